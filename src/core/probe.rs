//! Probe primitives (specification §4.1).
//!
//! Three pure operations, each returning a positive measurement or the
//! `-1`/`false` failure sentinel. Grounded on the teacher's async probe
//! execution style (`http_monitor.rs`) and on the TCP-connect pattern
//! common across the retrieval pack's own probers, adapted to `tokio`.

use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::core::estimator::jitter_of;
use crate::core::stores::TunnelEvaluator;
use crate::core::types::UNINIT;

/// Open a raw TCP connection with a 3s timeout, measuring wall-clock
/// elapsed from just before connect to just after. Never retries; any
/// resolution or socket error returns the failure sentinel. The
/// connection is dropped (closed) on every exit path.
pub async fn tcp_connect_latency(host: &str, port: u16, connect_timeout: Duration) -> f64 {
    let addr = format!("{}:{}", host, port);
    let start = Instant::now();

    match timeout(connect_timeout, TcpStream::connect(&addr)).await {
        Ok(Ok(stream)) => {
            let elapsed = start.elapsed();
            drop(stream);
            elapsed.as_secs_f64() * 1000.0
        }
        Ok(Err(_)) | Err(_) => UNINIT,
    }
}

/// Collect `repetitions` TCP-connect samples and reduce them to a mean RTT
/// and jitter. Samples that fail are excluded from both statistics; if
/// every sample fails the result is `(UNINIT, UNINIT)`.
pub async fn collect_tcp_samples(
    host: &str,
    port: u16,
    connect_timeout: Duration,
    repetitions: u32,
) -> (f64, f64) {
    let mut samples = Vec::with_capacity(repetitions as usize);
    for _ in 0..repetitions {
        let sample = tcp_connect_latency(host, port, connect_timeout).await;
        if sample != UNINIT {
            samples.push(sample);
        }
    }

    if samples.is_empty() {
        return (UNINIT, UNINIT);
    }

    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    (mean, jitter_of(&samples))
}

/// Round-trip-time measured for traffic that actually traverses the proxy
/// core, as distinct from a raw TCP connect. A reading strictly inside
/// `(0, ceiling_ms)` is success; anything else — including a failed config
/// build, a negative reading, or a reading at/above the ceiling — is
/// failure.
pub async fn tunneled_rtt(
    evaluator: &dyn TunnelEvaluator,
    id: &str,
    ceiling_ms: i64,
) -> (bool, f64) {
    let Some(cfg) = evaluator.build_transient_config(id).await else {
        return (false, UNINIT);
    };

    let rtt = evaluator.ping_through_tunnel(&cfg.content).await;
    if rtt > 0 && rtt < ceiling_ms {
        (true, rtt as f64)
    } else {
        (false, UNINIT)
    }
}

/// Exercise a `size_kb`-sized transfer through the tunnel and derive a
/// kbps figure from elapsed wall-clock time. Failure (including an
/// inability to obtain a config, or the evaluator returning no bytes)
/// yields the `-1` sentinel.
pub async fn throughput_kbps(evaluator: &dyn TunnelEvaluator, id: &str, size_kb: u64) -> f64 {
    let Some(cfg) = evaluator.build_transient_config(id).await else {
        return UNINIT;
    };

    let url = format!("probe://throughput?id={}&size_kb={}", id, size_kb);
    let user_agent = "auto-selector/probe";

    let start = Instant::now();
    let bytes = evaluator
        .fetch_through_tunnel(&url, user_agent, cfg.local_port)
        .await;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    match bytes {
        Some(n) if n > 0 && elapsed_ms > 0.0 => (size_kb as f64) * 8.0 * 1000.0 / elapsed_ms,
        _ => UNINIT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn tcp_connect_latency_succeeds_against_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let _ = listener.accept().await;
        });

        let rtt = tcp_connect_latency("127.0.0.1", port, StdDuration::from_secs(1)).await;
        assert!(rtt >= 0.0);
        assert_ne!(rtt, UNINIT);
    }

    #[tokio::test]
    async fn tcp_connect_latency_fails_fast_on_unroutable_host() {
        // TEST-NET-1 (RFC 5737): guaranteed unreachable, won't hit real network.
        let rtt = tcp_connect_latency("192.0.2.1", 9, StdDuration::from_millis(50)).await;
        assert_eq!(rtt, UNINIT);
    }

    #[tokio::test]
    async fn collect_tcp_samples_all_fail_yields_uninit() {
        let (rtt, jitter) =
            collect_tcp_samples("192.0.2.1", 9, StdDuration::from_millis(50), 3).await;
        assert_eq!(rtt, UNINIT);
        assert_eq!(jitter, UNINIT);
    }
}
