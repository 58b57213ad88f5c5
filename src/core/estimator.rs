//! Exponentially weighted moving average estimator (specification §4.2).

use crate::config::AutoSelectorConfig;
use crate::core::types::{HistoricalMetrics, ProbeResult, UNINIT};

/// Fold `sample` into `previous`. A sentinel `sample` (no real measurement
/// for this probe — e.g. every TCP sample in the probe failed even though
/// the overall probe succeeded) leaves `previous` untouched rather than
/// corrupting it; this is the only way `average_rtt_ms`/`average_jitter_ms`
/// can stay `UNINIT` after a successful probe, matching the "already
/// uninitialized" case on the next read.
fn ewma(previous: f64, sample: f64, alpha: f64) -> f64 {
    if sample == UNINIT {
        previous
    } else if previous == UNINIT {
        sample
    } else {
        alpha * sample + (1.0 - alpha) * previous
    }
}

/// Roll a probe result forward into `metrics` in place.
///
/// A result counts as successful iff `probe.connection_successful` is
/// `true` — the orchestrator is the sole authority on that flag, per the
/// specification. On success the three averages update via EWMA (or take
/// the sample value outright if still uninitialized); on failure only the
/// failure counter and timestamp move.
pub fn apply_probe_result(
    metrics: &mut HistoricalMetrics,
    probe: &ProbeResult,
    cfg: &AutoSelectorConfig,
) {
    if probe.connection_successful {
        metrics.average_rtt_ms = ewma(metrics.average_rtt_ms, probe.rtt_ms, cfg.ewma_alpha);
        metrics.average_jitter_ms = ewma(metrics.average_jitter_ms, probe.jitter_ms, cfg.ewma_alpha);
        metrics.average_throughput_kbps = ewma(
            metrics.average_throughput_kbps,
            probe.throughput_kbps,
            cfg.ewma_alpha,
        );
        metrics.success_count += 1;
    } else {
        metrics.failure_count += 1;
    }
    metrics.last_update_time_ms = metrics.last_update_time_ms.max(probe.tested_at_ms);
}

/// Sample standard deviation of a small set of TCP-ping samples (§4.2).
/// Fewer than two samples yields zero jitter.
pub fn jitter_of(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    let variance =
        samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (samples.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_success_initializes_averages_exactly() {
        let mut m = HistoricalMetrics::default();
        let cfg = AutoSelectorConfig::default();
        let probe = ProbeResult {
            id: "a".into(),
            rtt_ms: 100.0,
            jitter_ms: 10.0,
            throughput_kbps: 5000.0,
            connection_successful: true,
            tested_at_ms: 1,
        };
        apply_probe_result(&mut m, &probe, &cfg);
        assert_eq!(m.average_rtt_ms, 100.0);
        assert_eq!(m.average_jitter_ms, 10.0);
        assert_eq!(m.average_throughput_kbps, 5000.0);
        assert_eq!(m.success_count, 1);
        assert_eq!(m.failure_count, 0);
    }

    #[test]
    fn ewma_update_matches_scenario_s5() {
        let mut m = HistoricalMetrics {
            average_rtt_ms: 100.0,
            average_jitter_ms: 10.0,
            average_throughput_kbps: 5000.0,
            success_count: 1,
            failure_count: 0,
            last_update_time_ms: 0,
        };
        let cfg = AutoSelectorConfig::default();
        let probe = ProbeResult {
            id: "a".into(),
            rtt_ms: 50.0,
            jitter_ms: 5.0,
            throughput_kbps: 10_000.0,
            connection_successful: true,
            tested_at_ms: 5,
        };
        apply_probe_result(&mut m, &probe, &cfg);
        assert!((m.average_rtt_ms - 85.0).abs() < 1e-9);
        assert!((m.average_jitter_ms - 8.5).abs() < 1e-9);
        assert!((m.average_throughput_kbps - 6500.0).abs() < 1e-9);
        assert_eq!(m.success_count, 2);
        assert_eq!(m.failure_count, 0);

        // A subsequent failure leaves averages unchanged.
        let failed = ProbeResult::failed("a", 6);
        apply_probe_result(&mut m, &failed, &cfg);
        assert!((m.average_rtt_ms - 85.0).abs() < 1e-9);
        assert_eq!(m.success_count, 2);
        assert_eq!(m.failure_count, 1);
    }

    #[test]
    fn failure_never_touches_averages() {
        let mut m = HistoricalMetrics::default();
        let cfg = AutoSelectorConfig::default();
        apply_probe_result(&mut m, &ProbeResult::failed("a", 1), &cfg);
        assert_eq!(m.average_rtt_ms, UNINIT);
        assert_eq!(m.failure_count, 1);
        assert_eq!(m.success_count, 0);
    }

    #[test]
    fn last_update_time_is_monotonic() {
        let mut m = HistoricalMetrics {
            last_update_time_ms: 50,
            ..HistoricalMetrics::default()
        };
        let cfg = AutoSelectorConfig::default();
        apply_probe_result(&mut m, &ProbeResult::failed("a", 10), &cfg);
        assert_eq!(m.last_update_time_ms, 50);
    }

    #[test]
    fn jitter_needs_two_samples() {
        assert_eq!(jitter_of(&[]), 0.0);
        assert_eq!(jitter_of(&[42.0]), 0.0);
        assert!(jitter_of(&[10.0, 20.0, 30.0]) > 0.0);
    }
}
