//! Integration tests for the full-probe and cached selection pipelines,
//! exercising the orchestrator against in-memory stores and a mock tunnel
//! evaluator.

mod common;

use auto_selector::config::AutoSelectorConfig;
use auto_selector::core::{AutoSelector, HistoricalMetrics};
use common::*;

#[tokio::test]
async fn empty_candidate_list_selects_nothing() {
    let selector = AutoSelector::new(
        profile_store(vec![]),
        metrics_store(),
        selection_sink(),
        tunnel_evaluator(),
    );

    let result = selector.auto_select_best_proxy(&[]).await.unwrap();
    assert_eq!(result, None);
}

#[tokio::test]
async fn two_healthy_candidates_promotes_a_winner() {
    let (host_a, port_a) = spawn_accepting_listener().await;
    let (host_b, port_b) = spawn_accepting_listener().await;

    let profiles = profile_store(vec![
        profile("alpha", &host_a, port_a),
        profile("beta", &host_b, port_b),
    ]);
    let metrics = metrics_store();
    let sink = selection_sink();
    let tunnel = tunnel_evaluator();
    tunnel.set_ping("alpha", 50);
    tunnel.set_ping("beta", 100);
    tunnel.set_throughput_bytes("alpha", 256 * 1024);
    tunnel.set_throughput_bytes("beta", 256 * 1024);

    let selector = AutoSelector::new(profiles.clone(), metrics.clone(), sink.clone(), tunnel)
        .with_config(AutoSelectorConfig::fast_for_tests());

    let winner = selector
        .auto_select_best_proxy(&["alpha".to_string(), "beta".to_string()])
        .await
        .unwrap()
        .expect("one of the two healthy candidates should win");

    assert!(winner == "alpha" || winner == "beta");
    assert_eq!(*sink.active.lock().unwrap(), Some(winner.clone()));

    let winning_profile = profiles.lookup(&winner).await.unwrap();
    assert_eq!(winning_profile.label, "Auto Selector");

    // Both candidates were probed and their metrics updated regardless of
    // which one won the ranking.
    for id in ["alpha", "beta"] {
        let m = metrics.load_metrics(id).await.unwrap();
        assert_eq!(m.success_count, 1);
        assert_eq!(m.failure_count, 0);
    }
}

#[tokio::test]
async fn cached_ranking_prefers_lower_historical_rtt() {
    let profiles = profile_store(vec![
        profile("alpha", "127.0.0.1", 1),
        profile("beta", "127.0.0.1", 2),
    ]);
    let metrics = metrics_store();
    metrics
        .save_metrics(
            "alpha",
            HistoricalMetrics {
                average_rtt_ms: 40.0,
                average_jitter_ms: 2.0,
                average_throughput_kbps: 8000.0,
                success_count: 10,
                failure_count: 0,
                last_update_time_ms: 1_000,
            },
        )
        .await
        .unwrap();
    metrics
        .save_metrics(
            "beta",
            HistoricalMetrics {
                average_rtt_ms: 200.0,
                average_jitter_ms: 5.0,
                average_throughput_kbps: 8000.0,
                success_count: 10,
                failure_count: 0,
                last_update_time_ms: 1_000,
            },
        )
        .await
        .unwrap();

    let selector = AutoSelector::new(
        profiles,
        metrics,
        selection_sink(),
        tunnel_evaluator(),
    );

    let winner = selector
        .get_best_available_proxy(&["alpha".to_string(), "beta".to_string()])
        .await
        .expect("one candidate should have usable history");
    assert_eq!(winner, "alpha");
}

#[tokio::test]
async fn cached_path_skips_candidates_with_no_history() {
    let profiles = profile_store(vec![profile("alpha", "127.0.0.1", 1)]);
    let selector = AutoSelector::new(
        profiles,
        metrics_store(),
        selection_sink(),
        tunnel_evaluator(),
    );

    let winner = selector
        .get_best_available_proxy(&["alpha".to_string()])
        .await;
    assert_eq!(winner, None);
}

#[tokio::test]
async fn repeated_failures_open_the_breaker_and_block_further_probes() {
    // An unroutable TEST-NET-1 address (RFC 5737) so every TCP sample and
    // every probe on it fails deterministically.
    let profiles = profile_store(vec![profile("alpha", "192.0.2.1", 9)]);
    let metrics = metrics_store();
    let sink = selection_sink();
    let tunnel = tunnel_evaluator(); // no ping configured -> ping_through_tunnel returns -1

    let selector = AutoSelector::new(profiles, metrics.clone(), sink, tunnel)
        .with_config(AutoSelectorConfig::fast_for_tests());

    // Three consecutive failed runs should open the breaker (failure_threshold = 3).
    for _ in 0..3 {
        let result = selector
            .auto_select_best_proxy(&["alpha".to_string()])
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    let snapshot = selector.breaker_snapshot().await;
    let entry = snapshot.get("alpha").expect("breaker entry should exist");
    assert_eq!(entry.consecutive_failures, 3);

    let failed_metrics = metrics.load_metrics("alpha").await.unwrap();
    assert_eq!(failed_metrics.failure_count, 3);
    assert_eq!(failed_metrics.success_count, 0);
}

#[tokio::test]
async fn selection_failure_leaves_sink_untouched() {
    let profiles = profile_store(vec![profile("alpha", "192.0.2.1", 9)]);
    let sink = selection_sink();

    let selector = AutoSelector::new(
        profiles,
        metrics_store(),
        sink.clone(),
        tunnel_evaluator(),
    )
    .with_config(AutoSelectorConfig::fast_for_tests());

    let result = selector
        .auto_select_best_proxy(&["alpha".to_string()])
        .await
        .unwrap();
    assert_eq!(result, None);
    assert_eq!(*sink.active.lock().unwrap(), None);
}
