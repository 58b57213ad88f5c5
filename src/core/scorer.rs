//! Weighted scoring and ranking (specification §4.4). Lower score wins.

use crate::config::AutoSelectorConfig;
use crate::core::types::UNINIT;

fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

/// Everything the scorer needs for one candidate. Built either from a
/// live probe result (full-probe path) or from historical averages
/// (cached path) by the orchestrator.
#[derive(Debug, Clone)]
pub struct ScoreInput {
    pub id: String,
    /// Live probe RTT if available, else `UNINIT`.
    pub live_rtt_ms: f64,
    pub live_jitter_ms: f64,
    pub live_throughput_kbps: f64,
    pub historical_rtt_ms: f64,
    pub historical_jitter_ms: f64,
    pub historical_throughput_kbps: f64,
    /// Whether the probe this candidate is being scored from succeeded.
    pub was_successful: bool,
    pub failure_count: u64,
    pub success_count: u64,
    pub last_update_time_ms: i64,
}

fn source_value(live: f64, historical: f64) -> f64 {
    if live != UNINIT {
        live
    } else {
        historical
    }
}

/// Compute the raw score for one candidate. Lower is better.
pub fn compute_score(input: &ScoreInput, now_ms: i64, cfg: &AutoSelectorConfig) -> f64 {
    let rtt = source_value(input.live_rtt_ms, input.historical_rtt_ms);
    let jitter = source_value(input.live_jitter_ms, input.historical_jitter_ms);
    let throughput = source_value(input.live_throughput_kbps, input.historical_throughput_kbps);

    // Normalization is applied directly to the sentinel when a value is
    // unknown (clamp(-1/ceiling, 0, 1) == 0) rather than special-cased;
    // the failure penalty below is what actually keeps an unknown/failed
    // candidate from outranking a measured one.
    let n_rtt = clamp(rtt / cfg.rtt_ceiling_ms, 0.0, 1.0);
    let n_jitter = clamp(jitter / cfg.jitter_ceiling_ms, 0.0, 1.0);
    let n_throughput = 1.0 - clamp(throughput / cfg.throughput_ceiling_kbps, 0.0, 1.0);

    let mut score = cfg.weight_rtt * n_rtt + cfg.weight_jitter * n_jitter + cfg.weight_throughput * n_throughput;

    if !input.was_successful || rtt == UNINIT {
        score += cfg.failure_penalty;
    }

    let denom = input.success_count + input.failure_count;
    if denom > 0 {
        let rate = input.failure_count as f64 / denom as f64;
        score += rate * cfg.failure_rate_penalty;
    }

    let age_ms = (now_ms - input.last_update_time_ms).max(0) as f64;
    let staleness = (age_ms / cfg.staleness_divisor_ms).min(cfg.staleness_cap);
    score += staleness;

    score
}

/// Rank candidates and return the identifier of the best one. Ties break
/// on lower RTT, then on lexicographic identifier order, so ranking is
/// deterministic given identical inputs.
pub fn rank_best(inputs: &[ScoreInput], now_ms: i64, cfg: &AutoSelectorConfig) -> Option<String> {
    inputs
        .iter()
        .map(|input| {
            let score = compute_score(input, now_ms, cfg);
            let rtt = source_value(input.live_rtt_ms, input.historical_rtt_ms);
            (score, rtt, input.id.clone())
        })
        .min_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap()
                .then_with(|| a.1.partial_cmp(&b.1).unwrap())
                .then_with(|| a.2.cmp(&b.2))
        })
        .map(|(_, _, id)| id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(id: &str) -> ScoreInput {
        ScoreInput {
            id: id.to_string(),
            live_rtt_ms: UNINIT,
            live_jitter_ms: UNINIT,
            live_throughput_kbps: UNINIT,
            historical_rtt_ms: UNINIT,
            historical_jitter_ms: UNINIT,
            historical_throughput_kbps: UNINIT,
            was_successful: true,
            failure_count: 0,
            success_count: 1,
            last_update_time_ms: 0,
        }
    }

    #[test]
    fn lower_rtt_wins_scenario_s3() {
        let cfg = AutoSelectorConfig::default();
        let a = ScoreInput {
            historical_rtt_ms: 100.0,
            historical_jitter_ms: 10.0,
            historical_throughput_kbps: 5000.0,
            success_count: 5,
            ..base("A")
        };
        let b = ScoreInput {
            historical_rtt_ms: 50.0,
            historical_jitter_ms: 5.0,
            historical_throughput_kbps: 10_000.0,
            success_count: 10,
            ..base("B")
        };
        let winner = rank_best(&[a, b], 0, &cfg).unwrap();
        assert_eq!(winner, "B");
    }

    #[test]
    fn failed_probe_adds_penalty() {
        let cfg = AutoSelectorConfig::default();
        let good = ScoreInput {
            live_rtt_ms: 100.0,
            was_successful: true,
            ..base("good")
        };
        let bad = ScoreInput {
            live_rtt_ms: 100.0,
            was_successful: false,
            ..base("bad")
        };
        assert!(compute_score(&bad, 0, &cfg) > compute_score(&good, 0, &cfg));
    }

    #[test]
    fn tie_break_is_lexicographic() {
        let cfg = AutoSelectorConfig::default();
        let a = ScoreInput {
            live_rtt_ms: 100.0,
            ..base("zeta")
        };
        let b = ScoreInput {
            live_rtt_ms: 100.0,
            ..base("alpha")
        };
        assert_eq!(rank_best(&[a, b], 0, &cfg).unwrap(), "alpha");
    }

    #[test]
    fn staleness_is_capped() {
        let cfg = AutoSelectorConfig::default();
        let ancient = ScoreInput {
            live_rtt_ms: 10.0,
            last_update_time_ms: -1_000_000_000,
            ..base("old")
        };
        let score = compute_score(&ancient, 0, &cfg);
        // staleness alone is capped at staleness_cap; total score bounded.
        assert!(score <= cfg.staleness_cap + cfg.weight_rtt + cfg.weight_jitter + cfg.weight_throughput + 1.0);
    }
}
