//! Tunable constants for the Auto-Selector core.
//!
//! Grounded on `ProxyHealthOptions` from the teacher repo: a plain struct of
//! knobs with a `Default` impl that matches the specification's constants
//! exactly, plus named constructors for the couple of presets that are
//! useful in tests and the demo binary.

use std::time::Duration;

/// Tunable constants for probing, the circuit breaker, and the scorer.
///
/// Defaults match the specification's §6 tunable-constants table.
#[derive(Debug, Clone)]
pub struct AutoSelectorConfig {
    /// TCP connect timeout.
    pub tcp_timeout: Duration,
    /// Number of TCP-connect samples collected per probe.
    pub tcp_ping_repetitions: u32,
    /// Tunneled-ping ceiling; a reading at or above this is a failure.
    pub tunneled_ping_ceiling_ms: i64,
    /// Throughput probe payload size, in KB.
    pub throughput_probe_size_kb: u64,

    /// Consecutive failures before the breaker opens.
    pub failure_threshold: u32,
    /// How long the breaker stays OPEN before trying HALF_OPEN.
    pub open_window: Duration,
    /// How long HALF_OPEN waits (from the same stamp as OPEN) before
    /// admitting one probe.
    pub half_open_probe_gap: Duration,

    /// Scoring weights (RTT, jitter, throughput). The remaining weight is
    /// reserved for a loss metric this crate does not measure.
    pub weight_rtt: f64,
    pub weight_jitter: f64,
    pub weight_throughput: f64,

    /// Normalization ceilings.
    pub rtt_ceiling_ms: f64,
    pub jitter_ceiling_ms: f64,
    pub throughput_ceiling_kbps: f64,

    /// Added to the score when the current probe failed or RTT is unknown.
    pub failure_penalty: f64,
    /// Historical failure rate is multiplied by this before being added.
    pub failure_rate_penalty: f64,
    /// Staleness divisor (age in ms / this = staleness score before capping).
    pub staleness_divisor_ms: f64,
    /// Upper bound on the staleness penalty.
    pub staleness_cap: f64,

    /// EWMA weight applied to new samples.
    pub ewma_alpha: f64,
}

impl Default for AutoSelectorConfig {
    fn default() -> Self {
        Self {
            tcp_timeout: Duration::from_secs(3),
            tcp_ping_repetitions: 3,
            tunneled_ping_ceiling_ms: 5000,
            throughput_probe_size_kb: 256,

            failure_threshold: 3,
            open_window: Duration::from_secs(60),
            half_open_probe_gap: Duration::from_secs(10),

            weight_rtt: 0.35,
            weight_jitter: 0.15,
            weight_throughput: 0.25,

            rtt_ceiling_ms: 3000.0,
            jitter_ceiling_ms: 500.0,
            throughput_ceiling_kbps: 10_000.0,

            failure_penalty: 10_000.0,
            failure_rate_penalty: 10_000.0,
            staleness_divisor_ms: 120_000.0,
            staleness_cap: 10_000.0,

            ewma_alpha: 0.3,
        }
    }
}

impl AutoSelectorConfig {
    /// Default configuration, identical to `Default::default()`. Named to
    /// match the teacher's `ProxyHealthOptions::compatible()` convention.
    pub fn standard() -> Self {
        Self::default()
    }

    /// A shorter-fused variant useful for tests that need the breaker to
    /// open and recover within a test's lifetime.
    pub fn fast_for_tests() -> Self {
        Self {
            open_window: Duration::from_millis(60),
            half_open_probe_gap: Duration::from_millis(10),
            tcp_timeout: Duration::from_millis(200),
            ..Self::default()
        }
    }
}
