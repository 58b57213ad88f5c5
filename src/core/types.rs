//! Data model for the Auto-Selector core (specification §3).

use serde::{Deserialize, Serialize};

/// Sentinel for an uninitialized historical average.
pub const UNINIT: f64 = -1.0;

/// Connection/transport family. Opaque to the scoring math; carried
/// through to the profile store unchanged, exactly as the specification
/// requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    Vmess,
    Vless,
    Trojan,
    Shadowsocks,
    Socks5,
    Http,
}

/// Endpoint profile, as supplied by the profile store. Read-only from this
/// core's perspective except for the reserved label overwrite on
/// promotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointProfile {
    pub id: String,
    pub label: String,
    pub kind: ConnectionKind,
    pub host: String,
    pub port: u16,
}

/// The reserved label written back to a promoted profile. Exact bytes,
/// case-sensitive, per specification §6.
pub const PROMOTED_LABEL: &str = "Auto Selector";

/// Historical per-identifier metrics, persisted by the metrics store.
///
/// Averages use the `-1.0` sentinel for "uninitialized" rather than
/// `Option<f64>`: the scorer's clamp/normalize math reads directly against
/// the sentinel at every call site, and the specification singles this
/// convention out as load-bearing across both the estimator and the
/// scorer, so it is kept rather than migrated to an optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalMetrics {
    pub average_rtt_ms: f64,
    pub average_jitter_ms: f64,
    pub average_throughput_kbps: f64,
    pub success_count: u64,
    pub failure_count: u64,
    /// Milliseconds since epoch. Monotonically non-decreasing per
    /// identifier across writes.
    pub last_update_time_ms: i64,
}

impl Default for HistoricalMetrics {
    fn default() -> Self {
        Self {
            average_rtt_ms: UNINIT,
            average_jitter_ms: UNINIT,
            average_throughput_kbps: UNINIT,
            success_count: 0,
            failure_count: 0,
            last_update_time_ms: 0,
        }
    }
}

impl HistoricalMetrics {
    pub fn is_uninitialized(&self) -> bool {
        self.success_count == 0
    }
}

/// In-memory result of one probe invocation. Discarded after ranking;
/// its only durable trace is the `HistoricalMetrics` update already
/// persisted by the orchestrator.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub id: String,
    pub rtt_ms: f64,
    pub jitter_ms: f64,
    pub throughput_kbps: f64,
    pub connection_successful: bool,
    pub tested_at_ms: i64,
}

impl ProbeResult {
    pub fn failed(id: impl Into<String>, tested_at_ms: i64) -> Self {
        Self {
            id: id.into(),
            rtt_ms: UNINIT,
            jitter_ms: UNINIT,
            throughput_kbps: UNINIT,
            connection_successful: false,
            tested_at_ms,
        }
    }
}
