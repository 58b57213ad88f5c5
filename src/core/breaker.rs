//! Per-endpoint circuit breaker (specification §4.3).
//!
//! Modeled as an explicit map owned by the orchestrator rather than hidden
//! module state, per the specification's own design note. The map is
//! process-lifetime and never persisted: it is cheap to rebuild and the
//! historical metrics already capture long-term reliability.

use std::collections::HashMap;

use crate::config::AutoSelectorConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy)]
pub struct BreakerEntry {
    pub state: BreakerState,
    pub last_failure_time_ms: i64,
    pub consecutive_failures: u32,
}

impl Default for BreakerEntry {
    fn default() -> Self {
        Self {
            state: BreakerState::Closed,
            last_failure_time_ms: 0,
            consecutive_failures: 0,
        }
    }
}

/// Process-wide breaker map, keyed by identifier. Mutated only by the
/// orchestrator during a selection run.
pub type BreakerMap = HashMap<String, BreakerEntry>;

/// Consult (and, where the OPEN window has elapsed, transition) the
/// breaker entry for `id`. Returns `true` if a probe should be admitted
/// this call, `false` if the candidate must be skipped.
///
/// When an OPEN window elapses this call transitions the entry to
/// HALF_OPEN using the *same* failure stamp; since the OPEN window (60s)
/// is always at least as long as the HALF_OPEN probe gap (10s), the
/// HALF_OPEN admission check is evaluated against that same stamp in the
/// same call, so a candidate can go from "skipped" to "probe admitted"
/// within one `consult`.
pub fn consult(map: &mut BreakerMap, id: &str, now_ms: i64, cfg: &AutoSelectorConfig) -> bool {
    let entry = map.entry(id.to_string()).or_default();
    let open_window_ms = cfg.open_window.as_millis() as i64;
    let half_open_gap_ms = cfg.half_open_probe_gap.as_millis() as i64;

    match entry.state {
        BreakerState::Closed => true,
        BreakerState::Open => {
            if now_ms - entry.last_failure_time_ms >= open_window_ms {
                entry.state = BreakerState::HalfOpen;
                now_ms - entry.last_failure_time_ms >= half_open_gap_ms
            } else {
                false
            }
        }
        BreakerState::HalfOpen => now_ms - entry.last_failure_time_ms >= half_open_gap_ms,
    }
}

/// Whether `id`'s breaker is currently OPEN, without mutating state. Used
/// by the cached (non-probing) selection path, which only reads breaker
/// state and never drives OPEN -> HALF_OPEN transitions itself — those
/// belong to the probing orchestrator per the specification's ownership
/// rule.
pub fn is_open(map: &BreakerMap, id: &str) -> bool {
    matches!(map.get(id), Some(entry) if entry.state == BreakerState::Open)
}

/// Record a successful probe result against `id`'s breaker entry.
pub fn on_success(map: &mut BreakerMap, id: &str) {
    let entry = map.entry(id.to_string()).or_default();
    entry.state = BreakerState::Closed;
    entry.consecutive_failures = 0;
}

/// Record a failed probe result against `id`'s breaker entry.
pub fn on_failure(map: &mut BreakerMap, id: &str, now_ms: i64, cfg: &AutoSelectorConfig) {
    let entry = map.entry(id.to_string()).or_default();
    match entry.state {
        BreakerState::Closed => {
            entry.consecutive_failures = entry.consecutive_failures.saturating_add(1);
            if entry.consecutive_failures >= cfg.failure_threshold {
                entry.state = BreakerState::Open;
                entry.last_failure_time_ms = now_ms;
            }
        }
        BreakerState::HalfOpen => {
            entry.state = BreakerState::Open;
            entry.last_failure_time_ms = now_ms;
        }
        BreakerState::Open => {
            // Shouldn't normally be probed while OPEN; refresh defensively.
            entry.last_failure_time_ms = now_ms;
        }
    }
}
