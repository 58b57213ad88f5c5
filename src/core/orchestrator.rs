//! Selector orchestrator (specification §4.5): the full-probe and cached
//! selection pipelines, plus a single-flight wrapper.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tokio::sync::Mutex as AsyncMutex;

use crate::config::AutoSelectorConfig;
use crate::core::breaker::{self, BreakerMap};
use crate::core::estimator;
use crate::core::probe;
use crate::core::scorer::{self, ScoreInput};
use crate::core::stores::{AffiliationStore, MetricsStore, ProfileStore, SelectionSink, TunnelEvaluator};
use crate::core::types::{HistoricalMetrics, ProbeResult, PROMOTED_LABEL, UNINIT};
use crate::error::Result;
use crate::logging::SelectorLogger;

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Collaborators the orchestrator depends on. Every field is an injected
/// trait object, per the specification's "store abstraction" design note.
pub struct AutoSelector {
    profiles: Arc<dyn ProfileStore>,
    metrics: Arc<dyn MetricsStore>,
    sink: Arc<dyn SelectionSink>,
    tunnel: Arc<dyn TunnelEvaluator>,
    affiliation: Option<Arc<dyn AffiliationStore>>,
    config: AutoSelectorConfig,
    logger: Option<Arc<SelectorLogger>>,
    /// Process-wide, owned exclusively by the orchestrator during a run.
    breakers: AsyncMutex<BreakerMap>,
}

impl AutoSelector {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        metrics: Arc<dyn MetricsStore>,
        sink: Arc<dyn SelectionSink>,
        tunnel: Arc<dyn TunnelEvaluator>,
    ) -> Self {
        Self {
            profiles,
            metrics,
            sink,
            tunnel,
            affiliation: None,
            config: AutoSelectorConfig::default(),
            logger: None,
            breakers: AsyncMutex::new(HashMap::new()),
        }
    }

    pub fn with_config(mut self, config: AutoSelectorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_affiliation_store(mut self, store: Arc<dyn AffiliationStore>) -> Self {
        self.affiliation = Some(store);
        self
    }

    pub fn with_logger(mut self, logger: Arc<SelectorLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    fn log(&self, event: &str, fields: HashMap<String, serde_json::Value>) {
        if let Some(logger) = &self.logger {
            logger.log("auto_selector", event, fields);
        }
    }

    /// Full-probe selection (specification §4.5, full-probe variant).
    ///
    /// Probes candidates sequentially, rolls results into historical
    /// metrics and breaker state, ranks survivors, and promotes the
    /// winner through the profile store and selection sink.
    pub async fn auto_select_best_proxy(&self, candidates: &[String]) -> Result<Option<String>> {
        if candidates.is_empty() {
            return Ok(None);
        }

        let mut shuffled = candidates.to_vec();
        let seed = now_ms() as u64;
        let mut rng = StdRng::seed_from_u64(seed);
        shuffled.shuffle(&mut rng);

        let mut last_results: HashMap<String, ProbeResult> = HashMap::new();
        let mut last_metrics: HashMap<String, HistoricalMetrics> = HashMap::new();

        for id in &shuffled {
            let Some(profile) = self.profiles.lookup(id).await else {
                self.log(
                    "probe_skipped_missing_profile",
                    crate::log_fields!("id" => id),
                );
                continue;
            };

            let admitted = {
                let mut breakers = self.breakers.lock().await;
                breaker::consult(&mut breakers, id, now_ms(), &self.config)
            };
            if !admitted {
                self.log("probe_skipped_breaker_open", crate::log_fields!("id" => id));
                continue;
            }

            let result = self.probe_one(id, &profile.host, profile.port).await;

            let mut metrics = self.metrics.load_metrics(id).await.unwrap_or_default();
            estimator::apply_probe_result(&mut metrics, &result, &self.config);
            self.metrics.save_metrics(id, metrics.clone()).await?;

            {
                let mut breakers = self.breakers.lock().await;
                if result.connection_successful {
                    breaker::on_success(&mut breakers, id);
                } else {
                    breaker::on_failure(&mut breakers, id, result.tested_at_ms, &self.config);
                }
            }

            self.log(
                "probe_completed",
                crate::log_fields!(
                    "id" => id,
                    "success" => result.connection_successful,
                    "rtt_ms" => result.rtt_ms,
                ),
            );

            last_metrics.insert(id.clone(), metrics);
            last_results.insert(id.clone(), result);
        }

        let breakers_snapshot = self.breakers.lock().await.clone();

        let mut survivors = Vec::new();
        for id in &shuffled {
            let Some(result) = last_results.get(id) else {
                continue;
            };
            if breaker::is_open(&breakers_snapshot, id) {
                continue;
            }
            if !result.connection_successful || result.rtt_ms == UNINIT {
                continue;
            }
            let metrics = last_metrics.get(id).cloned().unwrap_or_default();
            survivors.push(ScoreInput {
                id: id.clone(),
                live_rtt_ms: result.rtt_ms,
                live_jitter_ms: result.jitter_ms,
                live_throughput_kbps: result.throughput_kbps,
                historical_rtt_ms: metrics.average_rtt_ms,
                historical_jitter_ms: metrics.average_jitter_ms,
                historical_throughput_kbps: metrics.average_throughput_kbps,
                was_successful: result.connection_successful,
                failure_count: metrics.failure_count,
                success_count: metrics.success_count,
                last_update_time_ms: metrics.last_update_time_ms,
            });
        }

        if survivors.is_empty() {
            return Ok(None);
        }

        let Some(winner_id) = scorer::rank_best(&survivors, now_ms(), &self.config) else {
            return Ok(None);
        };

        let Some(mut profile) = self.profiles.lookup(&winner_id).await else {
            return Ok(None);
        };
        profile.label = PROMOTED_LABEL.to_string();
        let final_id = self.profiles.write(&winner_id, profile).await?;

        self.sink.promote(&final_id).await?;

        self.log(
            "selection_completed",
            crate::log_fields!("winner" => final_id.clone()),
        );

        Ok(Some(final_id))
    }

    /// Run the three-stage probe (TCP samples, tunneled ping, optional
    /// throughput) for one candidate and fold it into a `ProbeResult`.
    async fn probe_one(&self, id: &str, host: &str, port: u16) -> ProbeResult {
        let tested_at_ms = now_ms();

        let (rtt_ms, jitter_ms) = probe::collect_tcp_samples(
            host,
            port,
            self.config.tcp_timeout,
            self.config.tcp_ping_repetitions,
        )
        .await;

        let (connection_successful, _tunneled_rtt_ms) =
            probe::tunneled_rtt(self.tunnel.as_ref(), id, self.config.tunneled_ping_ceiling_ms).await;

        let throughput_kbps = if connection_successful {
            probe::throughput_kbps(self.tunnel.as_ref(), id, self.config.throughput_probe_size_kb).await
        } else {
            UNINIT
        };

        ProbeResult {
            id: id.to_string(),
            rtt_ms,
            jitter_ms,
            throughput_kbps,
            connection_successful,
            tested_at_ms,
        }
    }

    /// Cached selection (specification §4.5, cached variant): no probing,
    /// no mutation of profile/metrics/breaker/selection-sink state. Ranks
    /// survivors purely from historical averages.
    pub async fn get_best_available_proxy(&self, candidates: &[String]) -> Option<String> {
        let breakers_snapshot = self.breakers.lock().await.clone();

        let mut inputs = Vec::new();
        for id in candidates {
            if self.profiles.lookup(id).await.is_none() {
                continue;
            }
            let Some(metrics) = self.metrics.load_metrics(id).await else {
                continue;
            };
            if metrics.is_uninitialized() {
                continue;
            }
            if breaker::is_open(&breakers_snapshot, id) {
                continue;
            }

            inputs.push(ScoreInput {
                id: id.clone(),
                live_rtt_ms: UNINIT,
                live_jitter_ms: UNINIT,
                live_throughput_kbps: UNINIT,
                historical_rtt_ms: metrics.average_rtt_ms,
                historical_jitter_ms: metrics.average_jitter_ms,
                historical_throughput_kbps: metrics.average_throughput_kbps,
                was_successful: true,
                failure_count: metrics.failure_count,
                success_count: metrics.success_count,
                last_update_time_ms: metrics.last_update_time_ms,
            });
        }

        if inputs.is_empty() {
            return None;
        }

        scorer::rank_best(&inputs, now_ms(), &self.config)
    }

    /// Read-only snapshot of the current breaker map, mostly useful for
    /// tests and diagnostics.
    pub async fn breaker_snapshot(&self) -> BreakerMap {
        self.breakers.lock().await.clone()
    }
}

/// Serializes overlapping `auto_select_best_proxy` calls, per the
/// specification's "single-flight guard" design note — the breaker map is
/// mutated without locking *within* one run, so two runs must never
/// overlap.
pub struct SingleFlightSelector {
    inner: Arc<AutoSelector>,
    guard: AsyncMutex<()>,
}

impl SingleFlightSelector {
    pub fn new(inner: Arc<AutoSelector>) -> Self {
        Self {
            inner,
            guard: AsyncMutex::new(()),
        }
    }

    pub async fn auto_select_best_proxy(&self, candidates: &[String]) -> Result<Option<String>> {
        let _permit = self.guard.lock().await;
        self.inner.auto_select_best_proxy(candidates).await
    }

    pub async fn get_best_available_proxy(&self, candidates: &[String]) -> Option<String> {
        self.inner.get_best_available_proxy(candidates).await
    }
}
