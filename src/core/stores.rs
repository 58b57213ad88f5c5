//! External-collaborator traits (specification §6) plus reference
//! implementations.
//!
//! Every store is modeled as a trait injected into the orchestrator,
//! exactly as the specification's design notes direct ("do not hide it
//! behind implicit module state"). This mirrors the teacher's
//! `HttpClientTrait`/`HealthCheckClient` dependency-injection pattern:
//! a trait plus at least one production-shaped implementation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::types::{EndpointProfile, HistoricalMetrics};
use crate::error::{AutoSelectorError, Result};

/// Lookup and (rarely) mutate endpoint profiles by opaque identifier.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn lookup(&self, id: &str) -> Option<EndpointProfile>;

    /// Persist `profile`, possibly under a new identifier. Callers must
    /// use the returned id thereafter.
    async fn write(&self, id: &str, profile: EndpointProfile) -> Result<String>;
}

/// Load and persist per-identifier historical metrics.
#[async_trait]
pub trait MetricsStore: Send + Sync {
    async fn load_metrics(&self, id: &str) -> Option<HistoricalMetrics>;

    /// Persist `metrics` for `id` as a single atomic operation: no partial
    /// write of the six fields is permitted.
    async fn save_metrics(&self, id: &str, metrics: HistoricalMetrics) -> Result<()>;
}

/// Auxiliary quality flags kept only for external UIs; not consumed by
/// the scoring math. Optional per specification §6.
#[async_trait]
pub trait AffiliationStore: Send + Sync {
    async fn read_flag(&self, id: &str) -> Option<String>;
    async fn write_flag(&self, id: &str, flag: String) -> Result<()>;
}

/// Receives the promoted identifier and makes it the "currently active"
/// endpoint.
#[async_trait]
pub trait SelectionSink: Send + Sync {
    async fn set_active(&self, id: &str) -> Result<()>;

    /// Separate "promote" hook, so a caller that wants to keep the label
    /// rewrite (specification §3/§9) out of the core's concerns can
    /// override just this method. The default forwards to `set_active`.
    async fn promote(&self, id: &str) -> Result<()> {
        self.set_active(id).await
    }
}

/// Transient per-endpoint configuration handed back by
/// `TunnelEvaluator::build_transient_config`.
#[derive(Debug, Clone)]
pub struct TransientConfig {
    pub content: String,
    pub local_port: u16,
}

/// Given a transient config, measure round-trip-time or transfer data
/// through the proxy core. This is the external collaborator the
/// specification treats as "running the tunnel itself" — entirely out of
/// this core's scope.
#[async_trait]
pub trait TunnelEvaluator: Send + Sync {
    async fn build_transient_config(&self, id: &str) -> Option<TransientConfig>;

    /// Returns the measured RTT in ms, or a value `<= 0` on failure.
    async fn ping_through_tunnel(&self, content: &str) -> i64;

    /// Returns the number of bytes transferred, or `None` on failure.
    async fn fetch_through_tunnel(
        &self,
        url: &str,
        user_agent: &str,
        local_port: u16,
    ) -> Option<usize>;
}

// ---------------------------------------------------------------------
// In-memory reference implementations (tests, and the cached-only path
// of the demo binary).
// ---------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: Mutex<HashMap<String, EndpointProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(self, profile: EndpointProfile) -> Self {
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.id.clone(), profile);
        self
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn lookup(&self, id: &str) -> Option<EndpointProfile> {
        self.profiles.lock().unwrap().get(id).cloned()
    }

    async fn write(&self, id: &str, profile: EndpointProfile) -> Result<String> {
        let mut guard = self.profiles.lock().unwrap();
        guard.insert(id.to_string(), profile);
        Ok(id.to_string())
    }
}

#[derive(Default)]
pub struct InMemoryMetricsStore {
    metrics: Mutex<HashMap<String, HistoricalMetrics>>,
}

impl InMemoryMetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(self, id: impl Into<String>, metrics: HistoricalMetrics) -> Self {
        self.metrics.lock().unwrap().insert(id.into(), metrics);
        self
    }
}

#[async_trait]
impl MetricsStore for InMemoryMetricsStore {
    async fn load_metrics(&self, id: &str) -> Option<HistoricalMetrics> {
        self.metrics.lock().unwrap().get(id).cloned()
    }

    async fn save_metrics(&self, id: &str, metrics: HistoricalMetrics) -> Result<()> {
        self.metrics.lock().unwrap().insert(id.to_string(), metrics);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySelectionSink {
    pub active: Mutex<Option<String>>,
}

impl InMemorySelectionSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SelectionSink for InMemorySelectionSink {
    async fn set_active(&self, id: &str) -> Result<()> {
        *self.active.lock().unwrap() = Some(id.to_string());
        Ok(())
    }
}

/// A `TunnelEvaluator` driven entirely by pre-programmed responses, in the
/// idiom of the teacher's `MockHealthCheckClient`. Intended for tests and
/// for the demo binary, never for production use — the real evaluator has
/// to actually route traffic through the proxy core, which is out of this
/// crate's scope.
#[derive(Default)]
pub struct MockTunnelEvaluator {
    pub ping_ms: Mutex<HashMap<String, i64>>,
    pub throughput_bytes: Mutex<HashMap<String, usize>>,
    pub config_available: Mutex<HashMap<String, bool>>,
}

impl MockTunnelEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ping(&self, id: &str, rtt_ms: i64) {
        self.ping_ms.lock().unwrap().insert(id.to_string(), rtt_ms);
    }

    pub fn set_throughput_bytes(&self, id: &str, bytes: usize) {
        self.throughput_bytes
            .lock()
            .unwrap()
            .insert(id.to_string(), bytes);
    }

    pub fn deny_config(&self, id: &str) {
        self.config_available
            .lock()
            .unwrap()
            .insert(id.to_string(), false);
    }
}

#[async_trait]
impl TunnelEvaluator for MockTunnelEvaluator {
    async fn build_transient_config(&self, id: &str) -> Option<TransientConfig> {
        if self
            .config_available
            .lock()
            .unwrap()
            .get(id)
            .copied()
            .unwrap_or(true)
        {
            Some(TransientConfig {
                content: format!("config:{}", id),
                local_port: 0,
            })
        } else {
            None
        }
    }

    async fn ping_through_tunnel(&self, content: &str) -> i64 {
        let id = content.trim_start_matches("config:");
        self.ping_ms.lock().unwrap().get(id).copied().unwrap_or(-1)
    }

    async fn fetch_through_tunnel(
        &self,
        url: &str,
        _user_agent: &str,
        _local_port: u16,
    ) -> Option<usize> {
        let id = url
            .split("id=")
            .nth(1)
            .and_then(|rest| rest.split('&').next())
            .unwrap_or("");
        self.throughput_bytes.lock().unwrap().get(id).copied()
    }
}

// ---------------------------------------------------------------------
// File-backed reference implementations, atomic via temp-file + rename
// (grounded on `http_monitor.rs`'s `write_state_atomic`/`load_state_internal`).
// ---------------------------------------------------------------------

pub struct FileProfileStore {
    path: PathBuf,
}

#[derive(Default, serde::Serialize, serde::Deserialize)]
struct ProfileFile {
    profiles: HashMap<String, EndpointProfile>,
}

impl FileProfileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn read_all(&self) -> ProfileFile {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => ProfileFile::default(),
        }
    }

    async fn write_all(&self, file: &ProfileFile) -> Result<()> {
        write_json_atomic(&self.path, file).await
    }
}

#[async_trait]
impl ProfileStore for FileProfileStore {
    async fn lookup(&self, id: &str) -> Option<EndpointProfile> {
        self.read_all().await.profiles.get(id).cloned()
    }

    async fn write(&self, id: &str, profile: EndpointProfile) -> Result<String> {
        let mut file = self.read_all().await;
        let new_id = id.to_string();
        file.profiles.insert(new_id.clone(), profile);
        self.write_all(&file).await?;
        Ok(new_id)
    }
}

pub struct FileMetricsStore {
    path: PathBuf,
}

#[derive(Default, serde::Serialize, serde::Deserialize)]
struct MetricsFile {
    metrics: HashMap<String, HistoricalMetrics>,
}

impl FileMetricsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn read_all(&self) -> MetricsFile {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => MetricsFile::default(),
        }
    }

    async fn write_all(&self, file: &MetricsFile) -> Result<()> {
        write_json_atomic(&self.path, file).await
    }
}

#[async_trait]
impl MetricsStore for FileMetricsStore {
    async fn load_metrics(&self, id: &str) -> Option<HistoricalMetrics> {
        self.read_all().await.metrics.get(id).cloned()
    }

    async fn save_metrics(&self, id: &str, metrics: HistoricalMetrics) -> Result<()> {
        let mut file = self.read_all().await;
        file.metrics.insert(id.to_string(), metrics);
        self.write_all(&file).await
    }
}

/// Write `value` to `path` atomically via temp-file + rename, so a crash
/// mid-write never leaves a torn store file behind.
async fn write_json_atomic<T: serde::Serialize>(path: &PathBuf, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(AutoSelectorError::IoError)?;
    }

    let temp_path = path.with_extension(format!("tmp-{}", Uuid::new_v4()));
    let content = serde_json::to_string_pretty(value)?;
    tokio::fs::write(&temp_path, content)
        .await
        .map_err(AutoSelectorError::IoError)?;
    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(AutoSelectorError::IoError)?;
    Ok(())
}

/// A `SelectionSink` that persists the active identifier to a small JSON
/// file, atomically, alongside the metrics/profile stores.
pub struct FileSelectionSink {
    path: PathBuf,
}

#[derive(Default, serde::Serialize, serde::Deserialize)]
struct ActiveFile {
    active_id: Option<String>,
}

impl FileSelectionSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub async fn read_active(&self) -> Option<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str::<ActiveFile>(&content)
                .ok()
                .and_then(|f| f.active_id),
            Err(_) => None,
        }
    }
}

#[async_trait]
impl SelectionSink for FileSelectionSink {
    async fn set_active(&self, id: &str) -> Result<()> {
        write_json_atomic(
            &self.path,
            &ActiveFile {
                active_id: Some(id.to_string()),
            },
        )
        .await
    }
}
