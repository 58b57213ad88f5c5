//! Auto-Selector core: probing, estimation, circuit-breaking, scoring, and
//! the selection orchestrator (specification §2–§5).

pub mod breaker;
pub mod estimator;
pub mod orchestrator;
pub mod probe;
pub mod scorer;
pub mod stores;
pub mod types;

pub use orchestrator::{AutoSelector, SingleFlightSelector};
pub use stores::{
    AffiliationStore, FileMetricsStore, FileProfileStore, FileSelectionSink,
    InMemoryMetricsStore, InMemoryProfileStore, InMemorySelectionSink, MetricsStore,
    MockTunnelEvaluator, ProfileStore, SelectionSink, TransientConfig, TunnelEvaluator,
};
pub use types::{
    ConnectionKind, EndpointProfile, HistoricalMetrics, ProbeResult, PROMOTED_LABEL, UNINIT,
};
