//! Error taxonomy for the Auto-Selector core.
//!
//! Mirrors the failure modes described in the specification: missing
//! profiles, malformed endpoints, and transient I/O never escalate past the
//! orchestrator (they resolve to `Ok(None)` or feed the breaker/estimator
//! instead). Only a store-write failure surfaces as `Err`.

#[derive(Debug, thiserror::Error)]
pub enum AutoSelectorError {
    #[error("profile store error: {0}")]
    StoreError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AutoSelectorError>;
