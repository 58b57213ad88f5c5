//! Auto-Selector: a probing and ranking engine that decides which outbound
//! proxy endpoint a client should actively use.
//!
//! See `core::orchestrator::AutoSelector` for the entry point. Profile
//! storage, metrics storage, the tunneled-ping evaluator, and the
//! selection sink are all external collaborators injected as traits
//! (`core::stores`); this crate never establishes a tunnel or decides when
//! to re-probe.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;

pub use config::AutoSelectorConfig;
pub use error::AutoSelectorError;
