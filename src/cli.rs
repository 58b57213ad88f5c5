//! Command-line surface for the demo binary.
//!
//! Thin wiring only: loads a TOML config of candidate profiles, runs one
//! of the two selection paths against file-backed stores and a mock
//! tunnel evaluator, and prints the winner. The real tunnel integration is
//! always an external collaborator (specification §1) — this binary
//! exists to exercise the core, not to replace that collaborator.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "auto-selector")]
#[command(version = concat!("Ver:", env!("CARGO_PKG_VERSION")))]
#[command(about = "Probe and rank outbound proxy endpoints")]
pub struct Cli {
    /// Path to a TOML file describing candidate endpoint profiles.
    #[arg(short = 'c', long = "config", default_value = "auto-selector.toml")]
    pub config_path: PathBuf,

    /// Directory used for the file-backed profile/metrics/selection state.
    #[arg(short = 's', long = "state-dir")]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the full-probe selection path.
    Select,
    /// Run the cached (historical-only) selection path.
    Cached,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
