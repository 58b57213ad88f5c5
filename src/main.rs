use std::path::PathBuf;
use std::sync::Arc;

use auto_selector::cli::{Cli, Command};
use auto_selector::core::{
    AutoSelector, ConnectionKind, EndpointProfile, FileMetricsStore, FileProfileStore,
    FileSelectionSink, MockTunnelEvaluator,
};
use serde::Deserialize;

/// TOML shape for the demo binary's candidate list.
#[derive(Debug, Deserialize)]
struct DemoConfig {
    #[serde(default)]
    candidates: Vec<DemoCandidate>,
}

#[derive(Debug, Deserialize)]
struct DemoCandidate {
    id: String,
    label: String,
    kind: ConnectionKind,
    host: String,
    port: u16,
}

fn load_demo_config(path: &PathBuf) -> DemoConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            eprintln!("failed to parse {}: {e}", path.display());
            DemoConfig { candidates: vec![] }
        }),
        Err(_) => DemoConfig { candidates: vec![] },
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_args();
    let demo = load_demo_config(&cli.config_path);

    if demo.candidates.is_empty() {
        eprintln!(
            "no candidates found in {} — see README.md for the expected TOML shape",
            cli.config_path.display()
        );
        return Ok(());
    }

    let state_dir = cli
        .state_dir
        .or_else(|| dirs::data_dir().map(|d| d.join("auto-selector")))
        .unwrap_or_else(|| PathBuf::from("./auto-selector-state"));

    let profile_store = Arc::new(FileProfileStore::new(state_dir.join("profiles.json")));
    let metrics_store = Arc::new(FileMetricsStore::new(state_dir.join("metrics.json")));
    let sink = Arc::new(FileSelectionSink::new(state_dir.join("active.json")));
    let tunnel = Arc::new(MockTunnelEvaluator::new());

    let mut candidate_ids = Vec::with_capacity(demo.candidates.len());
    for candidate in demo.candidates {
        candidate_ids.push(candidate.id.clone());
        let profile = EndpointProfile {
            id: candidate.id.clone(),
            label: candidate.label,
            kind: candidate.kind,
            host: candidate.host,
            port: candidate.port,
        };
        profile_store.write(&candidate.id, profile).await?;
    }

    let selector = AutoSelector::new(profile_store, metrics_store, sink, tunnel);

    match cli.command {
        Command::Select => match selector.auto_select_best_proxy(&candidate_ids).await? {
            Some(id) => println!("selected: {id}"),
            None => println!("no candidate available"),
        },
        Command::Cached => match selector.get_best_available_proxy(&candidate_ids).await {
            Some(id) => println!("best cached: {id}"),
            None => println!("no historical data available"),
        },
    }

    Ok(())
}
