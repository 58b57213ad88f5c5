//! Shared scaffolding for the Auto-Selector integration tests.

use std::sync::Arc;

use auto_selector::core::{
    ConnectionKind, EndpointProfile, InMemoryMetricsStore, InMemoryProfileStore,
    InMemorySelectionSink, MockTunnelEvaluator,
};
use tokio::net::TcpListener;

/// Spawn a local TCP listener that accepts and immediately drops every
/// connection, so TCP-phase probes against it succeed without exercising
/// any real proxy traffic.
pub async fn spawn_accepting_listener() -> (String, u16) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind ephemeral listener");
    let addr = listener.local_addr().expect("listener has no local addr");

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => drop(socket),
                Err(_) => break,
            }
        }
    });

    ("127.0.0.1".to_string(), addr.port())
}

pub fn profile(id: &str, host: &str, port: u16) -> EndpointProfile {
    EndpointProfile {
        id: id.to_string(),
        label: format!("{id} label"),
        kind: ConnectionKind::Vmess,
        host: host.to_string(),
        port,
    }
}

pub fn profile_store(profiles: Vec<EndpointProfile>) -> Arc<InMemoryProfileStore> {
    let mut store = InMemoryProfileStore::new();
    for profile in profiles {
        store = store.with_profile(profile);
    }
    Arc::new(store)
}

pub fn metrics_store() -> Arc<InMemoryMetricsStore> {
    Arc::new(InMemoryMetricsStore::new())
}

pub fn selection_sink() -> Arc<InMemorySelectionSink> {
    Arc::new(InMemorySelectionSink::new())
}

pub fn tunnel_evaluator() -> Arc<MockTunnelEvaluator> {
    Arc::new(MockTunnelEvaluator::new())
}
