//! Helpers shared by the connector tests: in-process upstream stubs and settings fixtures.

use agentmesh_core::ProviderSettings;
use std::collections::HashMap;

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn_stub(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Settings built from the given variables only; nothing is read from the process env.
pub fn settings_with(vars: &[(&str, &str)]) -> ProviderSettings {
    let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    ProviderSettings::from_lookup(|name| vars.get(name).cloned())
}
