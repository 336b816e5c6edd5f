//! Fixtures for route tests: gateway state over lookup-built settings and local upstream stubs.

use crate::AppState;
use agentmesh_connectors::{default_registry, ConnectionValidator, N8nClient};
use agentmesh_core::{CoreConfig, ProviderSettings, SessionState, SessionStore};
use axum::response::Response;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

pub fn test_config() -> CoreConfig {
    CoreConfig {
        app_name: "Test Gateway".to_string(),
        port: 8001,
        health_interval_secs: 0,
        demo_mode: false,
    }
}

/// State wired exactly like `main`, but with settings taken only from `vars`.
/// n8n defaults to a closed local port so nothing real is contacted.
pub fn test_state(vars: &[(&str, &str)]) -> AppState {
    let mut map: HashMap<String, String> = HashMap::new();
    map.insert(agentmesh_core::settings::ENV_N8N_URL.to_string(), "http://127.0.0.1:1".to_string());
    map.insert(agentmesh_core::settings::ENV_OLLAMA_API_URL.to_string(), "http://127.0.0.1:1".to_string());
    for (k, v) in vars {
        map.insert(k.to_string(), v.to_string());
    }
    let settings = Arc::new(ProviderSettings::from_lookup(|name| map.get(name).cloned()));
    let client = reqwest::Client::new();
    let (events_tx, _) = broadcast::channel(16);
    AppState {
        config: Arc::new(test_config()),
        validator: Arc::new(ConnectionValidator::new(Arc::new(default_registry(client.clone(), &settings)))),
        n8n: N8nClient::new(client, settings),
        session: Arc::new(SessionStore::new(SessionState::default())),
        events_tx,
    }
}

pub fn demo_state() -> AppState {
    let state = test_state(&[]);
    state.session.update(|s| s.with_demo_mode(true));
    state
}

pub async fn spawn_stub(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub async fn json_body(res: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
