//! AgentMesh gateway: connection validation for the AI backends, n8n workflow proxy,
//! session state and the chat route the UI talks to.

mod handlers;
mod monitor;

#[cfg(test)]
mod test_support;

use agentmesh_connectors::{default_registry, ConnectionValidator, N8nClient};
use agentmesh_core::{CoreConfig, ProviderSettings, SessionState, SessionStore};
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use handlers::events::ConnectionEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[agentmesh-gateway] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match CoreConfig::load() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("[agentmesh-gateway] invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    let settings = Arc::new(ProviderSettings::from_env());
    tracing::debug!(target: "agentmesh::gateway", settings = ?settings, "Provider settings loaded");

    let client = reqwest::Client::builder().build()?;
    let registry = Arc::new(default_registry(client.clone(), &settings));
    let (events_tx, _) = broadcast::channel(64);
    let state = AppState {
        config: Arc::clone(&config),
        validator: Arc::new(ConnectionValidator::new(registry)),
        n8n: N8nClient::new(client, Arc::clone(&settings)),
        session: Arc::new(SessionStore::new(SessionState::default().with_demo_mode(config.demo_mode))),
        events_tx,
    };

    if config.health_interval_secs > 0 {
        tokio::spawn(monitor::connection_monitor(
            state.clone(),
            Duration::from_secs(config.health_interval_secs),
        ));
    } else {
        tracing::info!(target: "agentmesh::monitor", "Connection monitor disabled");
    }

    let app = build_app(state);
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], config.port));
    tracing::info!("{} listening on {}", config.app_name, addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// UI dev servers run on 3000-3099, sibling APIs on 8001-8099.
fn origin_allowed(origin: &HeaderValue) -> bool {
    let port = origin
        .to_str()
        .unwrap_or("")
        .rsplit(':')
        .next()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(0);
    (3000..=3099).contains(&port) || (8001..=8099).contains(&port)
}

fn build_app(state: AppState) -> Router {
    // SSE requests carry browser-managed headers (Accept, Cache-Control); allow any.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| origin_allowed(origin)))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any)
        .expose_headers(tower_http::cors::Any);

    Router::new()
        .route("/api/n8n/health", get(handlers::n8n::health))
        .route("/api/n8n/health/:workflow", get(handlers::n8n::workflow_health))
        .route("/api/n8n/workflows/:workflow", post(handlers::n8n::run_workflow))
        .route("/api/:provider/validate", get(handlers::validate::provider))
        .route("/api/v1/health", get(health))
        .route("/api/v1/status", get(status))
        .route("/api/v1/session", get(handlers::session::get_session).post(handlers::session::update_session))
        .route("/api/v1/validate", post(handlers::validate::validate_backend))
        .route("/api/v1/chat", post(handlers::chat::chat))
        .route("/api/v1/connection/events", get(handlers::events::connection_events))
        .with_state(state)
        .layer(cors)
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<CoreConfig>,
    pub(crate) validator: Arc<ConnectionValidator>,
    pub(crate) n8n: N8nClient,
    pub(crate) session: Arc<SessionStore>,
    pub(crate) events_tx: broadcast::Sender<ConnectionEvent>,
}

/// GET /api/v1/health – liveness check for UI and scripts.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

/// GET /api/v1/status – app identity plus the backend the session currently targets.
async fn status(axum::extract::State(state): axum::extract::State<AppState>) -> axum::Json<serde_json::Value> {
    let session = state.session.snapshot();
    let probes: Vec<&str> = state
        .validator
        .registry()
        .backends()
        .into_iter()
        .map(|b| b.as_str())
        .collect();
    axum::Json(serde_json::json!({
        "appName": state.config.app_name,
        "port": state.config.port,
        "backend": session.backend,
        "useDemoMode": session.use_demo_mode,
        "connection": session.connection,
        "probes": probes,
    }))
}
