//! Provider validation routes.

use crate::handlers::events::publish;
use crate::AppState;
use agentmesh_core::{BackendType, ConnectionResult, ConnectionState, WorkflowType};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderValidation {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_available: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<String>,
}

impl ProviderValidation {
    fn failed(message: String) -> Self {
        Self {
            success: false,
            message,
            model_available: None,
            models: Vec::new(),
        }
    }
}

/// GET /api/:provider/validate – checks one model API directly.
///
/// 200 when the provider accepts the request, 500 for missing configuration, the
/// provider's own status when it rejects the key, 502 when it cannot be reached.
pub async fn provider(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> (StatusCode, Json<ProviderValidation>) {
    let backend = match provider.parse::<BackendType>() {
        Ok(BackendType::N8n) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ProviderValidation::failed("n8n is checked through /api/n8n/health".to_string())),
            )
        }
        Ok(backend) => backend,
        Err(e) => return (StatusCode::BAD_REQUEST, Json(ProviderValidation::failed(e.to_string()))),
    };

    match state.validator.probe(backend).await {
        Ok(report) => (
            StatusCode::OK,
            Json(ProviderValidation {
                success: true,
                message: report.message,
                model_available: report.model_available,
                models: report.models,
            }),
        ),
        Err(e) => {
            let status = StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, Json(ProviderValidation::failed(e.to_string())))
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub backend_type: BackendType,
    /// Falls back to the session's demo flag.
    #[serde(default)]
    pub use_demo_mode: Option<bool>,
    #[serde(default)]
    pub workflow_type: Option<WorkflowType>,
}

/// POST /api/v1/validate – validates a backend. When it is the session's backend the
/// outcome becomes the session's connection status.
pub async fn validate_backend(
    State(state): State<AppState>,
    Json(body): Json<ValidateRequest>,
) -> Json<ConnectionResult> {
    let use_demo_mode = body
        .use_demo_mode
        .unwrap_or_else(|| state.session.snapshot().use_demo_mode);
    let result = state
        .validator
        .validate(body.backend_type, use_demo_mode, body.workflow_type)
        .await;

    // Only a check of the session's own backend moves its connection badge.
    let target = Some(match body.backend_type {
        BackendType::N8n => (BackendType::N8n, Some(body.workflow_type.unwrap_or_default())),
        direct => (direct, None),
    });
    let checked_at = chrono::Utc::now();
    let mut recorded = false;
    let next = state.session.update(|s| {
        if s.backend.probe_target() == target {
            recorded = true;
            s.with_connection(ConnectionState::from_result(&result, checked_at))
        } else {
            s.clone()
        }
    });
    if recorded {
        publish(&state, &next);
    }
    tracing::info!(
        target: "agentmesh::gateway",
        backend = %body.backend_type,
        success = result.success,
        "Connection validated"
    );
    Json(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{demo_state, json_body, spawn_stub, test_state};
    use agentmesh_core::settings::{ENV_OLLAMA_API_URL, ENV_OPENAI_API_KEY, ENV_OPENAI_BASE_URL};
    use agentmesh_core::ConnectionStatus;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::{get, post};
    use axum::Router;
    use tower::ServiceExt;

    fn provider_app(state: AppState) -> Router {
        Router::new()
            .route("/api/:provider/validate", get(provider))
            .with_state(state)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        (status, json_body(res).await)
    }

    #[tokio::test]
    async fn test_missing_key_is_500() {
        let (status, json) = get_json(provider_app(test_state(&[])), "/api/gemini/validate").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Gemini API key not found in environment variables");
    }

    #[tokio::test]
    async fn test_anthropic_alias_routes_to_claude_probe() {
        let (status, json) = get_json(provider_app(test_state(&[])), "/api/anthropic/validate").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "Anthropic API key not found in environment variables");
    }

    #[tokio::test]
    async fn test_unknown_provider_is_400() {
        let (status, json) = get_json(provider_app(test_state(&[])), "/api/azure/validate").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "unknown backend type: azure");
    }

    #[tokio::test]
    async fn test_ollama_running_lists_models() {
        let stub = Router::new().route(
            "/api/tags",
            get(|| async { Json(serde_json::json!({ "models": [{ "name": "llama2" }, { "name": "mistral" }] })) }),
        );
        let base = spawn_stub(stub).await;
        let (status, json) = get_json(provider_app(test_state(&[(ENV_OLLAMA_API_URL, &base)])), "/api/ollama/validate").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Ollama is running locally");
        assert_eq!(json["modelAvailable"], true);
        assert_eq!(json["models"], serde_json::json!(["llama2", "mistral"]));
    }

    #[tokio::test]
    async fn test_ollama_unreachable_is_502() {
        let (status, json) = get_json(provider_app(test_state(&[])), "/api/ollama/validate").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(json["message"].as_str().unwrap().starts_with("Failed to connect to Ollama"));
    }

    #[tokio::test]
    async fn test_rejected_key_keeps_upstream_status() {
        let stub = Router::new().route(
            "/v1/models",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({ "error": { "message": "Incorrect API key provided" } })),
                )
            }),
        );
        let base = spawn_stub(stub).await;
        let state = test_state(&[(ENV_OPENAI_API_KEY, "sk-bad"), (ENV_OPENAI_BASE_URL, &base)]);
        let (status, json) = get_json(provider_app(state), "/api/openai/validate").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["message"], "OpenAI API error: Incorrect API key provided");
    }

    async fn post_validate(state: AppState, body: serde_json::Value) -> serde_json::Value {
        let app = Router::new()
            .route("/api/v1/validate", post(validate_backend))
            .with_state(state);
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/validate")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        json_body(res).await
    }

    #[tokio::test]
    async fn test_demo_mode_from_session_short_circuits() {
        let state = demo_state();
        let json = post_validate(state.clone(), serde_json::json!({ "backendType": "n8n" })).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Connected to Demo Mode");
        assert_eq!(state.session.snapshot().connection.status, ConnectionStatus::Connected);
    }

    #[tokio::test]
    async fn test_failed_validation_marks_session_disconnected() {
        let state = test_state(&[]);
        let mut events = state.events_tx.subscribe();
        let json = post_validate(state.clone(), serde_json::json!({ "backendType": "n8n", "useDemoMode": false })).await;
        assert_eq!(json["success"], false);

        let session = state.session.snapshot();
        assert_eq!(session.connection.status, ConnectionStatus::Disconnected);
        assert!(session.connection.checked_at.is_some());
        let event = events.recv().await.unwrap();
        assert_eq!(event.connection.status, ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_other_backend_leaves_session_badge_alone() {
        let state = test_state(&[]);
        let seeded = ConnectionState::from_result(&ConnectionResult::ok("n8n is running"), chrono::Utc::now());
        state.session.update(|s| s.with_connection(seeded.clone()));
        let mut events = state.events_tx.subscribe();

        for body in [
            serde_json::json!({ "backendType": "openai" }),
            serde_json::json!({ "backendType": "n8n", "workflowType": "gemini" }),
        ] {
            let json = post_validate(state.clone(), body).await;
            assert_eq!(json["success"], false);
        }

        assert_eq!(state.session.snapshot().connection, seeded);
        assert!(events.try_recv().is_err());
    }
}
