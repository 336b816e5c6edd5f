//! n8n routes: engine health (optionally with the workflow's model API) and the webhook proxy.

use crate::AppState;
use agentmesh_connectors::WorkflowError;
use agentmesh_core::{N8nHealth, WorkflowRequest, WorkflowType};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

fn health_response(health: N8nHealth) -> (StatusCode, Json<N8nHealth>) {
    let status = if health.n8n_available {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(health))
}

fn bad_workflow(raw: &str, e: impl std::fmt::Display) -> (StatusCode, Json<Value>) {
    tracing::debug!(target: "agentmesh::n8n", workflow = raw, "Rejected unknown workflow type");
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Unknown workflow type", "details": e.to_string() })),
    )
}

/// GET /api/n8n/health – 200 when n8n answers, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<N8nHealth>) {
    health_response(state.validator.n8n_health(None).await)
}

/// GET /api/n8n/health/:workflow – n8n plus the model API behind that workflow.
/// A failing model API still answers 200, with a warning message.
pub async fn workflow_health(
    State(state): State<AppState>,
    Path(workflow): Path<String>,
) -> Result<(StatusCode, Json<N8nHealth>), (StatusCode, Json<Value>)> {
    let workflow_type: WorkflowType = workflow.parse().map_err(|e| bad_workflow(&workflow, e))?;
    Ok(health_response(state.validator.n8n_health(Some(workflow_type)).await))
}

/// POST /api/n8n/workflows/:workflow – forwards the body to the workflow webhook and
/// relays the answer verbatim. Upstream errors become `{error, details}` with the
/// upstream status; an unreachable engine is 502.
pub async fn run_workflow(
    State(state): State<AppState>,
    Path(workflow): Path<String>,
    Json(request): Json<WorkflowRequest>,
) -> (StatusCode, Json<Value>) {
    let workflow_type: WorkflowType = match workflow.parse() {
        Ok(w) => w,
        Err(e) => return bad_workflow(&workflow, e),
    };

    match state.n8n.forward(workflow_type, &request).await {
        Ok(reply) => {
            let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
            if reply.is_success() {
                (status, Json(reply.body))
            } else {
                tracing::warn!(target: "agentmesh::n8n", workflow = %workflow_type, status = reply.status, "Workflow webhook returned an error");
                (
                    status,
                    Json(json!({ "error": format!("n8n workflow returned {}", reply.status), "details": reply.body })),
                )
            }
        }
        Err(e) => {
            let error = match e {
                WorkflowError::Transport { .. } => "Failed to reach n8n",
                WorkflowError::InvalidBody { .. } => "Invalid response from n8n",
            };
            tracing::warn!(target: "agentmesh::n8n", workflow = %workflow_type, error = %e, "Workflow proxy failed");
            (StatusCode::BAD_GATEWAY, Json(json!({ "error": error, "details": e.to_string() })))
        }
    }
}
