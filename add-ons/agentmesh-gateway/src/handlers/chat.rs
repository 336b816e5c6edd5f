//! Chat handler: sends the user's query to the n8n workflow for the session's backend and
//! returns the normalized agent messages. Demo mode answers locally without any upstream call.

use crate::AppState;
use agentmesh_core::{
    BackendDescriptor, MessageType, NormalizedMessage, NormalizedResponse, WorkflowRequest, WorkflowType,
};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

pub const DEMO_CHAT_NOTICE: &str =
    "Demo Mode is active: no workflow engine or model API was contacted. Select a backend and turn Demo Mode off to chat with the agents.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub query: String,
    /// Overrides the session selection for this request only.
    #[serde(default)]
    pub selected_agent_ids: Option<Vec<String>>,
    #[serde(default)]
    pub selected_strategy: Option<String>,
}

/// Chat always runs through n8n; a direct model backend selects the workflow built for it.
fn workflow_for(backend: BackendDescriptor) -> WorkflowType {
    match backend {
        BackendDescriptor::N8n { workflow_type } => workflow_type,
        BackendDescriptor::Demo => WorkflowType::Demo,
        BackendDescriptor::OpenAi => WorkflowType::OpenAi,
        BackendDescriptor::Ollama => WorkflowType::Ollama,
        BackendDescriptor::Claude => WorkflowType::Claude,
        BackendDescriptor::Gemini => WorkflowType::Gemini,
    }
}

/// POST /api/v1/chat
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> (StatusCode, Json<NormalizedResponse>) {
    if req.query.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(NormalizedResponse::failure("Query must not be empty")),
        );
    }

    let session = state.session.snapshot();
    if session.use_demo_mode || session.backend.is_demo() {
        tracing::debug!(target: "agentmesh::gateway", "Chat answered in demo mode");
        let notice = NormalizedMessage::system(DEMO_CHAT_NOTICE, MessageType::Message, chrono::Utc::now());
        return (StatusCode::OK, Json(NormalizedResponse::completed(vec![notice])));
    }

    let workflow = workflow_for(session.backend);
    let request = WorkflowRequest {
        selected_agent_ids: req
            .selected_agent_ids
            .unwrap_or_else(|| session.selected_agent_ids.clone()),
        selected_strategy: req
            .selected_strategy
            .unwrap_or_else(|| session.selected_strategy.clone()),
        query: req.query,
        model_type: String::new(),
    };
    let response = state.n8n.send_message(workflow, &request).await;
    tracing::info!(
        target: "agentmesh::gateway",
        workflow = %workflow,
        success = response.success,
        messages = response.messages.len(),
        "Chat completed"
    );
    (StatusCode::OK, Json(response))
}
