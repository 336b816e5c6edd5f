//! Session routes: read and partially update the UI session.

use crate::handlers::events::publish;
use crate::AppState;
use agentmesh_core::{base_agent_id, find_agent, BackendDescriptor, SessionState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

/// GET /api/v1/session
pub async fn get_session(State(state): State<AppState>) -> Json<SessionState> {
    Json(SessionState::clone(&state.session.snapshot()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpdate {
    #[serde(default)]
    pub selected_agent_ids: Option<Vec<String>>,
    #[serde(default)]
    pub selected_strategy: Option<String>,
    #[serde(default)]
    pub backend: Option<BackendDescriptor>,
    #[serde(default)]
    pub use_demo_mode: Option<bool>,
}

impl SessionUpdate {
    fn apply(&self, current: &SessionState) -> SessionState {
        let mut next = current.clone();
        if let Some(backend) = self.backend {
            next = next.with_backend(backend);
        }
        if let Some(enabled) = self.use_demo_mode {
            next = next.with_demo_mode(enabled);
        }
        if self.selected_agent_ids.is_some() || self.selected_strategy.is_some() {
            let ids = self
                .selected_agent_ids
                .clone()
                .unwrap_or_else(|| next.selected_agent_ids.clone());
            let strategy = self
                .selected_strategy
                .clone()
                .unwrap_or_else(|| next.selected_strategy.clone());
            next = next.with_selection(ids, strategy);
        }
        next
    }
}

/// POST /api/v1/session – applies the supplied fields and returns the new snapshot.
/// A backend change resets the connection status and sets demo mode to match the choice;
/// an explicit `useDemoMode` in the same body wins.
pub async fn update_session(
    State(state): State<AppState>,
    Json(update): Json<SessionUpdate>,
) -> Result<Json<SessionState>, (StatusCode, Json<Value>)> {
    if let Some(ids) = &update.selected_agent_ids {
        if let Some(unknown) = ids.iter().find(|id| find_agent(base_agent_id(id)).is_none()) {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("unknown agent: {}", unknown) })),
            ));
        }
    }

    let before = state.session.snapshot();
    let next = state.session.update(|s| update.apply(s));
    if before.connection != next.connection || before.use_demo_mode != next.use_demo_mode {
        publish(&state, &next);
    }
    tracing::info!(
        target: "agentmesh::gateway",
        agents = next.selected_agent_ids.len(),
        demo = next.use_demo_mode,
        "Session updated"
    );
    Ok(Json(SessionState::clone(&next)))
}
