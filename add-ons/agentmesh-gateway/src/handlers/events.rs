//! Connection-status change events, fanned out to SSE subscribers.

use crate::AppState;
use agentmesh_core::{BackendDescriptor, ConnectionState, SessionState};
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionEvent {
    pub backend: BackendDescriptor,
    pub use_demo_mode: bool,
    pub connection: ConnectionState,
}

impl ConnectionEvent {
    pub fn from_session(session: &SessionState) -> Self {
        Self {
            backend: session.backend,
            use_demo_mode: session.use_demo_mode,
            connection: session.connection.clone(),
        }
    }
}

/// Broadcasts the connection part of `session`. Having no subscribers is normal.
pub(crate) fn publish(state: &AppState, session: &SessionState) {
    let _ = state.events_tx.send(ConnectionEvent::from_session(session));
}

/// GET /api/v1/connection/events – Server-Sent Events stream of connection-status changes.
/// The current state is sent first so a fresh subscriber does not wait for the next check.
pub async fn connection_events(
    State(state): State<AppState>,
) -> Sse<impl futures_util::Stream<Item = Result<Event, std::convert::Infallible>> + Send + 'static> {
    use async_stream::stream;
    let mut rx = state.events_tx.subscribe();
    let current = ConnectionEvent::from_session(&state.session.snapshot());
    let stream = stream! {
        yield Ok(to_sse(&current));
        loop {
            match rx.recv().await {
                Ok(event) => yield Ok(to_sse(&event)),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::debug!(target: "agentmesh::gateway", skipped = n, "Connection event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };
    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("keepalive"))
}

fn to_sse(event: &ConnectionEvent) -> Event {
    let data = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    Event::default().event("connection").data(data)
}
