//! Background connection monitor: re-validates the session backend on a fixed tick.

use crate::handlers::events::publish;
use crate::AppState;
use agentmesh_core::{BackendType, ConnectionResult, ConnectionState};
use std::time::Duration;

/// Every tick spawns an independent check; a slow upstream never delays the next tick,
/// and whichever check finishes last owns the session's connection status.
pub(crate) async fn connection_monitor(state: AppState, tick: Duration) {
    tracing::info!(
        target: "agentmesh::monitor",
        tick_rate_secs = tick.as_secs(),
        "Connection monitor started"
    );
    let mut interval = tokio::time::interval(tick);
    loop {
        interval.tick().await;
        tokio::spawn(check_connection(state.clone()));
    }
}

/// Validates the backend selected in the session and records the outcome.
/// Skipped in demo mode. An unreachable n8n switches the session to demo mode.
pub(crate) async fn check_connection(state: AppState) -> Option<ConnectionResult> {
    let session = state.session.snapshot();
    if session.use_demo_mode {
        return None;
    }
    let (backend, workflow) = session.backend.probe_target()?;

    let result = state.validator.validate(backend, false, workflow).await;
    let checked_at = chrono::Utc::now();
    let fall_back = backend == BackendType::N8n && !result.success;
    let next = state.session.update(|s| {
        let s = s.with_connection(ConnectionState::from_result(&result, checked_at));
        if fall_back {
            s.with_demo_mode(true)
        } else {
            s
        }
    });

    if fall_back {
        tracing::warn!(
            target: "agentmesh::monitor",
            message = %result.message,
            "n8n unreachable, switching session to demo mode"
        );
    } else {
        tracing::debug!(target: "agentmesh::monitor", backend = %backend, success = result.success, "Connection checked");
    }
    if session.connection.status != next.connection.status || fall_back {
        publish(&state, &next);
    }
    Some(result)
}
