//! Session state shared between the gateway's routes and the connection monitor.
//!
//! State is an immutable [`SessionState`] snapshot behind [`SessionStore`]. Updates build a new
//! snapshot from the current one and swap it in whole, so concurrent writers resolve as
//! last-write-wins and readers never observe a half-applied change.

use crate::shared::{BackendDescriptor, ConnectionResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, RwLock};

/// Connection badge shown by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    #[default]
    Disconnected,
    Warning,
    Validating,
}

impl ConnectionStatus {
    pub fn from_result(result: &ConnectionResult) -> Self {
        if result.is_warning() {
            ConnectionStatus::Warning
        } else if result.success {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked_at: Option<DateTime<Utc>>,
}

impl ConnectionState {
    pub fn validating() -> Self {
        Self {
            status: ConnectionStatus::Validating,
            message: "Validating connection...".to_string(),
            checked_at: None,
        }
    }

    pub fn from_result(result: &ConnectionResult, checked_at: DateTime<Utc>) -> Self {
        Self {
            status: ConnectionStatus::from_result(result),
            message: result.message.clone(),
            checked_at: Some(checked_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub selected_agent_ids: Vec<String>,
    pub selected_strategy: String,
    pub backend: BackendDescriptor,
    pub use_demo_mode: bool,
    pub connection: ConnectionState,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            selected_agent_ids: vec!["data-engineer".to_string(), "data-analyst".to_string()],
            selected_strategy: "collaborative".to_string(),
            backend: BackendDescriptor::default(),
            use_demo_mode: false,
            connection: ConnectionState::default(),
        }
    }
}

impl SessionState {
    pub fn with_selection(&self, agent_ids: Vec<String>, strategy: String) -> Self {
        Self {
            selected_agent_ids: agent_ids,
            selected_strategy: strategy,
            ..self.clone()
        }
    }

    /// Switching backend invalidates the last connection result. Demo mode follows the
    /// choice, so picking a real backend ends an automatic demo fallback.
    pub fn with_backend(&self, backend: BackendDescriptor) -> Self {
        Self {
            backend,
            use_demo_mode: backend.is_demo(),
            connection: ConnectionState::default(),
            ..self.clone()
        }
    }

    pub fn with_demo_mode(&self, enabled: bool) -> Self {
        Self {
            use_demo_mode: enabled,
            ..self.clone()
        }
    }

    pub fn with_connection(&self, connection: ConnectionState) -> Self {
        Self {
            connection,
            ..self.clone()
        }
    }
}

/// Holder of the current [`SessionState`] snapshot.
#[derive(Debug, Default)]
pub struct SessionStore {
    current: RwLock<Arc<SessionState>>,
}

impl SessionStore {
    pub fn new(initial: SessionState) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    pub fn snapshot(&self) -> Arc<SessionState> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    /// Replaces the state with `f(current)` and returns the new snapshot.
    pub fn update<F>(&self, f: F) -> Arc<SessionState>
    where
        F: FnOnce(&SessionState) -> SessionState,
    {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let next = Arc::new(f(&**guard));
        *guard = Arc::clone(&next);
        next
    }
}
