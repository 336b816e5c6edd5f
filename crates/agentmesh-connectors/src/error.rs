use agentmesh_core::{BackendType, WorkflowType};

/// Why a backend probe did not succeed.
///
/// Every variant renders a message that is safe to show the user: no API keys and no
/// request URLs (some providers take the key as a query parameter).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// Required key or URL is absent; detected before any network call.
    #[error("{0} not found in environment variables")]
    MissingConfig(&'static str),

    #[error("{backend} API error: {message}")]
    Upstream {
        backend: &'static str,
        status: u16,
        message: String,
    },

    #[error("Failed to connect to {backend}: {detail}")]
    Transport { backend: &'static str, detail: String },

    #[error("Unexpected response from {backend}: {detail}")]
    InvalidResponse { backend: &'static str, detail: String },

    #[error("No probe registered for {0}")]
    Unsupported(BackendType),
}

impl ProbeError {
    /// HTTP status the gateway answers with when this error ends a validate request.
    pub fn http_status(&self) -> u16 {
        match self {
            ProbeError::MissingConfig(_) | ProbeError::Unsupported(_) => 500,
            ProbeError::Upstream { status, .. } if *status >= 400 => *status,
            ProbeError::Upstream { .. } | ProbeError::Transport { .. } | ProbeError::InvalidResponse { .. } => 502,
        }
    }

    pub(crate) fn transport(backend: BackendType, err: reqwest::Error) -> Self {
        let err = err.without_url();
        let detail = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            format!("connection failed ({})", err)
        } else {
            err.to_string()
        };
        ProbeError::Transport {
            backend: backend.display_name(),
            detail,
        }
    }
}

/// Failure forwarding a request to an n8n workflow webhook.
#[derive(thiserror::Error, Debug)]
pub enum WorkflowError {
    #[error("Could not reach n8n workflow '{workflow}': {detail}")]
    Transport { workflow: WorkflowType, detail: String },

    #[error("n8n workflow '{workflow}' returned a body that is not JSON: {detail}")]
    InvalidBody { workflow: WorkflowType, detail: String },
}
