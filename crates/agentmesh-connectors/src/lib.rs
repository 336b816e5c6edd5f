//! agentmesh-connectors: outbound HTTP to the AI providers and the n8n workflow engine.
//! Each backend gets a [`BackendProbe`]; [`ConnectionValidator`] turns probe outcomes into
//! connection results, and [`N8nClient`] forwards chat queries to workflow webhooks.

mod claude;
mod error;
mod gemini;
mod n8n;
mod ollama;
mod openai;
mod probe;
mod validator;

#[cfg(test)]
mod test_support;

pub use claude::ClaudeProbe;
pub use error::{ProbeError, WorkflowError};
pub use gemini::GeminiProbe;
pub use n8n::{N8nClient, N8nHealthProbe, WorkflowReply, N8N_API_KEY_HEADER};
pub use ollama::OllamaProbe;
pub use openai::OpenAiProbe;
pub use probe::{
    into_connection_result, upstream_error_message, BackendProbe, ProbeRegistry, ProbeReport, LOCAL_PROBE_TIMEOUT,
    PROBE_TIMEOUT,
};
pub use validator::ConnectionValidator;

use agentmesh_core::ProviderSettings;
use std::sync::Arc;

/// Registry with the built-in probe for every backend type, sharing one HTTP client.
pub fn default_registry(client: reqwest::Client, settings: &ProviderSettings) -> ProbeRegistry {
    let mut registry = ProbeRegistry::new();
    registry.register(Arc::new(N8nHealthProbe::new(client.clone(), settings)));
    registry.register(Arc::new(OpenAiProbe::new(client.clone(), settings)));
    registry.register(Arc::new(ClaudeProbe::new(client.clone(), settings)));
    registry.register(Arc::new(GeminiProbe::new(client.clone(), settings)));
    registry.register(Arc::new(OllamaProbe::new(client, settings)));
    tracing::info!(target: "agentmesh::probe", backends = registry.backends().len(), "Probe registry ready");
    registry
}
