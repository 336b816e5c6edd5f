//! Ollama probe: asks the local daemon for its installed models.

use crate::error::ProbeError;
use crate::probe::{fetch_json, names_in, BackendProbe, ProbeReport, LOCAL_PROBE_TIMEOUT};
use agentmesh_core::{BackendType, ProviderSettings};
use reqwest::Client;

pub struct OllamaProbe {
    client: Client,
    url: Option<String>,
}

impl OllamaProbe {
    pub fn new(client: Client, settings: &ProviderSettings) -> Self {
        Self {
            client,
            url: settings.ollama_url.clone(),
        }
    }
}

#[async_trait::async_trait]
impl BackendProbe for OllamaProbe {
    fn backend(&self) -> BackendType {
        BackendType::Ollama
    }

    async fn probe(&self) -> Result<ProbeReport, ProbeError> {
        let url = self
            .url
            .as_deref()
            .ok_or(ProbeError::MissingConfig("Ollama API URL"))?;
        let body = fetch_json(
            self.backend(),
            self.client
                .get(format!("{}/api/tags", url))
                .timeout(LOCAL_PROBE_TIMEOUT),
        )
        .await?;
        let models = names_in(body.get("models"), "name");
        tracing::debug!(target: "agentmesh::probe", backend = "ollama", models = ?models, "Ollama reachable");
        Ok(ProbeReport::new("Ollama is running locally")
            .with_model_available(!models.is_empty())
            .with_models(models))
    }
}
