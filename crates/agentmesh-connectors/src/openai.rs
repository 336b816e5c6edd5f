//! OpenAI probe: lists models with the configured key.

use crate::error::ProbeError;
use crate::probe::{fetch_json, names_in, BackendProbe, ProbeReport, PROBE_TIMEOUT};
use agentmesh_core::{BackendType, ProviderSettings};
use reqwest::Client;

pub struct OpenAiProbe {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiProbe {
    pub fn new(client: Client, settings: &ProviderSettings) -> Self {
        Self {
            client,
            base_url: settings.openai_base_url.clone(),
            api_key: settings.openai_api_key.clone(),
        }
    }
}

#[async_trait::async_trait]
impl BackendProbe for OpenAiProbe {
    fn backend(&self) -> BackendType {
        BackendType::OpenAi
    }

    async fn probe(&self) -> Result<ProbeReport, ProbeError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(ProbeError::MissingConfig("OpenAI API key"))?;
        let body = fetch_json(
            self.backend(),
            self.client
                .get(format!("{}/v1/models", self.base_url))
                .bearer_auth(key)
                .timeout(PROBE_TIMEOUT),
        )
        .await?;
        let models = names_in(body.get("data"), "id");
        tracing::debug!(target: "agentmesh::probe", backend = "openai", models = models.len(), "OpenAI key accepted");
        Ok(ProbeReport::new("OpenAI API key is valid").with_models(models))
    }
}
