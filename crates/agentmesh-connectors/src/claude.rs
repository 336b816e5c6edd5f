//! Anthropic (Claude) probe.

use crate::error::ProbeError;
use crate::probe::{fetch_json, names_in, BackendProbe, ProbeReport, PROBE_TIMEOUT};
use agentmesh_core::{BackendType, ProviderSettings};
use reqwest::Client;

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct ClaudeProbe {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ClaudeProbe {
    pub fn new(client: Client, settings: &ProviderSettings) -> Self {
        Self {
            client,
            base_url: settings.anthropic_base_url.clone(),
            api_key: settings.anthropic_api_key.clone(),
        }
    }
}

#[async_trait::async_trait]
impl BackendProbe for ClaudeProbe {
    fn backend(&self) -> BackendType {
        BackendType::Claude
    }

    async fn probe(&self) -> Result<ProbeReport, ProbeError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(ProbeError::MissingConfig("Anthropic API key"))?;
        let body = fetch_json(
            self.backend(),
            self.client
                .get(format!("{}/v1/models", self.base_url))
                .header("x-api-key", key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .timeout(PROBE_TIMEOUT),
        )
        .await?;
        Ok(ProbeReport::new("Anthropic API key is valid").with_models(names_in(body.get("data"), "id")))
    }
}
