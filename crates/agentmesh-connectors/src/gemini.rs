//! Gemini probe. Besides validating the key it reports whether the configured model
//! variant is listed; that flag never changes the outcome.

use crate::error::ProbeError;
use crate::probe::{fetch_json, names_in, BackendProbe, ProbeReport, PROBE_TIMEOUT};
use agentmesh_core::{BackendType, ProviderSettings};
use reqwest::Client;

pub struct GeminiProbe {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl GeminiProbe {
    pub fn new(client: Client, settings: &ProviderSettings) -> Self {
        Self {
            client,
            base_url: settings.gemini_base_url.clone(),
            api_key: settings.gemini_api_key.clone(),
            model: settings.gemini_model.clone(),
        }
    }
}

/// Model names come back as `models/gemini-1.5-pro-002`; versioned variants count as a match.
fn lists_model(models: &[String], wanted: &str) -> bool {
    models
        .iter()
        .map(|m| m.strip_prefix("models/").unwrap_or(m.as_str()))
        .any(|m| m == wanted || m.starts_with(&format!("{}-", wanted)))
}

#[async_trait::async_trait]
impl BackendProbe for GeminiProbe {
    fn backend(&self) -> BackendType {
        BackendType::Gemini
    }

    async fn probe(&self) -> Result<ProbeReport, ProbeError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(ProbeError::MissingConfig("Gemini API key"))?;
        let body = fetch_json(
            self.backend(),
            self.client
                .get(format!("{}/v1beta/models", self.base_url))
                .query(&[("key", key)])
                .timeout(PROBE_TIMEOUT),
        )
        .await?;
        let models = names_in(body.get("models"), "name");
        let available = lists_model(&models, &self.model);
        if !available {
            tracing::info!(target: "agentmesh::probe", model = %self.model, "Gemini key valid but model variant not listed");
        }
        Ok(ProbeReport::new("Gemini API key is valid")
            .with_model_available(available)
            .with_models(models))
    }
}
