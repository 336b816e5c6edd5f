//! n8n workflow engine: health probe and webhook client.

use crate::error::{ProbeError, WorkflowError};
use crate::probe::{upstream_error_message, BackendProbe, ProbeReport, LOCAL_PROBE_TIMEOUT};
use agentmesh_core::{normalize, BackendType, NormalizedResponse, ProviderSettings, WorkflowRequest, WorkflowType};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const N8N_API_KEY_HEADER: &str = "X-N8N-API-KEY";

/// Workflows fan out to several model calls; allow them time to finish.
const WORKFLOW_TIMEOUT: Duration = Duration::from_secs(120);

fn with_api_key(request: RequestBuilder, api_key: Option<&str>) -> RequestBuilder {
    match api_key {
        Some(key) => request.header(N8N_API_KEY_HEADER, key),
        None => request,
    }
}

/// Checks that the n8n instance answers on `/healthz`.
pub struct N8nHealthProbe {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl N8nHealthProbe {
    pub fn new(client: Client, settings: &ProviderSettings) -> Self {
        Self {
            client,
            base_url: settings.n8n_url.clone(),
            api_key: settings.n8n_api_key.clone(),
        }
    }
}

#[async_trait::async_trait]
impl BackendProbe for N8nHealthProbe {
    fn backend(&self) -> BackendType {
        BackendType::N8n
    }

    async fn probe(&self) -> Result<ProbeReport, ProbeError> {
        let request = self
            .client
            .get(format!("{}/healthz", self.base_url))
            .timeout(LOCAL_PROBE_TIMEOUT);
        let resp = with_api_key(request, self.api_key.as_deref())
            .send()
            .await
            .map_err(|e| ProbeError::transport(BackendType::N8n, e))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProbeError::Upstream {
                backend: BackendType::N8n.display_name(),
                status: status.as_u16(),
                message: upstream_error_message(&body, status),
            });
        }
        Ok(ProbeReport::new("n8n is running"))
    }
}

/// Upstream answer from a workflow webhook, passed through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowReply {
    pub status: u16,
    pub body: Value,
}

impl WorkflowReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Posts chat requests to the n8n webhook that matches a workflow type.
#[derive(Clone)]
pub struct N8nClient {
    client: Client,
    settings: Arc<ProviderSettings>,
}

impl N8nClient {
    pub fn new(client: Client, settings: Arc<ProviderSettings>) -> Self {
        Self { client, settings }
    }

    pub fn webhook_url(&self, workflow: WorkflowType) -> String {
        format!("{}/{}", self.settings.n8n_url, self.settings.workflow_path(workflow))
    }

    /// Forwards the request and returns whatever the webhook answered, any status.
    pub async fn forward(&self, workflow: WorkflowType, request: &WorkflowRequest) -> Result<WorkflowReply, WorkflowError> {
        let mut body = request.clone();
        if body.model_type.is_empty() {
            body.model_type = workflow.as_str().to_string();
        }
        let url = self.webhook_url(workflow);
        tracing::info!(
            target: "agentmesh::n8n",
            workflow = %workflow,
            agents = body.selected_agent_ids.len(),
            "Forwarding query to workflow webhook"
        );

        let builder = self.client.post(&url).json(&body).timeout(WORKFLOW_TIMEOUT);
        let resp = with_api_key(builder, self.settings.n8n_api_key.as_deref())
            .send()
            .await
            .map_err(|e| WorkflowError::Transport {
                workflow,
                detail: e.without_url().to_string(),
            })?;
        let status = resp.status().as_u16();
        let text = resp.text().await.map_err(|e| WorkflowError::Transport {
            workflow,
            detail: e.without_url().to_string(),
        })?;

        // Error pages from n8n or a proxy in front of it are often plain text or HTML;
        // those keep their status and travel as a JSON string.
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(e) if (200..300).contains(&status) => {
                    return Err(WorkflowError::InvalidBody {
                        workflow,
                        detail: e.to_string(),
                    })
                }
                Err(_) => Value::String(text),
            }
        };
        Ok(WorkflowReply { status, body })
    }

    /// Forwards the request and normalizes the reply. Failures become a one-message
    /// unsuccessful response.
    pub async fn send_message(&self, workflow: WorkflowType, request: &WorkflowRequest) -> NormalizedResponse {
        match self.forward(workflow, request).await {
            Ok(reply) if reply.is_success() => normalize(&reply.body),
            Ok(reply) => {
                let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
                let detail = match &reply.body {
                    Value::String(text) if !text.trim().is_empty() => text.trim().to_string(),
                    body => upstream_error_message(&body.to_string(), status),
                };
                tracing::warn!(target: "agentmesh::n8n", workflow = %workflow, status = reply.status, "Workflow returned an error status");
                NormalizedResponse::failure(format!("n8n workflow returned an error: {}", detail))
            }
            Err(e) => {
                tracing::warn!(target: "agentmesh::n8n", workflow = %workflow, error = %e, "Workflow request failed");
                NormalizedResponse::failure(e.to_string())
            }
        }
    }
}
