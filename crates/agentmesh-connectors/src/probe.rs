//! Probe trait and registry: one reachability check per backend type.

use crate::error::ProbeError;
use agentmesh_core::{BackendType, ConnectionResult};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Deadline for the lightweight list-models calls.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
/// Deadline for services expected on the local network (Ollama, n8n).
pub const LOCAL_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Successful probe outcome.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProbeReport {
    pub message: String,
    /// Set by probes that look for a specific model variant.
    pub model_available: Option<bool>,
    /// Model names the backend listed, when it lists any.
    pub models: Vec<String>,
}

impl ProbeReport {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }

    pub fn with_model_available(mut self, available: bool) -> Self {
        self.model_available = Some(available);
        self
    }
}

/// Collapses a probe outcome into the UI-facing result.
pub fn into_connection_result(outcome: Result<ProbeReport, ProbeError>) -> ConnectionResult {
    match outcome {
        Ok(report) => ConnectionResult {
            success: true,
            message: report.message,
            model_available: report.model_available,
        },
        Err(e) => ConnectionResult::failed(e.to_string()),
    }
}

/// Reachability check for one backend.
#[async_trait::async_trait]
pub trait BackendProbe: Send + Sync {
    fn backend(&self) -> BackendType;

    /// Checks configuration, then performs one minimal request. No retries.
    async fn probe(&self) -> Result<ProbeReport, ProbeError>;
}

/// Probes keyed by backend type.
pub struct ProbeRegistry {
    probes: Vec<Arc<dyn BackendProbe>>,
}

impl ProbeRegistry {
    pub fn new() -> Self {
        Self { probes: Vec::new() }
    }

    /// Registers a probe, replacing any earlier one for the same backend.
    pub fn register(&mut self, probe: Arc<dyn BackendProbe>) {
        let backend = probe.backend();
        self.probes.retain(|p| p.backend() != backend);
        self.probes.push(probe);
    }

    pub fn get(&self, backend: BackendType) -> Option<Arc<dyn BackendProbe>> {
        self.probes.iter().find(|p| p.backend() == backend).cloned()
    }

    pub fn backends(&self) -> Vec<BackendType> {
        self.probes.iter().map(|p| p.backend()).collect()
    }
}

impl Default for ProbeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Sends a GET and returns the JSON body of a 2xx answer.
pub(crate) async fn fetch_json(backend: BackendType, request: reqwest::RequestBuilder) -> Result<Value, ProbeError> {
    let resp = request.send().await.map_err(|e| ProbeError::transport(backend, e))?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ProbeError::Upstream {
            backend: backend.display_name(),
            status: status.as_u16(),
            message: upstream_error_message(&body, status),
        });
    }
    resp.json::<Value>().await.map_err(|e| ProbeError::InvalidResponse {
        backend: backend.display_name(),
        detail: e.without_url().to_string(),
    })
}

/// Picks the human-readable error out of an upstream error body.
/// Falls back to the status text when the body has nothing usable.
pub fn upstream_error_message(body: &str, status: reqwest::StatusCode) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let from_json = parsed.as_ref().and_then(|v| {
        v.pointer("/error/message")
            .and_then(Value::as_str)
            .or_else(|| v.get("error").and_then(Value::as_str))
            .or_else(|| v.get("message").and_then(Value::as_str))
            .map(str::to_string)
    });
    from_json
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| match status.canonical_reason() {
            Some(reason) => format!("{} {}", status.as_u16(), reason),
            None => status.as_u16().to_string(),
        })
}

/// Collects `field` from every object in a JSON array, e.g. `data[].id`.
pub(crate) fn names_in(list: Option<&Value>, field: &str) -> Vec<String> {
    list.and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get(field).and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
