//! Shared types used across all AgentMesh crates.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Message returned whenever demo mode short-circuits a connection check.
pub const DEMO_MODE_MESSAGE: &str = "Connected to Demo Mode";

/// Returned by `FromStr` when a backend or workflow name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

/// Upstream service a connection check can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    N8n,
    OpenAi,
    Ollama,
    Claude,
    Gemini,
}

impl BackendType {
    pub const ALL: [BackendType; 5] = [
        BackendType::N8n,
        BackendType::OpenAi,
        BackendType::Ollama,
        BackendType::Claude,
        BackendType::Gemini,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendType::N8n => "n8n",
            BackendType::OpenAi => "openai",
            BackendType::Ollama => "ollama",
            BackendType::Claude => "claude",
            BackendType::Gemini => "gemini",
        }
    }

    /// Vendor-facing name used in user messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            BackendType::N8n => "n8n",
            BackendType::OpenAi => "OpenAI",
            BackendType::Ollama => "Ollama",
            BackendType::Claude => "Anthropic",
            BackendType::Gemini => "Gemini",
        }
    }
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "n8n" => Ok(BackendType::N8n),
            "openai" => Ok(BackendType::OpenAi),
            "ollama" => Ok(BackendType::Ollama),
            "claude" | "anthropic" => Ok(BackendType::Claude),
            "gemini" => Ok(BackendType::Gemini),
            _ => Err(UnknownVariant {
                kind: "backend type",
                value: s.to_string(),
            }),
        }
    }
}

impl<'de> Deserialize<'de> for BackendType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Which n8n webhook (and therefore which model behind it) a request goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowType {
    #[default]
    Default,
    OpenAi,
    Ollama,
    Claude,
    Gemini,
    Demo,
}

impl WorkflowType {
    pub const ALL: [WorkflowType; 6] = [
        WorkflowType::Default,
        WorkflowType::OpenAi,
        WorkflowType::Ollama,
        WorkflowType::Claude,
        WorkflowType::Gemini,
        WorkflowType::Demo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowType::Default => "default",
            WorkflowType::OpenAi => "openai",
            WorkflowType::Ollama => "ollama",
            WorkflowType::Claude => "claude",
            WorkflowType::Gemini => "gemini",
            WorkflowType::Demo => "demo",
        }
    }

    /// Model API that must be reachable for this workflow to produce answers.
    /// `None` for workflows that only need n8n itself.
    pub fn model_backend(&self) -> Option<BackendType> {
        match self {
            WorkflowType::Default | WorkflowType::Demo => None,
            WorkflowType::OpenAi => Some(BackendType::OpenAi),
            WorkflowType::Ollama => Some(BackendType::Ollama),
            WorkflowType::Claude => Some(BackendType::Claude),
            WorkflowType::Gemini => Some(BackendType::Gemini),
        }
    }
}

impl fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(WorkflowType::Default),
            "openai" => Ok(WorkflowType::OpenAi),
            "ollama" => Ok(WorkflowType::Ollama),
            "claude" | "anthropic" => Ok(WorkflowType::Claude),
            "gemini" => Ok(WorkflowType::Gemini),
            "demo" => Ok(WorkflowType::Demo),
            _ => Err(UnknownVariant {
                kind: "workflow type",
                value: s.to_string(),
            }),
        }
    }
}

impl<'de> Deserialize<'de> for WorkflowType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Backend selected by the user in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendDescriptor {
    Demo,
    N8n {
        #[serde(rename = "workflowType", default)]
        workflow_type: WorkflowType,
    },
    OpenAi,
    Ollama,
    Claude,
    Gemini,
}

impl Default for BackendDescriptor {
    fn default() -> Self {
        BackendDescriptor::N8n {
            workflow_type: WorkflowType::Default,
        }
    }
}

impl BackendDescriptor {
    pub fn is_demo(&self) -> bool {
        matches!(self, BackendDescriptor::Demo)
    }

    /// Backend and optional workflow a connection check should target.
    /// `None` for demo, which never touches the network.
    pub fn probe_target(&self) -> Option<(BackendType, Option<WorkflowType>)> {
        match *self {
            BackendDescriptor::Demo => None,
            BackendDescriptor::N8n { workflow_type } => Some((BackendType::N8n, Some(workflow_type))),
            BackendDescriptor::OpenAi => Some((BackendType::OpenAi, None)),
            BackendDescriptor::Ollama => Some((BackendType::Ollama, None)),
            BackendDescriptor::Claude => Some((BackendType::Claude, None)),
            BackendDescriptor::Gemini => Some((BackendType::Gemini, None)),
        }
    }
}

/// Outcome of a single connection check. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_available: Option<bool>,
}

impl ConnectionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            model_available: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            model_available: None,
        }
    }

    pub fn demo() -> Self {
        Self::ok(DEMO_MODE_MESSAGE)
    }

    pub fn with_model_available(mut self, available: bool) -> Self {
        self.model_available = Some(available);
        self
    }

    /// Usable but degraded: the check passed with a warning in its message.
    pub fn is_warning(&self) -> bool {
        self.success && self.message.to_ascii_lowercase().contains("warning")
    }
}

/// Body of `/api/n8n/health` responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct N8nHealth {
    #[serde(rename = "n8nAvailable")]
    pub n8n_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_available: Option<bool>,
    pub message: String,
    pub workflow: WorkflowType,
}

/// Body forwarded to an n8n workflow webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRequest {
    #[serde(default)]
    pub selected_agent_ids: Vec<String>,
    #[serde(default)]
    pub selected_strategy: String,
    pub query: String,
    #[serde(default)]
    pub model_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_type_parses_case_insensitively_with_anthropic_alias() {
        assert_eq!("OpenAI".parse::<BackendType>().unwrap(), BackendType::OpenAi);
        assert_eq!("anthropic".parse::<BackendType>().unwrap(), BackendType::Claude);
        assert_eq!(" n8n ".parse::<BackendType>().unwrap(), BackendType::N8n);
        let err = "azure".parse::<BackendType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown backend type: azure");
    }

    #[test]
    fn workflow_model_backend_is_none_for_default_and_demo() {
        assert_eq!(WorkflowType::Default.model_backend(), None);
        assert_eq!(WorkflowType::Demo.model_backend(), None);
        assert_eq!(WorkflowType::Gemini.model_backend(), Some(BackendType::Gemini));
    }

    #[test]
    fn connection_result_omits_absent_model_flag() {
        let json = serde_json::to_value(ConnectionResult::ok("fine")).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "message": "fine" }));

        let json = serde_json::to_value(ConnectionResult::failed("no").with_model_available(false)).unwrap();
        assert_eq!(json["modelAvailable"], false);
    }

    #[test]
    fn warning_requires_success() {
        assert!(ConnectionResult::ok("n8n is running (warning: key missing)").is_warning());
        assert!(!ConnectionResult::failed("warning: down").is_warning());
    }

    #[test]
    fn descriptor_round_trips_with_workflow_type() {
        let d: BackendDescriptor =
            serde_json::from_value(serde_json::json!({ "kind": "n8n", "workflowType": "Anthropic" })).unwrap();
        assert_eq!(d, BackendDescriptor::N8n { workflow_type: WorkflowType::Claude });
        assert_eq!(d.probe_target(), Some((BackendType::N8n, Some(WorkflowType::Claude))));
        assert_eq!(BackendDescriptor::Demo.probe_target(), None);
    }

    #[test]
    fn n8n_health_uses_wire_field_names() {
        let health = N8nHealth {
            n8n_available: true,
            model_available: Some(false),
            message: "ok".into(),
            workflow: WorkflowType::OpenAi,
        };
        let json = serde_json::to_value(&health).unwrap();
        assert_eq!(json["n8nAvailable"], true);
        assert_eq!(json["modelAvailable"], false);
        assert_eq!(json["workflow"], "openai");
    }
}
