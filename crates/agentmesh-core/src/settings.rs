//! Gateway configuration and provider settings.
//!
//! [`CoreConfig`] holds server identity and timing and is loaded with the `config` crate
//! (defaults, optional TOML file, `AGENTMESH__*` environment overrides).
//! [`ProviderSettings`] holds upstream URLs and API keys read from the environment
//! variables the UI build already defines. Keys stay on the server side.

use crate::shared::WorkflowType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub const ENV_N8N_URL: &str = "NEXT_PUBLIC_AGENT_API_URL";
pub const ENV_N8N_API_KEY: &str = "NEXT_PUBLIC_AGENT_API_KEY";
pub const ENV_OPENAI_API_KEY: &str = "NEXT_PUBLIC_OPENAI_API_KEY";
pub const ENV_OLLAMA_API_URL: &str = "NEXT_PUBLIC_OLLAMA_API_URL";
pub const ENV_ANTHROPIC_API_KEY: &str = "NEXT_PUBLIC_ANTHROPIC_API_KEY";
pub const ENV_GEMINI_API_KEY: &str = "NEXT_PUBLIC_GEMINI_API_KEY";
pub const ENV_GEMINI_MODEL: &str = "NEXT_PUBLIC_GEMINI_MODEL";
pub const ENV_OPENAI_BASE_URL: &str = "AGENTMESH_OPENAI_BASE_URL";
pub const ENV_ANTHROPIC_BASE_URL: &str = "AGENTMESH_ANTHROPIC_BASE_URL";
pub const ENV_GEMINI_BASE_URL: &str = "AGENTMESH_GEMINI_BASE_URL";

pub const DEFAULT_N8N_URL: &str = "http://localhost:5678";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";

/// Environment variable overriding the webhook path of one workflow.
pub fn workflow_env_var(workflow: WorkflowType) -> &'static str {
    match workflow {
        WorkflowType::Default => "NEXT_PUBLIC_N8N_DEFAULT_WORKFLOW",
        WorkflowType::OpenAi => "NEXT_PUBLIC_N8N_OPENAI_WORKFLOW",
        WorkflowType::Ollama => "NEXT_PUBLIC_N8N_OLLAMA_WORKFLOW",
        WorkflowType::Claude => "NEXT_PUBLIC_N8N_CLAUDE_WORKFLOW",
        WorkflowType::Gemini => "NEXT_PUBLIC_N8N_GEMINI_WORKFLOW",
        WorkflowType::Demo => "NEXT_PUBLIC_N8N_DEMO_WORKFLOW",
    }
}

fn default_workflow_path(workflow: WorkflowType) -> String {
    match workflow {
        WorkflowType::Default => "webhook/multi-agent-chat".to_string(),
        other => format!("webhook/multi-agent-{}", other.as_str()),
    }
}

/// Upstream endpoints and credentials for every backend the gateway can reach.
#[derive(Clone)]
pub struct ProviderSettings {
    pub n8n_url: String,
    pub n8n_api_key: Option<String>,
    pub workflow_paths: HashMap<WorkflowType, String>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub anthropic_api_key: Option<String>,
    pub anthropic_base_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub gemini_model: String,
    /// `None` only when the variable is present but empty.
    pub ollama_url: Option<String>,
}

impl ProviderSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup. Tests pass a map here instead of
    /// mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let url_or = |key: &str, default: &str| {
            non_empty(key)
                .unwrap_or_else(|| default.to_string())
                .trim_end_matches('/')
                .to_string()
        };

        let workflow_paths = WorkflowType::ALL
            .iter()
            .map(|&w| {
                let path = non_empty(workflow_env_var(w)).unwrap_or_else(|| default_workflow_path(w));
                (w, path.trim_start_matches('/').to_string())
            })
            .collect();

        let ollama_url = match lookup(ENV_OLLAMA_API_URL) {
            None => Some(DEFAULT_OLLAMA_URL.to_string()),
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(v.trim().trim_end_matches('/').to_string()),
        };

        Self {
            n8n_url: url_or(ENV_N8N_URL, DEFAULT_N8N_URL),
            n8n_api_key: non_empty(ENV_N8N_API_KEY),
            workflow_paths,
            openai_api_key: non_empty(ENV_OPENAI_API_KEY),
            openai_base_url: url_or(ENV_OPENAI_BASE_URL, DEFAULT_OPENAI_BASE_URL),
            anthropic_api_key: non_empty(ENV_ANTHROPIC_API_KEY),
            anthropic_base_url: url_or(ENV_ANTHROPIC_BASE_URL, DEFAULT_ANTHROPIC_BASE_URL),
            gemini_api_key: non_empty(ENV_GEMINI_API_KEY),
            gemini_base_url: url_or(ENV_GEMINI_BASE_URL, DEFAULT_GEMINI_BASE_URL),
            gemini_model: non_empty(ENV_GEMINI_MODEL).unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            ollama_url,
        }
    }

    /// Webhook path (no leading slash) for a workflow.
    pub fn workflow_path(&self, workflow: WorkflowType) -> String {
        self.workflow_paths
            .get(&workflow)
            .cloned()
            .unwrap_or_else(|| default_workflow_path(workflow))
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn redact(value: &Option<String>) -> &'static str {
    if value.is_some() {
        "<set>"
    } else {
        "<unset>"
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("n8n_url", &self.n8n_url)
            .field("n8n_api_key", &redact(&self.n8n_api_key))
            .field("workflow_paths", &self.workflow_paths)
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("openai_base_url", &self.openai_base_url)
            .field("anthropic_api_key", &redact(&self.anthropic_api_key))
            .field("anthropic_base_url", &self.anthropic_base_url)
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("gemini_base_url", &self.gemini_base_url)
            .field("gemini_model", &self.gemini_model)
            .field("ollama_url", &self.ollama_url)
            .finish()
    }
}

/// Gateway configuration. Load from TOML or env.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Application identity shown by `/api/v1/status`.
    pub app_name: String,
    /// HTTP port for the gateway.
    pub port: u16,
    /// Seconds between background connection checks. 0 disables the monitor.
    pub health_interval_secs: u64,
    /// Start with demo mode on (no upstream calls until switched off).
    #[serde(default)]
    pub demo_mode: bool,
}

impl CoreConfig {
    /// Load config from file and environment. Precedence: `AGENTMESH__*` env > file named by
    /// `AGENTMESH_CONFIG` (default `config/gateway`) > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path = std::env::var("AGENTMESH_CONFIG").unwrap_or_else(|_| "config/gateway".to_string());
        config::Config::builder()
            .set_default("app_name", "AgentMesh Gateway")?
            .set_default("port", 8001_i64)?
            .set_default("health_interval_secs", 30_i64)?
            .set_default("demo_mode", false)?
            .add_source(config::File::with_name(&config_path).required(false))
            .add_source(config::Environment::with_prefix("AGENTMESH").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> ProviderSettings {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ProviderSettings::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let s = settings(&[]);
        assert_eq!(s.n8n_url, DEFAULT_N8N_URL);
        assert_eq!(s.ollama_url.as_deref(), Some(DEFAULT_OLLAMA_URL));
        assert_eq!(s.gemini_model, DEFAULT_GEMINI_MODEL);
        assert!(s.openai_api_key.is_none());
        assert_eq!(s.workflow_path(WorkflowType::Default), "webhook/multi-agent-chat");
        assert_eq!(s.workflow_path(WorkflowType::Claude), "webhook/multi-agent-claude");
    }

    #[test]
    fn blank_values_count_as_missing() {
        let s = settings(&[(ENV_OPENAI_API_KEY, "  "), (ENV_OLLAMA_API_URL, "")]);
        assert!(s.openai_api_key.is_none());
        assert!(s.ollama_url.is_none());
    }

    #[test]
    fn overrides_are_trimmed() {
        let s = settings(&[
            (ENV_N8N_URL, "http://n8n.internal:5678/"),
            ("NEXT_PUBLIC_N8N_OPENAI_WORKFLOW", "/webhook/custom-openai"),
        ]);
        assert_eq!(s.n8n_url, "http://n8n.internal:5678");
        assert_eq!(s.workflow_path(WorkflowType::OpenAi), "webhook/custom-openai");
    }

    #[test]
    fn debug_output_never_contains_keys() {
        let s = settings(&[(ENV_GEMINI_API_KEY, "super-secret-gemini")]);
        let rendered = format!("{:?}", s);
        assert!(!rendered.contains("super-secret-gemini"));
        assert!(rendered.contains("<set>"));
    }
}
