//! Agent catalog: display metadata for the data-engineering personas.

use serde::Serialize;

/// Id of the virtual agent that authors workflow summaries.
pub const COORDINATOR_ID: &str = "coordinator";

/// Display metadata for one agent persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AgentProfile {
    pub id: &'static str,
    pub name: &'static str,
    pub avatar: &'static str,
    pub color: &'static str,
}

pub const AGENTS: [AgentProfile; 7] = [
    AgentProfile { id: "data-engineer", name: "Data Engineer", avatar: "🛠️", color: "#3b82f6" },
    AgentProfile { id: "data-analyst", name: "Data Analyst", avatar: "📊", color: "#10b981" },
    AgentProfile { id: "data-scientist", name: "Data Scientist", avatar: "🔬", color: "#8b5cf6" },
    AgentProfile { id: "ml-engineer", name: "ML Engineer", avatar: "🤖", color: "#f59e0b" },
    AgentProfile { id: "data-architect", name: "Data Architect", avatar: "🏗️", color: "#ef4444" },
    AgentProfile { id: "data-quality", name: "Data Quality Specialist", avatar: "✅", color: "#14b8a6" },
    AgentProfile { id: COORDINATOR_ID, name: "Coordinator", avatar: "🧭", color: "#6b7280" },
];

pub fn find_agent(id: &str) -> Option<&'static AgentProfile> {
    AGENTS.iter().find(|a| a.id == id)
}

pub fn coordinator() -> &'static AgentProfile {
    &AGENTS[AGENTS.len() - 1]
}

/// Maps an instance id like `data-analyst-1` back to its persona id `data-analyst`.
/// Only a trailing all-digit segment is dropped; other ids come back unchanged.
pub fn base_agent_id(agent_id: &str) -> &str {
    match agent_id.rsplit_once('-') {
        Some((base, suffix))
            if !base.is_empty() && !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) =>
        {
            base
        }
        _ => agent_id,
    }
}
