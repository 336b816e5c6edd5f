//! Classification of raw workflow-engine responses.

use serde_json::Value;

/// One agent contribution. Entries missing any field are dropped during classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentEntry {
    pub agent_id: String,
    pub agent_name: String,
    pub content: String,
}

impl AgentEntry {
    fn from_value(value: &Value) -> Option<Self> {
        Some(Self {
            agent_id: non_empty_str(value.get("agentId"))?,
            agent_name: non_empty_str(value.get("agentName"))?,
            content: non_empty_str(value.get("content"))?,
        })
    }
}

/// `{ summary, agents: [...] }` as produced by the multi-agent workflows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkflowOutput {
    pub agents: Vec<AgentEntry>,
    pub summary: Option<String>,
}

impl WorkflowOutput {
    fn from_value(value: &Value) -> Self {
        let agents = value
            .get("agents")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(AgentEntry::from_value).collect())
            .unwrap_or_default();
        Self {
            agents,
            summary: non_empty_str(value.get("summary")),
        }
    }
}

/// Element of a bare item list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListItem {
    Agent(AgentEntry),
    Summary(String),
    Other,
}

impl ListItem {
    fn from_value(value: &Value) -> Self {
        if let Some(entry) = AgentEntry::from_value(value) {
            return ListItem::Agent(entry);
        }
        match non_empty_str(value.get("summary")) {
            Some(summary) => ListItem::Summary(summary),
            None => ListItem::Other,
        }
    }
}

/// Response shapes the workflow engine is known to emit, in match priority order.
#[derive(Debug, Clone, PartialEq)]
pub enum N8nPayload {
    /// `[{ "output": { "summary", "agents": [...] } }]`
    WrappedOutput(WorkflowOutput),
    /// `{ "summary", "agents": [...] }`
    AgentsObject(WorkflowOutput),
    /// `[{ agentId, agentName, content } | { summary }, ...]`
    ItemList(Vec<ListItem>),
    /// `{ "messages": [...] }`, already close to the normalized form.
    Messages(Vec<Value>),
    Unrecognized,
}

impl N8nPayload {
    pub fn classify(raw: &Value) -> Self {
        match raw {
            Value::Array(items) if items.len() == 1 && items[0].get("output").is_some() => {
                N8nPayload::WrappedOutput(WorkflowOutput::from_value(&items[0]["output"]))
            }
            Value::Object(map) if map.get("agents").is_some_and(Value::is_array) => {
                N8nPayload::AgentsObject(WorkflowOutput::from_value(raw))
            }
            Value::Array(items) => N8nPayload::ItemList(items.iter().map(ListItem::from_value).collect()),
            Value::Object(map) => match map.get("messages") {
                Some(Value::Array(messages)) => N8nPayload::Messages(messages.clone()),
                _ => N8nPayload::Unrecognized,
            },
            _ => N8nPayload::Unrecognized,
        }
    }

    pub fn shape_name(&self) -> &'static str {
        match self {
            N8nPayload::WrappedOutput(_) => "wrapped_output",
            N8nPayload::AgentsObject(_) => "agents_object",
            N8nPayload::ItemList(_) => "item_list",
            N8nPayload::Messages(_) => "messages",
            N8nPayload::Unrecognized => "unrecognized",
        }
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
