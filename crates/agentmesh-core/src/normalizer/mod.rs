//! Maps workflow-engine responses onto the chat message list the UI renders.
//!
//! The engine's output has drifted across workflow versions; [`N8nPayload::classify`] recognizes
//! the known shapes and [`normalize`] turns each into a [`NormalizedResponse`]. Unknown shapes
//! produce a single error message instead of failing.

mod payload;

pub use payload::{AgentEntry, ListItem, N8nPayload, WorkflowOutput};

use crate::agents::{base_agent_id, coordinator, find_agent};
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Spacing between synthetic timestamps so messages keep their display order.
const MESSAGE_SPACING_MS: i64 = 100;

pub const UNEXPECTED_FORMAT_MESSAGE: &str = "Received an unexpected response format from the workflow engine.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            "system" => Some(Role::System),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Message,
    Summary,
    Error,
}

impl MessageType {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "message" => Some(MessageType::Message),
            "summary" => Some(MessageType::Summary),
            "error" => Some(MessageType::Error),
            _ => None,
        }
    }
}

/// Always `Completed` today; `InProgress` is part of the wire contract but nothing emits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedMessage {
    pub id: String,
    pub content: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_color: Option<String>,
    /// Instance id as sent upstream (e.g. `data-analyst-1`) when `agent_id` was reduced to its persona.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_agent_id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MessageType>,
    pub created_at: DateTime<Utc>,
}

impl NormalizedMessage {
    pub fn system(content: impl Into<String>, kind: MessageType, created_at: DateTime<Utc>) -> Self {
        Self {
            id: new_message_id(),
            content: content.into(),
            role: Role::System,
            agent_id: None,
            agent_name: None,
            agent_avatar: None,
            agent_color: None,
            original_agent_id: None,
            kind: Some(kind),
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedResponse {
    pub success: bool,
    pub messages: Vec<NormalizedMessage>,
    pub status: ResponseStatus,
}

impl NormalizedResponse {
    /// A failed exchange carrying one system error message.
    pub fn failure(content: impl Into<String>) -> Self {
        Self {
            success: false,
            messages: vec![NormalizedMessage::system(content, MessageType::Error, Utc::now())],
            status: ResponseStatus::Completed,
        }
    }

    pub fn completed(messages: Vec<NormalizedMessage>) -> Self {
        Self {
            success: true,
            messages,
            status: ResponseStatus::Completed,
        }
    }
}

pub fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn normalize(raw: &Value) -> NormalizedResponse {
    normalize_at(raw, Utc::now())
}

/// Same as [`normalize`] with an explicit base time for synthetic timestamps.
pub fn normalize_at(raw: &Value, now: DateTime<Utc>) -> NormalizedResponse {
    let payload = N8nPayload::classify(raw);
    tracing::debug!(target: "agentmesh::normalizer", shape = payload.shape_name(), "Classified workflow response");

    match payload {
        N8nPayload::WrappedOutput(output) => from_workflow_output(output, now, true),
        N8nPayload::AgentsObject(output) => from_workflow_output(output, now, false),
        N8nPayload::ItemList(items) => from_item_list(items, now),
        N8nPayload::Messages(messages) => NormalizedResponse::completed(
            messages.iter().filter_map(|m| coerce_message(m, now)).collect(),
        ),
        N8nPayload::Unrecognized => {
            tracing::warn!(target: "agentmesh::normalizer", "Unexpected workflow response format");
            NormalizedResponse {
                success: false,
                messages: vec![NormalizedMessage::system(UNEXPECTED_FORMAT_MESSAGE, MessageType::Error, now)],
                status: ResponseStatus::Completed,
            }
        }
    }
}

fn offset(now: DateTime<Utc>, slot: usize) -> DateTime<Utc> {
    now + Duration::milliseconds(slot as i64 * MESSAGE_SPACING_MS)
}

fn from_workflow_output(output: WorkflowOutput, now: DateTime<Utc>, strip_instance_suffix: bool) -> NormalizedResponse {
    let slots = output.agents.len();
    let mut messages: Vec<NormalizedMessage> = output
        .agents
        .into_iter()
        .enumerate()
        .map(|(i, entry)| agent_message(entry, offset(now, i), strip_instance_suffix))
        .collect();
    if let Some(summary) = output.summary {
        messages.push(summary_message(summary, offset(now, slots)));
    }
    NormalizedResponse::completed(messages)
}

fn from_item_list(items: Vec<ListItem>, now: DateTime<Utc>) -> NormalizedResponse {
    let slots = items.len();
    let mut summary = None;
    let mut messages = Vec::with_capacity(slots);
    for (i, item) in items.into_iter().enumerate() {
        match item {
            ListItem::Agent(entry) => messages.push(agent_message(entry, offset(now, i), false)),
            ListItem::Summary(text) => {
                summary.get_or_insert(text);
            }
            ListItem::Other => {}
        }
    }
    if let Some(text) = summary {
        messages.push(summary_message(text, offset(now, slots)));
    }
    NormalizedResponse::completed(messages)
}

fn agent_message(entry: AgentEntry, created_at: DateTime<Utc>, strip_instance_suffix: bool) -> NormalizedMessage {
    let (agent_id, original_agent_id) = if strip_instance_suffix {
        (base_agent_id(&entry.agent_id).to_string(), Some(entry.agent_id))
    } else {
        (entry.agent_id, None)
    };
    let profile = find_agent(&agent_id);
    NormalizedMessage {
        id: new_message_id(),
        content: entry.content,
        role: Role::Assistant,
        agent_avatar: profile.map(|p| p.avatar.to_string()),
        agent_color: profile.map(|p| p.color.to_string()),
        agent_id: Some(agent_id),
        agent_name: Some(entry.agent_name),
        original_agent_id,
        kind: Some(MessageType::Message),
        created_at,
    }
}

fn summary_message(summary: String, created_at: DateTime<Utc>) -> NormalizedMessage {
    let profile = coordinator();
    NormalizedMessage {
        id: new_message_id(),
        content: summary,
        role: Role::System,
        agent_id: Some(profile.id.to_string()),
        agent_name: Some(profile.name.to_string()),
        agent_avatar: Some(profile.avatar.to_string()),
        agent_color: Some(profile.color.to_string()),
        original_agent_id: None,
        kind: Some(MessageType::Summary),
        created_at,
    }
}

/// Fills the gaps in an already-shaped message: id, role and a parsed timestamp.
///
/// The message is rebuilt from the fields [`NormalizedMessage`] knows. A `type` outside
/// message/summary/error becomes `None`, and any other field is not carried over.
fn coerce_message(value: &Value, now: DateTime<Utc>) -> Option<NormalizedMessage> {
    let obj = value.as_object()?;
    let text = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);

    let id = match obj.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => new_message_id(),
    };
    let created_at = obj
        .get("timestamp")
        .and_then(parse_instant)
        .or_else(|| obj.get("createdAt").and_then(parse_instant))
        .unwrap_or(now);

    Some(NormalizedMessage {
        id,
        content: text("content").unwrap_or_default(),
        role: text("role").as_deref().and_then(Role::parse).unwrap_or(Role::Assistant),
        agent_id: text("agentId"),
        agent_name: text("agentName"),
        agent_avatar: text("agentAvatar"),
        agent_color: text("agentColor"),
        original_agent_id: text("originalAgentId"),
        kind: text("type").as_deref().and_then(MessageType::parse),
        created_at,
    })
}

/// RFC 3339 strings, naive ISO strings (taken as UTC) and epoch milliseconds.
fn parse_instant(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            }),
        Value::Number(n) => n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::COORDINATOR_ID;
    use serde_json::json;

    fn summaries(resp: &NormalizedResponse) -> Vec<&NormalizedMessage> {
        resp.messages
            .iter()
            .filter(|m| m.kind == Some(MessageType::Summary))
            .collect()
    }

    fn assert_summary_last(resp: &NormalizedResponse) {
        let found = summaries(resp);
        assert_eq!(found.len(), 1, "exactly one summary expected");
        let summary = found[0];
        assert_eq!(summary.agent_id.as_deref(), Some(COORDINATOR_ID));
        assert_eq!(summary.role, Role::System);
        for m in resp.messages.iter().filter(|m| m.kind != Some(MessageType::Summary)) {
            assert!(m.created_at < summary.created_at, "agent message must precede summary");
        }
    }

    #[test]
    fn wrapped_output_strips_instance_suffix() {
        let raw = json!([{ "output": {
            "summary": "Pipeline looks healthy.",
            "agents": [
                { "agentId": "data-analyst-3", "agentName": "Data Analyst", "content": "Row counts match." },
                { "agentId": "data-engineer-1", "agentName": "Data Engineer", "content": "Backfill done." }
            ]
        }}]);
        let resp = normalize(&raw);

        assert!(resp.success);
        assert_eq!(resp.status, ResponseStatus::Completed);
        assert_eq!(resp.messages.len(), 3);
        let first = &resp.messages[0];
        assert_eq!(first.agent_id.as_deref(), Some("data-analyst"));
        assert_eq!(first.original_agent_id.as_deref(), Some("data-analyst-3"));
        assert_eq!(first.agent_color.as_deref(), Some("#10b981"));
        assert_eq!(first.role, Role::Assistant);
        assert!(resp.messages[0].created_at < resp.messages[1].created_at);
        assert_summary_last(&resp);
        assert_eq!(resp.messages[2].content, "Pipeline looks healthy.");
    }

    #[test]
    fn agents_object_keeps_ids_verbatim() {
        let raw = json!({
            "summary": "Done.",
            "agents": [{ "agentId": "data-analyst-3", "agentName": "Data Analyst", "content": "Checked." }]
        });
        let resp = normalize(&raw);

        assert!(resp.success);
        assert_eq!(resp.messages[0].agent_id.as_deref(), Some("data-analyst-3"));
        assert!(resp.messages[0].original_agent_id.is_none());
        assert_summary_last(&resp);
    }

    #[test]
    fn agents_object_without_summary_has_no_coordinator_message() {
        let raw = json!({ "agents": [{ "agentId": "ml-engineer", "agentName": "ML Engineer", "content": "Trained." }] });
        let resp = normalize(&raw);
        assert_eq!(resp.messages.len(), 1);
        assert!(summaries(&resp).is_empty());
    }

    #[test]
    fn item_list_places_summary_after_all_items() {
        let now = Utc::now();
        let raw = json!([
            { "summary": "Overall: ship it." },
            { "agentId": "data-engineer", "agentName": "Data Engineer", "content": "Schema migrated." },
            { "agentId": "data-scientist", "agentName": "Data Scientist", "content": "Model drift is low." },
            { "summary": "ignored second summary" }
        ]);
        let resp = normalize_at(&raw, now);

        assert!(resp.success);
        assert_eq!(resp.messages.len(), 3);
        assert_eq!(resp.messages[0].agent_id.as_deref(), Some("data-engineer"));
        assert_eq!(resp.messages[1].agent_id.as_deref(), Some("data-scientist"));
        assert_summary_last(&resp);
        assert_eq!(resp.messages[2].content, "Overall: ship it.");
        assert_eq!(resp.messages[2].created_at, now + Duration::milliseconds(400));
    }

    #[test]
    fn messages_prefer_timestamp_over_created_at() {
        let raw = json!({ "messages": [
            { "id": "m1", "content": "hi", "role": "user", "timestamp": "2024-01-01T00:00:00Z", "createdAt": "2023-06-01T00:00:00Z" },
            { "content": "only created", "createdAt": "2024-02-02T10:00:00Z" }
        ]});
        let resp = normalize(&raw);

        assert!(resp.success);
        let expected = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        assert_eq!(resp.messages[0].created_at, expected);
        assert_eq!(resp.messages[0].id, "m1");
        assert_eq!(resp.messages[0].role, Role::User);
        assert!(!resp.messages[1].id.is_empty());
        assert_eq!(resp.messages[1].role, Role::Assistant);
    }

    #[test]
    fn messages_timestamp_only_is_parsed() {
        let raw = json!({ "messages": [{ "content": "x", "timestamp": "2024-01-01T00:00:00Z" }] });
        let resp = normalize(&raw);
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(resp.messages[0].created_at, expected);
    }

    #[test]
    fn messages_without_time_default_to_now() {
        let before = Utc::now();
        let resp = normalize(&json!({ "messages": [{ "content": "no time" }] }));
        let after = Utc::now();
        let created = resp.messages[0].created_at;
        assert!(created >= before && created <= after);
    }

    #[test]
    fn messages_keep_known_fields_only() {
        let raw = json!({ "messages": [{
            "id": "m-1",
            "content": "hi",
            "role": "system",
            "type": "thinking",
            "agentId": "data-engineer",
            "tokens": 42
        }] });
        let resp = normalize(&raw);
        let msg = &resp.messages[0];
        assert_eq!(msg.id, "m-1");
        assert_eq!(msg.role, Role::System);
        assert_eq!(msg.kind, None);
        assert_eq!(msg.agent_id.as_deref(), Some("data-engineer"));

        let wire = serde_json::to_value(msg).unwrap();
        assert!(wire.get("type").is_none());
        assert!(wire.get("tokens").is_none());
    }

    #[test]
    fn epoch_millis_are_accepted() {
        let resp = normalize(&json!({ "messages": [{ "content": "x", "timestamp": 1_704_067_200_000_i64 }] }));
        assert_eq!(resp.messages[0].created_at, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn unrecognized_shapes_yield_one_error_message() {
        for raw in [json!({ "foo": 1 }), Value::Null, json!(42), json!("text")] {
            let resp = normalize(&raw);
            assert!(!resp.success);
            assert_eq!(resp.status, ResponseStatus::Completed);
            assert_eq!(resp.messages.len(), 1);
            assert_eq!(resp.messages[0].role, Role::System);
            assert_eq!(resp.messages[0].kind, Some(MessageType::Error));
            assert!(resp.messages[0].content.contains("unexpected response format"));
        }
    }

    #[test]
    fn wire_format_is_camel_case() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let raw = json!([{ "output": { "agents": [{ "agentId": "data-analyst-1", "agentName": "Data Analyst", "content": "ok" }] } }]);
        let json = serde_json::to_value(normalize_at(&raw, now)).unwrap();
        let msg = &json["messages"][0];
        assert_eq!(json["status"], "completed");
        assert_eq!(msg["agentId"], "data-analyst");
        assert_eq!(msg["originalAgentId"], "data-analyst-1");
        assert_eq!(msg["type"], "message");
        assert_eq!(msg["role"], "assistant");
        assert_eq!(msg["createdAt"], "2024-01-01T00:00:00Z");
    }
}
