//! Wire protocol DTOs exchanged between the relay and its clients.
//!
//! Every WebSocket text frame carries one JSON envelope of the form
//! `{"event": "<name>", "data": {...}}`. Payload field names are camelCase.

use serde::{Deserialize, Deserializer, Serialize};

/// Events emitted by a client towards the relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    JoinWorkspace(WorkspaceRef),
    LeaveWorkspace(WorkspaceRef),
    SendMessage(SendMessagePayload),
    TypingStart(WorkspaceRef),
    TypingStop(WorkspaceRef),
}

impl ClientEvent {
    /// Wire name of the event (e.g. `join-workspace`)
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinWorkspace(_) => "join-workspace",
            Self::LeaveWorkspace(_) => "leave-workspace",
            Self::SendMessage(_) => "send-message",
            Self::TypingStart(_) => "typing-start",
            Self::TypingStop(_) => "typing-stop",
        }
    }

    /// Workspace the event is scoped to
    pub fn workspace_id(&self) -> &str {
        match self {
            Self::JoinWorkspace(r)
            | Self::LeaveWorkspace(r)
            | Self::TypingStart(r)
            | Self::TypingStop(r) => &r.workspace_id,
            Self::SendMessage(payload) => &payload.workspace_id,
        }
    }
}

/// Events delivered by the relay to a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    NewMessage(MessagePayload),
    UserTyping(UserTypingPayload),
    UserStoppedTyping(UserStoppedTypingPayload),
}

/// Reference to a workspace-scoped room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceRef {
    pub workspace_id: String,
}

impl WorkspaceRef {
    pub fn new(workspace_id: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
        }
    }
}

/// Chat message submitted by a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub workspace_id: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Chat message as broadcast by the relay and returned by the history endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub id: String,
    pub workspace_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Unix timestamp (milliseconds). RFC 3339 strings are accepted on input.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: i64,
    #[serde(default)]
    pub edited: bool,
}

/// Remote user started typing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTypingPayload {
    pub user_id: String,
    pub user_name: String,
    /// Room the typist is in. Older relays omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
}

/// Remote user stopped typing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStoppedTypingPayload {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
}

/// Response body of `GET /workspaces/{id}/messages`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub messages: Vec<MessagePayload>,
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Millis(i64),
        Text(String),
    }

    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Millis(millis) => Ok(millis),
        RawTimestamp::Text(text) => chrono::DateTime::parse_from_rfc3339(&text)
            .map(|dt| dt.timestamp_millis())
            .map_err(serde::de::Error::custom),
    }
}
