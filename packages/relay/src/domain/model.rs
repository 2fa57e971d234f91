//! Domain models of the relay.

use std::fmt;

use uuid::Uuid;

use crate::auth::AuthenticatedUser;

/// Identifier of one accepted WebSocket connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An authenticated connection. A user may hold several.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub connection_id: ConnectionId,
    pub user_id: String,
    pub user_name: String,
}

impl Member {
    pub fn new(user: AuthenticatedUser) -> Self {
        Self {
            connection_id: ConnectionId::generate(),
            user_id: user.user_id,
            user_name: user.user_name,
        }
    }
}

/// A message accepted by the relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: String,
    pub workspace_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    pub kind: String,
    /// Unix timestamp (milliseconds)
    pub timestamp: i64,
}

impl ChatMessage {
    /// New message with a fresh id, sent by `sender`
    pub fn new(
        sender: &Member,
        workspace_id: impl Into<String>,
        content: impl Into<String>,
        kind: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            workspace_id: workspace_id.into(),
            sender_id: sender.user_id.clone(),
            sender_name: sender.user_name.clone(),
            content: content.into(),
            kind: kind.into(),
            timestamp,
        }
    }
}
