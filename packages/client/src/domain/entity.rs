//! Entities of the messaging domain.

use tokio::time::Instant;

use super::value_object::{MessageId, MessageKind, Timestamp, UserId, WorkspaceId};

/// A chat message within a workspace room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub workspace_id: WorkspaceId,
    pub sender_id: UserId,
    pub sender_name: String,
    pub content: String,
    pub kind: MessageKind,
    pub timestamp: Timestamp,
    pub edited: bool,
}

/// A remote user currently composing a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingEntry {
    pub user_id: UserId,
    pub user_name: String,
    /// When the entry lapses without a fresh typing-start. `None` means it only
    /// leaves on the matching typing-stop.
    pub expires_at: Option<Instant>,
}

impl TypingEntry {
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}
