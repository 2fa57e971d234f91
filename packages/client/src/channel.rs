//! Ordered message log of the active room.
//!
//! The log only grows from relay output: the history seed and live broadcasts,
//! including the echo of the local user's own sends. It stays ordered
//! non-decreasing by timestamp and holds each message id once.

use huddle_shared::protocol::ClientEvent;

use crate::{
    domain::{Message, MessageKind, WorkspaceId},
    error::SendError,
    protocol::send_message,
};

/// Messages made visible by a history seed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Seeded {
    /// The whole log right after merging the history
    pub history: Vec<Message>,
    /// Live messages that arrived during the fetch, applied after the history
    pub live: Vec<Message>,
}

#[derive(Debug)]
pub struct MessageChannel {
    messages: Vec<Message>,
    /// Live messages held back while a history fetch is in flight
    buffered: Option<Vec<Message>>,
}

impl Default for MessageChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageChannel {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            buffered: None,
        }
    }

    /// Build the `send-message` event for the active room
    pub fn compose(
        workspace_id: &WorkspaceId,
        content: &str,
        kind: &MessageKind,
    ) -> Result<ClientEvent, SendError> {
        if content.trim().is_empty() {
            return Err(SendError::EmptyContent);
        }
        Ok(send_message(workspace_id, content, kind))
    }

    /// A history fetch started: hold live messages until it lands
    pub fn begin_history(&mut self) {
        self.buffered.get_or_insert_with(Vec::new);
    }

    pub fn awaiting_history(&self) -> bool {
        self.buffered.is_some()
    }

    /// Merge the fetched history, then apply the live messages held back meanwhile
    pub fn seed_history(&mut self, history: Vec<Message>) -> Seeded {
        for message in history {
            self.insert_ordered(message);
        }
        let snapshot = self.messages.clone();

        let mut live = Vec::new();
        for message in self.buffered.take().unwrap_or_default() {
            let visible = message.clone();
            if self.insert_ordered(message) {
                live.push(visible);
            }
        }

        Seeded {
            history: snapshot,
            live,
        }
    }

    /// A live broadcast arrived. Returns the message if it became visible now.
    pub fn receive(&mut self, message: Message) -> Option<Message> {
        if let Some(buffered) = &mut self.buffered {
            buffered.push(message);
            return None;
        }
        let visible = message.clone();
        self.insert_ordered(message).then_some(visible)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    fn insert_ordered(&mut self, message: Message) -> bool {
        if self.messages.iter().any(|existing| existing.id == message.id) {
            return false;
        }
        let index = self
            .messages
            .partition_point(|existing| existing.timestamp <= message.timestamp);
        self.messages.insert(index, message);
        true
    }
}
