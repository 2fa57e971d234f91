//! InMemory message repository.
//!
//! Keeps the latest `capacity` messages of every workspace. Nothing survives a
//! restart.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ChatMessage, MessageRepository, RepositoryError};

/// Default number of messages kept per workspace
pub const DEFAULT_HISTORY_CAPACITY: usize = 500;

pub struct InMemoryMessageRepository {
    rooms: Mutex<HashMap<String, VecDeque<ChatMessage>>>,
    capacity: usize,
}

impl InMemoryMessageRepository {
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            capacity,
        }
    }
}

impl Default for InMemoryMessageRepository {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn append(&self, message: ChatMessage) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let history = rooms.entry(message.workspace_id.clone()).or_default();

        // Keep ascending order even if the clock stepped back
        let position = history.partition_point(|m| m.timestamp <= message.timestamp);
        history.insert(position, message);
        while history.len() > self.capacity {
            history.pop_front();
        }
        Ok(())
    }

    async fn history(&self, workspace_id: &str) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rooms = self.rooms.lock().await;
        Ok(rooms
            .get(workspace_id)
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default())
    }
}
