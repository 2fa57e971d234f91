//! Message history storage abstraction.

use async_trait::async_trait;
use thiserror::Error;

use super::model::ChatMessage;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Stores accepted messages per workspace, ascending by timestamp
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn append(&self, message: ChatMessage) -> Result<(), RepositoryError>;

    async fn history(&self, workspace_id: &str) -> Result<Vec<ChatMessage>, RepositoryError>;
}
