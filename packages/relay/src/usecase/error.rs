//! Error types of the relay use cases.

use thiserror::Error;

use crate::domain::{MessagePushError, RepositoryError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MembershipError {
    #[error("workspace ID must not be empty")]
    InvalidWorkspaceId,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    #[error("connection is not in workspace '{0}'")]
    NotInWorkspace(String),

    #[error("message content is empty")]
    EmptyContent,

    #[error("failed to store message: {0}")]
    Repository(#[from] RepositoryError),

    #[error("failed to encode message: {0}")]
    Encode(String),

    #[error("failed to broadcast message: {0}")]
    Broadcast(#[from] MessagePushError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypingError {
    #[error("connection is not in workspace '{0}'")]
    NotInWorkspace(String),

    #[error("failed to encode typing event: {0}")]
    Encode(String),

    #[error("failed to broadcast typing event: {0}")]
    Broadcast(#[from] MessagePushError),
}
