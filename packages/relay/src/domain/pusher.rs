//! Outbound delivery abstraction.
//!
//! Connections register an unbounded channel whose receiving end is drained
//! into their WebSocket. Use cases push serialized events through it.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::model::ConnectionId;

/// Sending half of a connection's outbound queue
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("connection '{0}' is not registered")]
    ClientNotFound(ConnectionId),

    #[error("push failed: {0}")]
    PushFailed(String),
}

#[async_trait]
pub trait MessagePusher: Send + Sync {
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    async fn unregister_client(&self, connection_id: &ConnectionId);

    async fn push_to(&self, connection_id: &ConnectionId, content: &str) -> Result<(), MessagePushError>;

    /// Push to every target, skipping the ones that are gone
    async fn broadcast(&self, targets: Vec<ConnectionId>, content: &str) -> Result<(), MessagePushError>;

    async fn count_clients(&self) -> usize;
}
