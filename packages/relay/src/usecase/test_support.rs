//! Test doubles shared by the use case tests.

use async_trait::async_trait;
use huddle_shared::protocol::ServerEvent;
use tokio::sync::Mutex;

use crate::{
    auth::AuthenticatedUser,
    domain::{ConnectionId, Member, MessagePushError, MessagePusher, PusherChannel},
};

/// MessagePusher that records every broadcast
#[derive(Default)]
pub(crate) struct RecordingPusher {
    pub(crate) broadcasts: Mutex<Vec<(Vec<ConnectionId>, ServerEvent)>>,
}

impl RecordingPusher {
    pub(crate) async fn recorded(&self) -> Vec<(Vec<ConnectionId>, ServerEvent)> {
        self.broadcasts.lock().await.clone()
    }
}

#[async_trait]
impl MessagePusher for RecordingPusher {
    async fn register_client(&self, _connection_id: ConnectionId, _sender: PusherChannel) {}

    async fn unregister_client(&self, _connection_id: &ConnectionId) {}

    async fn push_to(&self, _connection_id: &ConnectionId, _content: &str) -> Result<(), MessagePushError> {
        Ok(())
    }

    async fn broadcast(&self, mut targets: Vec<ConnectionId>, content: &str) -> Result<(), MessagePushError> {
        let event: ServerEvent = serde_json::from_str(content)
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        targets.sort();
        self.broadcasts.lock().await.push((targets, event));
        Ok(())
    }

    async fn count_clients(&self) -> usize {
        0
    }
}

pub(crate) fn member(user_id: &str, user_name: &str) -> Member {
    Member::new(AuthenticatedUser {
        user_id: user_id.to_string(),
        user_name: user_name.to_string(),
    })
}

pub(crate) fn sorted(mut ids: Vec<ConnectionId>) -> Vec<ConnectionId> {
    ids.sort();
    ids
}
