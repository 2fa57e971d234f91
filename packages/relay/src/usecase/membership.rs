//! UseCase: ルーム参加・退出・切断処理
//!
//! 接続が部屋を離れるときは、残るメンバーに `user-stopped-typing` を送って
//! タイピング表示が残らないようにする。

use std::sync::Arc;

use huddle_shared::protocol::{ServerEvent, UserStoppedTypingPayload};
use tokio::sync::Mutex;

use crate::domain::{Member, MessagePusher, RoomRegistry};

use super::{encode, error::MembershipError};

/// ルーム所属のユースケース
pub struct MembershipUseCase {
    rooms: Arc<Mutex<RoomRegistry>>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl MembershipUseCase {
    pub fn new(rooms: Arc<Mutex<RoomRegistry>>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            rooms,
            message_pusher,
        }
    }

    /// Put `member` in `workspace_id`, leaving its previous room
    ///
    /// # Returns
    ///
    /// * `Ok(Some(previous))` - the room that was left
    /// * `Ok(None)` - no room was left
    pub async fn join(
        &self,
        member: &Member,
        workspace_id: &str,
    ) -> Result<Option<String>, MembershipError> {
        if workspace_id.trim().is_empty() {
            return Err(MembershipError::InvalidWorkspaceId);
        }
        let previous = self.rooms.lock().await.join(member.connection_id, workspace_id);
        if let Some(previous) = &previous {
            self.announce_departure(member, previous).await;
        }
        tracing::info!(
            "'{}' ({}) joined workspace '{}'",
            member.user_id,
            member.connection_id,
            workspace_id
        );
        Ok(previous)
    }

    /// Take `member` out of `workspace_id`. Returns whether it was there.
    pub async fn leave(&self, member: &Member, workspace_id: &str) -> bool {
        let left = self.rooms.lock().await.leave(&member.connection_id, workspace_id);
        if left {
            self.announce_departure(member, workspace_id).await;
            tracing::info!(
                "'{}' ({}) left workspace '{}'",
                member.user_id,
                member.connection_id,
                workspace_id
            );
        }
        left
    }

    /// The connection closed: take `member` out of its room
    pub async fn disconnect(&self, member: &Member) -> Option<String> {
        let previous = self.rooms.lock().await.remove(&member.connection_id);
        if let Some(previous) = &previous {
            self.announce_departure(member, previous).await;
        }
        previous
    }

    async fn announce_departure(&self, member: &Member, workspace_id: &str) {
        let targets = self.rooms.lock().await.members(workspace_id);
        if targets.is_empty() {
            return;
        }
        let event = ServerEvent::UserStoppedTyping(UserStoppedTypingPayload {
            user_id: member.user_id.clone(),
            workspace_id: Some(workspace_id.to_string()),
        });
        let content = match encode(&event) {
            Ok(content) => content,
            Err(e) => {
                tracing::error!("Failed to encode user-stopped-typing: {}", e);
                return;
            }
        };
        if let Err(e) = self.message_pusher.broadcast(targets, &content).await {
            tracing::warn!("Failed to announce departure of '{}': {}", member.user_id, e);
        }
    }
}
