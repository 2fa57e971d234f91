//! UseCase: タイピング通知の中継
//!
//! 送信者以外の同じ部屋のメンバーに `user-typing` / `user-stopped-typing` を送る。

use std::sync::Arc;

use huddle_shared::protocol::{ServerEvent, UserStoppedTypingPayload, UserTypingPayload};
use tokio::sync::Mutex;

use crate::domain::{Member, MessagePusher, RoomRegistry};

use super::{encode, error::TypingError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingAction {
    Start,
    Stop,
}

/// タイピング通知のユースケース
pub struct RelayTypingUseCase {
    rooms: Arc<Mutex<RoomRegistry>>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl RelayTypingUseCase {
    pub fn new(rooms: Arc<Mutex<RoomRegistry>>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            rooms,
            message_pusher,
        }
    }

    /// Forward a typing event of `typist` to the rest of the room
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - number of connections the event was pushed to
    pub async fn execute(
        &self,
        typist: &Member,
        workspace_id: &str,
        action: TypingAction,
    ) -> Result<usize, TypingError> {
        let targets: Vec<_> = {
            let rooms = self.rooms.lock().await;
            if rooms.room_of(&typist.connection_id) != Some(workspace_id) {
                return Err(TypingError::NotInWorkspace(workspace_id.to_string()));
            }
            rooms
                .members(workspace_id)
                .into_iter()
                .filter(|id| *id != typist.connection_id)
                .collect()
        };
        if targets.is_empty() {
            return Ok(0);
        }

        let event = match action {
            TypingAction::Start => ServerEvent::UserTyping(UserTypingPayload {
                user_id: typist.user_id.clone(),
                user_name: typist.user_name.clone(),
                workspace_id: Some(workspace_id.to_string()),
            }),
            TypingAction::Stop => ServerEvent::UserStoppedTyping(UserStoppedTypingPayload {
                user_id: typist.user_id.clone(),
                workspace_id: Some(workspace_id.to_string()),
            }),
        };
        let content = encode(&event).map_err(|e| TypingError::Encode(e.to_string()))?;
        let count = targets.len();
        self.message_pusher.broadcast(targets, &content).await?;

        tracing::debug!(
            "Typing {:?} of '{}' relayed to {} connection(s) in '{}'",
            action,
            typist.user_id,
            count,
            workspace_id
        );
        Ok(count)
    }
}
