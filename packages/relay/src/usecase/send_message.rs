//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 送信者自身を含む部屋の全員に new-message が届くこと（クライアントはエコーでのみ表示する）
//! - 受け付けたメッセージが履歴に保存されること
//!
//! ### どのような状況を想定しているか
//! - 正常系：保存とブロードキャスト
//! - 異常系：部屋に所属していない、空のメッセージ、保存失敗

use std::sync::Arc;

use huddle_shared::{
    protocol::{MessagePayload, SendMessagePayload, ServerEvent},
    time::Clock,
};
use tokio::sync::Mutex;

use crate::domain::{ChatMessage, Member, MessagePusher, MessageRepository, RoomRegistry};

use super::{encode, error::SendMessageError};

const DEFAULT_KIND: &str = "text";

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    repository: Arc<dyn MessageRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    rooms: Arc<Mutex<RoomRegistry>>,
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    pub fn new(
        repository: Arc<dyn MessageRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        rooms: Arc<Mutex<RoomRegistry>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            rooms,
            clock,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `sender` - 送信した接続
    /// * `payload` - クライアントから届いた send-message
    ///
    /// # Returns
    ///
    /// * `Ok(ChatMessage)` - 保存・ブロードキャストしたメッセージ
    /// * `Err(SendMessageError)` - 送信失敗
    pub async fn execute(
        &self,
        sender: &Member,
        payload: SendMessagePayload,
    ) -> Result<ChatMessage, SendMessageError> {
        if payload.message.trim().is_empty() {
            return Err(SendMessageError::EmptyContent);
        }
        let targets = {
            let rooms = self.rooms.lock().await;
            if rooms.room_of(&sender.connection_id) != Some(payload.workspace_id.as_str()) {
                return Err(SendMessageError::NotInWorkspace(payload.workspace_id));
            }
            rooms.members(&payload.workspace_id)
        };

        let kind = if payload.kind.is_empty() {
            DEFAULT_KIND.to_string()
        } else {
            payload.kind
        };
        let message = ChatMessage::new(
            sender,
            payload.workspace_id,
            payload.message,
            kind,
            self.clock.now_millis(),
        );

        // 1. 履歴に保存
        self.repository.append(message.clone()).await?;

        // 2. 送信者を含む部屋の全員にブロードキャスト
        let event = ServerEvent::NewMessage(MessagePayload::from(message.clone()));
        let content = encode(&event).map_err(|e| SendMessageError::Encode(e.to_string()))?;
        self.message_pusher.broadcast(targets, &content).await?;

        tracing::info!(
            "Message {} from '{}' broadcast to workspace '{}'",
            message.id,
            message.sender_id,
            message.workspace_id
        );
        Ok(message)
    }
}
