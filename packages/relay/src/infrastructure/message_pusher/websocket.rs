//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの `UnboundedSender` を管理
//! - クライアントへのメッセージ送信（push_to, broadcast）
//!
//! WebSocket 自体は UI 層（`ui/handler/websocket.rs`）で受け付けます。
//! ここでは受け付け時に登録された sender だけを扱います。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, MessagePushError, MessagePusher, PusherChannel};

#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// 接続中のクライアントの sender
    clients: Mutex<HashMap<ConnectionId, PusherChannel>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        clients.insert(connection_id, sender);
        tracing::debug!("Connection '{}' registered to MessagePusher", connection_id);
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        clients.remove(connection_id);
        tracing::debug!("Connection '{}' unregistered from MessagePusher", connection_id);
    }

    async fn push_to(&self, connection_id: &ConnectionId, content: &str) -> Result<(), MessagePushError> {
        let clients = self.clients.lock().await;

        let sender = clients
            .get(connection_id)
            .ok_or(MessagePushError::ClientNotFound(*connection_id))?;
        sender
            .send(content.to_string())
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        tracing::debug!("Pushed message to connection '{}'", connection_id);
        Ok(())
    }

    async fn broadcast(&self, targets: Vec<ConnectionId>, content: &str) -> Result<(), MessagePushError> {
        let clients = self.clients.lock().await;

        for target in targets {
            match clients.get(&target) {
                // ブロードキャストでは一部の送信失敗を許容
                Some(sender) => {
                    if let Err(e) = sender.send(content.to_string()) {
                        tracing::warn!("Failed to push message to connection '{}': {}", target, e);
                    }
                }
                None => {
                    tracing::warn!("Connection '{}' not found during broadcast, skipping", target)
                }
            }
        }

        Ok(())
    }

    async fn count_clients(&self) -> usize {
        self.clients.lock().await.len()
    }
}
