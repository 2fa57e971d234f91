//! Conversion between domain models and wire DTOs.

use huddle_shared::protocol::{HistoryResponse, MessagePayload};

use crate::domain::ChatMessage;

impl From<ChatMessage> for MessagePayload {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: message.id,
            workspace_id: message.workspace_id,
            sender_id: message.sender_id,
            sender_name: message.sender_name,
            content: message.content,
            kind: message.kind,
            timestamp: message.timestamp,
            edited: false,
        }
    }
}

/// History endpoint body for the given messages
pub fn history_response(messages: Vec<ChatMessage>) -> HistoryResponse {
    HistoryResponse {
        messages: messages.into_iter().map(MessagePayload::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_to_payload() {
        // テスト項目: ドメインのメッセージがワイヤ形式に変換される
        // given (前提条件):
        let message = ChatMessage {
            id: "m-1".to_string(),
            workspace_id: "ws-1".to_string(),
            sender_id: "alice".to_string(),
            sender_name: "Alice".to_string(),
            content: "hello".to_string(),
            kind: "text".to_string(),
            timestamp: 1_000,
        };

        // when (操作):
        let response = history_response(vec![message]);

        // then (期待する結果):
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["messages"][0]["senderName"], "Alice");
        assert_eq!(json["messages"][0]["type"], "text");
        assert_eq!(json["messages"][0]["timestamp"], 1_000);
        assert_eq!(json["messages"][0]["edited"], false);
    }
}
