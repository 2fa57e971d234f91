//! Value objects of the messaging domain.

use std::fmt;

use thiserror::Error;

/// Errors raised when constructing a value object from raw input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// Create the identifier, rejecting blank input
            pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(ValueObjectError::Empty($label));
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueObjectError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a workspace, which is also the key of its relay room
    WorkspaceId,
    "workspace id"
);
string_id!(
    /// Identifier of a user
    UserId,
    "user id"
);
string_id!(
    /// Identifier of a persisted message
    MessageId,
    "message id"
);

/// Unix timestamp in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Milliseconds elapsed from `earlier` to `self` (negative if `self` is earlier)
    pub fn millis_since(&self, earlier: Timestamp) -> i64 {
        self.0.saturating_sub(earlier.0)
    }
}

/// Kind of a chat message (`type` on the wire)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum MessageKind {
    #[default]
    Text,
    System,
    Other(String),
}

impl MessageKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::System => "system",
            Self::Other(kind) => kind,
        }
    }
}

impl From<&str> for MessageKind {
    fn from(value: &str) -> Self {
        match value {
            "text" | "" => Self::Text,
            "system" => Self::System,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for MessageKind {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_id_rejects_blank() {
        // テスト項目: 空白のみのワークスペース ID は作成できない
        // given (前提条件):
        let raw = "   ".to_string();

        // when (操作):
        let result = WorkspaceId::try_from(raw);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::Empty("workspace id")));
    }

    #[test]
    fn test_user_id_keeps_value() {
        // テスト項目: 有効なユーザー ID は値をそのまま保持する
        // given (前提条件):
        let raw = "u-alice";

        // when (操作):
        let id = UserId::new(raw).unwrap();

        // then (期待する結果):
        assert_eq!(id.as_str(), "u-alice");
        assert_eq!(id.to_string(), "u-alice");
    }

    #[test]
    fn test_timestamp_millis_since() {
        // テスト項目: 2 つのタイムスタンプの差がミリ秒で得られる
        // given (前提条件):
        let earlier = Timestamp::new(1_000);
        let later = Timestamp::new(301_000);

        // when (操作):
        let elapsed = later.millis_since(earlier);

        // then (期待する結果):
        assert_eq!(elapsed, 300_000);
        assert_eq!(earlier.millis_since(later), -300_000);
    }

    #[test]
    fn test_message_kind_from_wire_string() {
        // テスト項目: ワイヤ上の type 文字列が MessageKind に変換される
        // given (前提条件):
        let kinds = ["text", "system", "code"];

        // when (操作):
        let parsed: Vec<MessageKind> = kinds.iter().map(|k| MessageKind::from(*k)).collect();

        // then (期待する結果):
        assert_eq!(
            parsed,
            vec![
                MessageKind::Text,
                MessageKind::System,
                MessageKind::Other("code".to_string())
            ]
        );
        assert_eq!(parsed[2].as_str(), "code");
    }
}
