//! Message formatting utilities for client display.
//!
//! A run of messages from one author is introduced by an author line. Run
//! boundaries come from [`shows_author_header`]: a new run starts right after a
//! message that ends one.

use std::fmt::Display;

use chrono::{Local, TimeZone};
use huddle_shared::time::datetime_in;

use crate::{
    connection::{ConnectionState, ConnectionStatus},
    domain::{Message, MessageKind, Timestamp, TypingEntry, UserId, WorkspaceId},
    sequencer::{annotate_in, needs_date_separator_in, shows_author_header},
    typing::render_typing_indicator,
};

const RULE: &str = "------------------------";

/// Message formatter for client display
#[derive(Debug, Clone)]
pub struct MessageFormatter<Tz: TimeZone = Local> {
    tz: Tz,
}

impl MessageFormatter<Local> {
    /// Formatter for the viewer's local zone
    pub fn new() -> Self {
        Self { tz: Local }
    }
}

impl Default for MessageFormatter<Local> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Tz: TimeZone> MessageFormatter<Tz>
where
    Tz::Offset: Display,
{
    pub fn with_zone(tz: Tz) -> Self {
        Self { tz }
    }

    /// Format a room's seeded log
    ///
    /// # Arguments
    ///
    /// * `messages` - The room's messages, ascending by timestamp
    /// * `me` - The local user (to mark as "me")
    pub fn format_history(&self, messages: &[Message], me: &UserId) -> String {
        if messages.is_empty() {
            return "\n(no messages yet)\n".to_string();
        }

        let views = annotate_in(messages, &self.tz);
        let mut output = String::new();
        for (index, (message, view)) in messages.iter().zip(&views).enumerate() {
            let starts_run = index == 0 || views[index - 1].author_header;
            output.push_str(&self.format_entry(message, view.date_separator, starts_run, me));
        }
        output
    }

    /// Format a live message following `prev` in the room's log
    pub fn format_live(&self, message: &Message, prev: Option<&Message>, me: &UserId) -> String {
        let date_separator = needs_date_separator_in(message, prev, &self.tz);
        let starts_run = prev.is_none_or(|prev| shows_author_header(prev, Some(message)));
        self.format_entry(message, date_separator, starts_run, me)
    }

    pub fn format_date_separator(&self, timestamp: Timestamp) -> String {
        let date = datetime_in(timestamp.value(), &self.tz)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "unknown date".to_string());
        format!("\n{} {} {}\n", RULE, date, RULE)
    }

    fn format_entry(
        &self,
        message: &Message,
        date_separator: bool,
        starts_run: bool,
        me: &UserId,
    ) -> String {
        let mut output = String::new();
        if date_separator {
            output.push_str(&self.format_date_separator(message.timestamp));
        }
        if starts_run || date_separator {
            let me_suffix = if &message.sender_id == me { " (me)" } else { "" };
            output.push_str(&format!(
                "\n@{}{} [{}]\n",
                message.sender_name,
                me_suffix,
                self.format_time(message.timestamp)
            ));
        }

        let edited = if message.edited { " (edited)" } else { "" };
        match &message.kind {
            MessageKind::System => output.push_str(&format!("  * {}{}\n", message.content, edited)),
            _ => output.push_str(&format!("  {}{}\n", message.content, edited)),
        }
        output
    }

    fn format_time(&self, timestamp: Timestamp) -> String {
        datetime_in(timestamp.value(), &self.tz)
            .map(|dt| dt.format("%H:%M").to_string())
            .unwrap_or_else(|| "--:--".to_string())
    }
}

/// Format the typing indicator line, if anyone is typing
pub fn format_typing(typists: &[TypingEntry]) -> Option<String> {
    render_typing_indicator(typists).map(|indicator| format!("\n({})\n", indicator))
}

/// Format a connection status change
pub fn format_status(status: &ConnectionStatus) -> String {
    let indicator = match status.state {
        ConnectionState::Connected => "●",
        _ => "○",
    };
    match &status.last_error {
        Some(error) if status.state != ConnectionState::Connected => {
            format!("\n{} {} ({})\n", indicator, status.state, error)
        }
        _ => format!("\n{} {}\n", indicator, status.state),
    }
}

/// Format the notice printed when a room becomes active
pub fn format_room_entered(workspace_id: &WorkspaceId) -> String {
    format!(
        "\n============================================================\n\
         Workspace: {}\n\
         ============================================================\n",
        workspace_id
    )
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;
    use crate::domain::MessageId;

    // 2023-01-01 10:00:00 JST
    const TEN_AM_JST: i64 = 1672534800000;

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn message(id: &str, sender: &str, timestamp: i64, content: &str) -> Message {
        Message {
            id: MessageId::new(id).unwrap(),
            workspace_id: WorkspaceId::new("ws-a").unwrap(),
            sender_id: UserId::new(sender).unwrap(),
            sender_name: sender.to_string(),
            content: content.to_string(),
            kind: MessageKind::Text,
            timestamp: Timestamp::new(timestamp),
            edited: false,
        }
    }

    fn me() -> UserId {
        UserId::new("alice").unwrap()
    }

    #[test]
    fn test_format_history_groups_same_author_run() {
        // テスト項目: 同じ作者の連続メッセージは作者行を 1 回だけ表示する
        // given (前提条件):
        let formatter = MessageFormatter::with_zone(jst());
        let messages = vec![
            message("m-1", "alice", TEN_AM_JST, "hi"),
            message("m-2", "alice", TEN_AM_JST + 60_000, "there"),
        ];

        // when (操作):
        let result = formatter.format_history(&messages, &me());

        // then (期待する結果):
        assert_eq!(result.matches("@alice (me) [10:00]").count(), 1);
        assert!(result.contains("2023-01-01"));
        assert!(result.contains("  hi\n"));
        assert!(result.contains("  there\n"));
    }

    #[test]
    fn test_format_history_starts_new_run_after_gap() {
        // テスト項目: 5 分を超えて間が空いたら同じ作者でも作者行を再表示する
        // given (前提条件):
        let formatter = MessageFormatter::with_zone(jst());
        let messages = vec![
            message("m-1", "bob", TEN_AM_JST, "first"),
            message("m-2", "bob", TEN_AM_JST + 300_001, "second"),
        ];

        // when (操作):
        let result = formatter.format_history(&messages, &me());

        // then (期待する結果):
        assert!(result.contains("@bob [10:00]"));
        assert!(result.contains("@bob [10:05]"));
    }

    #[test]
    fn test_format_history_with_date_change() {
        // テスト項目: 日付が変わるメッセージの前に日付区切りを表示する
        // given (前提条件):
        let formatter = MessageFormatter::with_zone(jst());
        // 2023-01-01 23:59 JST -> 2023-01-02 00:01 JST
        let before_midnight = TEN_AM_JST + 13 * 3_600_000 + 59 * 60_000;
        let messages = vec![
            message("m-1", "bob", before_midnight, "late"),
            message("m-2", "bob", before_midnight + 120_000, "early"),
        ];

        // when (操作):
        let result = formatter.format_history(&messages, &me());

        // then (期待する結果):
        assert!(result.contains("2023-01-01"));
        assert!(result.contains("2023-01-02"));
    }

    #[test]
    fn test_format_empty_history() {
        // テスト項目: 履歴が空の場合、その旨を表示する
        // given (前提条件):
        let formatter = MessageFormatter::with_zone(jst());

        // when (操作):
        let result = formatter.format_history(&[], &me());

        // then (期待する結果):
        assert!(result.contains("(no messages yet)"));
    }

    #[test]
    fn test_format_live_continues_run() {
        // テスト項目: 直前と同じ作者の 5 分以内のライブメッセージは本文のみ表示する
        // given (前提条件):
        let formatter = MessageFormatter::with_zone(jst());
        let prev = message("m-1", "bob", TEN_AM_JST, "hi");
        let curr = message("m-2", "bob", TEN_AM_JST + 60_000, "again");

        // when (操作):
        let result = formatter.format_live(&curr, Some(&prev), &me());

        // then (期待する結果):
        assert_eq!(result, "  again\n");
    }

    #[test]
    fn test_format_live_first_message_has_separator_and_author() {
        // テスト項目: 最初のライブメッセージには日付区切りと作者行が付く
        // given (前提条件):
        let formatter = MessageFormatter::with_zone(jst());
        let curr = message("m-1", "bob", TEN_AM_JST, "hello");

        // when (操作):
        let result = formatter.format_live(&curr, None, &me());

        // then (期待する結果):
        assert!(result.contains("2023-01-01"));
        assert!(result.contains("@bob [10:00]"));
        assert!(!result.contains("(me)"));
    }

    #[test]
    fn test_format_system_and_edited_messages() {
        // テスト項目: システムメッセージと編集済みメッセージが区別して表示される
        // given (前提条件):
        let formatter = MessageFormatter::with_zone(jst());
        let mut system = message("m-1", "bob", TEN_AM_JST, "bob joined");
        system.kind = MessageKind::System;
        let mut edited = message("m-2", "bob", TEN_AM_JST + 1_000, "fixed");
        edited.edited = true;

        // when (操作):
        let result = formatter.format_history(&[system, edited], &me());

        // then (期待する結果):
        assert!(result.contains("  * bob joined\n"));
        assert!(result.contains("  fixed (edited)\n"));
    }

    #[test]
    fn test_format_typing() {
        // テスト項目: タイピング中のユーザーがいる場合のみインジケーターを表示する
        // given (前提条件):
        let bob = TypingEntry {
            user_id: UserId::new("bob").unwrap(),
            user_name: "Bob".to_string(),
            expires_at: None,
        };

        // when (操作):
        let some = format_typing(&[bob]);
        let none = format_typing(&[]);

        // then (期待する結果):
        assert_eq!(some.as_deref(), Some("\n(Bob is typing…)\n"));
        assert_eq!(none, None);
    }

    #[test]
    fn test_format_status() {
        // テスト項目: 接続状態と直近のエラーが表示される
        // given (前提条件):
        let connected = ConnectionStatus {
            state: ConnectionState::Connected,
            last_error: None,
        };
        let reconnecting = ConnectionStatus {
            state: ConnectionState::Reconnecting,
            last_error: Some("connection closed by peer".to_string()),
        };

        // when (操作):
        let connected = format_status(&connected);
        let reconnecting = format_status(&reconnecting);

        // then (期待する結果):
        assert_eq!(connected, "\n● connected\n");
        assert_eq!(reconnecting, "\n○ reconnecting (connection closed by peer)\n");
    }

    #[test]
    fn test_format_room_entered() {
        // テスト項目: ルーム参加時の見出しにワークスペース ID が含まれる
        // given (前提条件):
        let workspace = WorkspaceId::new("ws-a").unwrap();

        // when (操作):
        let result = format_room_entered(&workspace);

        // then (期待する結果):
        assert!(result.contains("Workspace: ws-a"));
        assert!(result.contains("============================================================"));
    }
}
