//! Workspace room membership.
//!
//! A connection is in at most one room. The membership remembers the room the
//! user asked for even while disconnected, and re-emits the join once the
//! connection is (re)established.

use huddle_shared::protocol::ClientEvent;

use crate::{
    domain::WorkspaceId,
    protocol::{join_workspace, leave_workspace},
};

/// Wire effects of a membership change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipChange {
    /// Room a `leave-workspace` was emitted for
    pub left: Option<WorkspaceId>,
    /// Room a `join-workspace` was emitted for
    pub entered: Option<WorkspaceId>,
}

impl MembershipChange {
    /// Events to put on the wire, leave first
    pub fn events(&self) -> Vec<ClientEvent> {
        self.left
            .iter()
            .map(leave_workspace)
            .chain(self.entered.iter().map(join_workspace))
            .collect()
    }
}

/// Result of a join request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The requested room is already the active one
    AlreadyActive,
    /// The active room changed; `previous` was the room requested before
    Switched {
        previous: Option<WorkspaceId>,
        change: MembershipChange,
    },
}

#[derive(Debug, Default)]
pub struct RoomMembership {
    active: Option<WorkspaceId>,
    /// The relay has seen the join for `active` on the current connection
    joined: bool,
}

impl RoomMembership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Room the user asked to be in, joined or not yet
    pub fn active(&self) -> Option<&WorkspaceId> {
        self.active.as_ref()
    }

    /// Room the relay currently has this connection in
    pub fn joined_room(&self) -> Option<&WorkspaceId> {
        self.active.as_ref().filter(|_| self.joined)
    }

    /// Make `workspace_id` the active room, leaving the previous one first.
    /// While disconnected nothing is emitted; the join follows on reconnect.
    pub fn join(&mut self, workspace_id: WorkspaceId, connected: bool) -> JoinOutcome {
        if self.active.as_ref() == Some(&workspace_id) {
            return JoinOutcome::AlreadyActive;
        }

        let previous = self.active.take();
        let left = if self.joined && connected {
            previous.clone()
        } else {
            None
        };

        self.joined = connected;
        let entered = connected.then(|| workspace_id.clone());
        self.active = Some(workspace_id);

        JoinOutcome::Switched {
            previous,
            change: MembershipChange { left, entered },
        }
    }

    /// Leave `workspace_id` if it is the active room. Returns `None` otherwise.
    pub fn leave(&mut self, workspace_id: &WorkspaceId, connected: bool) -> Option<MembershipChange> {
        if self.active.as_ref() != Some(workspace_id) {
            return None;
        }
        self.leave_active(connected)
    }

    /// Leave whatever room is active
    pub fn leave_active(&mut self, connected: bool) -> Option<MembershipChange> {
        let previous = self.active.take()?;
        let was_joined = std::mem::take(&mut self.joined);
        Some(MembershipChange {
            left: (was_joined && connected).then_some(previous),
            entered: None,
        })
    }

    /// The connection reached Connected: re-assert the active room
    pub fn on_connected(&mut self) -> MembershipChange {
        let entered = match &self.active {
            Some(workspace_id) if !self.joined => {
                self.joined = true;
                Some(workspace_id.clone())
            }
            _ => None,
        };
        MembershipChange {
            left: None,
            entered,
        }
    }

    /// The transport dropped: the relay forgot this connection's room
    pub fn on_disconnected(&mut self) {
        self.joined = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ws(id: &str) -> WorkspaceId {
        WorkspaceId::new(id).unwrap()
    }

    #[test]
    fn test_join_while_connected_emits_join() {
        // テスト項目: 接続中の参加は join-workspace を送る
        // given (前提条件):
        let mut membership = RoomMembership::new();

        // when (操作):
        let outcome = membership.join(ws("a"), true);

        // then (期待する結果):
        assert_eq!(
            outcome,
            JoinOutcome::Switched {
                previous: None,
                change: MembershipChange {
                    left: None,
                    entered: Some(ws("a"))
                },
            }
        );
        assert_eq!(membership.joined_room(), Some(&ws("a")));
    }

    #[test]
    fn test_switching_rooms_leaves_then_joins() {
        // テスト項目: 別ルームへの参加は leave(A) → join(B) の順で送る
        // given (前提条件):
        let mut membership = RoomMembership::new();
        membership.join(ws("a"), true);

        // when (操作):
        let outcome = membership.join(ws("b"), true);

        // then (期待する結果):
        let JoinOutcome::Switched { previous, change } = outcome else {
            panic!("expected a room switch");
        };
        assert_eq!(previous, Some(ws("a")));
        assert_eq!(
            change.events(),
            vec![leave_workspace(&ws("a")), join_workspace(&ws("b"))]
        );
    }

    #[test]
    fn test_rejoining_active_room_is_noop() {
        // テスト項目: 既に参加中のルームへの参加は何も送らない
        // given (前提条件):
        let mut membership = RoomMembership::new();
        membership.join(ws("a"), true);

        // when (操作):
        let outcome = membership.join(ws("a"), true);

        // then (期待する結果):
        assert_eq!(outcome, JoinOutcome::AlreadyActive);
    }

    #[test]
    fn test_join_before_connected_is_deferred_until_connected() {
        // テスト項目: 接続前の参加は破棄されず、接続後に join が送られる
        // given (前提条件):
        let mut membership = RoomMembership::new();
        let outcome = membership.join(ws("a"), false);

        // when (操作):
        let change = membership.on_connected();

        // then (期待する結果):
        assert!(matches!(
            outcome,
            JoinOutcome::Switched { change: MembershipChange { entered: None, .. }, .. }
        ));
        assert_eq!(change.entered, Some(ws("a")));
        assert_eq!(membership.joined_room(), Some(&ws("a")));
    }

    #[test]
    fn test_reconnect_reasserts_room() {
        // テスト項目: 再接続後に参加中のルームへの join が再送される
        // given (前提条件):
        let mut membership = RoomMembership::new();
        membership.join(ws("a"), true);
        membership.on_disconnected();

        // when (操作):
        let first = membership.on_connected();
        let second = membership.on_connected();

        // then (期待する結果):
        assert_eq!(first.events(), vec![join_workspace(&ws("a"))]);
        assert!(second.events().is_empty());
    }

    #[test]
    fn test_leave_other_room_is_ignored() {
        // テスト項目: アクティブでないルームからの退出は無視される
        // given (前提条件):
        let mut membership = RoomMembership::new();
        membership.join(ws("a"), true);

        // when (操作):
        let change = membership.leave(&ws("b"), true);

        // then (期待する結果):
        assert_eq!(change, None);
        assert_eq!(membership.active(), Some(&ws("a")));
    }

    #[test]
    fn test_leave_while_disconnected_emits_nothing() {
        // テスト項目: 切断中の退出はルームを解除するが leave は送らない
        // given (前提条件):
        let mut membership = RoomMembership::new();
        membership.join(ws("a"), true);
        membership.on_disconnected();

        // when (操作):
        let change = membership.leave(&ws("a"), false);

        // then (期待する結果):
        assert_eq!(change, Some(MembershipChange::default()));
        assert_eq!(membership.active(), None);
        assert!(membership.on_connected().events().is_empty());
    }
}
