//! Workspace room membership.
//!
//! A connection is in at most one room; joining another room leaves the
//! previous one.

use std::collections::{BTreeSet, HashMap};

use super::model::ConnectionId;

#[derive(Debug, Default)]
pub struct RoomRegistry {
    /// Workspace ID to the connections in its room
    rooms: HashMap<String, BTreeSet<ConnectionId>>,
    /// Connection to the workspace it is in
    joined: HashMap<ConnectionId, String>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put the connection in `workspace_id`. Returns the room it left, if any.
    pub fn join(&mut self, connection_id: ConnectionId, workspace_id: &str) -> Option<String> {
        if self.room_of(&connection_id) == Some(workspace_id) {
            return None;
        }
        let previous = self.remove(&connection_id);
        self.rooms
            .entry(workspace_id.to_string())
            .or_default()
            .insert(connection_id);
        self.joined.insert(connection_id, workspace_id.to_string());
        previous
    }

    /// Take the connection out of `workspace_id`. Returns whether it was there.
    pub fn leave(&mut self, connection_id: &ConnectionId, workspace_id: &str) -> bool {
        if self.room_of(connection_id) != Some(workspace_id) {
            return false;
        }
        self.remove(connection_id).is_some()
    }

    /// Take the connection out of whatever room it is in
    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<String> {
        let workspace_id = self.joined.remove(connection_id)?;
        if let Some(members) = self.rooms.get_mut(&workspace_id) {
            members.remove(connection_id);
            if members.is_empty() {
                self.rooms.remove(&workspace_id);
            }
        }
        Some(workspace_id)
    }

    pub fn room_of(&self, connection_id: &ConnectionId) -> Option<&str> {
        self.joined.get(connection_id).map(String::as_str)
    }

    pub fn members(&self, workspace_id: &str) -> Vec<ConnectionId> {
        self.rooms
            .get(workspace_id)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
