//! Prompt utilities for the client.

use std::io::Write;

use crate::domain::{UserId, WorkspaceId};

/// Prompt label: `user@workspace> `, or `user> ` outside any room
pub fn prompt_label(user_id: &UserId, workspace_id: Option<&WorkspaceId>) -> String {
    match workspace_id {
        Some(workspace_id) => format!("{}@{}> ", user_id, workspace_id),
        None => format!("{}> ", user_id),
    }
}

/// Redisplay the prompt after printing output
pub fn redisplay_prompt(label: &str) {
    print!("{}", label);
    std::io::stdout().flush().ok();
}
