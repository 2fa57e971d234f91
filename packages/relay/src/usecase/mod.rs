//! UseCase layer of the relay.
//!
//! - `membership`: join/leave workspace rooms and connection teardown
//! - `send_message`: accept, store, and broadcast chat messages
//! - `relay_typing`: forward typing events to the rest of the room
//! - `get_history`: read a workspace's stored messages

pub mod error;
pub mod get_history;
pub mod membership;
pub mod relay_typing;
pub mod send_message;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{MembershipError, SendMessageError, TypingError};
pub use get_history::GetHistoryUseCase;
pub use membership::MembershipUseCase;
pub use relay_typing::{RelayTypingUseCase, TypingAction};
pub use send_message::SendMessageUseCase;

use huddle_shared::protocol::ServerEvent;

/// Serialize an event for the wire
pub(crate) fn encode(event: &ServerEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}
