//! Domain layer of the relay.
//!
//! - `model`: connections, members, and stored chat messages
//! - `room`: workspace room membership registry
//! - `repository`: message history storage abstraction
//! - `pusher`: outbound delivery abstraction

pub mod model;
pub mod pusher;
pub mod repository;
pub mod room;

pub use model::{ChatMessage, ConnectionId, Member};
pub use pusher::{MessagePushError, MessagePusher, PusherChannel};
pub use repository::{MessageRepository, RepositoryError};
pub use room::RoomRegistry;
