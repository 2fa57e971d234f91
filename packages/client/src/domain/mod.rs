//! Domain model of the messaging core.
//!
//! - `value_object`: identifiers, timestamps, and message kinds
//! - `entity`: messages and typing entries

pub mod entity;
pub mod value_object;

pub use entity::{Message, TypingEntry};
pub use value_object::{MessageId, MessageKind, Timestamp, UserId, ValueObjectError, WorkspaceId};
