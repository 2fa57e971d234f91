//! Shared building blocks for the Huddle relay and client.
//!
//! - `logger`: tracing subscriber setup used by every binary
//! - `protocol`: wire events exchanged over the relay connection and the history endpoint
//! - `time`: clock abstraction and timestamp helpers

pub mod logger;
pub mod protocol;
pub mod time;
