//! Real-time workspace messaging client.
//!
//! The client keeps one relay connection per session and layers room membership,
//! typing presence, and an ordered message channel on top of it:
//!
//! - [`connection::ConnectionManager`] opens the relay connection and hands out a
//!   [`connection::ConnectionHandle`] that reconnects transparently.
//! - [`membership::RoomMembership`] keeps at most one active workspace room.
//! - [`typing::TypingTracker`] tracks remote typists and the local idle timer.
//! - [`channel::MessageChannel`] holds the ordered per-room message log.
//! - [`sequencer`] computes date separators and author headers.

pub mod channel;
pub mod config;
pub mod connection;
pub mod credential;
pub mod domain;
pub mod error;
pub mod history;
pub mod listener;
pub mod membership;
pub mod protocol;
pub mod sequencer;
pub mod transport;
pub mod typing;
pub mod ui;
