//! Reference relay for Huddle workspace messaging.
//!
//! Clients authenticate with a bearer token, join one workspace room per
//! connection, and exchange chat messages and typing events through it. Every
//! accepted message is kept in a bounded in-memory history served over HTTP.
//!
//! Layers:
//!
//! - `domain`: members, room membership, and the repository/pusher abstractions
//! - `infrastructure`: in-memory history and WebSocket push implementations
//! - `usecase`: membership, messaging, typing, and history operations
//! - `ui`: axum router, handlers, and the server runner

pub mod auth;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
