//! Outbound delivery implementations.
//!
//! - `websocket`: per-connection channels drained into WebSockets

pub mod websocket;

pub use websocket::WebSocketMessagePusher;
