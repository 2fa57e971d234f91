//! Request handlers.

mod http;
mod websocket;

pub use http::{HealthResponse, get_workspace_messages, health_check};
pub use websocket::websocket_handler;
