//! HTTP and WebSocket surface of the relay.

mod handler;
mod server;
mod signal;
pub mod state;

pub use handler::HealthResponse;
pub use server::Server;
pub use signal::shutdown_signal;
