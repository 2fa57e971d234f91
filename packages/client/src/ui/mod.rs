//! Terminal front end of the client.
//!
//! - `formatter`: renders messages, typing indicators, and connection status
//! - `prompt`: prompt display helpers
//! - `input`: line reader that also reports in-progress edits
//! - `runner`: the interactive session loop

pub mod formatter;
pub mod input;
pub mod prompt;
pub mod runner;

pub use formatter::MessageFormatter;
pub use runner::run_client;
