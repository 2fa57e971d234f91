//! Error types for running the relay.

use thiserror::Error;

use crate::auth::TokenTableError;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid token table: {0}")]
    Tokens(#[from] TokenTableError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
