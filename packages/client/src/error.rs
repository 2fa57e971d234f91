//! Error types for the messaging client.

use std::time::Duration;

use thiserror::Error;

/// The relay refused the credential. Terminal: never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The relay answered the upgrade request with 401/403
    #[error("credential rejected by relay (HTTP {status})")]
    Rejected { status: u16 },

    /// The credential could not be put on the wire
    #[error("invalid credential: {0}")]
    InvalidCredential(String),
}

/// Transient connectivity failure. Retried with backoff and surfaced only as a
/// connection state change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("connection attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection closed by peer")]
    Closed,

    #[error("gave up reconnecting after {0} attempts")]
    RetriesExhausted(u32),
}

/// Outcome of a single transport open attempt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// The history collaborator call failed. The room proceeds with an empty history.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryFetchError {
    #[error("history request failed: {0}")]
    Request(String),

    #[error("history endpoint answered HTTP {0}")]
    Status(u16),

    #[error("history response could not be decoded: {0}")]
    Decode(String),
}

/// The connection actor has shut down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("connection has been shut down")]
pub struct ConnectionClosed;

/// A send was rejected locally before reaching the relay
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("not connected to the relay")]
    NotConnected,

    #[error("no active room to send to")]
    NoActiveRoom,

    #[error("message content is empty")]
    EmptyContent,

    #[error(transparent)]
    Closed(#[from] ConnectionClosed),
}

/// Invalid client configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid URL for {field}: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
}

/// Failure of an interactive client session
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The connection ended for good (credential revoked or retries exhausted)
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error(transparent)]
    Closed(#[from] ConnectionClosed),
}
