//! Bearer credential handed to the core by the credential supplier.

use std::fmt;

use crate::domain::UserId;

/// Opaque bearer token. Its value never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token value, for putting on the wire
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// `Authorization` header value
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// Token plus the identity it belongs to. The user id filters the local user's
/// own typing events.
#[derive(Debug, Clone)]
pub struct Credential {
    pub token: BearerToken,
    pub user_id: UserId,
}

impl Credential {
    pub fn new(token: BearerToken, user_id: UserId) -> Self {
        Self { token, user_id }
    }
}
