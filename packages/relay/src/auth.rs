//! Bearer token authentication against a static token table.
//!
//! Token issuance is out of scope for the relay: tokens are configured up front
//! as `token=userId:userName` entries.

use std::{collections::HashMap, str::FromStr};

use axum::http::{HeaderMap, header::AUTHORIZATION};
use thiserror::Error;

/// The user a token belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub user_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenTableError {
    #[error("entry '{0}' is not of the form token=userId:userName")]
    Malformed(String),

    #[error("a token of user '{0}' is listed more than once")]
    DuplicateToken(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("unknown bearer token")]
    UnknownToken,
}

/// Token to user mapping
#[derive(Debug, Clone, Default)]
pub struct TokenTable {
    users: HashMap<String, AuthenticatedUser>,
}

impl TokenTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `token=userId:userName` entries
    pub fn from_entries<I, S>(entries: I) -> Result<Self, TokenTableError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for entry in entries {
            let entry = entry.as_ref().trim();
            if entry.is_empty() {
                continue;
            }
            let (token, user) = parse_entry(entry)?;
            table.insert(token, user)?;
        }
        Ok(table)
    }

    pub fn insert(&mut self, token: String, user: AuthenticatedUser) -> Result<(), TokenTableError> {
        if self.users.contains_key(&token) {
            return Err(TokenTableError::DuplicateToken(user.user_id));
        }
        self.users.insert(token, user);
        Ok(())
    }

    pub fn lookup(&self, token: &str) -> Option<&AuthenticatedUser> {
        self.users.get(token)
    }

    /// Resolve the user behind the request's `Authorization: Bearer` header
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthenticatedUser, AuthError> {
        let token = bearer_token(headers).ok_or(AuthError::MissingToken)?;
        self.lookup(token).cloned().ok_or(AuthError::UnknownToken)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl FromStr for TokenTable {
    type Err = TokenTableError;

    /// Parse comma-separated `token=userId:userName` entries
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_entries(s.split(','))
    }
}

fn parse_entry(entry: &str) -> Result<(String, AuthenticatedUser), TokenTableError> {
    let malformed = || TokenTableError::Malformed(entry.to_string());
    let (token, user) = entry.split_once('=').ok_or_else(malformed)?;
    let (user_id, user_name) = user.split_once(':').ok_or_else(malformed)?;
    let (token, user_id, user_name) = (token.trim(), user_id.trim(), user_name.trim());
    if token.is_empty() || user_id.is_empty() || user_name.is_empty() {
        return Err(malformed());
    }
    Ok((
        token.to_string(),
        AuthenticatedUser {
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
        },
    ))
}

/// Token of an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_parse_token_table() {
        // テスト項目: カンマ区切りの token=userId:userName を解析できる
        // given (前提条件):
        let input = "alice-token=alice:Alice, bob-token=bob:Bob Smith";

        // when (操作):
        let table: TokenTable = input.parse().unwrap();

        // then (期待する結果):
        assert_eq!(table.len(), 2);
        let bob = table.lookup("bob-token").unwrap();
        assert_eq!(bob.user_id, "bob");
        assert_eq!(bob.user_name, "Bob Smith");
    }

    #[test]
    fn test_parse_skips_empty_entries() {
        // テスト項目: 空のエントリは無視される
        // given (前提条件):
        let input = "alice-token=alice:Alice,,";

        // when (操作):
        let table: TokenTable = input.parse().unwrap();

        // then (期待する結果):
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_parse_rejects_malformed_entry() {
        // テスト項目: 形式が不正なエントリはエラーになる
        // given (前提条件):
        let inputs = ["alice-token", "alice-token=alice", "=alice:Alice", "t=:Alice"];

        for input in inputs {
            // when (操作):
            let result = input.parse::<TokenTable>();

            // then (期待する結果):
            assert_eq!(
                result.unwrap_err(),
                TokenTableError::Malformed(input.to_string())
            );
        }
    }

    #[test]
    fn test_parse_rejects_duplicate_token() {
        // テスト項目: 同じトークンが二度現れるとエラーになる
        // given (前提条件):
        let input = "t=alice:Alice,t=bob:Bob";

        // when (操作):
        let result = input.parse::<TokenTable>();

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            TokenTableError::DuplicateToken("bob".to_string())
        );
    }

    #[test]
    fn test_authenticate_known_token() {
        // テスト項目: 既知のトークンならユーザーが解決される
        // given (前提条件):
        let table: TokenTable = "alice-token=alice:Alice".parse().unwrap();
        let headers = headers_with("Bearer alice-token");

        // when (操作):
        let user = table.authenticate(&headers);

        // then (期待する結果):
        assert_eq!(
            user,
            Ok(AuthenticatedUser {
                user_id: "alice".to_string(),
                user_name: "Alice".to_string(),
            })
        );
    }

    #[test]
    fn test_authenticate_rejects_missing_or_unknown_token() {
        // テスト項目: トークンがない、または未知の場合は認証に失敗する
        // given (前提条件):
        let table: TokenTable = "alice-token=alice:Alice".parse().unwrap();

        // when (操作):
        let missing = table.authenticate(&HeaderMap::new());
        let not_bearer = table.authenticate(&headers_with("Basic alice-token"));
        let unknown = table.authenticate(&headers_with("Bearer mallory-token"));

        // then (期待する結果):
        assert_eq!(missing, Err(AuthError::MissingToken));
        assert_eq!(not_bearer, Err(AuthError::MissingToken));
        assert_eq!(unknown, Err(AuthError::UnknownToken));
    }
}
