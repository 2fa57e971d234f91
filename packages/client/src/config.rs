//! Client configuration and reconnection policy.

use std::time::Duration;

use crate::error::ConfigError;

/// Idle window after the last keystroke before typing-stop is emitted
pub const DEFAULT_TYPING_IDLE: Duration = Duration::from_millis(1000);
/// Lifetime of a remote typing entry without a fresh typing-start
pub const DEFAULT_REMOTE_TYPING_TTL: Duration = Duration::from_millis(5000);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Exponential backoff between reconnection attempts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// `None` retries forever
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before the given attempt (0-indexed): doubles each attempt, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.min(31)).unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Check if another reconnection attempt is allowed.
    ///
    /// # Arguments
    ///
    /// * `current_attempt` - The current reconnection attempt count (0-indexed)
    pub fn allows(&self, current_attempt: u32) -> bool {
        self.max_attempts
            .is_none_or(|max_attempts| current_attempt < max_attempts)
    }
}

/// Settings of a client session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket endpoint of the relay (e.g. `ws://127.0.0.1:8080/ws`)
    pub relay_url: String,
    /// Base URL of the history endpoint (e.g. `http://127.0.0.1:8080`)
    pub api_base_url: String,
    pub typing_idle: Duration,
    /// `None` keeps remote typists until their typing-stop arrives
    pub remote_typing_ttl: Option<Duration>,
    pub connect_timeout: Duration,
    pub reconnect: ReconnectPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: "ws://127.0.0.1:8080/ws".to_string(),
            api_base_url: "http://127.0.0.1:8080".to_string(),
            typing_idle: DEFAULT_TYPING_IDLE,
            remote_typing_ttl: Some(DEFAULT_REMOTE_TYPING_TTL),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Default settings pointed at the given relay and history endpoints
    pub fn new(relay_url: impl Into<String>, api_base_url: impl Into<String>) -> Self {
        Self {
            relay_url: relay_url.into(),
            api_base_url: api_base_url.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !has_scheme(&self.relay_url, &["ws://", "wss://"]) {
            return Err(ConfigError::InvalidUrl {
                field: "relay_url",
                value: self.relay_url.clone(),
            });
        }
        if !has_scheme(&self.api_base_url, &["http://", "https://"]) {
            return Err(ConfigError::InvalidUrl {
                field: "api_base_url",
                value: self.api_base_url.clone(),
            });
        }
        if self.typing_idle.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "typing_idle",
                reason: "must be greater than zero",
            });
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "connect_timeout",
                reason: "must be greater than zero",
            });
        }
        if self.reconnect.initial_delay > self.reconnect.max_delay {
            return Err(ConfigError::InvalidValue {
                field: "reconnect.initial_delay",
                reason: "must not exceed reconnect.max_delay",
            });
        }
        Ok(())
    }
}

fn has_scheme(url: &str, schemes: &[&str]) -> bool {
    schemes
        .iter()
        .any(|scheme| url.len() > scheme.len() && url.starts_with(scheme))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_per_attempt() {
        // テスト項目: 再接続の待機時間が試行ごとに倍になる
        // given (前提条件):
        let policy = ReconnectPolicy {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            max_attempts: None,
        };

        // when (操作):
        let delays: Vec<Duration> = (0..4).map(|attempt| policy.delay_for(attempt)).collect();

        // then (期待する結果):
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(500),
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::from_millis(4000),
            ]
        );
    }

    #[test]
    fn test_delay_is_capped() {
        // テスト項目: 待機時間は上限値で頭打ちになり、大きな試行回数でも溢れない
        // given (前提条件):
        let policy = ReconnectPolicy::default();

        // when (操作):
        let late = policy.delay_for(10);
        let huge = policy.delay_for(u32::MAX);

        // then (期待する結果):
        assert_eq!(late, Duration::from_secs(30));
        assert_eq!(huge, Duration::from_secs(30));
    }

    #[test]
    fn test_unbounded_policy_always_allows() {
        // テスト項目: 上限未設定の場合、何回目でも再接続が許可される
        // given (前提条件):
        let policy = ReconnectPolicy::default();

        // when (操作):
        let result = policy.allows(1_000_000);

        // then (期待する結果):
        assert!(result);
    }

    #[test]
    fn test_bounded_policy_stops_at_limit() {
        // テスト項目: 再接続回数が上限に達した場合、再接続が許可されない
        // given (前提条件):
        let policy = ReconnectPolicy {
            max_attempts: Some(5),
            ..ReconnectPolicy::default()
        };

        // when (操作):
        let before_limit = policy.allows(4);
        let at_limit = policy.allows(5);

        // then (期待する結果):
        assert!(before_limit);
        assert!(!at_limit);
    }

    #[test]
    fn test_validate_accepts_defaults() {
        // テスト項目: デフォルト設定は検証を通過する
        // given (前提条件):
        let config = ClientConfig::default();

        // when (操作):
        let result = config.validate();

        // then (期待する結果):
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_validate_rejects_http_relay_url() {
        // テスト項目: リレー URL が ws/wss 以外の場合はエラーになる
        // given (前提条件):
        let config = ClientConfig::new("http://127.0.0.1:8080/ws", "http://127.0.0.1:8080");

        // when (操作):
        let result = config.validate();

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(ConfigError::InvalidUrl {
                field: "relay_url",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_typing_idle() {
        // テスト項目: タイピングのアイドル時間が 0 の場合はエラーになる
        // given (前提条件):
        let config = ClientConfig {
            typing_idle: Duration::ZERO,
            ..ClientConfig::default()
        };

        // when (操作):
        let result = config.validate();

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                field: "typing_idle",
                ..
            })
        ));
    }
}
