//! Time-related utilities with clock abstraction for testability.
//!
//! All timestamps on the wire are Unix epoch milliseconds (UTC). Conversion to a
//! calendar zone happens only at presentation time.

use chrono::{DateTime, Local, TimeZone, Utc};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Get current Unix timestamp (milliseconds)
    fn now_millis(&self) -> i64;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        now_millis()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: i64,
}

impl FixedClock {
    /// Create a new fixed clock with the given timestamp
    pub fn new(fixed_time_millis: i64) -> Self {
        Self {
            fixed_time: fixed_time_millis,
        }
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.fixed_time
    }
}

/// Get current Unix timestamp (milliseconds)
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Resolve a Unix timestamp (milliseconds) in the given zone.
///
/// Returns `None` when the timestamp is outside the representable range.
pub fn datetime_in<Tz: TimeZone>(timestamp_millis: i64, tz: &Tz) -> Option<DateTime<Tz>> {
    tz.timestamp_millis_opt(timestamp_millis).single()
}

/// Convert Unix timestamp (milliseconds) to RFC 3339 in the given zone
pub fn timestamp_to_rfc3339_in<Tz: TimeZone>(timestamp_millis: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match datetime_in(timestamp_millis, tz) {
        Some(dt) => dt.to_rfc3339(),
        None => format!("@{}ms", timestamp_millis),
    }
}

/// Convert Unix timestamp (milliseconds) to RFC 3339 in the viewer's local zone
pub fn timestamp_to_local_rfc3339(timestamp_millis: i64) -> String {
    timestamp_to_rfc3339_in(timestamp_millis, &Local)
}
