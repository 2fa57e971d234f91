//! Presentation hints computed from an ordered message list.
//!
//! Both rules are pure: the same input always yields the same hints.

use chrono::{Local, NaiveDate, TimeZone};
use huddle_shared::time::datetime_in;

use crate::domain::{Message, Timestamp};

/// Messages from the same author further apart than this start a new run
pub const AUTHOR_RUN_WINDOW_MS: i64 = 300_000;

/// Presentation hints for one message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageView {
    /// A date separator is drawn above the message
    pub date_separator: bool,
    /// The author's name is shown on the message (it ends a same-author run)
    pub author_header: bool,
}

/// True if `prev` is absent or lies on another calendar date in the viewer's local zone.
pub fn needs_date_separator(curr: &Message, prev: Option<&Message>) -> bool {
    needs_date_separator_in(curr, prev, &Local)
}

/// Zone-explicit form of [`needs_date_separator`].
pub fn needs_date_separator_in<Tz: TimeZone>(
    curr: &Message,
    prev: Option<&Message>,
    tz: &Tz,
) -> bool {
    match prev {
        None => true,
        Some(prev) => calendar_date(curr.timestamp, tz) != calendar_date(prev.timestamp, tz),
    }
}

/// True if `next` is absent, comes from another author, or follows more than
/// [`AUTHOR_RUN_WINDOW_MS`] later. The header sits on the message that ends a run.
pub fn shows_author_header(curr: &Message, next: Option<&Message>) -> bool {
    match next {
        None => true,
        Some(next) => {
            next.sender_id != curr.sender_id
                || next.timestamp.millis_since(curr.timestamp) > AUTHOR_RUN_WINDOW_MS
        }
    }
}

/// Hints for every message of an ascending list, in the viewer's local zone.
pub fn annotate(messages: &[Message]) -> Vec<MessageView> {
    annotate_in(messages, &Local)
}

/// Zone-explicit form of [`annotate`].
pub fn annotate_in<Tz: TimeZone>(messages: &[Message], tz: &Tz) -> Vec<MessageView> {
    messages
        .iter()
        .enumerate()
        .map(|(index, curr)| {
            let prev = index.checked_sub(1).and_then(|i| messages.get(i));
            let next = messages.get(index + 1);
            MessageView {
                date_separator: needs_date_separator_in(curr, prev, tz),
                author_header: shows_author_header(curr, next),
            }
        })
        .collect()
}

fn calendar_date<Tz: TimeZone>(timestamp: Timestamp, tz: &Tz) -> Option<NaiveDate> {
    datetime_in(timestamp.value(), tz).map(|dt| dt.date_naive())
}
