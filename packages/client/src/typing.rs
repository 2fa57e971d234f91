//! Typing presence: remote typists and the local idle timer.

use std::time::Duration;

use tokio::time::Instant;

use crate::domain::{TypingEntry, UserId};

/// Cancellable one-shot deadline.
///
/// The owner polls it with [`IdleTimer::fire`]; a cancelled timer has no
/// deadline left and can never fire.
#[derive(Debug, Clone)]
pub struct IdleTimer {
    period: Duration,
    deadline: Option<Instant>,
}

impl IdleTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            deadline: None,
        }
    }

    /// (Re)arm the timer so it expires one period after `now`
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.period);
    }

    /// Disarm the timer. Returns whether it was armed.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consume the deadline if it has passed. Fires at most once per arm.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// What the local user's typing state requires on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingSignal {
    Start,
    Stop,
}

/// Typing presence of one room as seen by the local user
#[derive(Debug)]
pub struct TypingTracker {
    local_user: UserId,
    remote_ttl: Option<Duration>,
    typists: Vec<TypingEntry>,
    idle: IdleTimer,
    local_typing: bool,
}

impl TypingTracker {
    pub fn new(local_user: UserId, idle: Duration, remote_ttl: Option<Duration>) -> Self {
        Self {
            local_user,
            remote_ttl,
            typists: Vec::new(),
            idle: IdleTimer::new(idle),
            local_typing: false,
        }
    }

    // ========================================
    // Remote typists
    // ========================================

    /// Insert or refresh a remote typist. Returns whether the visible set changed.
    pub fn on_typing_start(&mut self, user_id: UserId, user_name: String, now: Instant) -> bool {
        if user_id == self.local_user {
            return false;
        }

        let expires_at = self.remote_ttl.map(|ttl| now + ttl);
        match self.typists.iter_mut().find(|entry| entry.user_id == user_id) {
            Some(entry) => {
                entry.expires_at = expires_at;
                if entry.user_name == user_name {
                    false
                } else {
                    entry.user_name = user_name;
                    true
                }
            }
            None => {
                self.typists.push(TypingEntry {
                    user_id,
                    user_name,
                    expires_at,
                });
                true
            }
        }
    }

    /// Remove the matching remote typist. Returns whether the visible set changed.
    pub fn on_typing_stop(&mut self, user_id: &UserId) -> bool {
        let before = self.typists.len();
        self.typists.retain(|entry| &entry.user_id != user_id);
        self.typists.len() != before
    }

    /// Drop remote typists whose TTL has lapsed. Returns whether the visible set changed.
    pub fn expire(&mut self, now: Instant) -> bool {
        let before = self.typists.len();
        self.typists.retain(|entry| !entry.is_expired(now));
        self.typists.len() != before
    }

    /// Earliest remote expiry, if any
    pub fn next_expiry(&self) -> Option<Instant> {
        self.typists.iter().filter_map(|entry| entry.expires_at).min()
    }

    /// Forget every remote typist. Returns whether the visible set changed.
    pub fn clear_remote(&mut self) -> bool {
        let changed = !self.typists.is_empty();
        self.typists.clear();
        changed
    }

    /// Remote typists in order of first appearance, without duplicates
    pub fn active_typists(&self) -> &[TypingEntry] {
        &self.typists
    }

    // ========================================
    // Local typing
    // ========================================

    /// A keystroke changed the input. Non-empty input (re-)emits start and re-arms
    /// the idle timer; an emptied input behaves like blur.
    pub fn local_keystroke(&mut self, input: &str, now: Instant) -> Option<TypingSignal> {
        if input.trim().is_empty() {
            return self.local_stop();
        }
        self.idle.arm(now);
        self.local_typing = true;
        Some(TypingSignal::Start)
    }

    /// Send, blur, unmount, or room-leave: cancel the idle timer and stop typing.
    pub fn local_stop(&mut self) -> Option<TypingSignal> {
        self.idle.cancel();
        if std::mem::take(&mut self.local_typing) {
            Some(TypingSignal::Stop)
        } else {
            None
        }
    }

    /// Idle timer expiry
    pub fn poll_idle(&mut self, now: Instant) -> Option<TypingSignal> {
        if self.idle.fire(now) {
            self.local_typing = false;
            Some(TypingSignal::Stop)
        } else {
            None
        }
    }

    pub fn idle_deadline(&self) -> Option<Instant> {
        self.idle.deadline()
    }

    pub fn is_local_typing(&self) -> bool {
        self.local_typing
    }
}

/// Indicator text: nothing for no typists, the name for one, a count otherwise.
pub fn render_typing_indicator(typists: &[TypingEntry]) -> Option<String> {
    match typists {
        [] => None,
        [only] => Some(format!("{} is typing…", only.user_name)),
        many => Some(format!("{} people are typing…", many.len())),
    }
}
