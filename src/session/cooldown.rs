//! Per-user cooldown between accepted generation requests

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Admission decision for a generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Accept,
    Reject { remaining_secs: u64 },
}

/// Tracks the last accepted request per user.
///
/// Soft anti-abuse measure, not a security control: state is in-memory only
/// and lost on restart. Entries are never removed.
pub struct RateLimiter {
    window: Duration,
    last_accepted: Mutex<HashMap<i64, Instant>>,
}

impl RateLimiter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: Mutex::new(HashMap::new()),
        }
    }

    pub fn check(&self, user_id: i64, now: Instant) -> Gate {
        let last_accepted = self.last_accepted.lock().unwrap();
        let Some(last) = last_accepted.get(&user_id) else {
            return Gate::Accept;
        };

        let elapsed = now.saturating_duration_since(*last);
        if elapsed >= self.window {
            return Gate::Accept;
        }

        let remaining = self.window - elapsed;
        let mut remaining_secs = remaining.as_secs();
        if remaining.subsec_nanos() > 0 {
            remaining_secs += 1;
        }
        Gate::Reject { remaining_secs }
    }

    /// Record an accepted request. Must be called exactly once per accepted
    /// request, before the generation call is issued, so a slow backend call
    /// cannot be used to slip past the cooldown.
    pub fn record(&self, user_id: i64, now: Instant) {
        self.last_accepted.lock().unwrap().insert(user_id, now);
    }
}
