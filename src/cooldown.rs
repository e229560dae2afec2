//! Per-sender reply rate limiting.
//!
//! Volatile by design: a restart resets cooldowns, while the idempotency
//! ledger alone stays durable. The map records the time of the last
//! dispatched reply per sender.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// Last-reply timestamps keyed by sender id.
#[derive(Debug, Default)]
pub struct CooldownTracker {
    last_reply_at: HashMap<String, DateTime<Utc>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while the sender is still inside the cooldown window.
    pub fn is_throttled(&self, sender: &str, cooldown_seconds: u64, now: DateTime<Utc>) -> bool {
        match self.last_reply_at.get(sender) {
            Some(last) => (now - *last).num_seconds() < cooldown_seconds as i64,
            None => false,
        }
    }

    /// Record a dispatched reply to `sender`.
    pub fn mark_replied(&mut self, sender: &str, now: DateTime<Utc>) {
        self.last_reply_at.insert(sender.to_string(), now);
    }
}
