//! Owner presence tracking (volatile, process lifetime only).
//!
//! Two independent facts, not a single state enum: `owner_online` reflects
//! the most recent presence signal and may flap (no hysteresis), while
//! `last_owner_active_at` only ever moves forward in time. Three signal
//! sources feed the tracker; all are idempotent and commutative in effect.

use chrono::{DateTime, Utc};

/// A presence-affecting signal derived from transport events.
#[derive(Debug, Clone, Copy)]
pub enum PresenceSignal {
    /// Presence update naming the owner, with their availability flag.
    OwnerPresence { available: bool },
    /// Read receipt or self-originated message-status event.
    OwnerReceipt,
    /// An outgoing message sent from the owner account itself.
    OwnerMessage,
}

/// Last-known owner availability and activity.
#[derive(Debug, Clone, Default)]
pub struct PresenceTracker {
    owner_online: bool,
    last_owner_active_at: Option<DateTime<Utc>>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one signal into the tracked state.
    pub fn observe(&mut self, signal: PresenceSignal, now: DateTime<Utc>) {
        match signal {
            PresenceSignal::OwnerPresence { available } => {
                self.owner_online = available;
                self.touch(now);
            }
            PresenceSignal::OwnerReceipt | PresenceSignal::OwnerMessage => self.touch(now),
        }
    }

    /// Advance the activity timestamp. Never moves it backward.
    fn touch(&mut self, now: DateTime<Utc>) {
        if self.last_owner_active_at.is_none_or(|t| now > t) {
            self.last_owner_active_at = Some(now);
        }
    }

    pub fn owner_online(&self) -> bool {
        self.owner_online
    }

    pub fn last_owner_active_at(&self) -> Option<DateTime<Utc>> {
        self.last_owner_active_at
    }

    /// Whether the owner showed activity within the last `seconds`.
    /// False when no activity was ever observed.
    pub fn active_within(&self, seconds: u64, now: DateTime<Utc>) -> bool {
        match self.last_owner_active_at {
            Some(t) => (now - t).num_seconds() <= seconds as i64,
            None => false,
        }
    }

    /// Whether the owner has been idle strictly longer than `seconds`.
    /// True when no activity was ever observed.
    pub fn idle_for_more_than(&self, seconds: u64, now: DateTime<Utc>) -> bool {
        match self.last_owner_active_at {
            Some(t) => (now - t).num_seconds() > seconds as i64,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn presence_sets_online_flag_and_activity() {
        let now = Utc::now();
        let mut tracker = PresenceTracker::new();
        assert!(!tracker.owner_online());

        tracker.observe(PresenceSignal::OwnerPresence { available: true }, now);
        assert!(tracker.owner_online());
        assert_eq!(tracker.last_owner_active_at(), Some(now));

        tracker.observe(
            PresenceSignal::OwnerPresence { available: false },
            now + Duration::seconds(5),
        );
        assert!(!tracker.owner_online());
    }

    #[test]
    fn activity_timestamp_never_moves_backward() {
        let now = Utc::now();
        let mut tracker = PresenceTracker::new();
        tracker.observe(PresenceSignal::OwnerReceipt, now);
        tracker.observe(PresenceSignal::OwnerMessage, now - Duration::seconds(30));
        assert_eq!(tracker.last_owner_active_at(), Some(now));
    }

    #[test]
    fn receipt_and_message_signals_refresh_activity() {
        let now = Utc::now();
        let mut tracker = PresenceTracker::new();
        tracker.observe(PresenceSignal::OwnerReceipt, now);
        assert_eq!(tracker.last_owner_active_at(), Some(now));

        let later = now + Duration::seconds(10);
        tracker.observe(PresenceSignal::OwnerMessage, later);
        assert_eq!(tracker.last_owner_active_at(), Some(later));
        // neither signal touches the online flag
        assert!(!tracker.owner_online());
    }

    #[test]
    fn active_within_window() {
        let now = Utc::now();
        let mut tracker = PresenceTracker::new();
        assert!(!tracker.active_within(120, now));

        tracker.observe(PresenceSignal::OwnerReceipt, now);
        assert!(tracker.active_within(120, now + Duration::seconds(120)));
        assert!(!tracker.active_within(120, now + Duration::seconds(121)));
    }

    #[test]
    fn idle_threshold_is_strict() {
        let now = Utc::now();
        let mut tracker = PresenceTracker::new();
        // never-seen owner counts as idle
        assert!(tracker.idle_for_more_than(30, now));

        tracker.observe(PresenceSignal::OwnerReceipt, now);
        assert!(!tracker.idle_for_more_than(30, now + Duration::seconds(30)));
        assert!(tracker.idle_for_more_than(30, now + Duration::seconds(31)));
    }
}
