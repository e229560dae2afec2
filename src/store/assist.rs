//! Per-sender assist preferences and the derived opt-in state machine.
//!
//! The assist flow asks a sender whether they want continued automated
//! replies while the owner is online but idle. Their answer (and when they
//! last declined) is durable; the pipeline derives a four-state
//! [`AssistState`] from the stored record plus the current time.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StoreError;
use crate::store::write_atomic;

/// Stored assist preference for one sender.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistRecord {
    /// `None` means the sender was never asked.
    #[serde(default)]
    pub assist_enabled: Option<bool>,
    /// When the sender last declined the assist prompt.
    #[serde(default)]
    pub last_denied_at: Option<DateTime<Utc>>,
    /// The inbound message id that last triggered an assist-mode reply,
    /// kept to avoid duplicate offers for the same message.
    #[serde(default)]
    pub last_replied_message_id: Option<String>,
}

/// Opt-in state derived from a stored record plus the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistState {
    /// Sender has never been asked.
    NeverAsked,
    /// Sender accepted continued automated replies.
    OptedIn,
    /// Sender declined and the re-offer cooldown has not expired.
    OptedOutCoolingDown,
    /// Sender declined but the cooldown has expired; may be asked again.
    OptedOutExpired,
}

impl AssistRecord {
    /// Derive the assist state at `now` given the configured re-offer
    /// cooldown.
    pub fn state_at(&self, now: DateTime<Utc>, cooldown_seconds: u64) -> AssistState {
        match self.assist_enabled {
            None => AssistState::NeverAsked,
            Some(true) => AssistState::OptedIn,
            Some(false) => match self.last_denied_at {
                Some(denied) if (now - denied).num_seconds() < cooldown_seconds as i64 => {
                    AssistState::OptedOutCoolingDown
                }
                _ => AssistState::OptedOutExpired,
            },
        }
    }
}

/// Durable map of sender id → assist preference.
pub struct AssistStore {
    path: PathBuf,
    by_sender: HashMap<String, AssistRecord>,
}

impl AssistStore {
    /// Load the store from `path`. Absent or unreadable files yield an
    /// empty map; never fatal.
    pub async fn load(path: PathBuf) -> Self {
        let by_sender = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(map) => map,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Unreadable assist state, starting empty"
                    );
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to read assist state, starting empty"
                );
                HashMap::new()
            }
        };
        Self { path, by_sender }
    }

    /// The sender's record, or the never-asked default.
    pub fn get(&self, sender: &str) -> AssistRecord {
        self.by_sender.get(sender).cloned().unwrap_or_default()
    }

    /// Record an affirmative answer to the assist prompt.
    pub async fn opt_in(&mut self, sender: &str) -> Result<(), StoreError> {
        let record = self.by_sender.entry(sender.to_string()).or_default();
        record.assist_enabled = Some(true);
        record.last_denied_at = None;
        self.persist().await
    }

    /// Record a negative answer, starting the re-offer cooldown at `now`.
    pub async fn opt_out(&mut self, sender: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
        let record = self.by_sender.entry(sender.to_string()).or_default();
        record.assist_enabled = Some(false);
        record.last_denied_at = Some(now);
        self.persist().await
    }

    /// Remember which inbound message last got an assist-mode reply.
    pub async fn mark_replied(
        &mut self,
        sender: &str,
        message_id: &str,
    ) -> Result<(), StoreError> {
        let record = self.by_sender.entry(sender.to_string()).or_default();
        record.last_replied_message_id = Some(message_id.to_string());
        self.persist().await
    }

    async fn persist(&self) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(&self.by_sender)?;
        write_atomic(&self.path, &bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    #[test]
    fn never_asked_by_default() {
        let record = AssistRecord::default();
        assert_eq!(record.state_at(Utc::now(), 3600), AssistState::NeverAsked);
    }

    #[test]
    fn opted_in_state() {
        let record = AssistRecord {
            assist_enabled: Some(true),
            ..Default::default()
        };
        assert_eq!(record.state_at(Utc::now(), 3600), AssistState::OptedIn);
    }

    #[test]
    fn opt_out_cooling_down_then_expired() {
        let now = Utc::now();
        let record = AssistRecord {
            assist_enabled: Some(false),
            last_denied_at: Some(now - Duration::seconds(100)),
            ..Default::default()
        };
        assert_eq!(record.state_at(now, 3600), AssistState::OptedOutCoolingDown);
        assert_eq!(
            record.state_at(now + Duration::seconds(3500), 3600),
            AssistState::OptedOutExpired
        );
    }

    #[test]
    fn opt_out_without_denial_timestamp_counts_as_expired() {
        // Legacy records may carry the flag without a timestamp.
        let record = AssistRecord {
            assist_enabled: Some(false),
            ..Default::default()
        };
        assert_eq!(record.state_at(Utc::now(), 3600), AssistState::OptedOutExpired);
    }

    #[tokio::test]
    async fn opt_in_clears_denial_and_survives_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("assist_state.json");

        let mut store = AssistStore::load(path.clone()).await;
        store.opt_out("628123", Utc::now()).await.unwrap();
        store.opt_in("628123").await.unwrap();
        drop(store);

        let reloaded = AssistStore::load(path).await;
        let record = reloaded.get("628123");
        assert_eq!(record.assist_enabled, Some(true));
        assert!(record.last_denied_at.is_none());
    }

    #[tokio::test]
    async fn opt_out_persists_denial_time() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("assist_state.json");
        let now = Utc::now();

        let mut store = AssistStore::load(path.clone()).await;
        store.opt_out("628123", now).await.unwrap();
        drop(store);

        let reloaded = AssistStore::load(path).await;
        let record = reloaded.get("628123");
        assert_eq!(record.assist_enabled, Some(false));
        assert_eq!(record.last_denied_at, Some(now));
    }

    #[tokio::test]
    async fn mark_replied_tracks_last_message() {
        let dir = TempDir::new().unwrap();
        let mut store = AssistStore::load(dir.path().join("assist_state.json")).await;
        store.mark_replied("628123", "MSG9").await.unwrap();
        assert_eq!(
            store.get("628123").last_replied_message_id.as_deref(),
            Some("MSG9")
        );
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("assist_state.json");
        tokio::fs::write(&path, "[1,2,3]").await.unwrap();
        let store = AssistStore::load(path).await;
        assert!(store.get("anyone").assist_enabled.is_none());
    }
}
