//! Idempotency ledger — at-most-once reply per inbound message.
//!
//! Keys are `sender:message_id` composites. Once recorded, a key is never
//! removed, so a message answered before a restart stays answered after it.
//! Growth is bounded only by storage, which is acceptable for a personal
//! account.

use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::warn;

use crate::error::StoreError;
use crate::store::write_atomic;

/// Durable set of already-answered `(sender, message_id)` pairs.
pub struct ReplyLedger {
    path: PathBuf,
    keys: BTreeSet<String>,
}

impl ReplyLedger {
    /// Load the ledger from `path`. Absent or unreadable files yield an
    /// empty ledger (the latter with a warning); neither is fatal.
    pub async fn load(path: PathBuf) -> Self {
        let keys = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(entries) => entries.into_iter().collect(),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Unreadable reply ledger, starting empty"
                    );
                    BTreeSet::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to read reply ledger, starting empty"
                );
                BTreeSet::new()
            }
        };
        Self { path, keys }
    }

    fn key(sender: &str, message_id: &str) -> String {
        format!("{sender}:{message_id}")
    }

    /// Whether this exact inbound message has already been answered.
    pub fn contains(&self, sender: &str, message_id: &str) -> bool {
        self.keys.contains(&Self::key(sender, message_id))
    }

    /// Record a dispatched reply and persist the ledger.
    pub async fn record(&mut self, sender: &str, message_id: &str) -> Result<(), StoreError> {
        self.keys.insert(Self::key(sender, message_id));
        self.persist().await
    }

    /// Number of answered messages.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    async fn persist(&self) -> Result<(), StoreError> {
        let entries: Vec<&String> = self.keys.iter().collect();
        let bytes = serde_json::to_vec_pretty(&entries)?;
        write_atomic(&self.path, &bytes).await?;
        Ok(())
    }
}
