//! Operational policy record and its durable store.
//!
//! The configuration is the process's policy-of-record: it is read by every
//! gate in the decision pipeline and mutated only through admin commands.
//! Mutations go through [`ConfigStore::update`], which persists before
//! returning, so an acknowledgment can never be sent for a write that was
//! lost (write-then-ack ordering).

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::store::write_atomic;

/// Operating mode advertised to remote parties.
///
/// `Busy` templates identically to `Online`; it exists so the owner can
/// signal intent without changing reply behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotMode {
    Online,
    Offline,
    Busy,
}

impl BotMode {
    /// Parse a mode name, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "online" => Some(Self::Online),
            "offline" => Some(Self::Offline),
            "busy" => Some(Self::Busy),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Busy => "busy",
        }
    }
}

/// Mutable operational policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Owner availability mode used for templating.
    pub mode: BotMode,
    /// Display name substituted into reply templates.
    pub owner_name: String,
    /// If non-empty, only these senders are answered.
    pub whitelist: BTreeSet<String>,
    /// Senders never answered. Checked before the whitelist.
    pub blacklist: BTreeSet<String>,
    /// Senders authorized to issue `!` commands.
    pub admin_numbers: BTreeSet<String>,
    /// Withhold auto-replies shortly after detected owner activity.
    pub suppress_when_owner_active: bool,
    /// Length of the owner-activity suppression window, in seconds.
    pub suppress_timeout_seconds: u64,
    /// Global kill switch for non-admin auto-replies.
    pub auto_reply: bool,
    /// Minimum spacing between automated replies to the same sender.
    pub reply_cooldown_seconds: u64,
    /// Minimum time before re-offering the assist prompt to a sender who
    /// declined it.
    pub assist_cooldown_seconds: u64,
    /// Idle threshold defining "owner online but not actively viewing".
    pub owner_idle_seconds: u64,
}

impl BotConfig {
    /// Placeholder owner name, replaced by the account profile name on the
    /// first connect that reports one.
    pub const DEFAULT_OWNER_NAME: &'static str = "Nama";

    /// Whether the sender may issue admin commands.
    pub fn is_admin(&self, sender: &str) -> bool {
        self.admin_numbers.contains(sender)
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            mode: BotMode::Online,
            owner_name: Self::DEFAULT_OWNER_NAME.to_string(),
            whitelist: BTreeSet::new(),
            blacklist: BTreeSet::new(),
            admin_numbers: BTreeSet::new(),
            suppress_when_owner_active: false,
            suppress_timeout_seconds: 120,
            auto_reply: true,
            reply_cooldown_seconds: 60,
            assist_cooldown_seconds: 3600,
            owner_idle_seconds: 30,
        }
    }
}

/// Durable store for the policy record.
pub struct ConfigStore {
    path: PathBuf,
    config: BotConfig,
}

impl ConfigStore {
    /// Load the configuration from `path`.
    ///
    /// A missing file is created with defaults; an unreadable one falls back
    /// to defaults with a warning. Neither case is fatal.
    pub async fn load(path: PathBuf) -> Result<Self, ConfigError> {
        let config = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(config) => config,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Unreadable configuration, falling back to defaults"
                    );
                    BotConfig::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BotConfig::default(),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to read configuration, falling back to defaults"
                );
                BotConfig::default()
            }
        };

        let store = Self { path, config };
        store.save().await?;
        Ok(store)
    }

    /// Current policy snapshot.
    pub fn get(&self) -> &BotConfig {
        &self.config
    }

    /// Apply a mutation and persist it before returning.
    pub async fn update<F>(&mut self, mutate: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut BotConfig),
    {
        mutate(&mut self.config);
        self.save().await
    }

    async fn save(&self) -> Result<(), ConfigError> {
        let bytes = serde_json::to_vec_pretty(&self.config)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        write_atomic(&self.path, &bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_documented_policy() {
        let config = BotConfig::default();
        assert_eq!(config.mode, BotMode::Online);
        assert_eq!(config.owner_name, "Nama");
        assert!(config.whitelist.is_empty());
        assert!(config.blacklist.is_empty());
        assert!(!config.suppress_when_owner_active);
        assert_eq!(config.suppress_timeout_seconds, 120);
        assert!(config.auto_reply);
        assert_eq!(config.reply_cooldown_seconds, 60);
        assert_eq!(config.assist_cooldown_seconds, 3600);
        assert_eq!(config.owner_idle_seconds, 30);
    }

    #[test]
    fn mode_parse_is_case_insensitive() {
        assert_eq!(BotMode::parse("Online"), Some(BotMode::Online));
        assert_eq!(BotMode::parse("OFFLINE"), Some(BotMode::Offline));
        assert_eq!(BotMode::parse("busy"), Some(BotMode::Busy));
        assert_eq!(BotMode::parse("away"), None);
    }

    #[tokio::test]
    async fn load_creates_default_file_when_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bot_config.json");
        let store = ConfigStore::load(path.clone()).await.unwrap();
        assert_eq!(store.get().mode, BotMode::Online);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn load_falls_back_to_defaults_on_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bot_config.json");
        tokio::fs::write(&path, "{not json").await.unwrap();
        let store = ConfigStore::load(path).await.unwrap();
        assert_eq!(store.get().reply_cooldown_seconds, 60);
    }

    #[tokio::test]
    async fn update_persists_across_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bot_config.json");

        let mut store = ConfigStore::load(path.clone()).await.unwrap();
        store
            .update(|c| c.reply_cooldown_seconds = 45)
            .await
            .unwrap();

        let reloaded = ConfigStore::load(path).await.unwrap();
        assert_eq!(reloaded.get().reply_cooldown_seconds, 45);
    }

    #[tokio::test]
    async fn partial_file_fills_missing_fields_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bot_config.json");
        tokio::fs::write(&path, r#"{"mode":"offline","owner_name":"Budi"}"#)
            .await
            .unwrap();
        let store = ConfigStore::load(path).await.unwrap();
        assert_eq!(store.get().mode, BotMode::Offline);
        assert_eq!(store.get().owner_name, "Budi");
        assert_eq!(store.get().assist_cooldown_seconds, 3600);
    }
}
