//! Admin command interpreter.
//!
//! Input is the admin's raw text with the `!` prefix stripped; output is
//! exactly one reply. Grammar: `command [subcommand] [argument]`,
//! case-insensitive command name, whitespace-delimited. Malformed input
//! yields a usage reply and leaves the configuration unchanged. Every
//! successful mutation is persisted before the acknowledgment is returned.

use std::collections::BTreeSet;

use crate::config::{BotConfig, BotMode, ConfigStore};
use crate::error::ConfigError;

const UNRECOGNIZED: &str =
    "Perintah admin tidak dikenali. Ketik !show untuk melihat konfigurasi saat ini.";

/// Execute one admin command (prefix already stripped).
pub async fn execute(store: &mut ConfigStore, input: &str) -> Result<String, ConfigError> {
    let mut parts = input.split_whitespace();
    let Some(command) = parts.next() else {
        return Ok(UNRECOGNIZED.to_string());
    };
    let args: Vec<&str> = parts.collect();

    match command.to_lowercase().as_str() {
        "status" => status(store, &args).await,
        "whitelist" => edit_list(store, ListKind::Whitelist, &args).await,
        "blacklist" => edit_list(store, ListKind::Blacklist, &args).await,
        "admin" => edit_list(store, ListKind::Admins, &args).await,
        "suppress" => suppress(store, &args).await,
        "autoreply" => autoreply(store, &args).await,
        "cooldown" => cooldown(store, &args).await,
        "show" => Ok(render(store.get())),
        _ => Ok(UNRECOGNIZED.to_string()),
    }
}

async fn status(store: &mut ConfigStore, args: &[&str]) -> Result<String, ConfigError> {
    let Some(mode) = args.first().and_then(|v| BotMode::parse(v)) else {
        return Ok("Gunakan: !status online|offline|busy".to_string());
    };
    store.update(|c| c.mode = mode).await?;
    Ok(format!("✅ Mode berhasil diubah menjadi: {}", mode.as_str()))
}

/// Which sender set a list command targets.
#[derive(Debug, Clone, Copy)]
enum ListKind {
    Whitelist,
    Blacklist,
    Admins,
}

impl ListKind {
    fn target<'a>(&self, config: &'a mut BotConfig) -> &'a mut BTreeSet<String> {
        match self {
            Self::Whitelist => &mut config.whitelist,
            Self::Blacklist => &mut config.blacklist,
            Self::Admins => &mut config.admin_numbers,
        }
    }

    fn usage(&self) -> &'static str {
        match self {
            Self::Whitelist => "Gunakan: !whitelist add|remove <nomor>",
            Self::Blacklist => "Gunakan: !blacklist add|remove <nomor>",
            Self::Admins => "Gunakan: !admin add|remove <nomor>",
        }
    }

    fn added_ack(&self, number: &str) -> String {
        match self {
            Self::Whitelist => format!("➕ Nomor {number} berhasil ditambahkan ke whitelist."),
            Self::Blacklist => format!("⛔ Nomor {number} berhasil ditambahkan ke blacklist."),
            Self::Admins => format!("🔐 Nomor {number} berhasil ditambahkan sebagai admin."),
        }
    }

    fn removed_ack(&self, number: &str) -> String {
        match self {
            Self::Whitelist => format!("➖ Nomor {number} dihapus dari whitelist."),
            Self::Blacklist => format!("✔️ Nomor {number} telah dihapus dari blacklist."),
            Self::Admins => format!("🔓 Nomor {number} telah dihapus dari admin."),
        }
    }
}

async fn edit_list(
    store: &mut ConfigStore,
    kind: ListKind,
    args: &[&str],
) -> Result<String, ConfigError> {
    match (args.first().copied(), args.get(1).copied()) {
        (Some("add"), Some(number)) => {
            store
                .update(|c| {
                    kind.target(c).insert(number.to_string());
                })
                .await?;
            Ok(kind.added_ack(number))
        }
        (Some("remove"), Some(number)) => {
            store
                .update(|c| {
                    kind.target(c).remove(number);
                })
                .await?;
            Ok(kind.removed_ack(number))
        }
        _ => Ok(kind.usage().to_string()),
    }
}

async fn suppress(store: &mut ConfigStore, args: &[&str]) -> Result<String, ConfigError> {
    match args.first().copied() {
        Some("on") | Some("off") => {
            let enabled = args[0] == "on";
            store
                .update(|c| c.suppress_when_owner_active = enabled)
                .await?;
            Ok(format!(
                "🔕 suppressWhenOwnerActive sudah {}",
                if enabled { "ON" } else { "OFF" }
            ))
        }
        Some("timeout") => {
            let Some(seconds) = args.get(1).and_then(|v| v.parse::<u64>().ok()) else {
                return Ok(
                    "Gunakan: !suppress timeout <detik> (contoh: !suppress timeout 120)"
                        .to_string(),
                );
            };
            store.update(|c| c.suppress_timeout_seconds = seconds).await?;
            Ok(format!("⏱️ suppressTimeoutSeconds diset ke {seconds} detik"))
        }
        _ => Ok("Gunakan: !suppress on|off atau !suppress timeout <detik>".to_string()),
    }
}

async fn autoreply(store: &mut ConfigStore, args: &[&str]) -> Result<String, ConfigError> {
    match args.first().copied() {
        Some("on") | Some("off") => {
            let enabled = args[0] == "on";
            store.update(|c| c.auto_reply = enabled).await?;
            Ok(format!(
                "🔁 Auto-reply sekarang: {}",
                if enabled { "ON" } else { "OFF" }
            ))
        }
        _ => Ok("Gunakan: !autoreply on|off".to_string()),
    }
}

async fn cooldown(store: &mut ConfigStore, args: &[&str]) -> Result<String, ConfigError> {
    let Some(seconds) = args.first().and_then(|v| v.parse::<u64>().ok()) else {
        return Ok("Gunakan: !cooldown <detik> (contoh: !cooldown 60)".to_string());
    };
    store.update(|c| c.reply_cooldown_seconds = seconds).await?;
    Ok(format!("⏱️ cooldown reply diset ke {seconds} detik"))
}

fn join_or_dash(set: &BTreeSet<String>) -> String {
    if set.is_empty() {
        "-".to_string()
    } else {
        set.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Render the current configuration as a chat message.
fn render(config: &BotConfig) -> String {
    format!(
        "📋 Config saat ini:\n\
         • mode: {}\n\
         • ownerName: {}\n\
         • whitelist: {}\n\
         • blacklist: {}\n\
         • adminNumbers: {}\n\
         • suppressWhenOwnerActive: {}\n\
         • suppressTimeoutSeconds: {}\n\
         • autoReply: {}\n\
         • replyCooldownSeconds: {}\n\
         • assistCooldownSeconds: {}\n\
         • ownerIdleSeconds: {}",
        config.mode.as_str(),
        config.owner_name,
        join_or_dash(&config.whitelist),
        join_or_dash(&config.blacklist),
        join_or_dash(&config.admin_numbers),
        config.suppress_when_owner_active,
        config.suppress_timeout_seconds,
        config.auto_reply,
        config.reply_cooldown_seconds,
        config.assist_cooldown_seconds,
        config.owner_idle_seconds,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_store() -> (ConfigStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::load(dir.path().join("bot_config.json"))
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn status_sets_mode() {
        let (mut store, _dir) = test_store().await;
        let reply = execute(&mut store, "status offline").await.unwrap();
        assert!(reply.contains("offline"));
        assert_eq!(store.get().mode, BotMode::Offline);
    }

    #[tokio::test]
    async fn status_is_case_insensitive() {
        let (mut store, _dir) = test_store().await;
        execute(&mut store, "STATUS Busy").await.unwrap();
        assert_eq!(store.get().mode, BotMode::Busy);
    }

    #[tokio::test]
    async fn status_rejects_unknown_mode() {
        let (mut store, _dir) = test_store().await;
        let reply = execute(&mut store, "status away").await.unwrap();
        assert!(reply.starts_with("Gunakan"));
        assert_eq!(store.get().mode, BotMode::Online);
    }

    #[tokio::test]
    async fn whitelist_add_and_remove() {
        let (mut store, _dir) = test_store().await;
        execute(&mut store, "whitelist add 628123").await.unwrap();
        assert!(store.get().whitelist.contains("628123"));

        execute(&mut store, "whitelist remove 628123").await.unwrap();
        assert!(!store.get().whitelist.contains("628123"));
    }

    #[tokio::test]
    async fn whitelist_add_without_number_is_usage_and_unchanged() {
        let (mut store, _dir) = test_store().await;
        let before = store.get().whitelist.clone();
        let reply = execute(&mut store, "whitelist add").await.unwrap();
        assert!(reply.starts_with("Gunakan"));
        assert_eq!(store.get().whitelist, before);
    }

    #[tokio::test]
    async fn blacklist_and_admin_lists() {
        let (mut store, _dir) = test_store().await;
        execute(&mut store, "blacklist add 628999").await.unwrap();
        execute(&mut store, "admin add 628111").await.unwrap();
        assert!(store.get().blacklist.contains("628999"));
        assert!(store.get().is_admin("628111"));
    }

    #[tokio::test]
    async fn suppress_on_off_and_timeout() {
        let (mut store, _dir) = test_store().await;
        execute(&mut store, "suppress on").await.unwrap();
        assert!(store.get().suppress_when_owner_active);

        execute(&mut store, "suppress timeout 300").await.unwrap();
        assert_eq!(store.get().suppress_timeout_seconds, 300);

        execute(&mut store, "suppress off").await.unwrap();
        assert!(!store.get().suppress_when_owner_active);
    }

    #[tokio::test]
    async fn suppress_timeout_rejects_non_numeric() {
        let (mut store, _dir) = test_store().await;
        let reply = execute(&mut store, "suppress timeout soon").await.unwrap();
        assert!(reply.starts_with("Gunakan"));
        assert_eq!(store.get().suppress_timeout_seconds, 120);
    }

    #[tokio::test]
    async fn cooldown_rejects_negative_numbers() {
        let (mut store, _dir) = test_store().await;
        let reply = execute(&mut store, "cooldown -5").await.unwrap();
        assert!(reply.starts_with("Gunakan"));
        assert_eq!(store.get().reply_cooldown_seconds, 60);
    }

    #[tokio::test]
    async fn cooldown_persists_before_ack() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bot_config.json");
        let mut store = ConfigStore::load(path.clone()).await.unwrap();

        let reply = execute(&mut store, "cooldown 45").await.unwrap();
        assert!(reply.contains("45"));

        // simulated restart: the acknowledged value must be on disk
        let reloaded = ConfigStore::load(path).await.unwrap();
        assert_eq!(reloaded.get().reply_cooldown_seconds, 45);
    }

    #[tokio::test]
    async fn autoreply_toggles() {
        let (mut store, _dir) = test_store().await;
        execute(&mut store, "autoreply off").await.unwrap();
        assert!(!store.get().auto_reply);
        execute(&mut store, "autoreply on").await.unwrap();
        assert!(store.get().auto_reply);
    }

    #[tokio::test]
    async fn show_lists_every_policy_field() {
        let (mut store, _dir) = test_store().await;
        execute(&mut store, "whitelist add 628123").await.unwrap();
        let reply = execute(&mut store, "show").await.unwrap();
        assert!(reply.contains("mode: online"));
        assert!(reply.contains("whitelist: 628123"));
        assert!(reply.contains("blacklist: -"));
        assert!(reply.contains("replyCooldownSeconds: 60"));
        assert!(reply.contains("ownerIdleSeconds: 30"));
    }

    #[tokio::test]
    async fn unrecognized_command_gets_fallback_reply() {
        let (mut store, _dir) = test_store().await;
        let reply = execute(&mut store, "reboot now").await.unwrap();
        assert_eq!(reply, UNRECOGNIZED);
    }

    #[tokio::test]
    async fn empty_input_gets_fallback_reply() {
        let (mut store, _dir) = test_store().await;
        let reply = execute(&mut store, "   ").await.unwrap();
        assert_eq!(reply, UNRECOGNIZED);
    }
}
