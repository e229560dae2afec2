//! Health endpoint for supervision.
//!
//! One read-only route; it never mutates bot state.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Instant;

use axum::{Json, Router, extract::State, routing::get};
use serde_json::json;

use crate::context::BotContext;

#[derive(Clone)]
pub struct HealthState {
    ctx: Arc<BotContext>,
    started_at: Instant,
}

/// Build the health router.
pub fn router(ctx: Arc<BotContext>) -> Router {
    let state = HealthState {
        ctx,
        started_at: Instant::now(),
    };
    Router::new().route("/health", get(health)).with_state(state)
}

async fn health(State(state): State<HealthState>) -> Json<serde_json::Value> {
    let last_owner_active_at = state.ctx.presence.read().await.last_owner_active_at();
    let ledger_entries = state.ctx.ledger.read().await.len();
    Json(json!({
        "status": "ok",
        "service": "wa-assist",
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "connected": state.ctx.connected.load(Ordering::Relaxed),
        "last_owner_active_at": last_owner_active_at,
        "ledger_entries": ledger_entries,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigStore;
    use crate::store::{AssistStore, ReplyLedger};
    use tempfile::TempDir;

    #[tokio::test]
    async fn health_reports_disconnected_fresh_state() {
        let dir = TempDir::new().unwrap();
        let config = ConfigStore::load(dir.path().join("bot_config.json"))
            .await
            .unwrap();
        let ledger = ReplyLedger::load(dir.path().join("replied.json")).await;
        let assist = AssistStore::load(dir.path().join("assist_state.json")).await;
        let ctx = BotContext::new(config, ledger, assist);

        let state = HealthState {
            ctx,
            started_at: Instant::now(),
        };
        let Json(body) = health(State(state)).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["connected"], false);
        assert_eq!(body["ledger_entries"], 0);
        assert!(body["last_owner_active_at"].is_null());
    }
}
