//! Shared runtime context.
//!
//! Explicit handles to every store and tracker, threaded into the decision
//! pipeline and command interpreter instead of module-level globals. The
//! event loop is the only writer; the health surface takes read snapshots.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tokio::sync::RwLock;

use crate::config::ConfigStore;
use crate::cooldown::CooldownTracker;
use crate::presence::PresenceTracker;
use crate::store::{AssistStore, ReplyLedger};

/// Handles to all mutable bot state.
pub struct BotContext {
    pub config: RwLock<ConfigStore>,
    pub ledger: RwLock<ReplyLedger>,
    pub assist: RwLock<AssistStore>,
    pub presence: RwLock<PresenceTracker>,
    pub cooldown: RwLock<CooldownTracker>,
    /// Whether the transport connection is currently established.
    pub connected: AtomicBool,
}

impl BotContext {
    pub fn new(config: ConfigStore, ledger: ReplyLedger, assist: AssistStore) -> Arc<Self> {
        Arc::new(Self {
            config: RwLock::new(config),
            ledger: RwLock::new(ledger),
            assist: RwLock::new(assist),
            presence: RwLock::new(PresenceTracker::new()),
            cooldown: RwLock::new(CooldownTracker::new()),
            connected: AtomicBool::new(false),
        })
    }
}
