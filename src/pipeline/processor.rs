//! Decision pipeline — one ordered pass per inbound event.
//!
//! Gate order is enforced in this single function: structural filters →
//! idempotency → assist opt-in/out intercept → admin commands → blacklist →
//! whitelist → owner-active suppression → kill switch → assist decision →
//! cooldown → template selection and dispatch → commit. Any failing gate
//! ends the pass with no side effects.
//!
//! Ordering notes: opt-in/out keywords preempt everything so a sender
//! declining assist never also gets a templated reply in the same turn;
//! admin commands preempt the blacklist/whitelist; the cooldown is checked
//! before send so a throttled message never consumes a ledger slot.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use chrono::{DateTime, Local, Timelike, Utc};
use futures::StreamExt;
use tracing::{debug, error, info, warn};

use crate::commands;
use crate::config::BotConfig;
use crate::context::BotContext;
use crate::error::PipelineError;
use crate::pipeline::templates;
use crate::presence::PresenceSignal;
use crate::store::AssistState;
use crate::transport::{
    ConnectionUpdate, EventStream, InboundMessage, MessageStatus, MessageStatusUpdate,
    OutboundMessage, PresenceUpdate, ReconnectPolicy, Transport, TransportEvent,
};

/// Affirmative responses to the assist prompt (button id or typed text).
const ASSIST_YES: &[&str] = &["assist_yes", "iya", "yes"];

/// Negative responses to the assist prompt.
const ASSIST_NO: &[&str] = &["assist_no", "tidak", "no"];

/// Prefix for privileged admin commands.
const COMMAND_PREFIX: char = '!';

/// What the caller should do after an event has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Non-terminal disconnect; wait and let the transport re-establish.
    Reconnect,
    /// Explicit logout; stop the process.
    Shutdown,
}

/// What the assist state machine wants for an eligible message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssistDisposition {
    PlainReply,
    OfferPrompt,
    Suppress,
}

fn assist_disposition(state: AssistState) -> AssistDisposition {
    match state {
        AssistState::OptedIn => AssistDisposition::PlainReply,
        AssistState::OptedOutCoolingDown => AssistDisposition::Suppress,
        AssistState::NeverAsked | AssistState::OptedOutExpired => AssistDisposition::OfferPrompt,
    }
}

/// The orchestrator: applies every policy gate to each inbound event and
/// invokes the transport on a reply outcome.
pub struct DecisionPipeline {
    ctx: Arc<BotContext>,
    transport: Arc<dyn Transport>,
    owner_id: String,
}

impl DecisionPipeline {
    pub fn new(
        ctx: Arc<BotContext>,
        transport: Arc<dyn Transport>,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            ctx,
            transport,
            owner_id: owner_id.into(),
        }
    }

    /// Drive the pipeline from an event stream until logout or stream end.
    ///
    /// Reconnects after non-terminal disconnects are paced by `policy`; the
    /// retry budget resets once a connection re-opens.
    pub async fn run(&self, mut events: EventStream, policy: ReconnectPolicy) {
        let mut attempts = 0u32;
        while let Some(event) = events.next().await {
            let reopened = matches!(
                event,
                TransportEvent::Connection(ConnectionUpdate::Open { .. })
            );
            match self.handle_event(event).await {
                Flow::Continue => {
                    if reopened {
                        attempts = 0;
                    }
                }
                Flow::Reconnect => {
                    attempts += 1;
                    if attempts > policy.max_attempts {
                        error!(attempts, "Reconnect budget exhausted, stopping");
                        break;
                    }
                    warn!(
                        attempt = attempts,
                        delay_secs = policy.delay.as_secs(),
                        "Waiting before reconnect"
                    );
                    tokio::time::sleep(policy.delay).await;
                }
                Flow::Shutdown => break,
            }
        }
        info!("Event loop stopped");
    }

    /// Handle one transport event. Errors are logged at this boundary and
    /// the event dropped; only an explicit logout stops the loop.
    pub async fn handle_event(&self, event: TransportEvent) -> Flow {
        match event {
            TransportEvent::Presence(update) => {
                self.observe_presence(update).await;
                Flow::Continue
            }
            TransportEvent::MessageStatus(update) => {
                self.observe_status(update).await;
                Flow::Continue
            }
            TransportEvent::Connection(update) => self.handle_connection(update).await,
            TransportEvent::Message(message) => {
                if let Err(e) = self.handle_message(&message, Utc::now()).await {
                    error!(
                        sender = %message.sender_id,
                        id = %message.message_id,
                        error = %e,
                        "Failed to handle inbound message"
                    );
                }
                Flow::Continue
            }
        }
    }

    /// Run one inbound message through every gate.
    ///
    /// `now` is injected so the gates are deterministic under test.
    pub async fn handle_message(
        &self,
        message: &InboundMessage,
        now: DateTime<Utc>,
    ) -> Result<(), PipelineError> {
        // Gate 1: structural filters. Self check comes first: any outgoing
        // message from the owner account is an activity signal, textual or
        // not.
        if message.is_from_self {
            self.ctx
                .presence
                .write()
                .await
                .observe(PresenceSignal::OwnerMessage, now);
            return Ok(());
        }
        let Some(raw_text) = message.payload.text() else {
            debug!(id = %message.message_id, "No textual payload, skipping");
            return Ok(());
        };
        if message.is_group {
            debug!(sender = %message.sender_id, "Group chat message, skipping");
            return Ok(());
        }
        if message.sender_id == self.owner_id {
            debug!("Message in the owner's self-chat, skipping");
            return Ok(());
        }
        let text = raw_text.trim();

        info!(sender = %message.sender_id, id = %message.message_id, "Inbound message");

        // Gate 2: idempotency.
        if self
            .ctx
            .ledger
            .read()
            .await
            .contains(&message.sender_id, &message.message_id)
        {
            debug!(
                sender = %message.sender_id,
                id = %message.message_id,
                "Already replied to this message, skipping"
            );
            return Ok(());
        }

        let config = self.ctx.config.read().await.get().clone();

        // Gate 3: assist opt-in/out intercept. Checked before admin parsing
        // and before any list filtering.
        let normalized = text.to_lowercase();
        if ASSIST_YES.contains(&normalized.as_str()) {
            self.ctx.assist.write().await.opt_in(&message.sender_id).await?;
            info!(sender = %message.sender_id, "Sender opted in to assist replies");
            self.send_or_log(
                &message.sender_id,
                OutboundMessage::text(templates::assist_opt_in_ack()),
            )
            .await;
            return Ok(());
        }
        if ASSIST_NO.contains(&normalized.as_str()) {
            self.ctx
                .assist
                .write()
                .await
                .opt_out(&message.sender_id, now)
                .await?;
            info!(sender = %message.sender_id, "Sender opted out of assist replies");
            let minutes = config.assist_cooldown_seconds.div_ceil(60);
            self.send_or_log(
                &message.sender_id,
                OutboundMessage::text(templates::assist_opt_out_ack(minutes)),
            )
            .await;
            return Ok(());
        }

        // Gate 4: admin commands. Admins are not subject to the lists below.
        if config.is_admin(&message.sender_id)
            && let Some(body) = text.strip_prefix(COMMAND_PREFIX)
        {
            let reply = {
                let mut store = self.ctx.config.write().await;
                commands::execute(&mut store, body).await?
            };
            info!(sender = %message.sender_id, "Admin command handled");
            self.send_or_log(&message.sender_id, OutboundMessage::text(reply))
                .await;
            return Ok(());
        }

        // Gate 5: blacklist, checked before the whitelist.
        if config.blacklist.contains(&message.sender_id) {
            debug!(sender = %message.sender_id, "Sender in blacklist, skipping");
            return Ok(());
        }

        // Gate 6: non-empty whitelist is an allow-list.
        if !config.whitelist.is_empty() && !config.whitelist.contains(&message.sender_id) {
            debug!(sender = %message.sender_id, "Sender not in whitelist, skipping");
            return Ok(());
        }

        let presence = self.ctx.presence.read().await.clone();

        // Gate 7: owner-active suppression window.
        if config.suppress_when_owner_active
            && presence.active_within(config.suppress_timeout_seconds, now)
        {
            debug!(
                sender = %message.sender_id,
                "Owner active recently, suppressing auto-reply"
            );
            return Ok(());
        }

        // Gate 8: global kill switch.
        if !config.auto_reply {
            debug!(sender = %message.sender_id, "Auto-reply disabled, skipping");
            return Ok(());
        }

        // Gate 9: assist decision. Engages only while the owner is online
        // but idle; otherwise the message gets a plain reply.
        let assist_engaged = presence.owner_online()
            && presence.idle_for_more_than(config.owner_idle_seconds, now);
        let mut offer_assist = false;
        if assist_engaged {
            let record = self.ctx.assist.read().await.get(&message.sender_id);
            if record.last_replied_message_id.as_deref() == Some(message.message_id.as_str()) {
                debug!(
                    sender = %message.sender_id,
                    id = %message.message_id,
                    "Assist reply already sent for this message, skipping"
                );
                return Ok(());
            }
            match assist_disposition(record.state_at(now, config.assist_cooldown_seconds)) {
                AssistDisposition::Suppress => {
                    debug!(
                        sender = %message.sender_id,
                        "Assist declined and still cooling down, skipping"
                    );
                    return Ok(());
                }
                AssistDisposition::PlainReply => {}
                AssistDisposition::OfferPrompt => offer_assist = true,
            }
        }

        // Gate 10: per-sender cooldown, checked before send so a throttled
        // message never consumes a ledger slot.
        if self
            .ctx
            .cooldown
            .read()
            .await
            .is_throttled(&message.sender_id, config.reply_cooldown_seconds, now)
        {
            debug!(sender = %message.sender_id, "Within reply cooldown, skipping");
            return Ok(());
        }

        // Gate 11: template selection and dispatch.
        let outbound = self.compose_reply(&config, text, offer_assist);
        if let Err(e) = self.transport.send(&message.sender_id, outbound).await {
            // Transient transport fault: the reply is abandoned, nothing is
            // committed, and the message stays unanswered.
            warn!(
                sender = %message.sender_id,
                error = %e,
                "Send failed, dropping reply without commit"
            );
            return Ok(());
        }

        // Gate 12: commit only after a successful dispatch.
        self.ctx
            .cooldown
            .write()
            .await
            .mark_replied(&message.sender_id, now);
        self.ctx
            .ledger
            .write()
            .await
            .record(&message.sender_id, &message.message_id)
            .await?;
        if assist_engaged {
            self.ctx
                .assist
                .write()
                .await
                .mark_replied(&message.sender_id, &message.message_id)
                .await?;
        }

        info!(
            sender = %message.sender_id,
            id = %message.message_id,
            mode = config.mode.as_str(),
            assist_offer = offer_assist,
            "Replied"
        );
        Ok(())
    }

    fn compose_reply(&self, config: &BotConfig, text: &str, offer_assist: bool) -> OutboundMessage {
        let hour = Local::now().hour();
        let body = templates::compose(config.mode, hour, text, &config.owner_name);
        if offer_assist {
            OutboundMessage::with_prompt(body, templates::assist_prompt())
        } else {
            OutboundMessage::text(body)
        }
    }

    async fn observe_presence(&self, update: PresenceUpdate) {
        // Only presence updates naming the owner feed the tracker.
        if update.participant_id != self.owner_id {
            return;
        }
        let available = update.available || update.composing;
        debug!(available, "Owner presence update");
        self.ctx
            .presence
            .write()
            .await
            .observe(PresenceSignal::OwnerPresence { available }, Utc::now());
    }

    async fn observe_status(&self, update: MessageStatusUpdate) {
        // Read receipts and self-originated status events count as owner
        // activity.
        if update.from_self || update.status == MessageStatus::Read {
            self.ctx
                .presence
                .write()
                .await
                .observe(PresenceSignal::OwnerReceipt, Utc::now());
        }
    }

    async fn handle_connection(&self, update: ConnectionUpdate) -> Flow {
        match update {
            ConnectionUpdate::Open { owner_name } => {
                info!("Transport connection established");
                self.ctx.connected.store(true, Ordering::Relaxed);
                // Adopt the account profile name while the config still
                // holds the placeholder.
                if let Some(name) = owner_name {
                    let mut store = self.ctx.config.write().await;
                    if store.get().owner_name == BotConfig::DEFAULT_OWNER_NAME {
                        if let Err(e) = store.update(|c| c.owner_name = name).await {
                            warn!(error = %e, "Failed to persist owner name from session");
                        }
                    }
                }
                Flow::Continue
            }
            ConnectionUpdate::Closed { reason } => {
                self.ctx.connected.store(false, Ordering::Relaxed);
                if reason.is_terminal() {
                    error!(
                        "Logged out by the server. Remove the session credentials and \
                         re-pair before restarting."
                    );
                    Flow::Shutdown
                } else {
                    warn!(?reason, "Connection closed, scheduling reconnect");
                    Flow::Reconnect
                }
            }
        }
    }

    /// Send a reply, logging (not propagating) a transport failure.
    async fn send_or_log(&self, recipient: &str, message: OutboundMessage) {
        if let Err(e) = self.transport.send(recipient, message).await {
            warn!(recipient = %recipient, error = %e, "Failed to send reply");
        }
    }
}
