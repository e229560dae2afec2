//! Transport seam — events from and sends to the messaging client.
//!
//! The protocol client itself (connection lifecycle, credential persistence,
//! QR pairing, wire encoding) is an external collaborator. The engine
//! consumes its normalized event stream and invokes [`Transport::send`];
//! nothing here speaks the wire protocol.

pub mod console;

pub use console::ConsoleTransport;

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

// ── Inbound events ──────────────────────────────────────────────────

/// Message body shapes the engine knows how to read.
///
/// Anything else is `Unsupported` and dropped by the structural filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessagePayload {
    Text { body: String },
    QuotedText { body: String },
    ImageCaption { caption: String },
    VideoCaption { caption: String },
    /// A tapped button or selected list row from a prompt we sent.
    PromptResponse { selected_id: String },
    Unsupported,
}

impl MessagePayload {
    /// Extract the textual content, if this shape carries one.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text { body } | Self::QuotedText { body } => Some(body),
            Self::ImageCaption { caption } | Self::VideoCaption { caption } => Some(caption),
            Self::PromptResponse { selected_id } => Some(selected_id),
            Self::Unsupported => None,
        }
    }
}

/// One normalized inbound message.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub sender_id: String,
    pub message_id: String,
    pub payload: MessagePayload,
    pub is_group: bool,
    pub is_from_self: bool,
}

/// A presence update for one conversation participant.
#[derive(Debug, Clone)]
pub struct PresenceUpdate {
    pub participant_id: String,
    pub available: bool,
    /// Typing indicator; counts as availability.
    pub composing: bool,
}

/// Delivery state carried by a message-status event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStatus {
    Delivered,
    Read,
}

/// A message-status update (delivery/read receipts).
#[derive(Debug, Clone)]
pub struct MessageStatusUpdate {
    pub participant_id: String,
    pub status: MessageStatus,
    /// Whether the status event originated from the owner account.
    pub from_self: bool,
}

/// Why the transport connection closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Explicit logout — terminal; the process must stop, not reconnect.
    LoggedOut,
    ConnectionLost,
    Unknown,
}

impl DisconnectReason {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::LoggedOut)
    }
}

/// Connection lifecycle events.
#[derive(Debug, Clone)]
pub enum ConnectionUpdate {
    /// Connection established. Carries the account profile name when the
    /// session reports one.
    Open { owner_name: Option<String> },
    Closed { reason: DisconnectReason },
}

/// The unioned event stream consumed by the decision pipeline.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Message(InboundMessage),
    Presence(PresenceUpdate),
    MessageStatus(MessageStatusUpdate),
    Connection(ConnectionUpdate),
}

/// Stream of transport events, processed one at a time in arrival order.
pub type EventStream = Pin<Box<dyn Stream<Item = TransportEvent> + Send>>;

// ── Outbound ────────────────────────────────────────────────────────

/// One option of a binary prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptOption {
    pub id: String,
    pub label: String,
}

/// A yes/no control attached below a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyPrompt {
    pub footer: String,
    pub options: Vec<PromptOption>,
}

/// An outbound reply: plain text, optionally with an attached prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub text: String,
    pub prompt: Option<ReplyPrompt>,
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            prompt: None,
        }
    }

    pub fn with_prompt(text: impl Into<String>, prompt: ReplyPrompt) -> Self {
        Self {
            text: text.into(),
            prompt: Some(prompt),
        }
    }
}

/// Send-side of the messaging client.
///
/// A failed send is logged by the caller and the reply dropped; the decision
/// was time-sensitive, so there is no retry of the individual message.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, recipient: &str, message: OutboundMessage) -> Result<(), TransportError>;
}

// ── Reconnection ────────────────────────────────────────────────────

/// Bounded retry pacing for non-terminal disconnects.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_secs(5),
        }
    }
}
