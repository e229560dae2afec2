//! Console transport — stdin/stdout loop for exercising the engine locally.
//!
//! Input lines:
//!   `<text>`             inbound message from the default sender
//!   `@<sender> <text>`   inbound message from a specific sender
//!   `/online` `/offline` owner presence toggles
//!   `/read`              owner read-receipt signal
//!   `/quit`              logout (terminal)
//!
//! Replies are printed to stdout. The production messaging client plugs in
//! through the same [`Transport`] trait and [`EventStream`] type.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::error::TransportError;
use crate::transport::{
    ConnectionUpdate, DisconnectReason, EventStream, InboundMessage, MessagePayload,
    MessageStatus, MessageStatusUpdate, OutboundMessage, PresenceUpdate, Transport,
    TransportEvent,
};

/// Stdin/stdout transport for local runs.
pub struct ConsoleTransport;

impl ConsoleTransport {
    pub fn new() -> Self {
        Self
    }

    /// Spawn the stdin reader and return the resulting event stream.
    pub fn spawn_reader(owner_id: &str, default_sender: &str) -> EventStream {
        let owner = owner_id.to_string();
        let fallback = default_sender.to_string();
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let _ = tx.send(TransportEvent::Connection(ConnectionUpdate::Open {
                owner_name: None,
            }));

            let stdin = tokio::io::stdin();
            let mut lines = BufReader::new(stdin).lines();
            let mut counter = 0u64;
            eprint!("> ");

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            eprint!("> ");
                            continue;
                        }
                        let event = match line {
                            "/quit" => {
                                let _ = tx.send(TransportEvent::Connection(
                                    ConnectionUpdate::Closed {
                                        reason: DisconnectReason::LoggedOut,
                                    },
                                ));
                                break;
                            }
                            "/online" => TransportEvent::Presence(PresenceUpdate {
                                participant_id: owner.clone(),
                                available: true,
                                composing: false,
                            }),
                            "/offline" => TransportEvent::Presence(PresenceUpdate {
                                participant_id: owner.clone(),
                                available: false,
                                composing: false,
                            }),
                            "/read" => TransportEvent::MessageStatus(MessageStatusUpdate {
                                participant_id: owner.clone(),
                                status: MessageStatus::Read,
                                from_self: true,
                            }),
                            _ => {
                                counter += 1;
                                let (sender, body) = match line.strip_prefix('@') {
                                    Some(rest) => {
                                        rest.split_once(char::is_whitespace).unwrap_or((rest, ""))
                                    }
                                    None => (fallback.as_str(), line),
                                };
                                TransportEvent::Message(InboundMessage {
                                    sender_id: sender.to_string(),
                                    message_id: format!("cli-{counter}"),
                                    payload: MessagePayload::Text {
                                        body: body.to_string(),
                                    },
                                    is_group: false,
                                    is_from_self: false,
                                })
                            }
                        };
                        if tx.send(event).is_err() {
                            break;
                        }
                        eprint!("> ");
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        Box::pin(UnboundedReceiverStream::new(rx))
    }
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    async fn send(&self, recipient: &str, message: OutboundMessage) -> Result<(), TransportError> {
        println!("\n→ {recipient}:\n{}", message.text);
        if let Some(prompt) = &message.prompt {
            println!("   [{}]", prompt.footer);
            for option in &prompt.options {
                println!("   ({}) {}", option.id, option.label);
            }
        }
        eprint!("> ");
        Ok(())
    }
}
