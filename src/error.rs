//! Error types for wa-assist.

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Transport-related errors.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to send message to {recipient}: {reason}")]
    SendFailed { recipient: String, reason: String },

    #[error("Connection failed: {reason}")]
    ConnectFailed { reason: String },

    #[error("Logged out by the server")]
    LoggedOut,
}

/// Errors surfaced at the event-handler boundary.
///
/// These are logged and the inbound message abandoned; they never crash
/// the event loop.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
