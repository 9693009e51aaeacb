//! Error types for the Discord connector.

/// Failure modes specific to the Discord gateway/REST connector.
#[derive(Debug, thiserror::Error)]
pub enum DiscordError {
    /// A `WebSocket` transport error.
    #[error("websocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

    /// The Discord REST API returned an error response or the request itself failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// A payload failed to (de)serialize as JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The gateway connection closed with the given close code.
    #[error("gateway closed: {0}")]
    Closed(u16),

    /// The bot token was rejected by the gateway.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The requested intents were not enabled for this application.
    #[error("disallowed intents: {0}")]
    DisallowedIntents(u16),

    /// The gateway closed with a code this connector cannot recover from by reconnecting.
    #[error("unrecoverable close code: {0}")]
    UnrecoverableClose(u16),

    /// The connector was asked to shut down.
    #[error("shutdown requested")]
    Shutdown,

    /// HELLO was not received within the expected window.
    #[error("timed out waiting for hello")]
    HelloTimeout,

    /// A protocol invariant was violated by the remote end.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The shared pipeline (`chatgate-core`) returned an error.
    #[error("pipeline error: {0}")]
    Pipeline(#[from] chatgate_core::error::CoreError),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] chatgate_config::ConfigError),
}

impl From<tokio_tungstenite::tungstenite::Error> for DiscordError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        DiscordError::WebSocket(Box::new(err))
    }
}

/// Convenience alias for connector operations.
pub type DiscordResult<T> = Result<T, DiscordError>;
