//! Error types for the Telegram connector.

/// Failure modes specific to the Telegram long-poll/REST connector.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    /// The Telegram Bot API returned an error response or the request failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// A payload failed to (de)serialize as JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// `getUpdates`/`sendMessage`/etc. responded with `ok: false`.
    #[error("telegram API error: {0}")]
    Api(String),

    /// The connector was asked to shut down.
    #[error("shutdown requested")]
    Shutdown,

    /// The shared pipeline (`chatgate-core`) returned an error.
    #[error("pipeline error: {0}")]
    Pipeline(#[from] chatgate_core::error::CoreError),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] chatgate_config::ConfigError),
}

/// Convenience alias for connector operations.
pub type TelegramResult<T> = Result<T, TelegramError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display() {
        let err = TelegramError::Api("chat not found".to_string());
        assert_eq!(err.to_string(), "telegram API error: chat not found");
    }
}
