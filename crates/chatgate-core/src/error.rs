//! Crate-boundary error type for the shared pipeline.

use thiserror::Error;

/// Errors surfaced by the shared message pipeline.
///
/// Collaborator and attachment failures are generally caught and converted
/// into safe fallbacks inside the pipeline; this enum exists for the cases
/// that must propagate to the session loop (transport-level send failures)
/// and for plumbing collaborator errors through `?`.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A collaborator call (store, gateway, responder, policy) failed.
    #[error("collaborator call failed: {0}")]
    Collaborator(String),

    /// Sending the outbound message failed at the transport layer.
    #[error("transport send failed: {0}")]
    Transport(String),

    /// An attachment exceeded the configured byte cap.
    #[error("attachment too large: {actual} bytes (max {max})")]
    AttachmentTooLarge {
        /// Observed size in bytes.
        actual: u64,
        /// Configured cap in bytes.
        max: u64,
    },

    /// Filesystem I/O failure while logging or ingesting attachments.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results returned by the shared pipeline.
pub type CoreResult<T> = Result<T, CoreError>;
