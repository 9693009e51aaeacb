//! Telemetry error types.

use thiserror::Error;

/// Errors raised while initializing logging.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The global subscriber was already installed.
    #[error("logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
