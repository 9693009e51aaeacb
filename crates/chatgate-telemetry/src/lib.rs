//! Structured logging setup and tracing spans for chatgate connectors.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod logging;
mod spans;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{setup_default_logging, setup_logging, LogConfig, LogFormat};
pub use spans::{connector_span, message_span};
