//! Logging setup: `EnvFilter` plus a compact or JSON formatter.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::{TelemetryError, TelemetryResult};

/// Output formatting for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Single-line, human-readable output. Default for local development.
    #[default]
    Compact,
    /// Newline-delimited JSON, suitable for log aggregation.
    Json,
}

/// Logging configuration: a filter directive plus a format choice.
#[derive(Debug, Clone)]
pub struct LogConfig {
    filter: String,
    format: LogFormat,
}

impl LogConfig {
    /// Start from a `tracing_subscriber::EnvFilter` directive string.
    pub fn new(filter: impl Into<String>) -> Self {
        Self { filter: filter.into(), format: LogFormat::default() }
    }

    /// Choose the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

/// Install the global subscriber described by `config`.
///
/// Returns an error if a global subscriber is already installed; callers
/// that only want "best effort, once" semantics should use
/// [`setup_default_logging`] instead.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    let env_filter =
        EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new("warn,chatgate=info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match config.format {
        LogFormat::Compact => registry.with(tracing_subscriber::fmt::layer().compact()).try_init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
    };
    result.map_err(|err| TelemetryError::AlreadyInitialized(err.to_string()))
}

/// Install the default subscriber (`warn,chatgate=info`, compact format),
/// ignoring the "already initialized" error so binaries and tests can call
/// it unconditionally.
pub fn setup_default_logging() {
    let _ = setup_logging(&LogConfig::new("warn,chatgate=info"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_config_defaults_to_compact() {
        let config = LogConfig::new("info");
        assert_eq!(config.format, LogFormat::Compact);
    }

    #[test]
    fn log_config_with_format_overrides() {
        let config = LogConfig::new("info").with_format(LogFormat::Json);
        assert_eq!(config.format, LogFormat::Json);
    }
}
