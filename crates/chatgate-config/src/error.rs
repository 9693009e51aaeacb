//! Configuration-loading errors.

use thiserror::Error;

/// Errors raised while loading or validating [`crate::ConnectorSettings`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file exists but is not valid TOML.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Path that failed to parse.
        path: String,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A merged setting failed validation. Distinct from a missing token,
    /// which is not an error and instead yields a `Disabled` connector.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
