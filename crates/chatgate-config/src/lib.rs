//! Layered configuration loading for chatgate connectors.
//!
//! Resolution order is always defaults, then `<config-dir>/chatgate/config.toml`,
//! then environment variables — each layer only overrides fields the one
//! before it set.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod settings;

pub use error::ConfigError;
pub use settings::{load, ConnectorSettings, Platform};
