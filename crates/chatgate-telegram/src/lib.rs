//! Telegram long-poll connector: wire types, Bot API client, and the
//! connector frame that wires them into the shared pipeline.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod client;
pub mod commands;
pub mod connector;
pub mod error;
pub mod poll;
pub mod transport;
pub mod types;
