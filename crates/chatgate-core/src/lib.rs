//! Shared pipeline, collaborator contracts, and data model for chatgate
//! connectors.
//!
//! This crate holds everything that is identical in spirit across both
//! session engines: message classification, attachment ingestion, chat
//! logging, acknowledgement planning, proposal extraction, and reply
//! composition. `chatgate-discord` and `chatgate-telegram` each implement
//! [`transport::ConnectorTransport`] and feed it into [`handler::MessageHandler`].

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod ack;
pub mod attachments;
pub mod chatlog;
pub mod collab;
pub mod composer;
pub mod error;
pub mod handler;
pub mod outbound;
pub mod proposal;
pub mod sanitize;
pub mod transport;
pub mod types;

pub mod prelude {
    //! Common imports for crates consuming the shared pipeline.
    pub use crate::collab::*;
    pub use crate::composer::{ComposedReply, ReplyComposer};
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::handler::{should_auto_reply, MessageHandler, INTERNAL_ERROR_MESSAGE};
    pub use crate::outbound::OutboundSink;
    pub use crate::transport::ConnectorTransport;
    pub use crate::types::*;
}
