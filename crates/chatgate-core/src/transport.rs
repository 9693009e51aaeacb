//! The capability set a connector exposes to the shared pipeline.
//!
//! Per the polymorphism design note, the message-handling pipeline is
//! parameterized over this single trait rather than duplicated per
//! connector; `chatgate-discord` and `chatgate-telegram` each provide one
//! implementation.

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{Attachment, InboundMessage};

/// Connector-specific send/fetch/identity operations used by the pipeline.
#[async_trait]
pub trait ConnectorTransport: Send + Sync {
    /// Connector name, e.g. `"discord"` / `"telegram"`.
    fn name(&self) -> &'static str;

    /// Send plain text to an external channel.
    async fn send_text(&self, external_id: &str, text: &str) -> CoreResult<()>;

    /// Download an attachment's content via the connector's authenticated
    /// transport. Implementations enforce the byte cap themselves so the
    /// error carries the connector-specific context.
    async fn download_attachment(&self, attachment: &Attachment) -> CoreResult<Vec<u8>>;

    /// True when the bot is explicitly mentioned in this message's text.
    fn is_mentioned(&self, message: &InboundMessage, text: &str) -> bool;

    /// Strip bot-mention tokens from `text`, collapsing leftover whitespace.
    fn strip_mentions(&self, text: &str) -> String;
}
