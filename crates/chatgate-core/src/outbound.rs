//! Outbound send paired with the matching chat-log append.

use std::sync::Arc;

use crate::chatlog::{self, ChatLogEntry};
use crate::error::CoreResult;
use crate::transport::ConnectorTransport;

/// Sends text through a connector transport and logs exactly one outbound
/// chat-log entry per non-empty send, so the invariant "every outbound
/// message has a matching log entry" holds regardless of which pipeline
/// stage produced the text.
pub struct OutboundSink {
    transport: Arc<dyn ConnectorTransport>,
    workspace_root: String,
}

impl OutboundSink {
    /// Build a sink bound to one connector transport and workspace root.
    pub fn new(transport: Arc<dyn ConnectorTransport>, workspace_root: String) -> Self {
        Self { transport, workspace_root }
    }

    /// Send `text` to `external_id` and append the matching log entry.
    ///
    /// Empty (after trim) text is a silent no-op, matching `publish`'s
    /// contract in the connector frame.
    pub async fn send_and_log(
        &self,
        workspace_id: &str,
        external_id: &str,
        display_name: &str,
        text: &str,
    ) -> CoreResult<()> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(());
        }
        self.transport.send_text(external_id, trimmed).await?;
        chatlog::append(
            &self.workspace_root,
            workspace_id,
            self.transport.name(),
            external_id,
            display_name,
            ChatLogEntry::outbound(trimmed),
        )
        .await;
        Ok(())
    }
}
