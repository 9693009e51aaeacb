//! Shared per-message decision pipeline.

use std::sync::Arc;

use crate::attachments;
use crate::chatlog::{self, ChatLogEntry};
use crate::collab::{CommandGateway, GatewayRequest, PairingRequestInput, PairingStore};
use crate::composer::ReplyComposer;
use crate::error::CoreResult;
use crate::outbound::OutboundSink;
use crate::sanitize::normalize_pair_command;
use crate::transport::ConnectorTransport;
use crate::types::InboundMessage;

/// Fixed fallback text sent when the composer fails and nothing else
/// non-empty is available to send this turn.
pub const INTERNAL_ERROR_MESSAGE: &str =
    "Sorry, something went wrong handling that. Please try again in a moment.";

/// The shared per-message pipeline, parameterized over one connector's
/// transport capability set and its configured collaborators.
pub struct MessageHandler {
    /// Connector transport (send/fetch/identity capability set).
    pub connector: Arc<dyn ConnectorTransport>,
    /// Pairing/context/approval store. Required.
    pub store: Arc<dyn PairingStore>,
    /// Structured command gateway. Absent means "never handled, always fall through".
    pub gateway: Option<Arc<dyn CommandGateway>>,
    /// Reply composer, sharing the handler's outbound sink.
    pub composer: ReplyComposer,
    /// Outbound sink for sends originating directly in the handler.
    pub outbound: Arc<OutboundSink>,
    /// Filesystem root under which workspaces are rooted.
    pub workspace_root: String,
}

impl MessageHandler {
    /// Handle one normalized inbound message.
    ///
    /// Returns an error only for transport-level send failures; every
    /// other failure mode (collaborator errors, attachment errors, chat-log
    /// errors) is caught, logged, and converted into a safe fallback.
    pub async fn handle(&self, message: InboundMessage) -> CoreResult<()> {
        if message.author_is_bot {
            return Ok(());
        }

        let channel_label = if !message.guild_id.is_empty() {
            message.guild_id.clone()
        } else {
            message.channel_id.clone()
        };

        let context = match self
            .store
            .ensure_context_for_external_channel(self.connector.name(), &message.channel_id, &channel_label)
            .await
        {
            Ok(context) => context,
            Err(err) => {
                tracing::warn!(error = %err, "ensure_context_for_external_channel failed, using empty context");
                Default::default()
            },
        };

        chatlog::append(
            &self.workspace_root,
            &context.workspace_id,
            self.connector.name(),
            &message.channel_id,
            &channel_label,
            ChatLogEntry::inbound(&message),
        )
        .await;

        let (attachment_reply, attachment_err) =
            attachments::ingest(&self.workspace_root, &context.workspace_id, self.connector.as_ref(), &message)
                .await;
        if let Some(err) = attachment_err {
            tracing::warn!(error = %err, "attachment ingestion reported a failure for this message");
        }

        if message.text.trim().is_empty() {
            self.send(&context.workspace_id, &message.channel_id, &channel_label, &attachment_reply)
                .await?;
            return Ok(());
        }

        if message.is_dm() && normalize_pair_command(&message.text) == "pair" {
            match self
                .store
                .create_pairing_request(PairingRequestInput {
                    connector: self.connector.name().to_string(),
                    connector_user_id: message.author_id.clone(),
                    display_name: message.display_name.clone(),
                })
                .await
            {
                Ok(token) => {
                    let reply = format_pairing_reply(&token.token, &token.expires_at);
                    self.send(&context.workspace_id, &message.channel_id, &channel_label, &reply)
                        .await?;
                },
                Err(err) => {
                    tracing::warn!(error = %err, "create_pairing_request failed");
                },
            }
            return Ok(());
        }

        let gateway_response = match &self.gateway {
            Some(gateway) => {
                gateway
                    .handle_message(GatewayRequest {
                        connector: self.connector.name().to_string(),
                        external_id: message.channel_id.clone(),
                        display_name: channel_label.clone(),
                        from_user_id: message.author_id.clone(),
                        text: message.text.trim().to_string(),
                    })
                    .await?
            },
            None => Default::default(),
        };

        if gateway_response.handled && !gateway_response.reply.trim().is_empty() {
            let merged = join_non_empty(&[gateway_response.reply.as_str(), attachment_reply.as_str()]);
            self.send(&context.workspace_id, &message.channel_id, &channel_label, &merged)
                .await?;
            return Ok(());
        }

        let (should_reply, is_mention) = should_auto_reply(self.connector.as_ref(), &message);
        if !should_reply {
            self.send(&context.workspace_id, &message.channel_id, &channel_label, &attachment_reply)
                .await?;
            return Ok(());
        }

        let composed = self
            .composer
            .compose(self.connector.as_ref(), &context, &message, is_mention)
            .await;
        if let Some(err) = &composed.error {
            tracing::warn!(error = %err, "reply composer failed");
        }

        let mut parts = Vec::new();
        if !composed.notice.trim().is_empty() {
            parts.push(composed.notice.as_str());
        }
        if !composed.clean_reply.trim().is_empty() {
            parts.push(composed.clean_reply.as_str());
        }
        if !attachment_reply.trim().is_empty() {
            parts.push(attachment_reply.as_str());
        }
        if parts.is_empty() && composed.error.is_some() {
            parts.push(INTERNAL_ERROR_MESSAGE);
        }

        let merged = join_non_empty(&parts);
        self.send(&context.workspace_id, &message.channel_id, &channel_label, &merged)
            .await?;
        Ok(())
    }

    async fn send(
        &self,
        workspace_id: &str,
        external_id: &str,
        display_name: &str,
        text: &str,
    ) -> CoreResult<()> {
        self.outbound.send_and_log(workspace_id, external_id, display_name, text).await
    }
}

fn join_non_empty(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Decide whether the handler should run the reply composer for `message`,
/// and whether the bot was explicitly mentioned.
///
/// False if the text is empty or starts with `/`; true with `mention=false`
/// for direct messages; otherwise true, with `mention` delegated to the
/// connector's own mention detection.
pub fn should_auto_reply(connector: &dyn ConnectorTransport, message: &InboundMessage) -> (bool, bool) {
    let text = message.text.trim();
    if text.is_empty() || text.starts_with('/') {
        return (false, false);
    }
    if message.is_dm() {
        return (true, false);
    }
    let is_mention = connector.is_mentioned(message, text);
    (true, is_mention)
}

fn format_pairing_reply(token: &str, expires_at: &str) -> String {
    format!("Pairing token: `{token}` (expires {expires_at}). Reply to this bot to complete pairing.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_non_empty_skips_blank_parts() {
        assert_eq!(join_non_empty(&["", "a", "", "b"]), "a\n\nb");
    }

    #[test]
    fn join_non_empty_of_nothing_is_empty() {
        assert_eq!(join_non_empty(&["", ""]), "");
    }

    #[test]
    fn format_pairing_reply_includes_token() {
        let reply = format_pairing_reply("TOK123", "2026-01-01T00:00:00Z");
        assert!(reply.contains("TOK123"));
        assert!(reply.contains("2026-01-01T00:00:00Z"));
    }
}
