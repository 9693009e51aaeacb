//! [`ConnectorTransport`] implementation backed by the Discord REST client.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use chatgate_core::attachments::MAX_ATTACHMENT_BYTES;
use chatgate_core::error::{CoreError, CoreResult};
use chatgate_core::transport::ConnectorTransport;
use chatgate_core::types::Attachment;

use crate::rest::DiscordRestClient;
use crate::session::BotIdentity;

static MENTION_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<@!?(\d+)>").unwrap());

/// Sends and receives on behalf of a single Discord bot session.
pub struct DiscordTransport {
    rest: DiscordRestClient,
    identity: BotIdentity,
}

impl DiscordTransport {
    /// Build a transport around a REST client and the session's bot identity.
    pub fn new(rest: DiscordRestClient, identity: BotIdentity) -> Self {
        Self { rest, identity }
    }
}

#[async_trait]
impl ConnectorTransport for DiscordTransport {
    fn name(&self) -> &'static str {
        "discord"
    }

    async fn send_text(&self, external_id: &str, text: &str) -> CoreResult<()> {
        self.rest
            .send_message(external_id, text)
            .await
            .map_err(|err| CoreError::Transport(err.to_string()))
    }

    async fn download_attachment(&self, attachment: &Attachment) -> CoreResult<Vec<u8>> {
        self.rest.download(&attachment.url, MAX_ATTACHMENT_BYTES).await.map_err(|err| match err {
            crate::error::DiscordError::Pipeline(core_err) => core_err,
            other => CoreError::Transport(other.to_string()),
        })
    }

    fn is_mentioned(&self, message: &chatgate_core::types::InboundMessage, _text: &str) -> bool {
        let Some(bot_id) = self.identity.user_id.read().unwrap().clone() else { return false };
        message.mentions.iter().any(|id| id == &bot_id)
    }

    fn strip_mentions(&self, text: &str) -> String {
        MENTION_TOKEN.replace_all(text, "").trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_mentions_removes_tokens() {
        let rest = DiscordRestClient::new(reqwest::Client::new(), "tok".to_string());
        let transport = DiscordTransport::new(rest, BotIdentity::default());
        assert_eq!(transport.strip_mentions("<@123> hello <@!456>"), "hello");
    }

    #[test]
    fn is_mentioned_matches_bot_user_id() {
        let rest = DiscordRestClient::new(reqwest::Client::new(), "tok".to_string());
        let identity = BotIdentity::default();
        *identity.user_id.write().unwrap() = Some("123".to_string());
        let transport = DiscordTransport::new(rest, identity);
        let message = chatgate_core::types::InboundMessage {
            channel_id: "c".to_string(),
            guild_id: "g".to_string(),
            message_id: "m".to_string(),
            author_id: "a".to_string(),
            author_is_bot: false,
            display_name: "alice".to_string(),
            text: "hi".to_string(),
            mentions: vec!["123".to_string()],
            attachments: vec![],
        };
        assert!(transport.is_mentioned(&message, ""));
    }
}
