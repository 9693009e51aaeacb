//! [`ConnectorTransport`] implementation backed by the Telegram Bot API.

use async_trait::async_trait;

use chatgate_core::attachments::MAX_ATTACHMENT_BYTES;
use chatgate_core::error::{CoreError, CoreResult};
use chatgate_core::transport::ConnectorTransport;
use chatgate_core::types::{Attachment, InboundMessage};

use crate::client::TelegramClient;

/// Sends and receives on behalf of a single Telegram bot.
pub struct TelegramTransport {
    client: TelegramClient,
    bot_username: std::sync::RwLock<Option<String>>,
}

impl TelegramTransport {
    /// Build a transport around a Bot API client.
    pub fn new(client: TelegramClient) -> Self {
        Self { client, bot_username: std::sync::RwLock::new(None) }
    }

    /// Record the bot's own `@username`, resolved once at startup via `getMe`.
    pub fn set_bot_username(&self, username: Option<String>) {
        *self.bot_username.write().unwrap() = username;
    }

    fn bot_username(&self) -> Option<String> {
        self.bot_username.read().unwrap().clone()
    }
}

#[async_trait]
impl ConnectorTransport for TelegramTransport {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn send_text(&self, external_id: &str, text: &str) -> CoreResult<()> {
        let chat_id: i64 = external_id.parse().map_err(|_| CoreError::Transport(format!("invalid chat id: {external_id}")))?;
        self.client.send_message(chat_id, text).await.map_err(|err| CoreError::Transport(err.to_string()))
    }

    async fn download_attachment(&self, attachment: &Attachment) -> CoreResult<Vec<u8>> {
        self.client.download_document(&attachment.id, MAX_ATTACHMENT_BYTES).await.map_err(|err| match err {
            crate::error::TelegramError::Pipeline(core_err) => core_err,
            other => CoreError::Transport(other.to_string()),
        })
    }

    fn is_mentioned(&self, message: &InboundMessage, text: &str) -> bool {
        let Some(username) = self.bot_username() else { return false };
        let token = format!("@{username}");
        text.to_lowercase().contains(&token.to_lowercase()) || message.mentions.iter().any(|m| m.eq_ignore_ascii_case(&username))
    }

    fn strip_mentions(&self, text: &str) -> String {
        let Some(username) = self.bot_username() else { return text.trim().to_string() };
        let token = format!("@{username}");
        let mut result = String::with_capacity(text.len());
        let lower_text = text.to_lowercase();
        let lower_token = token.to_lowercase();
        let mut rest = text;
        let mut lower_rest = lower_text.as_str();
        while let Some(idx) = lower_rest.find(&lower_token) {
            result.push_str(&rest[..idx]);
            rest = &rest[idx + token.len()..];
            lower_rest = &lower_rest[idx + token.len()..];
        }
        result.push_str(rest);
        result.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> TelegramTransport {
        let client = TelegramClient::new(reqwest::Client::new(), "tok".to_string());
        let transport = TelegramTransport::new(client);
        transport.set_bot_username(Some("helper_bot".to_string()));
        transport
    }

    #[test]
    fn is_mentioned_matches_username_case_insensitively() {
        let transport = transport();
        let message = InboundMessage {
            channel_id: "1".to_string(),
            guild_id: String::new(),
            message_id: "1".to_string(),
            author_id: "u".to_string(),
            author_is_bot: false,
            display_name: "alice".to_string(),
            text: "Hey @Helper_Bot do this".to_string(),
            mentions: vec![],
            attachments: vec![],
        };
        assert!(transport.is_mentioned(&message, &message.text));
    }

    #[test]
    fn strip_mentions_removes_username_token() {
        let transport = transport();
        assert_eq!(transport.strip_mentions("Hey @helper_bot do this"), "Hey do this");
    }

    #[test]
    fn strip_mentions_no_username_known_returns_trimmed_text() {
        let client = TelegramClient::new(reqwest::Client::new(), "tok".to_string());
        let transport = TelegramTransport::new(client);
        assert_eq!(transport.strip_mentions("  hi  "), "hi");
    }
}
