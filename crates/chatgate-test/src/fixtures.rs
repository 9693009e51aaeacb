//! Builders for sample `InboundMessage`/`Attachment` values.

use chatgate_core::types::{Attachment, InboundMessage};

/// A minimal, valid inbound message builder with sensible defaults.
///
/// Every field can be overridden with the matching `with_*` method.
#[derive(Debug, Clone)]
pub struct InboundMessageBuilder {
    message: InboundMessage,
}

impl InboundMessageBuilder {
    /// Start from an empty, non-bot, DM message.
    #[must_use]
    pub fn new() -> Self {
        Self {
            message: InboundMessage {
                channel_id: "chan-1".to_string(),
                guild_id: String::new(),
                message_id: "msg-1".to_string(),
                author_id: "user-1".to_string(),
                author_is_bot: false,
                display_name: "Test User".to_string(),
                text: String::new(),
                mentions: Vec::new(),
                attachments: Vec::new(),
            },
        }
    }

    /// Override the channel ID.
    #[must_use]
    pub fn with_channel_id(mut self, channel_id: impl Into<String>) -> Self {
        self.message.channel_id = channel_id.into();
        self
    }

    /// Override the guild ID. Non-empty marks this as a guild message.
    #[must_use]
    pub fn with_guild_id(mut self, guild_id: impl Into<String>) -> Self {
        self.message.guild_id = guild_id.into();
        self
    }

    /// Override the message ID.
    #[must_use]
    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message.message_id = message_id.into();
        self
    }

    /// Override the author ID.
    #[must_use]
    pub fn with_author_id(mut self, author_id: impl Into<String>) -> Self {
        self.message.author_id = author_id.into();
        self
    }

    /// Mark the message as bot-authored.
    #[must_use]
    pub fn with_author_is_bot(mut self, author_is_bot: bool) -> Self {
        self.message.author_is_bot = author_is_bot;
        self
    }

    /// Override the message text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.message.text = text.into();
        self
    }

    /// Add a mentioned external user ID.
    #[must_use]
    pub fn with_mention(mut self, user_id: impl Into<String>) -> Self {
        self.message.mentions.push(user_id.into());
        self
    }

    /// Append an attachment.
    #[must_use]
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.message.attachments.push(attachment);
        self
    }

    /// Build the final message.
    #[must_use]
    pub fn build(self) -> InboundMessage {
        self.message
    }
}

impl Default for InboundMessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a markdown attachment fixture.
#[must_use]
pub fn markdown_attachment(id: &str, filename: &str, url: &str) -> Attachment {
    Attachment {
        id: id.to_string(),
        filename: filename.to_string(),
        content_type: Some("text/markdown".to_string()),
        url: url.to_string(),
    }
}
