//! Telegram Bot API wire types (the subset this connector consumes).

use serde::Deserialize;

/// One entry from `getUpdates`.
#[derive(Debug, Deserialize)]
pub struct Update {
    /// Monotonically increasing update ID.
    pub update_id: u64,
    /// The message payload, when this update is a plain message.
    #[serde(default)]
    pub message: Option<Message>,
}

/// A Telegram message.
#[derive(Debug, Deserialize)]
pub struct Message {
    /// Message ID, scoped to the chat.
    pub message_id: i64,
    /// The chat this message was sent in.
    pub chat: Chat,
    /// The sender, absent for channel posts.
    #[serde(default)]
    pub from: Option<User>,
    /// Message text.
    #[serde(default)]
    pub text: Option<String>,
    /// A document attachment, if any.
    #[serde(default)]
    pub document: Option<Document>,
    /// Explicit user mentions within the message entities.
    #[serde(default)]
    pub entities: Vec<MessageEntity>,
}

/// A Telegram chat.
#[derive(Debug, Deserialize)]
pub struct Chat {
    /// Chat ID.
    pub id: i64,
    /// `"private"` for DMs; anything else is a group/supergroup/channel.
    #[serde(rename = "type")]
    pub kind: String,
}

/// A Telegram user.
#[derive(Debug, Deserialize)]
pub struct User {
    /// Numeric user ID.
    pub id: i64,
    /// Display name (first name, falling back to username).
    #[serde(default)]
    pub first_name: String,
    /// `@username`, if set.
    #[serde(default)]
    pub username: Option<String>,
    /// True for bot accounts.
    #[serde(default)]
    pub is_bot: bool,
}

/// A document (file) attachment.
#[derive(Debug, Deserialize, Clone)]
pub struct Document {
    /// Opaque file ID used to resolve a download path via `getFile`.
    pub file_id: String,
    /// Original filename, if the client sent one.
    #[serde(default)]
    pub file_name: Option<String>,
    /// MIME type, if known.
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Size in bytes, if known.
    #[serde(default)]
    pub file_size: Option<u64>,
}

/// An entity (mention, bold span, etc.) within message text.
#[derive(Debug, Deserialize)]
pub struct MessageEntity {
    /// Entity kind, e.g. `"mention"` or `"bot_command"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Byte offset (UTF-16 code units per the Bot API) into the text.
    pub offset: u32,
    /// Length in UTF-16 code units.
    pub length: u32,
}

/// Response envelope used by every Bot API method.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the call succeeded.
    pub ok: bool,
    /// The result payload, present iff `ok`.
    #[serde(default)]
    pub result: Option<T>,
    /// A human-readable description, mostly present on failure.
    #[serde(default)]
    pub description: Option<String>,
}

/// Result of `getFile`.
#[derive(Debug, Deserialize)]
pub struct FileInfo {
    /// Server-side relative path used to build the download URL.
    pub file_path: Option<String>,
}

/// Result of `getMe`.
#[derive(Debug, Deserialize)]
pub struct Me {
    /// The bot's `@username`.
    #[serde(default)]
    pub username: Option<String>,
}

impl Message {
    /// True when this chat is a 1:1 DM with the bot.
    pub fn is_dm(&self) -> bool {
        self.chat.kind == "private"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_a_plain_update() {
        let json = serde_json::json!({
            "update_id": 5,
            "message": {
                "message_id": 1,
                "chat": {"id": 42, "type": "private"},
                "from": {"id": 7, "first_name": "Alice", "is_bot": false},
                "text": "hi",
            }
        });
        let update: Update = serde_json::from_value(json).unwrap();
        assert_eq!(update.update_id, 5);
        let message = update.message.unwrap();
        assert!(message.is_dm());
        assert_eq!(message.text.as_deref(), Some("hi"));
    }

    #[test]
    fn non_private_chat_is_not_a_dm() {
        let message = Message {
            message_id: 1,
            chat: Chat { id: 1, kind: "supergroup".to_string() },
            from: None,
            text: None,
            document: None,
            entities: vec![],
        };
        assert!(!message.is_dm());
    }
}
