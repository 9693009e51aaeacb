//! Thin REST client over the Telegram Bot API.

use tracing::warn;

use chatgate_core::error::CoreError;

use crate::error::{TelegramError, TelegramResult};
use crate::types::{ApiResponse, FileInfo, Me, Update};

/// The Bot API hard-truncates message text past this length.
pub const MESSAGE_LENGTH_LIMIT: usize = 4096;

/// A Bot API client bound to one bot token.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    token: String,
}

impl TelegramClient {
    /// Build a client around the given bot token.
    pub fn new(http: reqwest::Client, token: String) -> Self {
        Self { http, token }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{method}", self.token)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("https://api.telegram.org/file/bot{}/{file_path}", self.token)
    }

    async fn call<T: serde::de::DeserializeOwned>(&self, method: &str, body: serde_json::Value) -> TelegramResult<T> {
        let resp: ApiResponse<T> = self.http.post(self.api_url(method)).json(&body).send().await?.json().await?;
        if !resp.ok {
            return Err(TelegramError::Api(resp.description.unwrap_or_else(|| "unknown error".to_string())));
        }
        resp.result.ok_or_else(|| TelegramError::Api("missing result on ok response".to_string()))
    }

    /// `getUpdates?timeout=<poll_seconds>&offset=<offset>`.
    pub async fn get_updates(&self, offset: u64, poll_seconds: u64) -> TelegramResult<Vec<Update>> {
        self.call("getUpdates", serde_json::json!({ "offset": offset, "timeout": poll_seconds })).await
    }

    /// `sendMessage`.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> TelegramResult<()> {
        let clipped = clip_for_telegram(text);
        let _: serde_json::Value = self
            .call("sendMessage", serde_json::json!({ "chat_id": chat_id, "text": clipped }))
            .await?;
        Ok(())
    }

    /// `getMe` — used to resolve the bot's own `@username` for mention checks.
    pub async fn get_me(&self) -> TelegramResult<Option<String>> {
        let me: Me = self.call("getMe", serde_json::json!({})).await?;
        Ok(me.username)
    }

    /// `setMyCommands`.
    pub async fn set_my_commands(&self, commands: &serde_json::Value) -> TelegramResult<()> {
        let _: serde_json::Value = self.call("setMyCommands", serde_json::json!({ "commands": commands })).await?;
        Ok(())
    }

    /// Two-step document download: `getFile` to resolve `file_path`, then a
    /// plain `GET` against the file CDN URL.
    pub async fn download_document(&self, file_id: &str, max_bytes: u64) -> TelegramResult<Vec<u8>> {
        let info: FileInfo = self.call("getFile", serde_json::json!({ "file_id": file_id })).await?;
        let Some(file_path) = info.file_path else {
            return Err(TelegramError::Api("getFile returned no file_path".to_string()));
        };

        let resp = self.http.get(self.file_url(&file_path)).send().await?.error_for_status()?;
        if let Some(len) = resp.content_length() {
            if len > max_bytes {
                warn!(target: "chatgate_telegram", len, max_bytes, "attachment exceeds size cap, aborting download");
                return Err(CoreError::AttachmentTooLarge { actual: len, max: max_bytes }.into());
            }
        }
        Ok(resp.bytes().await?.to_vec())
    }
}

/// Clip text to the Bot API's message-length limit.
pub fn clip_for_telegram(text: &str) -> String {
    if text.chars().count() <= MESSAGE_LENGTH_LIMIT {
        return text.to_string();
    }
    text.chars().take(MESSAGE_LENGTH_LIMIT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_leaves_short_text_alone() {
        assert_eq!(clip_for_telegram("hello"), "hello");
    }

    #[test]
    fn clip_truncates_long_text() {
        let long = "a".repeat(5000);
        assert_eq!(clip_for_telegram(&long).chars().count(), MESSAGE_LENGTH_LIMIT);
    }
}
