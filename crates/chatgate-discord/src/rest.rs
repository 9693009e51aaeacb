//! Discord REST API calls: sending messages, resolving the gateway URL,
//! registering slash commands, and responding to interactions.

use serde_json::json;
use tracing::warn;

use chatgate_core::error::CoreError;

use crate::error::DiscordResult;

const API_BASE: &str = "https://discord.com/api/v10";
/// Discord hard-truncates interaction responses past this length.
pub const INTERACTION_RESPONSE_LIMIT: usize = 2000;

/// A thin REST client over the shared `reqwest::Client`.
#[derive(Clone)]
pub struct DiscordRestClient {
    http: reqwest::Client,
    token: String,
}

impl DiscordRestClient {
    /// Build a client around the given bot token.
    pub fn new(http: reqwest::Client, token: String) -> Self {
        Self { http, token }
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// `GET /gateway/bot` — resolve the `WebSocket` URL to connect to.
    pub async fn gateway_url(&self) -> DiscordResult<String> {
        let resp: crate::protocol::GatewayBotResponse = self
            .http
            .get(format!("{API_BASE}/gateway/bot"))
            .header("Authorization", self.auth_header())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.url)
    }

    /// `POST /channels/{channel_id}/messages`.
    pub async fn send_message(&self, channel_id: &str, content: &str) -> DiscordResult<()> {
        self.http
            .post(format!("{API_BASE}/channels/{channel_id}/messages"))
            .header("Authorization", self.auth_header())
            .json(&json!({ "content": content }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// `GET /users/@me` — used to resolve the application ID when it was
    /// not supplied in configuration.
    pub async fn current_application_id(&self) -> DiscordResult<String> {
        let resp: serde_json::Value = self
            .http
            .get(format!("{API_BASE}/oauth2/applications/@me"))
            .header("Authorization", self.auth_header())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.get("id").and_then(serde_json::Value::as_str).unwrap_or_default().to_string())
    }

    /// `PUT /applications/{application_id}/commands` (global) or
    /// `PUT /applications/{application_id}/guilds/{guild_id}/commands`.
    pub async fn register_commands(&self, application_id: &str, guild_ids: &[String], commands: &serde_json::Value) -> DiscordResult<()> {
        if guild_ids.is_empty() {
            self.put_commands(&format!("{API_BASE}/applications/{application_id}/commands"), commands).await?;
        } else {
            for guild_id in guild_ids {
                self.put_commands(&format!("{API_BASE}/applications/{application_id}/guilds/{guild_id}/commands"), commands)
                    .await?;
            }
        }
        Ok(())
    }

    async fn put_commands(&self, url: &str, commands: &serde_json::Value) -> DiscordResult<()> {
        self.http
            .put(url)
            .header("Authorization", self.auth_header())
            .json(commands)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// `POST /interactions/{id}/{token}/callback` — no `Authorization` header;
    /// the interaction token embedded in the URL is the credential.
    pub async fn respond_to_interaction(&self, interaction_id: &str, interaction_token: &str, content: &str) -> DiscordResult<()> {
        let clipped = clip_for_interaction(content);
        self.http
            .post(format!("{API_BASE}/interactions/{interaction_id}/{interaction_token}/callback"))
            .json(&json!({
                "type": 4,
                "data": { "content": clipped },
            }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Download an attachment from its CDN URL, enforcing `max_bytes`.
    pub async fn download(&self, url: &str, max_bytes: u64) -> DiscordResult<Vec<u8>> {
        let resp = self.http.get(url).send().await?.error_for_status()?;
        if let Some(len) = resp.content_length() {
            if len > max_bytes {
                warn!(target: "chatgate_discord", len, max_bytes, "attachment exceeds size cap, aborting download");
                return Err(CoreError::AttachmentTooLarge { actual: len, max: max_bytes }.into());
            }
        }
        Ok(resp.bytes().await?.to_vec())
    }
}

/// Clip text to Discord's interaction-response character limit, appending
/// `...` when truncation happens so the cut is visible to the reader.
pub fn clip_for_interaction(content: &str) -> String {
    if content.chars().count() <= INTERACTION_RESPONSE_LIMIT {
        return content.to_string();
    }
    let head: String = content.chars().take(INTERACTION_RESPONSE_LIMIT - 3).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_leaves_short_text_alone() {
        assert_eq!(clip_for_interaction("hello"), "hello");
    }

    #[test]
    fn clip_truncates_long_text() {
        let long = "a".repeat(2100);
        let clipped = clip_for_interaction(&long);
        assert_eq!(clipped.chars().count(), INTERACTION_RESPONSE_LIMIT);
        assert!(clipped.ends_with("..."));
        assert_eq!(&clipped[..INTERACTION_RESPONSE_LIMIT - 3], "a".repeat(INTERACTION_RESPONSE_LIMIT - 3).as_str());
    }

    #[test]
    fn clip_exact_boundary_is_untouched() {
        let exact = "a".repeat(INTERACTION_RESPONSE_LIMIT);
        assert_eq!(clip_for_interaction(&exact), exact);
    }
}
