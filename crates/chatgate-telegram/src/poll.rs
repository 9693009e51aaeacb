//! The long-poll cycle: one `getUpdates` call plus dispatch of any messages
//! it returns.
//!
//! The offset is advanced to `max(offset, update_id + 1)` *before* a given
//! update is dispatched, so a handler failure cannot cause Telegram to
//! redeliver the same update on the next poll.

use std::sync::Arc;

use tracing::warn;

use chatgate_core::handler::MessageHandler;
use chatgate_core::types::{Attachment, InboundMessage};

use crate::client::TelegramClient;
use crate::error::TelegramResult;
use crate::types::Message;

/// Mutable poll-loop state, carried between cycles.
#[derive(Debug, Default)]
pub struct PollState {
    /// Next `offset` to request from `getUpdates`.
    pub offset: u64,
}

impl PollState {
    /// Advance the offset monotonically; never moves it backwards.
    pub fn advance(&mut self, update_id: u64) {
        self.offset = self.offset.max(update_id + 1);
    }
}

/// Run a single `getUpdates` cycle and dispatch any messages it returns.
pub async fn poll_once(
    client: &TelegramClient,
    handler: &Arc<MessageHandler>,
    state: &mut PollState,
    poll_seconds: u64,
) -> TelegramResult<()> {
    let updates = client.get_updates(state.offset, poll_seconds).await?;

    for update in updates {
        state.advance(update.update_id);
        if let Some(message) = update.message {
            let span = chatgate_telemetry::message_span("telegram", &message.chat.id.to_string(), &message.message_id.to_string());
            let _enter = span.enter();
            let inbound = to_inbound_message(&message);
            if let Err(err) = handler.handle(inbound).await {
                warn!(target: "chatgate_telegram", error = %err, "message handling failed");
            }
        }
    }

    Ok(())
}

fn to_inbound_message(message: &Message) -> InboundMessage {
    let guild_id = if message.is_dm() { String::new() } else { message.chat.id.to_string() };
    let author_id = message.from.as_ref().map(|u| u.id.to_string()).unwrap_or_default();
    let author_is_bot = message.from.as_ref().map(|u| u.is_bot).unwrap_or(false);
    let display_name = message
        .from
        .as_ref()
        .map(|u| u.username.clone().unwrap_or_else(|| u.first_name.clone()))
        .unwrap_or_default();
    let mentions = mention_usernames(message);
    let attachments = message
        .document
        .as_ref()
        .map(|doc| {
            vec![Attachment {
                id: doc.file_id.clone(),
                filename: doc.file_name.clone().unwrap_or_else(|| "attachment".to_string()),
                content_type: doc.mime_type.clone(),
                url: String::new(),
            }]
        })
        .unwrap_or_default();

    InboundMessage {
        channel_id: message.chat.id.to_string(),
        guild_id,
        message_id: message.message_id.to_string(),
        author_id,
        author_is_bot,
        display_name,
        text: message.text.clone().unwrap_or_default(),
        mentions,
        attachments,
    }
}

fn mention_usernames(message: &Message) -> Vec<String> {
    let Some(text) = &message.text else { return Vec::new() };
    message
        .entities
        .iter()
        .filter(|e| e.kind == "mention")
        .filter_map(|e| {
            let chars: Vec<char> = text.chars().collect();
            let start = e.offset as usize;
            let end = (e.offset + e.length) as usize;
            if end > chars.len() {
                return None;
            }
            let raw: String = chars[start..end].iter().collect();
            Some(raw.trim_start_matches('@').to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_offset_forward_only() {
        let mut state = PollState { offset: 10 };
        state.advance(4);
        assert_eq!(state.offset, 10);
        state.advance(20);
        assert_eq!(state.offset, 21);
    }

    #[test]
    fn to_inbound_marks_group_chat_with_guild_id() {
        let message = Message {
            message_id: 1,
            chat: crate::types::Chat { id: 99, kind: "group".to_string() },
            from: None,
            text: Some("hi".to_string()),
            document: None,
            entities: vec![],
        };
        let inbound = to_inbound_message(&message);
        assert_eq!(inbound.guild_id, "99");
    }
}
