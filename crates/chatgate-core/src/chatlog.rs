//! Append-only markdown chat transcripts.

use std::path::PathBuf;

use chrono::Utc;
use tokio::io::AsyncWriteExt;

use crate::sanitize::sanitize_path_segment;
use crate::types::InboundMessage;

/// Direction of a logged exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Message received from the external platform.
    Inbound,
    /// Message sent to the external platform.
    Outbound,
}

impl Direction {
    fn token(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// One chat-log entry, ready to append.
#[derive(Debug, Clone)]
pub struct ChatLogEntry {
    /// Inbound or outbound.
    pub direction: Direction,
    /// The actor who produced the entry (author ID, or `"bot"`).
    pub actor: String,
    /// Message body; already trimmed and non-empty by the time it is built.
    pub body: String,
}

impl ChatLogEntry {
    /// Build an inbound entry, synthesizing an attachments note when the
    /// message text is empty but attachments were present.
    pub fn inbound(message: &InboundMessage) -> Option<Self> {
        let body = inbound_body(message);
        if body.trim().is_empty() {
            return None;
        }
        Some(Self {
            direction: Direction::Inbound,
            actor: message.author_id.clone(),
            body,
        })
    }

    /// Build an outbound entry for the given text.
    pub fn outbound(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            direction: Direction::Outbound,
            actor: "bot".to_string(),
            body: trimmed.to_string(),
        })
    }
}

fn inbound_body(message: &InboundMessage) -> String {
    let trimmed = message.text.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    if message.attachments.is_empty() {
        return String::new();
    }
    let names: Vec<&str> = message
        .attachments
        .iter()
        .map(|a| a.filename.as_str())
        .collect();
    format!("[attachments] {}", names.join(", "))
}

/// Derive the chat-log path for a (workspace, connector, external channel).
pub fn derive_path(workspace_root: &str, workspace_id: &str, connector: &str, external_id: &str) -> PathBuf {
    PathBuf::from(workspace_root)
        .join(workspace_id)
        .join("logs")
        .join("chats")
        .join(connector)
        .join(format!("{}.md", sanitize_path_segment(external_id)))
}

fn header(connector: &str, external_id: &str, display_name: &str) -> String {
    format!(
        "# Chat log\n\n- connector: {connector}\n- external_id: {external_id}\n- display_name: {display_name}\n\n"
    )
}

fn format_entry(entry: &ChatLogEntry) -> String {
    let timestamp = Utc::now().to_rfc3339();
    format!(
        "## {timestamp} {direction}\n\n- direction: {direction}\n- actor: {actor}\n\n{body}\n\n",
        timestamp = timestamp,
        direction = entry.direction.token(),
        actor = entry.actor,
        body = entry.body,
    )
}

/// Append `entry` to the log for this (workspace, connector, external_id).
///
/// Skips silently when `workspace_root`, `workspace_id`, or `external_id`
/// is empty, matching the zero-valued [`ContextRecord`] fallback used when
/// `ensure_context_for_external_channel` fails. Writes are best-effort:
/// I/O failures are logged but never propagated, since chat-log failure
/// must not block message delivery.
pub async fn append(
    workspace_root: &str,
    workspace_id: &str,
    connector: &str,
    external_id: &str,
    display_name: &str,
    entry: Option<ChatLogEntry>,
) {
    let Some(entry) = entry else { return };
    if workspace_root.is_empty() || workspace_id.is_empty() || external_id.is_empty() {
        return;
    }

    let path = derive_path(workspace_root, workspace_id, connector, external_id);
    if let Some(parent) = path.parent() {
        if let Err(err) = tokio::fs::create_dir_all(parent).await {
            tracing::warn!(error = %err, path = %parent.display(), "failed to create chat log directory");
            return;
        }
    }

    let is_new = !tokio::fs::try_exists(&path).await.unwrap_or(false);
    let mut contents = String::new();
    if is_new {
        contents.push_str(&header(connector, external_id, display_name));
    }
    contents.push_str(&format_entry(&entry));

    let file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await;
    match file {
        Ok(mut file) => {
            if let Err(err) = file.write_all(contents.as_bytes()).await {
                tracing::warn!(error = %err, path = %path.display(), "failed to append chat log entry");
            }
        },
        Err(err) => {
            tracing::warn!(error = %err, path = %path.display(), "failed to open chat log file");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Attachment;

    fn base_message() -> InboundMessage {
        InboundMessage {
            channel_id: "chan-1".to_string(),
            guild_id: String::new(),
            message_id: "m1".to_string(),
            author_id: "u1".to_string(),
            author_is_bot: false,
            display_name: "Alice".to_string(),
            text: String::new(),
            mentions: vec![],
            attachments: vec![],
        }
    }

    #[test]
    fn inbound_body_uses_text_when_present() {
        let mut message = base_message();
        message.text = "hello".to_string();
        assert_eq!(inbound_body(&message), "hello");
    }

    #[test]
    fn inbound_body_synthesizes_attachment_note() {
        let mut message = base_message();
        message.attachments.push(Attachment {
            id: "a1".to_string(),
            filename: "notes.md".to_string(),
            content_type: None,
            url: "https://example.com/a1".to_string(),
        });
        assert_eq!(inbound_body(&message), "[attachments] notes.md");
    }

    #[test]
    fn inbound_body_empty_when_nothing_to_log() {
        assert_eq!(inbound_body(&base_message()), "");
    }

    #[test]
    fn derive_path_sanitizes_external_id() {
        let path = derive_path("/ws", "workspace-42", "telegram", "Chan 42!");
        assert_eq!(path, PathBuf::from("/ws/workspace-42/logs/chats/telegram/chan-42.md"));
    }

    #[tokio::test]
    async fn append_skips_when_workspace_id_empty() {
        static COUNTER: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);
        let n = COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!("chatgate-test-{n}"));
        let entry = ChatLogEntry::outbound("hi");
        append(dir.to_str().unwrap(), "", "discord", "chan-1", "chan-1", entry).await;
        assert!(!dir.exists());
    }
}
