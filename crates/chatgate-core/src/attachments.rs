//! Markdown attachment ingestion.

use std::path::PathBuf;

use crate::error::{CoreError, CoreResult};
use crate::sanitize::sanitize_filename;
use crate::transport::ConnectorTransport;
use crate::types::{Attachment, InboundMessage};

/// Attachment downloads above this size fail fast.
pub const MAX_ATTACHMENT_BYTES: u64 = 2 * 1024 * 1024;

fn is_markdown(attachment: &Attachment) -> bool {
    let lower = attachment.filename.to_lowercase();
    if lower.ends_with(".md") || lower.ends_with(".markdown") {
        return true;
    }
    matches!(
        attachment.content_type.as_deref(),
        Some("text/markdown") | Some("text/x-markdown")
    )
}

/// Download and persist every markdown attachment on `message`.
///
/// Preconditions (workspace root/id non-empty, at least one attachment)
/// are checked up front; otherwise this returns empty with no error.
/// Per-attachment failures are logged and skipped — one bad download
/// never prevents the others in the same message from succeeding.
pub async fn ingest(
    workspace_root: &str,
    workspace_id: &str,
    connector: &dyn ConnectorTransport,
    message: &InboundMessage,
) -> (String, Option<CoreError>) {
    if workspace_root.is_empty() || workspace_id.is_empty() || message.attachments.is_empty() {
        return (String::new(), None);
    }

    let mut saved = Vec::new();
    let mut last_err = None;
    for attachment in &message.attachments {
        if !is_markdown(attachment) {
            continue;
        }
        match ingest_one(workspace_root, workspace_id, connector, message, attachment).await {
            Ok(relpath) => saved.push(relpath),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    attachment = %attachment.filename,
                    "attachment ingestion failed, skipping"
                );
                last_err = Some(err);
            },
        }
    }

    let reply = match saved.len() {
        0 => String::new(),
        1 => format!("Attachment saved: `{}`", saved[0]),
        n => format!("Saved {n} markdown attachments."),
    };
    (reply, last_err)
}

async fn ingest_one(
    workspace_root: &str,
    workspace_id: &str,
    connector: &dyn ConnectorTransport,
    message: &InboundMessage,
    attachment: &Attachment,
) -> CoreResult<String> {
    let bytes = connector.download_attachment(attachment).await?;
    if bytes.len() as u64 > MAX_ATTACHMENT_BYTES {
        return Err(CoreError::AttachmentTooLarge {
            actual: bytes.len() as u64,
            max: MAX_ATTACHMENT_BYTES,
        });
    }

    let filename = sanitize_filename(&attachment.filename);
    let entry_name = format!("{}-{}", message.message_id, filename);
    let full_path: PathBuf = [
        workspace_root,
        workspace_id,
        "inbox",
        connector.name(),
        &message.channel_id,
        &entry_name,
    ]
    .iter()
    .collect();

    if let Some(parent) = full_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&full_path, &bytes).await?;

    Ok(format!(
        "{workspace_id}/inbox/{}/{}/{entry_name}",
        connector.name(),
        message.channel_id,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_markdown_by_extension() {
        let attachment = Attachment {
            id: "a".to_string(),
            filename: "notes.MD".to_string(),
            content_type: None,
            url: "https://example.com".to_string(),
        };
        assert!(is_markdown(&attachment));
    }

    #[test]
    fn is_markdown_by_content_type() {
        let attachment = Attachment {
            id: "a".to_string(),
            filename: "blob".to_string(),
            content_type: Some("text/markdown".to_string()),
            url: "https://example.com".to_string(),
        };
        assert!(is_markdown(&attachment));
    }

    #[test]
    fn non_markdown_is_rejected() {
        let attachment = Attachment {
            id: "a".to_string(),
            filename: "photo.png".to_string(),
            content_type: Some("image/png".to_string()),
            url: "https://example.com".to_string(),
        };
        assert!(!is_markdown(&attachment));
    }
}
