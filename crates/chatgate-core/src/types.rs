//! Protocol-normalized data model shared by both connectors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A remote attachment referenced by an inbound message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    /// Platform-native attachment identifier.
    pub id: String,
    /// Original filename as reported by the platform, unsanitized.
    pub filename: String,
    /// MIME type, when the platform reports one.
    pub content_type: Option<String>,
    /// URL or file reference used to fetch the content.
    pub url: String,
}

/// A message normalized from either connector's wire protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Opaque, stable-per-chat channel identifier.
    pub channel_id: String,
    /// Guild/group identifier; empty string means a direct message.
    pub guild_id: String,
    /// Platform-native message identifier.
    pub message_id: String,
    /// Platform-native author identifier.
    pub author_id: String,
    /// True when the message was authored by a bot account.
    pub author_is_bot: bool,
    /// The author's display name (username/nickname), not the channel label.
    pub display_name: String,
    /// Message text, already decoded from the platform's wire format.
    pub text: String,
    /// External user IDs mentioned in the message.
    pub mentions: Vec<String>,
    /// Attachments carried by the message, in platform order.
    pub attachments: Vec<Attachment>,
}

impl InboundMessage {
    /// True when this message arrived outside any guild/group context.
    pub fn is_dm(&self) -> bool {
        self.guild_id.is_empty()
    }
}

/// A workspace/context binding for one external channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextRecord {
    /// Context identifier, stable per external channel.
    pub id: String,
    /// Workspace the context belongs to.
    pub workspace_id: String,
}

/// An optional identity bound to an external user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Internal user identifier.
    pub user_id: String,
    /// Role string used by the safety policy.
    pub role: String,
}

/// A structured action extracted from an LLM reply, pending approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    /// Non-empty action type, e.g. `"send_email"`.
    pub action_type: String,
    /// Target of the action, platform- and action-specific.
    pub target: String,
    /// Short human summary of the action.
    pub summary: String,
    /// All non-reserved fields from the decoded object.
    pub payload: Map<String, Value>,
    /// The full decoded object, reserved keys included.
    pub raw: Value,
}

/// An action approval request queued by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionApproval {
    /// Approval identifier assigned by the store.
    pub id: String,
    /// Workspace the approval belongs to.
    pub workspace_id: String,
    /// Context the approval was raised from.
    pub context_id: String,
    /// Connector name (`"discord"` / `"telegram"`).
    pub connector: String,
    /// External channel the approval was raised from.
    pub external_id: String,
    /// Action type, mirrors `Proposal::action_type`.
    pub action_type: String,
    /// Action summary, mirrors `Proposal::summary`.
    pub action_summary: String,
    /// Approval status; always `"pending"` on creation.
    pub status: String,
}

/// A pairing token issued in response to a `pair` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingToken {
    /// Pairing request identifier.
    pub id: String,
    /// Full pairing token.
    pub token: String,
    /// Truncated token safe to echo in logs.
    pub token_hint: String,
    /// RFC3339 expiry timestamp.
    pub expires_at: String,
}
