//! Collaborator contracts consumed by the pipeline.
//!
//! Every trait here is implemented outside this crate (pairing/identity
//! store, command parser, LLM responder, safety policy, heartbeat sink,
//! memory log). The pipeline only ever depends on these interfaces, never
//! on a concrete implementation, so it can run against
//! [`chatgate-test`](https://docs.rs/chatgate-test) fakes in isolation.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::CoreResult;
use crate::types::{ActionApproval, ContextRecord, PairingToken, UserIdentity};

/// Input to [`PairingStore::create_pairing_request`].
#[derive(Debug, Clone)]
pub struct PairingRequestInput {
    /// Connector name.
    pub connector: String,
    /// External user identifier requesting a pairing.
    pub connector_user_id: String,
    /// Display name to attach to the request.
    pub display_name: String,
}

/// Input to [`PairingStore::create_action_approval`].
#[derive(Debug, Clone)]
pub struct CreateApprovalInput {
    /// Workspace the approval belongs to.
    pub workspace_id: String,
    /// Context the approval was raised from.
    pub context_id: String,
    /// Connector name.
    pub connector: String,
    /// External channel the approval was raised from.
    pub external_id: String,
    /// External user requesting the action.
    pub requester_user_id: String,
    /// Action type from the decoded proposal.
    pub action_type: String,
    /// Action target from the decoded proposal.
    pub action_target: String,
    /// Action summary from the decoded proposal.
    pub action_summary: String,
    /// Non-reserved proposal fields.
    pub payload: Map<String, Value>,
}

/// Pairing, context, and approval persistence.
#[async_trait]
pub trait PairingStore: Send + Sync {
    /// Create a one-time pairing token for an external user.
    async fn create_pairing_request(&self, input: PairingRequestInput) -> CoreResult<PairingToken>;

    /// Bind an external channel to a workspace context, creating it lazily.
    async fn ensure_context_for_external_channel(
        &self,
        connector: &str,
        external_id: &str,
        display_name: &str,
    ) -> CoreResult<ContextRecord>;

    /// Look up the internal identity bound to an external user, if any.
    ///
    /// `Ok(None)` means "not found" and is not an error; any other failure
    /// is an `Err`.
    async fn lookup_user_identity(
        &self,
        connector: &str,
        connector_user_id: &str,
    ) -> CoreResult<Option<UserIdentity>>;

    /// Queue an action approval request. Never executes the action.
    async fn create_action_approval(&self, input: CreateApprovalInput) -> CoreResult<ActionApproval>;
}

/// Result of a structured command-gateway call.
#[derive(Debug, Clone, Default)]
pub struct GatewayResponse {
    /// True when the gateway recognized and handled the command.
    pub handled: bool,
    /// Reply text; empty means "fall through to the LLM".
    pub reply: String,
}

/// Input to [`CommandGateway::handle_message`].
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    /// Connector name.
    pub connector: String,
    /// External channel identifier.
    pub external_id: String,
    /// Channel label used for display purposes.
    pub display_name: String,
    /// External user identifier of the message author.
    pub from_user_id: String,
    /// Raw, trimmed message text.
    pub text: String,
}

/// Structured command routing, upstream of the LLM fallback.
#[async_trait]
pub trait CommandGateway: Send + Sync {
    /// Attempt to handle a message as a structured command.
    ///
    /// `handled=false` or an empty reply both mean "fall through to the
    /// LLM-backed reply composer".
    async fn handle_message(&self, request: GatewayRequest) -> CoreResult<GatewayResponse>;
}

/// Input to [`Responder::reply`].
#[derive(Debug, Clone)]
pub struct MessageInput {
    /// Connector name.
    pub connector: String,
    /// Workspace the message belongs to.
    pub workspace_id: String,
    /// Context the message belongs to.
    pub context_id: String,
    /// External channel identifier.
    pub external_id: String,
    /// Channel label used for display purposes.
    pub display_name: String,
    /// External user identifier of the message author.
    pub from_user_id: String,
    /// Prompt text, mention tokens already stripped.
    pub text: String,
    /// True when the message arrived as a direct message.
    pub is_dm: bool,
    /// True to disable retrieval-augmented grounding for this call.
    pub skip_grounding: bool,
}

/// LLM-backed reply generation.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Generate a reply for the given input.
    async fn reply(&self, input: MessageInput) -> CoreResult<String>;
}

/// Input to [`SafetyPolicy::check`].
#[derive(Debug, Clone)]
pub struct PolicyInput {
    /// Connector name.
    pub connector: String,
    /// Context the message belongs to.
    pub context_id: String,
    /// External user identifier of the message author.
    pub user_id: String,
    /// Role resolved from [`PairingStore::lookup_user_identity`], or empty.
    pub user_role: String,
    /// True when the message arrived as a direct message.
    pub is_dm: bool,
    /// True when the bot was explicitly mentioned.
    pub is_mention: bool,
}

/// Decision returned by [`SafetyPolicy::check`].
#[derive(Debug, Clone, Default)]
pub struct PolicyDecision {
    /// True when the auto-reply is permitted to run.
    pub allowed: bool,
    /// User-facing text to send instead, when `allowed=false`.
    pub notify: String,
    /// Internal reason, logged but never shown to the user.
    pub reason: String,
}

/// Pre-reply safety gating for auto-replies.
#[async_trait]
pub trait SafetyPolicy: Send + Sync {
    /// Decide whether an auto-reply may proceed for this input.
    async fn check(&self, input: PolicyInput) -> CoreResult<PolicyDecision>;
}

/// Connector lifecycle reporting.
#[async_trait]
pub trait HeartbeatReporter: Send + Sync {
    /// The connector frame began starting up.
    async fn starting(&self, component: &str, message: &str);
    /// One successful session/poll cycle completed.
    async fn beat(&self, component: &str, message: &str);
    /// The session degraded and will retry after a backoff sleep.
    async fn degrade(&self, component: &str, message: &str, err: &str);
    /// The connector is disabled due to missing configuration.
    async fn disabled(&self, component: &str, message: &str);
    /// The connector stopped because its cancellation token fired.
    async fn stopped(&self, component: &str, message: &str);
}

/// Fire-and-forget markdown memory writer.
///
/// No module in this pipeline calls it yet; it's a seam for a future
/// memory-log feature to hang off without changing this trait.
#[async_trait]
pub trait MemoryLog: Send + Sync {
    /// Append an entry. Failures are not surfaced to the caller.
    async fn append(&self, entry: &str);
}
