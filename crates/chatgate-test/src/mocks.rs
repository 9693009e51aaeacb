//! Mock implementations of every collaborator trait plus the connector
//! transport capability set, for running the shared pipeline without a
//! live platform connection.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chatgate_core::collab::{
    CommandGateway, CreateApprovalInput, GatewayRequest, GatewayResponse, HeartbeatReporter,
    MessageInput, PairingRequestInput, PairingStore, PolicyDecision, PolicyInput, Responder,
    SafetyPolicy,
};
use chatgate_core::error::{CoreError, CoreResult};
use chatgate_core::transport::ConnectorTransport;
use chatgate_core::types::{ActionApproval, Attachment, ContextRecord, InboundMessage, PairingToken, UserIdentity};

/// Mock [`PairingStore`].
///
/// Queue responses with `with_*`/`queue_*`; calls are captured for
/// assertions via the `*_calls` getters.
#[derive(Debug, Clone)]
pub struct MockPairingStore {
    pairing_tokens: Arc<Mutex<VecDeque<PairingToken>>>,
    context: Arc<Mutex<ContextRecord>>,
    identities: Arc<Mutex<VecDeque<Option<UserIdentity>>>>,
    pairing_calls: Arc<Mutex<Vec<PairingRequestInput>>>,
    approval_calls: Arc<Mutex<Vec<CreateApprovalInput>>>,
    next_approval_id: Arc<Mutex<u64>>,
}

impl MockPairingStore {
    /// Create a mock store returning a default (non-empty) context record.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pairing_tokens: Arc::new(Mutex::new(VecDeque::new())),
            context: Arc::new(Mutex::new(ContextRecord {
                id: "ctx-1".to_string(),
                workspace_id: "ws-1".to_string(),
            })),
            identities: Arc::new(Mutex::new(VecDeque::new())),
            pairing_calls: Arc::new(Mutex::new(Vec::new())),
            approval_calls: Arc::new(Mutex::new(Vec::new())),
            next_approval_id: Arc::new(Mutex::new(1)),
        }
    }

    /// Override the context record returned by `ensure_context_for_external_channel`.
    #[must_use]
    pub fn with_context(self, context: ContextRecord) -> Self {
        *self.context.lock().unwrap() = context;
        self
    }

    /// Queue the pairing token returned by the next `create_pairing_request` call.
    #[must_use]
    pub fn with_pairing_token(self, token: PairingToken) -> Self {
        self.pairing_tokens.lock().unwrap().push_back(token);
        self
    }

    /// Queue the identity returned by the next `lookup_user_identity` call.
    #[must_use]
    pub fn with_identity(self, identity: Option<UserIdentity>) -> Self {
        self.identities.lock().unwrap().push_back(identity);
        self
    }

    /// Captured `create_pairing_request` calls, in order.
    #[must_use]
    pub fn pairing_calls(&self) -> Vec<PairingRequestInput> {
        self.pairing_calls.lock().unwrap().clone()
    }

    /// Captured `create_action_approval` calls, in order.
    #[must_use]
    pub fn approval_calls(&self) -> Vec<CreateApprovalInput> {
        self.approval_calls.lock().unwrap().clone()
    }
}

impl Default for MockPairingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PairingStore for MockPairingStore {
    async fn create_pairing_request(&self, input: PairingRequestInput) -> CoreResult<PairingToken> {
        self.pairing_calls.lock().unwrap().push(input);
        let queued = self.pairing_tokens.lock().unwrap().pop_front();
        Ok(queued.unwrap_or(PairingToken {
            id: "pairing-1".to_string(),
            token: "MOCKTOKEN".to_string(),
            token_hint: "MOCK...".to_string(),
            expires_at: "2026-01-01T00:00:00Z".to_string(),
        }))
    }

    async fn ensure_context_for_external_channel(
        &self,
        _connector: &str,
        _external_id: &str,
        _display_name: &str,
    ) -> CoreResult<ContextRecord> {
        Ok(self.context.lock().unwrap().clone())
    }

    async fn lookup_user_identity(
        &self,
        _connector: &str,
        _connector_user_id: &str,
    ) -> CoreResult<Option<UserIdentity>> {
        Ok(self.identities.lock().unwrap().pop_front().flatten())
    }

    async fn create_action_approval(&self, input: CreateApprovalInput) -> CoreResult<ActionApproval> {
        let mut next_id = self.next_approval_id.lock().unwrap();
        let id = format!("approval-{next_id}");
        *next_id += 1;
        let approval = ActionApproval {
            id,
            workspace_id: input.workspace_id.clone(),
            context_id: input.context_id.clone(),
            connector: input.connector.clone(),
            external_id: input.external_id.clone(),
            action_type: input.action_type.clone(),
            action_summary: input.action_summary.clone(),
            status: "pending".to_string(),
        };
        self.approval_calls.lock().unwrap().push(input);
        Ok(approval)
    }
}

/// Mock [`CommandGateway`]. Defaults to `handled=false` (fall through to the LLM).
#[derive(Debug, Clone, Default)]
pub struct MockCommandGateway {
    response: Arc<Mutex<GatewayResponse>>,
    calls: Arc<Mutex<Vec<GatewayRequest>>>,
}

impl MockCommandGateway {
    /// Create a mock gateway that never handles anything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the response returned by every `handle_message` call.
    #[must_use]
    pub fn with_response(self, response: GatewayResponse) -> Self {
        *self.response.lock().unwrap() = response;
        self
    }

    /// Captured `handle_message` calls, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<GatewayRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandGateway for MockCommandGateway {
    async fn handle_message(&self, request: GatewayRequest) -> CoreResult<GatewayResponse> {
        self.calls.lock().unwrap().push(request);
        Ok(self.response.lock().unwrap().clone())
    }
}

/// Mock [`Responder`]. Queue replies with `with_reply`; queue a failure with
/// `with_error`. Defaults to an empty reply if nothing is queued.
#[derive(Clone, Default)]
pub struct MockResponder {
    replies: Arc<Mutex<VecDeque<CoreResult<String>>>>,
    calls: Arc<Mutex<Vec<MessageInput>>>,
}

impl MockResponder {
    /// Create a mock responder with no queued replies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    #[must_use]
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
        self
    }

    /// Queue a failed call.
    #[must_use]
    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(CoreError::Collaborator(message.into())));
        self
    }

    /// Captured `reply` calls, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<MessageInput> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Responder for MockResponder {
    async fn reply(&self, input: MessageInput) -> CoreResult<String> {
        self.calls.lock().unwrap().push(input);
        self.replies.lock().unwrap().pop_front().unwrap_or(Ok(String::new()))
    }
}

/// Mock [`SafetyPolicy`]. Defaults to always-allowed.
#[derive(Debug, Clone)]
pub struct MockSafetyPolicy {
    decision: Arc<Mutex<PolicyDecision>>,
    calls: Arc<Mutex<Vec<PolicyInput>>>,
}

impl MockSafetyPolicy {
    /// Create a mock policy that allows everything.
    #[must_use]
    pub fn new() -> Self {
        Self {
            decision: Arc::new(Mutex::new(PolicyDecision { allowed: true, notify: String::new(), reason: String::new() })),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the decision returned by every `check` call.
    #[must_use]
    pub fn with_decision(self, decision: PolicyDecision) -> Self {
        *self.decision.lock().unwrap() = decision;
        self
    }

    /// Captured `check` calls, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<PolicyInput> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockSafetyPolicy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SafetyPolicy for MockSafetyPolicy {
    async fn check(&self, input: PolicyInput) -> CoreResult<PolicyDecision> {
        self.calls.lock().unwrap().push(input);
        Ok(self.decision.lock().unwrap().clone())
    }
}

/// Mock [`HeartbeatReporter`] that records every call by component name.
#[derive(Debug, Clone, Default)]
pub struct MockHeartbeatReporter {
    starting: Arc<Mutex<u32>>,
    beats: Arc<Mutex<u32>>,
    degrades: Arc<Mutex<u32>>,
    disabled: Arc<Mutex<u32>>,
    stopped: Arc<Mutex<u32>>,
}

impl MockHeartbeatReporter {
    /// Create a fresh reporter with all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `degrade` calls observed so far.
    #[must_use]
    pub fn degrade_count(&self) -> u32 {
        *self.degrades.lock().unwrap()
    }

    /// Number of `stopped` calls observed so far.
    #[must_use]
    pub fn stopped_count(&self) -> u32 {
        *self.stopped.lock().unwrap()
    }

    /// Number of `beat` calls observed so far.
    #[must_use]
    pub fn beat_count(&self) -> u32 {
        *self.beats.lock().unwrap()
    }

    /// Number of `starting` calls observed so far.
    #[must_use]
    pub fn starting_count(&self) -> u32 {
        *self.starting.lock().unwrap()
    }

    /// Number of `disabled` calls observed so far.
    #[must_use]
    pub fn disabled_count(&self) -> u32 {
        *self.disabled.lock().unwrap()
    }
}

#[async_trait]
impl HeartbeatReporter for MockHeartbeatReporter {
    async fn starting(&self, _component: &str, _message: &str) {
        *self.starting.lock().unwrap() += 1;
    }

    async fn beat(&self, _component: &str, _message: &str) {
        *self.beats.lock().unwrap() += 1;
    }

    async fn degrade(&self, _component: &str, _message: &str, _err: &str) {
        *self.degrades.lock().unwrap() += 1;
    }

    async fn disabled(&self, _component: &str, _message: &str) {
        *self.disabled.lock().unwrap() += 1;
    }

    async fn stopped(&self, _component: &str, _message: &str) {
        *self.stopped.lock().unwrap() += 1;
    }
}

/// Mock [`ConnectorTransport`]. Records every send; attachment downloads
/// are queued bytes or a queued failure.
#[derive(Clone)]
pub struct MockTransport {
    name: &'static str,
    sent: Arc<Mutex<Vec<(String, String)>>>,
    downloads: Arc<Mutex<VecDeque<CoreResult<Vec<u8>>>>>,
    mention_token: Option<String>,
}

impl MockTransport {
    /// Create a mock transport with the given connector name.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            sent: Arc::new(Mutex::new(Vec::new())),
            downloads: Arc::new(Mutex::new(VecDeque::new())),
            mention_token: None,
        }
    }

    /// Treat `token` as the bot's mention token for `is_mentioned`/`strip_mentions`.
    #[must_use]
    pub fn with_mention_token(mut self, token: impl Into<String>) -> Self {
        self.mention_token = Some(token.into());
        self
    }

    /// Queue the bytes (or error) returned by the next `download_attachment` call.
    #[must_use]
    pub fn with_download(self, result: CoreResult<Vec<u8>>) -> Self {
        self.downloads.lock().unwrap().push_back(result);
        self
    }

    /// Every `(external_id, text)` pair sent so far, in order.
    #[must_use]
    pub fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConnectorTransport for MockTransport {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn send_text(&self, external_id: &str, text: &str) -> CoreResult<()> {
        self.sent.lock().unwrap().push((external_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn download_attachment(&self, _attachment: &Attachment) -> CoreResult<Vec<u8>> {
        self.downloads
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(b"# mock attachment".to_vec()))
    }

    fn is_mentioned(&self, _message: &InboundMessage, text: &str) -> bool {
        match &self.mention_token {
            Some(token) => text.contains(token.as_str()),
            None => false,
        }
    }

    fn strip_mentions(&self, text: &str) -> String {
        let stripped = match &self.mention_token {
            Some(token) => text.replace(token.as_str(), ""),
            None => text.to_string(),
        };
        stripped.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}
