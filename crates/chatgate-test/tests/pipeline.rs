//! Integration-level scenarios for the shared message-handling pipeline.

use std::sync::Arc;

use chatgate_core::collab::{GatewayResponse, PolicyDecision};
use chatgate_core::composer::ReplyComposer;
use chatgate_core::handler::MessageHandler;
use chatgate_core::outbound::OutboundSink;
use chatgate_core::types::{ContextRecord, PairingToken};
use chatgate_test::{InboundMessageBuilder, MockCommandGateway, MockPairingStore, MockResponder, MockSafetyPolicy, MockTransport};

fn handler(
    connector: Arc<MockTransport>,
    store: Arc<MockPairingStore>,
    gateway: Option<Arc<MockCommandGateway>>,
    responder: Option<Arc<MockResponder>>,
    policy: Option<Arc<MockSafetyPolicy>>,
    workspace_root: String,
) -> MessageHandler {
    let outbound = Arc::new(OutboundSink::new(connector.clone(), workspace_root.clone()));
    MessageHandler {
        connector: connector.clone(),
        store: store.clone(),
        gateway: gateway.map(|g| g as Arc<dyn chatgate_core::collab::CommandGateway>),
        composer: ReplyComposer {
            store,
            responder: responder.map(|r| r as Arc<dyn chatgate_core::collab::Responder>),
            policy: policy.map(|p| p as Arc<dyn chatgate_core::collab::SafetyPolicy>),
            outbound: outbound.clone(),
        },
        outbound,
        workspace_root,
    }
}

#[tokio::test]
async fn bot_authored_messages_are_dropped() {
    let workspace = tempfile::tempdir().unwrap();
    let connector = Arc::new(MockTransport::new("discord"));
    let store = Arc::new(MockPairingStore::new());
    let h = handler(
        connector.clone(),
        store.clone(),
        None,
        None,
        None,
        workspace.path().to_str().unwrap().to_string(),
    );

    let message = InboundMessageBuilder::new().with_author_is_bot(true).with_text("pair").build();
    h.handle(message).await.unwrap();

    assert!(connector.sent_messages().is_empty());
    assert!(store.pairing_calls().is_empty());
}

#[tokio::test]
async fn dm_pairing_issues_a_token_and_logs_the_exchange() {
    let workspace = tempfile::tempdir().unwrap();
    let connector = Arc::new(MockTransport::new("discord"));
    let store = Arc::new(MockPairingStore::new().with_context(ContextRecord {
        id: "ctx-1".to_string(),
        workspace_id: "ws-1".to_string(),
    }).with_pairing_token(PairingToken {
        id: "pairing-1".to_string(),
        token: "PAIRDISCORD123".to_string(),
        token_hint: "PAIR...".to_string(),
        expires_at: "2026-01-01T00:00:00Z".to_string(),
    }));
    let gateway = Arc::new(MockCommandGateway::new());
    let h = handler(
        connector.clone(),
        store.clone(),
        Some(gateway.clone()),
        None,
        None,
        workspace.path().to_str().unwrap().to_string(),
    );

    let message = InboundMessageBuilder::new()
        .with_channel_id("123")
        .with_author_id("u1")
        .with_text("pair")
        .build();
    h.handle(message).await.unwrap();

    assert_eq!(store.pairing_calls().len(), 1);
    assert!(gateway.calls().is_empty());
    let sent = connector.sent_messages();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("PAIRDISCORD123"));

    let log_path = workspace.path().join("ws-1/logs/chats/discord/123.md");
    assert!(log_path.exists(), "expected chat log at {log_path:?}");
}

#[tokio::test]
async fn slash_command_handled_by_gateway_skips_the_llm() {
    let workspace = tempfile::tempdir().unwrap();
    let connector = Arc::new(MockTransport::new("discord"));
    let store = Arc::new(MockPairingStore::new());
    let gateway = Arc::new(MockCommandGateway::new().with_response(GatewayResponse {
        handled: true,
        reply: "Task queued: `abc`".to_string(),
    }));
    let responder = Arc::new(MockResponder::new().with_reply("should not be called"));
    let h = handler(
        connector.clone(),
        store,
        Some(gateway.clone()),
        Some(responder.clone()),
        None,
        workspace.path().to_str().unwrap().to_string(),
    );

    let message = InboundMessageBuilder::new()
        .with_channel_id("chan-1")
        .with_guild_id("guild-1")
        .with_text("/task write report")
        .build();
    h.handle(message).await.unwrap();

    let calls = gateway.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].external_id, "chan-1");
    let sent = connector.sent_messages();
    assert!(sent[0].1.contains("Task queued"));
    assert!(responder.calls().is_empty());
}

#[tokio::test]
async fn policy_denial_short_circuits_the_responder() {
    let workspace = tempfile::tempdir().unwrap();
    let connector = Arc::new(MockTransport::new("discord"));
    let store = Arc::new(MockPairingStore::new());
    let responder = Arc::new(MockResponder::new().with_reply("should not be called"));
    let policy = Arc::new(MockSafetyPolicy::new().with_decision(PolicyDecision {
        allowed: false,
        notify: "Rate limit reached for non-admin users. Try again shortly.".to_string(),
        reason: "rate_limited".to_string(),
    }));
    let h = handler(
        connector.clone(),
        store,
        None,
        Some(responder.clone()),
        Some(policy),
        workspace.path().to_str().unwrap().to_string(),
    );

    let message = InboundMessageBuilder::new().with_text("what's on my plate today?").build();
    h.handle(message).await.unwrap();

    assert!(responder.calls().is_empty());
    let sent = connector.sent_messages();
    assert!(sent[0].1.contains("Rate limit reached"));
}

#[tokio::test]
async fn action_proposal_is_queued_instead_of_sent_as_prose() {
    let workspace = tempfile::tempdir().unwrap();
    let connector = Arc::new(MockTransport::new("discord"));
    let store = Arc::new(MockPairingStore::new());
    let reply = "I can do that.\n\n```action\n{\"type\":\"send_email\",\"target\":\"ops@example.com\",\"summary\":\"Send update\",\"subject\":\"Status\"}\n```";
    let responder = Arc::new(MockResponder::new().with_reply(reply));
    let h = handler(
        connector.clone(),
        store.clone(),
        None,
        Some(responder),
        None,
        workspace.path().to_str().unwrap().to_string(),
    );

    let message = InboundMessageBuilder::new().with_text("please email ops with the status").build();
    h.handle(message).await.unwrap();

    let approvals = store.approval_calls();
    assert_eq!(approvals.len(), 1);
    assert_eq!(approvals[0].action_type, "send_email");

    let sent = connector.sent_messages();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("Admin approval required."));
    assert!(!sent[0].1.contains("I can do that."));
}
