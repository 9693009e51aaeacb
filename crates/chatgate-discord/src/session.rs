//! The Discord gateway session state machine.
//!
//! One run of [`run_session`] takes the connection from `Hello` through
//! `Identify` into steady-state dispatch, and returns when the connection
//! drops so the caller can decide whether to reconnect.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use chatgate_core::collab::{CommandGateway, GatewayRequest};
use chatgate_core::handler::MessageHandler;
use chatgate_core::types::{Attachment, InboundMessage};

use crate::connection::GatewayConnection;
use crate::error::{DiscordError, DiscordResult};
use crate::heartbeat::{run_heartbeat, HeartbeatExit, HeartbeatState};
use crate::protocol::{build_identify, clamp_heartbeat_interval, opcode, GatewayPayload, HelloPayload, ReadyPayload};

/// Bot-identity state resolved once at READY and reused for mention checks.
///
/// A plain `std::sync::RwLock` rather than the async mutex used elsewhere:
/// [`ConnectorTransport::is_mentioned`] is a synchronous trait method, so the
/// read side here must not require an executor.
#[derive(Debug, Default, Clone)]
pub struct BotIdentity {
    /// The bot's own user ID, once known.
    pub user_id: Arc<std::sync::RwLock<Option<String>>>,
}

/// Run one gateway session to completion (until disconnect or shutdown).
///
/// Returns `Ok(())` only on an explicit shutdown; any other termination is
/// surfaced as an error so the caller's reconnect loop can sleep and retry.
pub async fn run_session(
    gateway_url: &str,
    token: &str,
    handler: Arc<MessageHandler>,
    identity: BotIdentity,
    rest: crate::rest::DiscordRestClient,
    shutdown: broadcast::Sender<()>,
) -> DiscordResult<()> {
    let mut conn = GatewayConnection::connect(gateway_url).await?;

    let hello = conn.recv().await?.ok_or(DiscordError::HelloTimeout)?;
    if hello.op != opcode::HELLO {
        return Err(DiscordError::Protocol(format!("expected HELLO, got op={}", hello.op)));
    }
    let hello_data = hello.d.ok_or_else(|| DiscordError::Protocol("HELLO missing data".to_string()))?;
    let hello_payload: HelloPayload = serde_json::from_value(hello_data)?;
    let interval_ms = clamp_heartbeat_interval(hello_payload.heartbeat_interval);

    let sequence = Arc::new(Mutex::new(None));
    let heartbeat_state = Arc::new(Mutex::new(HeartbeatState::new()));

    let identify = build_identify(token, crate::protocol::INTENTS);
    GatewayConnection::send(&conn.writer, &identify).await?;

    let heartbeat_shutdown = shutdown.subscribe();
    let heartbeat_handle = tokio::spawn(run_heartbeat(
        interval_ms,
        sequence.clone(),
        heartbeat_state.clone(),
        conn.writer.clone(),
        heartbeat_shutdown,
    ));

    let mut session_shutdown = shutdown.subscribe();
    let result = loop {
        tokio::select! {
            biased;
            _ = session_shutdown.recv() => {
                GatewayConnection::close(&conn.writer, 1000).await;
                break Ok(());
            }
            next = conn.recv() => {
                match next {
                    Ok(Some(payload)) => {
                        if let Some(seq) = payload.s {
                            *sequence.lock().await = Some(seq);
                        }
                        if let Err(err) = dispatch(payload, &handler, &identity, &heartbeat_state, &sequence, &conn.writer, &rest).await {
                            break Err(err);
                        }
                    }
                    Ok(None) => break Err(DiscordError::Closed(1006)),
                    Err(err) => break Err(err),
                }
            }
        }
    };

    let _ = shutdown.send(());
    match heartbeat_handle.await {
        Ok(HeartbeatExit::Zombied) => warn!(target: "chatgate_discord", "heartbeat zombied, reconnecting"),
        Ok(HeartbeatExit::Shutdown) => {}
        Err(err) => warn!(target: "chatgate_discord", error = %err, "heartbeat task panicked"),
    }

    result
}

async fn dispatch(
    payload: GatewayPayload,
    handler: &Arc<MessageHandler>,
    identity: &BotIdentity,
    heartbeat_state: &Arc<Mutex<HeartbeatState>>,
    sequence: &Arc<Mutex<Option<u64>>>,
    writer: &crate::connection::SharedWriter,
    rest: &crate::rest::DiscordRestClient,
) -> DiscordResult<()> {
    match payload.op {
        opcode::HEARTBEAT => {
            let seq = *sequence.lock().await;
            GatewayConnection::send(writer, &crate::protocol::build_heartbeat(seq)).await?;
            Ok(())
        }
        opcode::HEARTBEAT_ACK => {
            heartbeat_state.lock().await.ack_received();
            Ok(())
        }
        opcode::RECONNECT => Err(DiscordError::Closed(4000)),
        opcode::INVALID_SESSION => Err(DiscordError::Protocol("invalid session".to_string())),
        opcode::DISPATCH => dispatch_event(payload, handler, identity, rest).await,
        _ => {
            debug!(target: "chatgate_discord", op = payload.op, "ignoring unhandled opcode");
            Ok(())
        }
    }
}

async fn dispatch_event(
    payload: GatewayPayload,
    handler: &Arc<MessageHandler>,
    identity: &BotIdentity,
    rest: &crate::rest::DiscordRestClient,
) -> DiscordResult<()> {
    let Some(event) = payload.t.as_deref() else { return Ok(()) };
    let Some(data) = payload.d else { return Ok(()) };

    match event {
        "READY" => {
            let ready: ReadyPayload = serde_json::from_value(data)?;
            info!(target: "chatgate_discord", user_id = %ready.user.id, "session ready");
            *identity.user_id.write().unwrap() = Some(ready.user.id);
            Ok(())
        }
        "MESSAGE_CREATE" => {
            let message = parse_message_create(&data);
            let span = chatgate_telemetry::message_span("discord", &message.channel_id, &message.message_id);
            let _enter = span.enter();
            if let Err(err) = handler.handle(message).await {
                warn!(target: "chatgate_discord", error = %err, "message handling failed");
            }
            Ok(())
        }
        "INTERACTION_CREATE" => {
            let Some(interaction) = parse_interaction_create(&data) else {
                warn!(target: "chatgate_discord", "could not decode INTERACTION_CREATE, ignoring");
                return Ok(());
            };
            handle_interaction(handler, rest, interaction).await;
            Ok(())
        }
        _ => Ok(()),
    }
}

/// A decoded application-command interaction, reduced to what the command
/// gateway and the callback response need.
struct InteractionCommand {
    id: String,
    token: String,
    channel_id: String,
    channel_label: String,
    author_id: String,
    text: String,
}

fn parse_interaction_create(data: &Value) -> Option<InteractionCommand> {
    let id = data.get("id")?.as_str()?.to_string();
    let token = data.get("token")?.as_str()?.to_string();
    let channel_id = data.get("channel_id").and_then(Value::as_str).unwrap_or_default().to_string();
    let guild_id = data.get("guild_id").and_then(Value::as_str).unwrap_or_default().to_string();
    let channel_label = if !guild_id.is_empty() { guild_id } else { channel_id.clone() };

    let command = data.get("data")?;
    let name = command.get("name")?.as_str()?.to_string();
    let options = command
        .get("options")
        .and_then(Value::as_array)
        .map(|opts| {
            opts.iter()
                .filter_map(|opt| opt.get("value").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();
    let text = format!("/{name} {options}").trim().to_string();

    let invoker = data.get("member").and_then(|m| m.get("user")).or_else(|| data.get("user"));
    let author_id = invoker.and_then(|u| u.get("id")).and_then(Value::as_str).unwrap_or_default().to_string();

    Some(InteractionCommand { id, token, channel_id, channel_label, author_id, text })
}

async fn handle_interaction(handler: &Arc<MessageHandler>, rest: &crate::rest::DiscordRestClient, interaction: InteractionCommand) {
    let reply = match &handler.gateway {
        Some(gateway) => {
            let request = GatewayRequest {
                connector: "discord".to_string(),
                external_id: interaction.channel_id.clone(),
                display_name: interaction.channel_label.clone(),
                from_user_id: interaction.author_id.clone(),
                text: interaction.text.clone(),
            };
            match gateway.handle_message(request).await {
                Ok(response) if response.handled && !response.reply.trim().is_empty() => response.reply,
                Ok(_) => "Command received.".to_string(),
                Err(err) => {
                    warn!(target: "chatgate_discord", error = %err, "command gateway failed for interaction");
                    "Sorry, something went wrong handling that command.".to_string()
                }
            }
        }
        None => "No command handler is configured.".to_string(),
    };

    if let Err(err) = rest.respond_to_interaction(&interaction.id, &interaction.token, &reply).await {
        warn!(target: "chatgate_discord", error = %err, "failed to respond to interaction");
    }
}

fn parse_message_create(data: &Value) -> InboundMessage {
    let text = data.get("content").and_then(Value::as_str).unwrap_or_default().to_string();
    let channel_id = data.get("channel_id").and_then(Value::as_str).unwrap_or_default().to_string();
    let guild_id = data.get("guild_id").and_then(Value::as_str).unwrap_or_default().to_string();
    let message_id = data.get("id").and_then(Value::as_str).unwrap_or_default().to_string();
    let author = data.get("author");
    let author_id = author.and_then(|a| a.get("id")).and_then(Value::as_str).unwrap_or_default().to_string();
    let author_is_bot = author.and_then(|a| a.get("bot")).and_then(Value::as_bool).unwrap_or(false);
    let display_name = author.and_then(|a| a.get("username")).and_then(Value::as_str).unwrap_or_default().to_string();
    let mentions = data
        .get("mentions")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(|m| m.get("id").and_then(Value::as_str)).map(str::to_string).collect())
        .unwrap_or_default();
    let attachments = data
        .get("attachments")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(parse_attachment).collect())
        .unwrap_or_default();

    InboundMessage {
        channel_id,
        guild_id,
        message_id,
        author_id,
        author_is_bot,
        display_name,
        text,
        mentions,
        attachments,
    }
}

fn parse_attachment(value: &Value) -> Option<Attachment> {
    Some(Attachment {
        id: value.get("id")?.as_str()?.to_string(),
        filename: value.get("filename")?.as_str()?.to_string(),
        content_type: value.get("content_type").and_then(Value::as_str).map(str::to_string),
        url: value.get("url")?.as_str()?.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_plain_message() {
        let data = serde_json::json!({
            "content": "hello",
            "channel_id": "1",
            "guild_id": "2",
            "id": "3",
            "author": {"id": "u1", "username": "alice", "bot": false},
            "mentions": [],
            "attachments": [],
        });
        let message = parse_message_create(&data);
        assert_eq!(message.text, "hello");
        assert!(!message.author_is_bot);
        assert_eq!(message.display_name, "alice");
    }

    #[test]
    fn parses_attachments() {
        let data = serde_json::json!({
            "content": "",
            "channel_id": "1",
            "guild_id": "",
            "id": "3",
            "author": {"id": "u1", "username": "alice", "bot": false},
            "mentions": [],
            "attachments": [{"id": "a1", "filename": "notes.md", "content_type": "text/markdown", "url": "https://cdn/notes.md"}],
        });
        let message = parse_message_create(&data);
        assert_eq!(message.attachments.len(), 1);
        assert_eq!(message.attachments[0].filename, "notes.md");
    }

    #[test]
    fn parses_interaction_with_options() {
        let data = serde_json::json!({
            "id": "int-1",
            "token": "int-token",
            "channel_id": "chan-1",
            "guild_id": "guild-1",
            "data": {
                "name": "task",
                "options": [{"name": "prompt", "value": "write report"}],
            },
            "member": {"user": {"id": "u1", "username": "alice"}},
        });
        let interaction = parse_interaction_create(&data).unwrap();
        assert_eq!(interaction.id, "int-1");
        assert_eq!(interaction.token, "int-token");
        assert_eq!(interaction.channel_label, "guild-1");
        assert_eq!(interaction.author_id, "u1");
        assert_eq!(interaction.text, "/task write report");
    }

    #[test]
    fn parses_interaction_without_options() {
        let data = serde_json::json!({
            "id": "int-2",
            "token": "int-token-2",
            "channel_id": "chan-2",
            "data": {"name": "pair"},
            "user": {"id": "u2", "username": "bob"},
        });
        let interaction = parse_interaction_create(&data).unwrap();
        assert_eq!(interaction.channel_label, "chan-2");
        assert_eq!(interaction.text, "/pair");
    }

    #[test]
    fn missing_interaction_data_returns_none() {
        let data = serde_json::json!({ "id": "int-3", "token": "tok" });
        assert!(parse_interaction_create(&data).is_none());
    }
}
