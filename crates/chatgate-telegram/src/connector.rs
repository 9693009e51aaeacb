//! The Telegram connector frame: startup gating, the poll loop, and command
//! registration, wired around the shared pipeline.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use chatgate_config::ConnectorSettings;
use chatgate_core::collab::HeartbeatReporter;
use chatgate_core::handler::MessageHandler;

use crate::client::TelegramClient;
use crate::commands;
use crate::poll::{poll_once, PollState};
use crate::transport::TelegramTransport;

const RETRY_DELAY: std::time::Duration = std::time::Duration::from_millis(1500);

/// Runs one Telegram bot connection for the lifetime of the process.
pub struct TelegramConnector {
    settings: ConnectorSettings,
    client: TelegramClient,
    transport: Arc<TelegramTransport>,
    handler: Arc<MessageHandler>,
    heartbeat: Arc<dyn HeartbeatReporter>,
}

impl TelegramConnector {
    /// Build a connector from resolved settings and the shared pipeline handler.
    pub fn new(
        settings: ConnectorSettings,
        http: reqwest::Client,
        transport: Arc<TelegramTransport>,
        handler: Arc<MessageHandler>,
        heartbeat: Arc<dyn HeartbeatReporter>,
    ) -> Self {
        let client = TelegramClient::new(http, settings.token.clone());
        Self { settings, client, transport, handler, heartbeat }
    }

    /// Drive the connector until `cancel` fires.
    pub async fn start(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        self.heartbeat.starting("telegram", "starting telegram connector").await;

        if self.settings.token.trim().is_empty() {
            self.heartbeat.disabled("telegram", "no bot token configured").await;
            cancel.cancelled().await;
            return Ok(());
        }

        match self.client.get_me().await {
            Ok(username) => self.transport.set_bot_username(username),
            Err(err) => warn!(target: "chatgate_telegram", error = %err, "getMe failed, continuing without bot username"),
        }

        if let Err(err) = self.register_commands().await {
            warn!(target: "chatgate_telegram", error = %err, "setMyCommands failed, continuing");
        }

        let mut state = PollState::default();
        loop {
            if cancel.is_cancelled() {
                self.heartbeat.stopped("telegram", "connector cancelled").await;
                return Ok(());
            }

            tokio::select! {
                result = poll_once(&self.client, &self.handler, &mut state, self.settings.poll_seconds) => {
                    match result {
                        Ok(()) => {
                            self.heartbeat.beat("telegram", "poll cycle completed").await;
                        }
                        Err(err) => {
                            self.heartbeat.degrade("telegram", "poll error", &err.to_string()).await;
                            tokio::select! {
                                () = tokio::time::sleep(RETRY_DELAY) => {}
                                () = cancel.cancelled() => {
                                    self.heartbeat.stopped("telegram", "connector cancelled").await;
                                    return Ok(());
                                }
                            }
                        }
                    }
                }
                () = cancel.cancelled() => {
                    self.heartbeat.stopped("telegram", "connector cancelled").await;
                    return Ok(());
                }
            }
        }
    }

    /// Publish a message to an external chat.
    pub async fn publish(&self, external_id: &str, text: &str) -> anyhow::Result<()> {
        let trimmed = text.trim();
        if trimmed.is_empty() || external_id.trim().is_empty() {
            return Ok(());
        }
        let chat_id: i64 = external_id.parse()?;
        self.client.send_message(chat_id, trimmed).await?;
        Ok(())
    }

    async fn register_commands(&self) -> anyhow::Result<()> {
        let declared = vec![("task".to_string(), "Ask the assistant to do something".to_string())];
        let payload = commands::build_commands_payload(&declared);
        self.client.set_my_commands(&payload).await?;
        info!(target: "chatgate_telegram", "registered bot commands");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chatgate_core::composer::ReplyComposer;
    use chatgate_core::outbound::OutboundSink;
    use chatgate_test::{MockHeartbeatReporter, MockPairingStore, MockTransport};

    fn empty_token_settings() -> ConnectorSettings {
        ConnectorSettings {
            token: String::new(),
            workspace_root: "/tmp/chatgate-test".to_string(),
            guild_ids: vec![],
            poll_seconds: 25,
            allowed_user_ids: vec![],
            application_id: None,
            log_filter: "warn".to_string(),
        }
    }

    #[tokio::test]
    async fn missing_token_enters_disabled_mode_without_polling() {
        let mock_transport = Arc::new(MockTransport::new("telegram"));
        let store = Arc::new(MockPairingStore::new());
        let outbound = Arc::new(OutboundSink::new(mock_transport.clone(), "/tmp/chatgate-test".to_string()));
        let handler = Arc::new(MessageHandler {
            connector: mock_transport,
            store: store.clone(),
            gateway: None,
            composer: ReplyComposer { store, responder: None, policy: None, outbound: outbound.clone() },
            outbound,
            workspace_root: "/tmp/chatgate-test".to_string(),
        });
        let heartbeat = Arc::new(MockHeartbeatReporter::new());
        let telegram_transport = Arc::new(TelegramTransport::new(TelegramClient::new(reqwest::Client::new(), String::new())));
        let connector = TelegramConnector::new(empty_token_settings(), reqwest::Client::new(), telegram_transport, handler, heartbeat.clone());

        let cancel = CancellationToken::new();
        cancel.cancel();
        connector.start(cancel).await.unwrap();

        assert_eq!(heartbeat.starting_count(), 1);
        assert_eq!(heartbeat.disabled_count(), 1);
        assert_eq!(heartbeat.beat_count(), 0);
    }
}
