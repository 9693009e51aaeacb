//! The Discord connector frame: startup gating, the reconnect loop, and
//! command registration, wired around the shared pipeline.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use chatgate_config::ConnectorSettings;
use chatgate_core::collab::HeartbeatReporter;
use chatgate_core::handler::MessageHandler;

use crate::rest::DiscordRestClient;
use crate::session::{run_session, BotIdentity};

const RECONNECT_DELAY: std::time::Duration = std::time::Duration::from_secs(2);

/// Runs one Discord bot connection for the lifetime of the process.
pub struct DiscordConnector {
    settings: ConnectorSettings,
    rest: DiscordRestClient,
    handler: Arc<MessageHandler>,
    heartbeat: Arc<dyn HeartbeatReporter>,
    identity: BotIdentity,
}

impl DiscordConnector {
    /// Build a connector from resolved settings and the shared pipeline handler.
    ///
    /// `identity` must be the same [`BotIdentity`] handed to the
    /// [`crate::transport::DiscordTransport`] wired into `handler`, so that
    /// the user ID the session loop learns from READY is visible to mention
    /// checks.
    pub fn new(
        settings: ConnectorSettings,
        http: reqwest::Client,
        handler: Arc<MessageHandler>,
        heartbeat: Arc<dyn HeartbeatReporter>,
        identity: BotIdentity,
    ) -> Self {
        let rest = DiscordRestClient::new(http, settings.token.clone());
        Self { settings, rest, handler, heartbeat, identity }
    }

    /// Drive the connector until `cancel` fires.
    pub async fn start(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        self.heartbeat.starting("discord", "starting discord connector").await;

        if self.settings.token.trim().is_empty() {
            self.heartbeat.disabled("discord", "no bot token configured").await;
            cancel.cancelled().await;
            return Ok(());
        }

        if let Err(err) = self.register_commands().await {
            warn!(target: "chatgate_discord", error = %err, "slash command registration failed, continuing");
        }

        loop {
            if cancel.is_cancelled() {
                self.heartbeat.stopped("discord", "connector cancelled").await;
                return Ok(());
            }

            match self.run_one_session(&cancel).await {
                Ok(()) => {
                    self.heartbeat.beat("discord", "session cycle completed").await;
                }
                Err(err) => {
                    self.heartbeat.degrade("discord", "session error", &err.to_string()).await;
                    if cancel.is_cancelled() {
                        self.heartbeat.stopped("discord", "connector cancelled").await;
                        return Ok(());
                    }
                    tokio::select! {
                        () = tokio::time::sleep(RECONNECT_DELAY) => {}
                        () = cancel.cancelled() => {
                            self.heartbeat.stopped("discord", "connector cancelled").await;
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    async fn run_one_session(&self, cancel: &CancellationToken) -> anyhow::Result<()> {
        let gateway_url = self.rest.gateway_url().await?;
        let (shutdown_tx, _rx) = broadcast::channel(1);

        let forward_shutdown = shutdown_tx.clone();
        let cancel_clone = cancel.clone();
        let forwarder = tokio::spawn(async move {
            cancel_clone.cancelled().await;
            let _ = forward_shutdown.send(());
        });

        let result = run_session(
            &gateway_url,
            &self.settings.token,
            self.handler.clone(),
            self.identity.clone(),
            self.rest.clone(),
            shutdown_tx,
        )
        .await;
        forwarder.abort();
        result.map_err(anyhow::Error::from)
    }

    /// Publish a message to an external channel (used by collaborator-driven
    /// pushes outside the inbound flow, e.g. approval notifications).
    pub async fn publish(&self, external_id: &str, text: &str) -> anyhow::Result<()> {
        let trimmed = text.trim();
        if trimmed.is_empty() || external_id.trim().is_empty() {
            return Ok(());
        }
        self.rest.send_message(external_id, trimmed).await?;
        Ok(())
    }

    async fn register_commands(&self) -> anyhow::Result<()> {
        let application_id = match &self.settings.application_id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => self.rest.current_application_id().await?,
        };

        let commands = serde_json::json!([
            {
                "name": "task",
                "type": 1,
                "description": "Ask the assistant to do something",
                "options": [
                    { "type": 3, "name": "prompt", "description": "What to do", "required": false }
                ]
            }
        ]);

        self.rest.register_commands(&application_id, &self.settings.guild_ids, &commands).await?;
        info!(target: "chatgate_discord", application_id, "registered slash commands");
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
    async fn missing_token_enters_disabled_mode_without_connecting() {
        let transport = Arc::new(MockTransport::new("discord"));
        let store = Arc::new(MockPairingStore::new());
        let outbound = Arc::new(OutboundSink::new(transport.clone(), "/tmp/chatgate-test".to_string()));
        let handler = Arc::new(MessageHandler {
            connector: transport,
            store: store.clone(),
            gateway: None,
            composer: ReplyComposer { store, responder: None, policy: None, outbound: outbound.clone() },
            outbound,
            workspace_root: "/tmp/chatgate-test".to_string(),
        });
        let heartbeat = Arc::new(MockHeartbeatReporter::new());
        let connector = DiscordConnector::new(
            empty_token_settings(),
            reqwest::Client::new(),
            handler,
            heartbeat.clone(),
            BotIdentity::default(),
        );

        let cancel = CancellationToken::new();
        cancel.cancel();
        connector.start(cancel).await.unwrap();

        assert_eq!(heartbeat.starting_count(), 1);
        assert_eq!(heartbeat.disabled_count(), 1);
        assert_eq!(heartbeat.beat_count(), 0);
    }
}
