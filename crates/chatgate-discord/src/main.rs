//! Binary entry point for the Discord connector.

use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use chatgate_core::collab::{CommandGateway, PairingStore, Responder, SafetyPolicy};
use chatgate_core::composer::ReplyComposer;
use chatgate_core::handler::MessageHandler;
use chatgate_core::outbound::OutboundSink;
use chatgate_discord::connector::DiscordConnector;
use chatgate_discord::transport::DiscordTransport;
use chatgate_telemetry::{setup_logging, LogConfig};

/// chatgate Discord connector.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Emit structured JSON logs instead of the compact format.
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = chatgate_config::load(chatgate_config::Platform::Discord)?;

    let mut log_config = LogConfig::new(settings.log_filter.clone());
    if args.json_logs {
        log_config = log_config.with_format(chatgate_telemetry::LogFormat::Json);
    }
    setup_logging(log_config)?;

    tracing::info!(target: "chatgate_discord", "starting chatgate discord connector");

    let http = reqwest::Client::new();
    let identity = chatgate_discord::session::BotIdentity::default();
    let rest = chatgate_discord::rest::DiscordRestClient::new(http.clone(), settings.token.clone());
    let transport: Arc<dyn chatgate_core::transport::ConnectorTransport> = Arc::new(DiscordTransport::new(rest, identity.clone()));

    // No collaborators are wired in yet; this binary boots in degraded
    // (store-missing) mode until a concrete `PairingStore`/`CommandGateway`
    // implementation is supplied by the surrounding deployment.
    let store: Arc<dyn PairingStore> = Arc::new(NullPairingStore);
    let gateway: Option<Arc<dyn CommandGateway>> = None;
    let responder: Option<Arc<dyn Responder>> = None;
    let policy: Option<Arc<dyn SafetyPolicy>> = None;

    let outbound = Arc::new(OutboundSink::new(transport.clone(), settings.workspace_root.clone()));
    let composer = ReplyComposer { store: store.clone(), responder, policy, outbound: outbound.clone() };
    let handler = Arc::new(MessageHandler {
        connector: transport,
        store,
        gateway,
        composer,
        outbound,
        workspace_root: settings.workspace_root.clone(),
    });

    let heartbeat: Arc<dyn chatgate_core::collab::HeartbeatReporter> = Arc::new(TracingHeartbeatReporter);
    let connector = DiscordConnector::new(settings, http, handler, heartbeat, identity);

    let cancel = CancellationToken::new();
    let shutdown_cancel = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        shutdown_cancel.cancel();
    });

    connector.start(cancel).await
}

/// A [`PairingStore`] that always reports "not found" / hard errors pairing
/// attempts. Placeholder until a real collaborator backend is wired in.
struct NullPairingStore;

#[async_trait::async_trait]
impl PairingStore for NullPairingStore {
    async fn create_pairing_request(
        &self,
        _input: chatgate_core::collab::PairingRequestInput,
    ) -> chatgate_core::error::CoreResult<chatgate_core::types::PairingToken> {
        Err(chatgate_core::error::CoreError::Collaborator("no pairing store configured".to_string()))
    }

    async fn ensure_context_for_external_channel(
        &self,
        _connector: &str,
        _external_id: &str,
        _display_name: &str,
    ) -> chatgate_core::error::CoreResult<chatgate_core::types::ContextRecord> {
        Ok(chatgate_core::types::ContextRecord::default())
    }

    async fn lookup_user_identity(
        &self,
        _connector: &str,
        _user_id: &str,
    ) -> chatgate_core::error::CoreResult<Option<chatgate_core::types::UserIdentity>> {
        Ok(None)
    }

    async fn create_action_approval(
        &self,
        _input: chatgate_core::collab::CreateApprovalInput,
    ) -> chatgate_core::error::CoreResult<chatgate_core::types::ActionApproval> {
        Err(chatgate_core::error::CoreError::Collaborator("no pairing store configured".to_string()))
    }
}

/// A [`chatgate_core::collab::HeartbeatReporter`] that logs via `tracing`.
struct TracingHeartbeatReporter;

#[async_trait::async_trait]
impl chatgate_core::collab::HeartbeatReporter for TracingHeartbeatReporter {
    async fn starting(&self, component: &str, message: &str) {
        tracing::info!(target: "chatgate_discord", component, message, "starting");
    }

    async fn beat(&self, component: &str, message: &str) {
        tracing::debug!(target: "chatgate_discord", component, message, "beat");
    }

    async fn degrade(&self, component: &str, message: &str, err: &str) {
        tracing::warn!(target: "chatgate_discord", component, message, err, "degraded");
    }

    async fn disabled(&self, component: &str, message: &str) {
        tracing::warn!(target: "chatgate_discord", component, message, "disabled");
    }

    async fn stopped(&self, component: &str, message: &str) {
        tracing::info!(target: "chatgate_discord", component, message, "stopped");
    }
}
