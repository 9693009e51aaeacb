//! Reply composer: identity -> safety policy -> LLM -> proposal -> approval.

use std::sync::Arc;

use crate::ack;
use crate::collab::{
    CreateApprovalInput, MessageInput, PairingStore, PolicyInput, Responder, SafetyPolicy,
};
use crate::error::CoreError;
use crate::outbound::OutboundSink;
use crate::proposal;
use crate::transport::ConnectorTransport;
use crate::types::{ContextRecord, InboundMessage};

/// Result of composing an auto-reply.
#[derive(Debug, Clone, Default)]
pub struct ComposedReply {
    /// The LLM's narrative reply, cleaned of any action fence. Empty when
    /// a proposal replaced it with a notice, or when nothing was produced.
    pub clean_reply: String,
    /// A fixed notice: either a policy denial or an approval notice.
    pub notice: String,
    /// Set only when the responder call itself failed.
    pub error: Option<CoreError>,
}

/// Orchestrates identity lookup, safety policy, LLM generation, proposal
/// extraction, and approval queuing for one auto-reply.
pub struct ReplyComposer {
    /// Persistent store; required (gates the connector frame, not this call).
    pub store: Arc<dyn PairingStore>,
    /// LLM responder; absent means "no auto-reply capability configured".
    pub responder: Option<Arc<dyn Responder>>,
    /// Safety policy; absent means "no gating, always allowed".
    pub policy: Option<Arc<dyn SafetyPolicy>>,
    /// Outbound sink used to send (and log) the acknowledgement pre-reply.
    pub outbound: Arc<OutboundSink>,
}

impl ReplyComposer {
    /// Compose an auto-reply for `message` in `context`.
    pub async fn compose(
        &self,
        connector: &dyn ConnectorTransport,
        context: &ContextRecord,
        message: &InboundMessage,
        is_mention: bool,
    ) -> ComposedReply {
        let Some(responder) = self.responder.clone() else {
            return ComposedReply::default();
        };

        let role = match self
            .store
            .lookup_user_identity(connector.name(), &message.author_id)
            .await
        {
            Ok(Some(identity)) => identity.role,
            Ok(None) => String::new(),
            Err(err) => {
                tracing::warn!(error = %err, "user identity lookup failed, continuing with empty role");
                String::new()
            },
        };

        if let Some(policy) = &self.policy {
            let decision = policy
                .check(PolicyInput {
                    connector: connector.name().to_string(),
                    context_id: context.id.clone(),
                    user_id: message.author_id.clone(),
                    user_role: role,
                    is_dm: message.is_dm(),
                    is_mention,
                })
                .await;
            match decision {
                Ok(decision) if !decision.allowed => {
                    tracing::info!(reason = %decision.reason, "safety policy denied auto-reply");
                    return ComposedReply {
                        clean_reply: String::new(),
                        notice: decision.notify.trim().to_string(),
                        error: None,
                    };
                },
                Ok(_) => {},
                Err(err) => {
                    tracing::warn!(error = %err, "safety policy check failed, proceeding without gating");
                },
            }
        }

        let prompt = connector.strip_mentions(&message.text);
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return ComposedReply::default();
        }

        let base_input = MessageInput {
            connector: connector.name().to_string(),
            workspace_id: context.workspace_id.clone(),
            context_id: context.id.clone(),
            external_id: message.channel_id.clone(),
            display_name: message.display_name.clone(),
            from_user_id: message.author_id.clone(),
            text: prompt.to_string(),
            is_dm: message.is_dm(),
            skip_grounding: false,
        };

        let ack_text = ack::plan_acknowledgement(responder.as_ref(), &base_input, &message.text).await;
        if !ack_text.is_empty() {
            if let Err(err) = self
                .outbound
                .send_and_log(&context.workspace_id, &message.channel_id, &message.display_name, &ack_text)
                .await
            {
                tracing::warn!(error = %err, "failed to send acknowledgement");
            }
        }

        let raw_reply = match responder.reply(base_input).await {
            Ok(reply) => reply,
            Err(err) => {
                return ComposedReply {
                    clean_reply: String::new(),
                    notice: String::new(),
                    error: Some(err),
                };
            },
        };

        let (clean, proposal) = proposal::extract_proposal(raw_reply.trim());
        let Some(proposal) = proposal else {
            return ComposedReply {
                clean_reply: clean,
                notice: String::new(),
                error: None,
            };
        };

        let approval = self
            .store
            .create_action_approval(CreateApprovalInput {
                workspace_id: context.workspace_id.clone(),
                context_id: context.id.clone(),
                connector: connector.name().to_string(),
                external_id: message.channel_id.clone(),
                requester_user_id: message.author_id.clone(),
                action_type: proposal.action_type.clone(),
                action_target: proposal.target.clone(),
                action_summary: proposal.summary.clone(),
                payload: proposal.payload.clone(),
            })
            .await;

        match approval {
            Ok(approval) => ComposedReply {
                clean_reply: String::new(),
                notice: format_approval_notice(&approval.id),
                error: None,
            },
            Err(err) => {
                tracing::warn!(error = %err, "failed to queue action approval");
                ComposedReply {
                    clean_reply: clean,
                    notice: String::new(),
                    error: None,
                }
            },
        }
    }
}

/// Build the fixed approval-notice string for an approval ID.
pub fn format_approval_notice(approval_id: &str) -> String {
    let id = if approval_id.trim().is_empty() {
        "(unknown-action-request)"
    } else {
        approval_id
    };
    format!("Admin approval required. Reply 'approve' to execute action '{id}', or 'deny' to reject.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_approval_notice_uses_id() {
        assert_eq!(
            format_approval_notice("abc123"),
            "Admin approval required. Reply 'approve' to execute action 'abc123', or 'deny' to reject."
        );
    }

    #[test]
    fn format_approval_notice_substitutes_blank_id() {
        assert_eq!(
            format_approval_notice(""),
            "Admin approval required. Reply 'approve' to execute action '(unknown-action-request)', or 'deny' to reject."
        );
    }
}
