//! Span constructors for the connector run loop and message handling.

use tracing::Span;

/// Span wrapping one iteration of a connector's run loop.
pub fn connector_span(connector: &str, cycle: u64) -> Span {
    tracing::info_span!("connector", connector = %connector, cycle = cycle)
}

/// Span wrapping handling of one inbound message.
pub fn message_span(connector: &str, external_id: &str, message_id: &str) -> Span {
    tracing::debug_span!(
        "message",
        connector = %connector,
        external_id = %external_id,
        message_id = %message_id,
    )
}
