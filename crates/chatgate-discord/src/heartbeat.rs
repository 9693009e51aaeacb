//! The periodic heartbeat task that keeps a gateway session alive.
//!
//! The write side of the socket is a single `tokio::sync::Mutex`-guarded
//! sink shared with the session read loop: both the heartbeat task and the
//! session loop lock it only for the duration of a single frame send, so
//! there is never a window where two tasks interleave partial writes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};

use crate::connection::{GatewayConnection, SharedWriter};
use crate::protocol::build_heartbeat;

/// Tracks whether the last heartbeat sent was acknowledged before the next
/// one came due. Used for zombie-connection detection.
#[derive(Debug, Default)]
pub struct HeartbeatState {
    last_ack_received: bool,
}

impl HeartbeatState {
    /// A fresh state, optimistically assuming the connection is healthy.
    pub fn new() -> Self {
        Self { last_ack_received: true }
    }

    /// Record that a `HEARTBEAT_ACK` was received.
    pub fn ack_received(&mut self) {
        self.last_ack_received = true;
    }
}

/// Outcome of the heartbeat task: it only ever stops because of shutdown or
/// because the remote stopped acknowledging heartbeats (a "zombied"
/// connection that must be reconnected).
#[derive(Debug, PartialEq, Eq)]
pub enum HeartbeatExit {
    /// A shutdown signal was received.
    Shutdown,
    /// Two consecutive heartbeats went unacknowledged.
    Zombied,
}

/// Run the heartbeat loop until shutdown or zombie detection.
pub async fn run_heartbeat(
    interval_ms: u64,
    sequence: Arc<Mutex<Option<u64>>>,
    heartbeat_state: Arc<Mutex<HeartbeatState>>,
    writer: SharedWriter,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> HeartbeatExit {
    let jitter = f64::from(fastrand::u32(0..1000)) / 1000.0;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let first_delay = Duration::from_millis((interval_ms as f64 * jitter) as u64);

    tokio::select! {
        biased;
        _ = shutdown_rx.recv() => return HeartbeatExit::Shutdown,
        () = tokio::time::sleep(first_delay) => {}
    }

    let interval = Duration::from_millis(interval_ms);
    loop {
        {
            let mut state = heartbeat_state.lock().await;
            if !state.last_ack_received {
                return HeartbeatExit::Zombied;
            }
            state.last_ack_received = false;
        }

        let seq = *sequence.lock().await;
        let payload = build_heartbeat(seq);
        if GatewayConnection::send(&writer, &payload).await.is_err() {
            return HeartbeatExit::Zombied;
        }

        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => return HeartbeatExit::Shutdown,
            () = tokio::time::sleep(interval) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heartbeat_state_starts_healthy() {
        let state = HeartbeatState::new();
        assert!(state.last_ack_received);
    }

    #[test]
    fn ack_received_sets_flag() {
        let mut state = HeartbeatState { last_ack_received: false };
        state.ack_received();
        assert!(state.last_ack_received);
    }
}
