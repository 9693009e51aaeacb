//! Discord Gateway wire protocol: opcodes, payload shapes, intents.

use serde::{Deserialize, Serialize};

/// Discord Gateway opcodes relevant to this connector.
pub mod opcode {
    /// Event dispatch (receive only).
    pub const DISPATCH: u8 = 0;
    /// Heartbeat (bidirectional).
    pub const HEARTBEAT: u8 = 1;
    /// Identify (send only).
    pub const IDENTIFY: u8 = 2;
    /// Server requests reconnect (receive only).
    pub const RECONNECT: u8 = 7;
    /// Invalid session (receive only).
    pub const INVALID_SESSION: u8 = 9;
    /// Hello — carries the heartbeat interval (receive only).
    pub const HELLO: u8 = 10;
    /// Heartbeat ACK (receive only).
    pub const HEARTBEAT_ACK: u8 = 11;
}

/// `GUILDS | GUILD_MESSAGES | DIRECT_MESSAGES | MESSAGE_CONTENT`.
pub const INTENTS: u32 = (1 << 0) | (1 << 9) | (1 << 12) | (1 << 15);

/// Heartbeat intervals below this are clamped up.
pub const MIN_HEARTBEAT_INTERVAL_MS: u64 = 1000;
/// The clamp target for a too-low heartbeat interval.
pub const CLAMPED_HEARTBEAT_INTERVAL_MS: u64 = 5000;

/// Raw Gateway payload as sent/received over the `WebSocket`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPayload {
    /// Opcode for this payload.
    pub op: u8,
    /// Event data (opcode-dependent).
    #[serde(default)]
    pub d: Option<serde_json::Value>,
    /// Sequence number; only present on dispatch (`op=0`) events.
    #[serde(default)]
    pub s: Option<u64>,
    /// Event name; only present on dispatch (`op=0`) events.
    #[serde(default)]
    pub t: Option<String>,
}

/// Hello payload (`op=10`).
#[derive(Debug, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval in milliseconds, before clamping.
    pub heartbeat_interval: u64,
}

/// READY event user object.
#[derive(Debug, Deserialize)]
pub struct ReadyUser {
    /// The bot's user ID.
    pub id: String,
}

/// READY event data (`t="READY"`).
#[derive(Debug, Deserialize)]
pub struct ReadyPayload {
    /// The bot user object.
    pub user: ReadyUser,
}

/// Response from `GET /gateway/bot`.
#[derive(Debug, Deserialize)]
pub struct GatewayBotResponse {
    /// Gateway `WebSocket` URL.
    pub url: String,
}

/// Build an Identify payload (`op=2`).
pub fn build_identify(token: &str, intents: u32) -> GatewayPayload {
    GatewayPayload {
        op: opcode::IDENTIFY,
        d: Some(serde_json::json!({
            "token": token,
            "intents": intents,
            "properties": {
                "os": std::env::consts::OS,
                "browser": "chatgate",
                "device": "chatgate",
            },
        })),
        s: None,
        t: None,
    }
}

/// Build a Heartbeat payload (`op=1`).
pub fn build_heartbeat(sequence: Option<u64>) -> GatewayPayload {
    GatewayPayload {
        op: opcode::HEARTBEAT,
        d: sequence.map(serde_json::Value::from),
        s: None,
        t: None,
    }
}

/// Clamp a HELLO-reported heartbeat interval to a sane floor.
pub fn clamp_heartbeat_interval(interval_ms: u64) -> u64 {
    if interval_ms < MIN_HEARTBEAT_INTERVAL_MS {
        CLAMPED_HEARTBEAT_INTERVAL_MS
    } else {
        interval_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_constants() {
        assert_eq!(opcode::DISPATCH, 0);
        assert_eq!(opcode::HELLO, 10);
        assert_eq!(opcode::HEARTBEAT_ACK, 11);
    }

    #[test]
    fn intents_include_message_content() {
        assert_eq!(INTENTS, 1 | 512 | 4096 | 32768);
    }

    #[test]
    fn clamp_low_interval() {
        assert_eq!(clamp_heartbeat_interval(500), 5000);
    }

    #[test]
    fn clamp_leaves_normal_interval_alone() {
        assert_eq!(clamp_heartbeat_interval(41250), 41250);
    }

    #[test]
    fn build_identify_payload_shape() {
        let payload = build_identify("Bot tok", INTENTS);
        assert_eq!(payload.op, opcode::IDENTIFY);
        let d = payload.d.unwrap();
        assert_eq!(d["token"], "Bot tok");
        assert_eq!(d["intents"], INTENTS);
    }

    #[test]
    fn build_heartbeat_carries_sequence() {
        let payload = build_heartbeat(Some(42));
        assert_eq!(payload.d, Some(serde_json::Value::from(42)));
    }

    #[test]
    fn build_heartbeat_null_sequence() {
        let payload = build_heartbeat(None);
        assert!(payload.d.is_none());
    }

    #[test]
    fn gateway_payload_roundtrip() {
        let payload = GatewayPayload { op: 0, d: Some(serde_json::json!({"a":1})), s: Some(7), t: Some("MESSAGE_CREATE".to_string()) };
        let json = serde_json::to_string(&payload).unwrap();
        let restored: GatewayPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.s, Some(7));
        assert_eq!(restored.t.as_deref(), Some("MESSAGE_CREATE"));
    }
}
