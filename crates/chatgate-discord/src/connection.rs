//! Thin wrapper around the gateway `WebSocket` stream.

use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::MaybeTlsStream;

use crate::error::{DiscordError, DiscordResult};
use crate::protocol::GatewayPayload;

type WsStream = tokio_tungstenite::WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;
/// The write half of the gateway socket, behind a shared mutex so the
/// heartbeat task and the read loop can both send frames.
pub type SharedWriter = std::sync::Arc<tokio::sync::Mutex<futures::stream::SplitSink<WsStream, Message>>>;
type Reader = futures::stream::SplitStream<WsStream>;

/// An established gateway connection, split into a shared writer and a reader.
pub struct GatewayConnection {
    /// Write half, shared with the heartbeat task.
    pub writer: SharedWriter,
    /// Read half, owned by the session loop.
    pub reader: Reader,
}

impl GatewayConnection {
    /// Connect to the given gateway `WebSocket` URL.
    pub async fn connect(url: &str) -> DiscordResult<Self> {
        let (stream, _response) = tokio_tungstenite::connect_async(url).await?;
        let (sink, reader) = stream.split();
        Ok(Self {
            writer: std::sync::Arc::new(tokio::sync::Mutex::new(sink)),
            reader,
        })
    }

    /// Send a payload as a text frame.
    pub async fn send(writer: &SharedWriter, payload: &GatewayPayload) -> DiscordResult<()> {
        let text = serde_json::to_string(payload)?;
        let mut guard = writer.lock().await;
        guard.send(Message::Text(text)).await?;
        Ok(())
    }

    /// Receive the next dispatch-worthy payload, transparently skipping
    /// ping/pong/binary frames. Returns `Ok(None)` on a clean stream end and
    /// `Err(DiscordError::Closed(code))` on a close frame.
    pub async fn recv(&mut self) -> DiscordResult<Option<GatewayPayload>> {
        loop {
            match self.reader.next().await {
                None => return Ok(None),
                Some(Err(err)) => return Err(err.into()),
                Some(Ok(Message::Text(text))) => {
                    let payload: GatewayPayload = serde_json::from_str(&text)?;
                    return Ok(Some(payload));
                }
                Some(Ok(Message::Close(frame))) => {
                    let code = frame.map(|f| u16::from(f.code)).unwrap_or(1000);
                    return Err(DiscordError::Closed(code));
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Binary(_) | Message::Frame(_))) => {
                    continue;
                }
            }
        }
    }

    /// Close the underlying socket with the given close code.
    pub async fn close(writer: &SharedWriter, code: u16) {
        let frame = tokio_tungstenite::tungstenite::protocol::CloseFrame {
            code: code.into(),
            reason: std::borrow::Cow::Borrowed(""),
        };
        let mut guard = writer.lock().await;
        let _ = guard.send(Message::Close(Some(frame))).await;
    }
}
