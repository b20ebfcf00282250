//! WebSocket plumbing.
//!
//! Goals:
//! - One bidirectional text-frame connection per session.
//! - Keep close reporting faithful: an explicit close frame logs its
//!   reason, an abrupt end is reported as abnormal.
//! - Leave reconnection to the application.

use std::net::SocketAddr;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::protocol::encode_frame;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// One WebSocket connection carrying JSON text frames.
pub struct WsConn {
    ws: WsStream,
    closed: bool,
}

impl WsConn {
    /// Opens a client connection to a `ws://` address.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let (ws, _) = connect_async(url)
            .await
            .with_context(|| format!("connect to {url}"))?;
        Ok(Self { ws, closed: false })
    }

    /// Serializes `msg` and sends it as one text frame.
    ///
    /// Float precision is reduced at this boundary only; see
    /// [`encode_frame`].
    pub async fn send<T: Serialize>(&mut self, msg: &T) -> anyhow::Result<()> {
        let frame = encode_frame(msg)?;
        debug!(frame = %frame, "Sending frame");
        self.send_text(&frame).await
    }

    /// Sends a raw text frame, bypassing the codec.
    pub async fn send_text(&mut self, frame: &str) -> anyhow::Result<()> {
        self.ws
            .send(Message::text(frame))
            .await
            .context("send text frame")
    }

    /// Receives the next text frame.
    ///
    /// Returns `Ok(None)` once the connection is closed, after logging how
    /// it closed. The close is reported once; later calls return `Ok(None)`
    /// without touching the stream. Binary frames are not part of the
    /// protocol and are skipped.
    pub async fn recv(&mut self) -> anyhow::Result<Option<String>> {
        if self.closed {
            return Ok(None);
        }
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(frame))) => return Ok(Some(frame.into())),
                Some(Ok(Message::Close(close))) => {
                    match close {
                        Some(frame) if !frame.reason.is_empty() => {
                            info!(reason = %frame.reason, "Socket closed")
                        }
                        _ => info!("Socket closed"),
                    }
                    self.closed = true;
                    return Ok(None);
                }
                Some(Ok(Message::Binary(_))) => {
                    warn!("Ignoring binary frame");
                }
                Some(Ok(_)) => {
                    // Ping/pong, handled by the library.
                }
                Some(Err(e)) => {
                    warn!(error = %e, "Socket error");
                    warn!("Socket closed: abnormal");
                    self.closed = true;
                    return Ok(None);
                }
                None => {
                    warn!("Socket closed: abnormal");
                    self.closed = true;
                    return Ok(None);
                }
            }
        }
    }

    /// Sends a close frame with `reason`.
    pub async fn close(&mut self, reason: &str) -> anyhow::Result<()> {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: reason.to_string().into(),
        };
        self.ws
            .send(Message::Close(Some(frame)))
            .await
            .context("send close frame")
    }

    /// Whether the connection has reported its close.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Accepting side of the WebSocket handshake. The production server lives
/// elsewhere; this exists for harnesses that impersonate it.
pub struct WsListener {
    listener: TcpListener,
}

impl WsListener {
    pub async fn bind(addr: &str) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("bind {addr}"))?;
        Ok(Self { listener })
    }

    pub async fn accept(&self) -> anyhow::Result<WsConn> {
        let (stream, addr) = self.listener.accept().await.context("tcp accept")?;
        let ws = accept_async(MaybeTlsStream::Plain(stream))
            .await
            .context("websocket accept")?;
        debug!(peer = %addr, "Accepted websocket client");
        Ok(WsConn { ws, closed: false })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}
