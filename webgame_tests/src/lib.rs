//! Test harness: a scripted stand-in for the game server.
//!
//! The stub replays canned JSON frames and reads back what the client
//! sends. It contains no game logic, so the tests pin client behavior
//! alone.

use anyhow::Context;
use serde_json::{json, Value};

use webgame_client::session::ConnectionState;
use webgame_client::GameClient;
use webgame_shared::net::{WsConn, WsListener};

/// Listening half of the stub. Bind, hand the URL to the client, then
/// accept.
pub struct StubServer {
    listener: WsListener,
}

impl StubServer {
    /// Binds to an ephemeral local port and returns the `ws://` URL a
    /// client should connect to.
    pub async fn bind_ephemeral() -> anyhow::Result<(Self, String)> {
        let listener = WsListener::bind("127.0.0.1:0").await?;
        let url = format!("ws://{}", listener.local_addr()?);
        Ok((Self { listener }, url))
    }

    pub async fn accept(&self) -> anyhow::Result<StubConn> {
        let conn = self.listener.accept().await?;
        Ok(StubConn { conn })
    }
}

/// One accepted client connection, driven by the test script.
pub struct StubConn {
    conn: WsConn,
}

impl StubConn {
    /// Sends one canned JSON frame.
    pub async fn send_json(&mut self, frame: &Value) -> anyhow::Result<()> {
        self.conn.send(frame).await
    }

    /// Sends a raw text frame, bypassing the codec.
    pub async fn send_raw(&mut self, frame: &str) -> anyhow::Result<()> {
        self.conn.send_text(frame).await
    }

    /// Receives the next client frame, parsed as JSON.
    pub async fn recv_json(&mut self) -> anyhow::Result<Value> {
        let frame = self
            .conn
            .recv()
            .await?
            .context("client closed the connection")?;
        Ok(serde_json::from_str(&frame)?)
    }

    /// Reads the authentication order, replies with a session config and
    /// the player init for `player_id`, and returns the authentication
    /// frame for inspection.
    pub async fn complete_handshake(&mut self, player_id: u64) -> anyhow::Result<Value> {
        let auth = self.recv_json().await?;
        self.send_json(&json!({ "tick_duration": 0.1 })).await?;
        self.send_json(&json!({
            "id": player_id,
            "pos": { "x": 0.0, "y": 0.0 },
            "dir": { "x": 0.0, "y": 0.0 },
            "speed": 0.0,
            "max_speed": 1.0,
        }))
        .await?;
        Ok(auth)
    }

    /// Sends a close frame carrying `reason`.
    pub async fn close(&mut self, reason: &str) -> anyhow::Result<()> {
        self.conn.close(reason).await
    }
}

/// Polls `client` until it reaches `target`, bounded so a wedged client
/// fails the test instead of hanging it.
pub async fn poll_until(client: &mut GameClient, target: ConnectionState) -> anyhow::Result<()> {
    for _ in 0..50 {
        if client.state() == target {
            return Ok(());
        }
        client.poll().await?;
    }
    anyhow::bail!("client stuck in {:?}, wanted {target:?}", client.state())
}

/// Polls `client` until its registry holds `count` entities.
pub async fn poll_until_entities(client: &mut GameClient, count: usize) -> anyhow::Result<()> {
    for _ in 0..50 {
        if client.session().registry().len() == count {
            return Ok(());
        }
        client.poll().await?;
    }
    anyhow::bail!(
        "registry stuck at {} entities, wanted {count}",
        client.session().registry().len()
    )
}
