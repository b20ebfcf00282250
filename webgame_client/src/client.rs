//! Client shell.
//!
//! Owns the socket and the session: frames drain in through
//! [`GameClient::poll`], ticks run through [`GameClient::tick`]. Both
//! execute on one task, so session state is never touched concurrently.

use std::time::Duration;

use anyhow::Context;
use tracing::{error, info};

use webgame_shared::config::ClientConfig;
use webgame_shared::net::WsConn;
use webgame_shared::protocol::ClientMessage;

use crate::entity::AssetCatalog;
use crate::input::{InputSample, ScreenMapper};
use crate::session::{ConnectionState, Session};

/// How long one poll waits for the next inbound frame.
const POLL_WAIT: Duration = Duration::from_millis(10);

/// High-level game client.
pub struct GameClient {
    session: Session,
    conn: WsConn,
}

impl GameClient {
    /// Connects to the server and sends the authentication order.
    pub async fn connect(cfg: &ClientConfig) -> anyhow::Result<Self> {
        info!(server = %cfg.server_url, "Connecting to server");
        let mut conn = WsConn::connect(&cfg.server_url).await?;

        let mut session = Session::new(cfg.player_name.clone());
        let auth = session.begin_authentication()?;
        conn.send(&auth).await.context("send authentication")?;
        session.authentication_sent();

        Ok(Self { session, conn })
    }

    /// Drains available inbound frames into the session.
    ///
    /// Waits at most [`POLL_WAIT`] per frame, so a quiet socket never
    /// blocks the simulation loop. A fatal handshake frame surfaces as an
    /// error; socket close moves the session to
    /// [`ConnectionState::Closed`].
    pub async fn poll(&mut self) -> anyhow::Result<()> {
        loop {
            match tokio::time::timeout(POLL_WAIT, self.conn.recv()).await {
                Ok(Ok(Some(frame))) => {
                    if let Err(e) = self.session.handle_frame(&frame) {
                        error!(error = %e, "Handshake failed");
                        return Err(e);
                    }
                }
                Ok(Ok(None)) => {
                    self.session.on_socket_closed();
                    return Ok(());
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    // Timeout, no frame available.
                    return Ok(());
                }
            }
        }
    }

    /// Advances one simulation tick and transmits any due orders in FIFO
    /// order.
    pub async fn tick(&mut self, dt: f32, input: &InputSample) -> anyhow::Result<()> {
        for action in self.session.simulate(dt, input) {
            self.conn
                .send(&ClientMessage::Action(action))
                .await
                .context("send order")?;
        }
        Ok(())
    }

    pub fn state(&self) -> ConnectionState {
        self.session.state()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Installs the host's screen-to-world translation.
    pub fn set_screen_mapper(&mut self, mapper: Box<dyn ScreenMapper>) {
        self.session.set_screen_mapper(mapper);
    }

    /// Installs the host's asset lookup.
    pub fn set_asset_catalog(&mut self, catalog: Box<dyn AssetCatalog>) {
        self.session.set_asset_catalog(catalog);
    }
}
