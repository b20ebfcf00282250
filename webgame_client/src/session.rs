//! Session context and connection state machine.
//!
//! The session sequences the handshake, routes steady-state traffic to
//! the entity registry, and runs the per-tick simulation step. Each state
//! accepts exactly one shape of inbound frame, dispatched by a single
//! stored state value.
//!
//! The session itself is synchronous and does no IO; the async shell in
//! [`crate::client`] feeds it frames and transmits what [`Session::simulate`]
//! returns.

use anyhow::Context;
use tracing::{info, warn};

use webgame_shared::math::Vec2;
use webgame_shared::protocol::{
    decode_frame, Action, ClientMessage, EntityId, PlayerInit, ServerMessage, SessionConfig,
    StateUpdate,
};

use crate::entity::{AssetCatalog, EntityRegistry, SpriteCatalog};
use crate::input::{IdentityMapper, InputSample, ScreenMapper};
use crate::movement;
use crate::orders::{IntentTracker, OrderQueue};
use crate::render::Camera;

/// Connection phase. Transitions are one-directional; `Closed` is
/// terminal and reachable from every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Socket is opening.
    Connecting,
    /// Authentication order is in flight.
    Authenticating,
    /// Waiting for the session configuration.
    AwaitingConfig,
    /// Waiting for the local player's initial state.
    AwaitingPlayerInit,
    /// Steady state: snapshots in, orders out.
    Synchronized,
    /// Socket closed. Everything becomes a no-op; the registry keeps its
    /// last state.
    Closed,
}

/// One connection's worth of client state.
///
/// Owns the registry, the order queue, intent tracking, and the camera.
/// Constructed on connect, torn down with the connection.
pub struct Session {
    state: ConnectionState,
    player_name: String,
    registry: EntityRegistry,
    orders: OrderQueue,
    intent: IntentTracker,
    camera: Camera,
    catalog: Box<dyn AssetCatalog>,
    mapper: Box<dyn ScreenMapper>,
    config: Option<SessionConfig>,
    max_speed: Option<f32>,
}

impl Session {
    /// Creates a session with the local player seeded at the origin under
    /// a placeholder id.
    pub fn new(player_name: impl Into<String>) -> Self {
        let catalog: Box<dyn AssetCatalog> = Box::new(SpriteCatalog);
        let mut registry = EntityRegistry::new();
        registry.spawn_local(catalog.as_ref(), Vec2::ZERO);
        Self {
            state: ConnectionState::Connecting,
            player_name: player_name.into(),
            registry,
            orders: OrderQueue::new(),
            intent: IntentTracker::new(),
            camera: Camera::default(),
            catalog,
            mapper: Box::new(IdentityMapper),
            config: None,
            max_speed: None,
        }
    }

    // ─── Handshake ───

    /// Called when the socket opens. Returns the authentication order to
    /// transmit.
    pub fn begin_authentication(&mut self) -> anyhow::Result<ClientMessage> {
        if self.state != ConnectionState::Connecting {
            anyhow::bail!("authentication begun in state {:?}", self.state);
        }
        self.state = ConnectionState::Authenticating;
        info!(player_name = %self.player_name, "Authenticating");
        Ok(ClientMessage::Authentication {
            player_name: self.player_name.clone(),
        })
    }

    /// Called once the authentication order has gone out.
    pub fn authentication_sent(&mut self) {
        if self.state == ConnectionState::Authenticating {
            self.state = ConnectionState::AwaitingConfig;
        }
    }

    // ─── Inbound dispatch ───

    /// Dispatches one inbound text frame according to the current state.
    ///
    /// A handshake frame that fails to parse is fatal for this attempt:
    /// the error comes back to the caller and the state stays where it
    /// is. In steady state a malformed frame is logged and skipped.
    pub fn handle_frame(&mut self, frame: &str) -> anyhow::Result<()> {
        match self.state {
            ConnectionState::Connecting | ConnectionState::Authenticating => {
                warn!(state = ?self.state, "Dropping frame received before handshake");
                Ok(())
            }
            ConnectionState::AwaitingConfig => self.handle_config(frame),
            ConnectionState::AwaitingPlayerInit => self.handle_player_init(frame),
            ConnectionState::Synchronized => {
                self.handle_world(frame);
                Ok(())
            }
            ConnectionState::Closed => Ok(()),
        }
    }

    fn handle_config(&mut self, frame: &str) -> anyhow::Result<()> {
        let config: SessionConfig = decode_frame(frame).context("session config frame")?;
        info!(
            tick_duration = config.tick_duration,
            game_name = config.game_name.as_deref().unwrap_or(""),
            "Got session config"
        );
        self.config = Some(config);
        self.state = ConnectionState::AwaitingPlayerInit;
        Ok(())
    }

    fn handle_player_init(&mut self, frame: &str) -> anyhow::Result<()> {
        let init: PlayerInit = decode_frame(frame).context("player init frame")?;
        self.registry.rekey_local(init.id);
        if let Some(local) = self.registry.local_mut() {
            local.position = init.pos;
            local.direction = init.dir;
            local.speed = init.speed;
        }
        self.camera.focus = init.pos;
        self.max_speed = Some(init.max_speed);
        self.state = ConnectionState::Synchronized;
        info!(
            id = ?init.id,
            pos = ?init.pos,
            speed = init.speed,
            max_speed = init.max_speed,
            "Got player state, synchronized"
        );
        Ok(())
    }

    fn handle_world(&mut self, frame: &str) {
        let msg: ServerMessage = match decode_frame(frame) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(error = %e, "Skipping unparseable frame");
                return;
            }
        };
        match msg {
            ServerMessage::State(StateUpdate::Entities { data }) => {
                for snapshot in &data {
                    self.registry
                        .upsert_from_snapshot(self.catalog.as_ref(), snapshot);
                }
            }
            ServerMessage::State(StateUpdate::Player { pos, dir, speed }) => {
                if let Some(local) = self.registry.local_mut() {
                    local.position = pos;
                    local.direction = dir;
                    local.speed = speed;
                }
            }
            ServerMessage::State(StateUpdate::Game(config)) => {
                // A config resend in steady state: keep the latest.
                self.config = Some(config);
            }
            ServerMessage::Remove { ids } => {
                self.registry.remove(&ids);
            }
        }
    }

    /// Socket close, from any state. A socket error alone does not land
    /// here; only the close that follows it does.
    pub fn on_socket_closed(&mut self) {
        if self.state != ConnectionState::Closed {
            info!(state = ?self.state, "Session closed");
            self.state = ConnectionState::Closed;
        }
    }

    // ─── Simulation ───

    /// Runs one tick: prediction over every entity, intent translation
    /// for `input`, then an order flush when due.
    ///
    /// Returns the orders to transmit, in program order. Flushing only
    /// happens once synchronized; orders queued earlier wait. After close
    /// this is a no-op.
    pub fn simulate(&mut self, dt: f32, input: &InputSample) -> Vec<Action> {
        if self.state == ConnectionState::Closed {
            return Vec::new();
        }
        movement::advance_all(&mut self.registry, dt);
        if let Some(local) = self.registry.local() {
            let position = local.position;
            let cursor_world = self.mapper.to_world(input.cursor);
            let move_to = input.move_to_click.map(|p| self.mapper.to_world(p));
            self.intent
                .apply(input.move_held, cursor_world, move_to, position, &mut self.orders);
        }
        self.orders
            .flush(dt, self.state == ConnectionState::Synchronized)
    }

    // ─── Accessors ───

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Session parameters from the handshake, once received.
    pub fn session_config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    /// The server-reported speed cap for the local player.
    pub fn max_speed(&self) -> Option<f32> {
        self.max_speed
    }

    pub fn local_player_id(&self) -> Option<EntityId> {
        self.registry.local_id()
    }

    /// Orders waiting for the next flush.
    pub fn pending_orders(&self) -> usize {
        self.orders.len()
    }

    /// Installs the host's screen-to-world translation.
    pub fn set_screen_mapper(&mut self, mapper: Box<dyn ScreenMapper>) {
        self.mapper = mapper;
    }

    /// Installs the host's asset lookup.
    pub fn set_asset_catalog(&mut self, catalog: Box<dyn AssetCatalog>) {
        self.catalog = catalog;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;

    const CONFIG_FRAME: &str = r#"{"tick_duration":0.1}"#;
    const INIT_FRAME: &str = r#"{"id":7,"pos":{"x":0.0,"y":0.0},"dir":{"x":0.0,"y":0.0},"speed":0.0,"max_speed":1.0}"#;

    fn synchronized_session() -> Session {
        let mut session = Session::new("tester");
        session.begin_authentication().unwrap();
        session.authentication_sent();
        session.handle_frame(CONFIG_FRAME).unwrap();
        session.handle_frame(INIT_FRAME).unwrap();
        session
    }

    fn held_move(x: f32, y: f32) -> InputSample {
        InputSample {
            move_held: true,
            move_to_click: None,
            cursor: Vec2::new(x, y),
        }
    }

    #[test]
    fn handshake_reaches_synchronized() {
        let mut session = Session::new("tester");
        assert_eq!(session.state(), ConnectionState::Connecting);

        let auth = session.begin_authentication().unwrap();
        assert_eq!(
            auth,
            ClientMessage::Authentication {
                player_name: "tester".to_string()
            }
        );
        assert_eq!(session.state(), ConnectionState::Authenticating);

        session.authentication_sent();
        assert_eq!(session.state(), ConnectionState::AwaitingConfig);

        session.handle_frame(CONFIG_FRAME).unwrap();
        assert_eq!(session.state(), ConnectionState::AwaitingPlayerInit);

        session.handle_frame(INIT_FRAME).unwrap();
        assert_eq!(session.state(), ConnectionState::Synchronized);
        assert_eq!(session.local_player_id(), Some(EntityId(7)));
        assert_eq!(session.camera().focus, Vec2::ZERO);
        assert_eq!(session.max_speed(), Some(1.0));
    }

    #[test]
    fn tagged_config_frame_is_accepted() {
        let mut session = Session::new("tester");
        session.begin_authentication().unwrap();
        session.authentication_sent();
        session
            .handle_frame(
                r#"{"order":"state","suborder":"game","tick_duration":0.05,"game_name":"arena"}"#,
            )
            .unwrap();
        assert_eq!(session.state(), ConnectionState::AwaitingPlayerInit);
        let config = session.session_config().unwrap();
        assert_eq!(config.tick_duration, 0.05);
        assert_eq!(config.game_name.as_deref(), Some("arena"));
    }

    #[test]
    fn malformed_config_is_fatal_but_leaves_state() {
        let mut session = Session::new("tester");
        session.begin_authentication().unwrap();
        session.authentication_sent();

        assert!(session.handle_frame("not json at all").is_err());
        assert_eq!(session.state(), ConnectionState::AwaitingConfig);
    }

    #[test]
    fn malformed_player_init_is_fatal() {
        let mut session = Session::new("tester");
        session.begin_authentication().unwrap();
        session.authentication_sent();
        session.handle_frame(CONFIG_FRAME).unwrap();

        assert!(session.handle_frame(r#"{"id":7}"#).is_err());
        assert_eq!(session.state(), ConnectionState::AwaitingPlayerInit);
    }

    #[test]
    fn frames_before_authentication_are_dropped() {
        let mut session = Session::new("tester");
        session.handle_frame(CONFIG_FRAME).unwrap();
        assert_eq!(session.state(), ConnectionState::Connecting);
        assert!(session.session_config().is_none());
    }

    #[test]
    fn entity_snapshots_are_routed_to_the_registry() {
        let mut session = synchronized_session();
        session
            .handle_frame(
                r#"{"order":"state","suborder":"entities","data":[{"id":3,"pos":{"x":1.0,"y":1.0},"type":"npc_enemy_1"}]}"#,
            )
            .unwrap();

        assert_eq!(session.registry().len(), 2);
        let npc = session.registry().get(EntityId(3)).unwrap();
        assert_eq!(npc.position, Vec2::new(1.0, 1.0));
        assert_eq!(npc.kind, EntityKind::EnemyNpc);
        assert_eq!(npc.direction, Vec2::ZERO);
        assert_eq!(npc.speed, 0.0);
    }

    #[test]
    fn player_correction_wins_over_prediction() {
        let mut session = synchronized_session();
        session
            .handle_frame(
                r#"{"order":"state","suborder":"player","pos":{"x":1.0,"y":1.0},"dir":{"x":0.0,"y":1.0},"speed":2.0}"#,
            )
            .unwrap();
        session.simulate(0.5, &InputSample::default());

        // Predicted to (1, 2); the next correction overrides it outright.
        session
            .handle_frame(
                r#"{"order":"state","suborder":"player","pos":{"x":5.0,"y":5.0},"dir":{"x":0.0,"y":0.0},"speed":0.0}"#,
            )
            .unwrap();
        assert_eq!(
            session.registry().local().unwrap().position,
            Vec2::new(5.0, 5.0)
        );
    }

    #[test]
    fn remove_orders_are_routed() {
        let mut session = synchronized_session();
        session
            .handle_frame(
                r#"{"order":"state","suborder":"entities","data":[{"id":3,"pos":{"x":1.0,"y":1.0}}]}"#,
            )
            .unwrap();
        session.handle_frame(r#"{"order":"remove","ids":[3,99]}"#).unwrap();

        assert_eq!(session.registry().len(), 1);
        assert!(session.registry().get(EntityId(3)).is_none());
    }

    #[test]
    fn own_id_in_entities_snapshot_is_ignored() {
        let mut session = synchronized_session();
        session
            .handle_frame(
                r#"{"order":"state","suborder":"entities","data":[{"id":7,"pos":{"x":9.0,"y":9.0}}]}"#,
            )
            .unwrap();

        assert_eq!(session.registry().len(), 1);
        assert_eq!(session.registry().local().unwrap().position, Vec2::ZERO);
    }

    #[test]
    fn unparseable_world_frame_is_skipped() {
        let mut session = synchronized_session();
        session.handle_frame("garbage").unwrap();
        assert_eq!(session.state(), ConnectionState::Synchronized);
        assert_eq!(session.registry().len(), 1);
    }

    #[test]
    fn simulate_returns_due_orders_in_program_order() {
        let mut session = synchronized_session();
        let flushed = session.simulate(0.0, &held_move(3.0, 4.0));
        assert_eq!(
            flushed,
            vec![
                Action::ChangeSpeed { speed: 1.0 },
                Action::ChangeDir { dir: Vec2::new(3.0, 4.0) },
            ]
        );
    }

    #[test]
    fn orders_queued_before_sync_flush_after() {
        let mut session = Session::new("tester");
        session.begin_authentication().unwrap();
        session.authentication_sent();

        assert!(session.simulate(1.0, &held_move(1.0, 0.0)).is_empty());
        assert_eq!(session.pending_orders(), 2);

        session.handle_frame(CONFIG_FRAME).unwrap();
        session.handle_frame(INIT_FRAME).unwrap();
        let flushed = session.simulate(0.0, &InputSample::default());
        assert_eq!(flushed.len(), 3);
        assert_eq!(flushed[0], Action::ChangeSpeed { speed: 1.0 });
        assert!(matches!(flushed[1], Action::ChangeDir { .. }));
        assert_eq!(flushed[2], Action::ChangeSpeed { speed: 0.0 });
    }

    #[test]
    fn close_freezes_the_session() {
        let mut session = synchronized_session();
        session
            .handle_frame(
                r#"{"order":"state","suborder":"player","pos":{"x":0.0,"y":0.0},"dir":{"x":0.0,"y":1.0},"speed":1.0}"#,
            )
            .unwrap();
        session.on_socket_closed();
        assert_eq!(session.state(), ConnectionState::Closed);

        // No prediction, no dispatch, registry untouched.
        assert!(session.simulate(1.0, &held_move(1.0, 1.0)).is_empty());
        assert_eq!(session.registry().local().unwrap().position, Vec2::ZERO);
        session
            .handle_frame(
                r#"{"order":"state","suborder":"entities","data":[{"id":3,"pos":{"x":1.0,"y":1.0}}]}"#,
            )
            .unwrap();
        assert_eq!(session.registry().len(), 1);
    }

    #[test]
    fn close_is_reachable_from_every_state() {
        let mut session = Session::new("tester");
        session.on_socket_closed();
        assert_eq!(session.state(), ConnectionState::Closed);

        let mut session = Session::new("tester");
        session.begin_authentication().unwrap();
        session.authentication_sent();
        session.on_socket_closed();
        assert_eq!(session.state(), ConnectionState::Closed);
        assert!(session.handle_frame(CONFIG_FRAME).is_ok());
        assert_eq!(session.state(), ConnectionState::Closed);
    }
}
