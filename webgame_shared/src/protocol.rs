//! Wire protocol.
//!
//! All traffic is JSON text frames over a single WebSocket. Messages carry
//! an `order` tag, and state updates a `suborder` tag below it. Outbound
//! encoding reduces every float to 3 decimal digits; in-memory state keeps
//! full precision.

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::math::Vec2;

/// Server-assigned entity identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Key for the locally spawned player entry until the handshake
    /// assigns the real id.
    pub const PLACEHOLDER: Self = Self(u64::MAX);
}

// ─── Client → server ───

/// Envelope for everything the client sends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "order", rename_all = "snake_case")]
pub enum ClientMessage {
    /// First message after the socket opens.
    Authentication { player_name: String },
    /// A queued player order, sent during steady state.
    Action(Action),
}

/// One discrete player order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "suborder", rename_all = "snake_case")]
pub enum Action {
    ChangeSpeed { speed: f32 },
    ChangeDir { dir: Vec2 },
    MoveTo { target_pos: Vec2 },
}

// ─── Server → client ───

/// Envelope for steady-state server traffic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "order", rename_all = "snake_case")]
pub enum ServerMessage {
    State(StateUpdate),
    /// Entities to delete from the local mirror.
    Remove { ids: Vec<EntityId> },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "suborder", rename_all = "snake_case")]
pub enum StateUpdate {
    /// Snapshot batch for entities other than the local player.
    Entities { data: Vec<EntitySnapshot> },
    /// Authoritative correction of the local player.
    Player { pos: Vec2, dir: Vec2, speed: f32 },
    /// Session configuration, normally seen during the handshake.
    Game(SessionConfig),
}

/// Session parameters sent by the server after authentication.
///
/// The production server wraps this in a tagged `state`/`game` frame;
/// unknown fields are ignored so both the bare and the tagged shape parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    pub tick_duration: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_name: Option<String>,
}

/// Initial local-player state, completing the handshake.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PlayerInit {
    pub id: EntityId,
    pub pos: Vec2,
    pub dir: Vec2,
    pub speed: f32,
    pub max_speed: f32,
}

/// One entity's state within a snapshot batch. Fields beyond `pos` are
/// optional; absent ones leave the mirrored entity untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub pos: Vec2,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<Vec2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

// ─── Codec helpers ───

/// Serializes `msg` to a text frame, rounding every float field to 3
/// decimal digits. Integer fields are left exact.
pub fn encode_frame<T: Serialize>(msg: &T) -> anyhow::Result<String> {
    let mut value = serde_json::to_value(msg).context("serialize frame")?;
    round_floats(&mut value);
    serde_json::to_string(&value).context("encode frame")
}

/// Parses a text frame into `T`, ignoring unknown fields.
pub fn decode_frame<T: DeserializeOwned>(frame: &str) -> anyhow::Result<T> {
    serde_json::from_str(frame).context("decode frame")
}

fn round_floats(value: &mut Value) {
    match value {
        Value::Number(n) if n.is_f64() => {
            if let Some(f) = n.as_f64() {
                let rounded = (f * 1000.0).round() / 1000.0;
                if let Some(replacement) = serde_json::Number::from_f64(rounded) {
                    *n = replacement;
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                round_floats(item);
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                round_floats(item);
            }
        }
        _ => {}
    }
}
