//! Configuration system.
//!
//! Loads client configuration from JSON strings/files (file IO left to app).

use serde::{Deserialize, Serialize};

/// Root configuration for the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// WebSocket address of the game server, e.g. `ws://127.0.0.1:2000`.
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Name sent in the authentication order.
    #[serde(default = "default_player_name")]
    pub player_name: String,
    /// Simulation loop rate for the standalone client binary.
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,
}

fn default_server_url() -> String {
    "ws://127.0.0.1:2000".to_string()
}

fn default_player_name() -> String {
    "Player".to_string()
}

fn default_tick_hz() -> u32 {
    60
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            player_name: default_player_name(),
            tick_hz: default_tick_hz(),
        }
    }
}

impl ClientConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}
