//! Configuration system.
//!
//! Loads client configuration from JSON strings/files (file IO left to app).

use serde::{Deserialize, Serialize};

/// Root configuration for the arena client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server address, e.g. `127.0.0.1:40000`.
    pub server_addr: String,
    /// Target presentation frame rate.
    pub frame_hz: u32,
    /// Viewport width in pixels.
    #[serde(default = "default_viewport_width")]
    pub viewport_width: f32,
    /// Viewport height in pixels.
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f32,
    /// Player name.
    #[serde(default = "default_player_name")]
    pub player_name: String,
}

fn default_viewport_width() -> f32 {
    1280.0
}

fn default_viewport_height() -> f32 {
    720.0
}

fn default_player_name() -> String {
    "Player".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:40000".to_string(),
            frame_hz: 60,
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            player_name: default_player_name(),
        }
    }
}

impl ClientConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}
