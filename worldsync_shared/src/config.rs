//! Client configuration.
//!
//! Loads from JSON strings or files; every field has a default so partial
//! files are fine.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Root client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server address, e.g. `127.0.0.1:40000`.
    #[serde(default = "default_server_addr")]
    pub server_addr: String,
    /// Nominal server tick rate. Seeds the tick interval until two updates
    /// have been measured.
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,
    /// Render passes per second for the headless driver.
    #[serde(default = "default_frame_hz")]
    pub frame_hz: u32,
    /// RTT probe period.
    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,
    #[serde(default = "default_player_name")]
    pub player_name: String,
    #[serde(default = "default_skin")]
    pub skin: String,
    #[serde(default)]
    pub badge: Option<String>,
    #[serde(default)]
    pub emotes: Vec<String>,
    /// Initial value of `cl_movement_smoothing`.
    #[serde(default = "default_true")]
    pub movement_smoothing: bool,
    /// Initial value of `cl_draw_hitboxes`.
    #[serde(default)]
    pub draw_hitboxes: bool,
}

fn default_server_addr() -> String {
    "127.0.0.1:40000".to_string()
}

fn default_tick_hz() -> u32 {
    40
}

fn default_frame_hz() -> u32 {
    60
}

fn default_ping_interval_ms() -> u64 {
    5000
}

fn default_player_name() -> String {
    "Player".to_string()
}

fn default_skin() -> String {
    "default".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: default_server_addr(),
            tick_hz: default_tick_hz(),
            frame_hz: default_frame_hz(),
            ping_interval_ms: default_ping_interval_ms(),
            player_name: default_player_name(),
            skin: default_skin(),
            badge: None,
            emotes: Vec::new(),
            movement_smoothing: true,
            draw_hitboxes: false,
        }
    }
}

impl ClientConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Reads and parses a JSON config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("parse config {}", path.display()))
    }

    /// Tick interval implied by `tick_hz`.
    pub fn nominal_tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.tick_hz.max(1) as f64)
    }
}
