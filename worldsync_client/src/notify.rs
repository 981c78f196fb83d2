//! Notifications emitted by the sync core for the sound, effect and UI layers.
//!
//! Emitted into `worldsync_shared::event::Notifications` and drained by the
//! embedding app. The core never waits on them.

use std::time::Duration;

use worldsync_shared::{
    math::Vec2,
    protocol::{Layer, ObjectId, PlayerStatus},
};

/// A positional sound to play.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundCue {
    pub name: String,
    pub position: Option<Vec2>,
    pub layer: Layer,
}

impl SoundCue {
    pub fn at(name: impl Into<String>, position: Vec2, layer: Layer) -> Self {
        Self {
            name: name.into(),
            position: Some(position),
            layer,
        }
    }

    pub fn global(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: None,
            layer: Layer::GROUND,
        }
    }
}

/// Visual one-shots for the particle/effect layer.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectEvent {
    Explosion { definition: String, position: Vec2, layer: Layer },
    Emote { player: ObjectId, emote: String, position: Vec2 },
    EmoteHidden { player: ObjectId },
    Debris { definition: String, position: Vec2 },
    CeilingCollapse { building: ObjectId, position: Vec2 },
    MarkerDrop { marker: ObjectId, position: Vec2 },
    MarkerSettled { marker: ObjectId },
    PlaneFlyover { position: Vec2, direction: f32 },
    MapPing { definition: String, position: Vec2, player: Option<ObjectId> },
}

/// Messages for the HUD and menus.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    GameStarted { team_id: u8, team_mode: bool },
    MapLoaded { seed: u32, width: u32, height: u32 },
    Status(PlayerStatus),
    AliveCount(u32),
    /// Nearest object the local player can interact with changed.
    Interactable(Option<ObjectId>),
    KillFeed(String),
    Report { player: String, report_id: String },
    Pickup { item: String, message: Option<String> },
    Ping(Duration),
    /// Short error splash, e.g. a failed connection.
    Splash(String),
    /// The play button is usable again.
    EnablePlay,
    ConnectionLost,
    /// Client code is stale; reload with this cache-busting query.
    ForceReload { query: String },
    GameOver { won: bool, rank: u32, kills: u32 },
    Spectating,
}
