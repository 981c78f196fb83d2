//! Per-frame settings snapshot.
//!
//! Console variables are read once per frame into a `FrameSettings` value
//! that is passed down into reconciliation and interpolation.

use std::time::{Duration, Instant};

use worldsync_shared::{
    config::ClientConfig,
    console::{Console, CvarFlags, CvarValue},
};

pub const CVAR_MOVEMENT_SMOOTHING: &str = "cl_movement_smoothing";
pub const CVAR_DRAW_HITBOXES: &str = "cl_draw_hitboxes";

/// Read-only view of the client toggles for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSettings {
    pub movement_smoothing: bool,
    pub draw_hitboxes: bool,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            movement_smoothing: true,
            draw_hitboxes: false,
        }
    }
}

impl FrameSettings {
    pub fn from_console(console: &Console) -> Self {
        Self {
            movement_smoothing: console.get_bool(CVAR_MOVEMENT_SMOOTHING),
            draw_hitboxes: console.get_bool(CVAR_DRAW_HITBOXES),
        }
    }
}

/// Timing inputs for one render pass.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    pub now: Instant,
    /// Measured spacing between the last two tick updates.
    pub tick_interval: Duration,
    pub settings: FrameSettings,
}

/// Registers the client cvars, seeded from config.
pub fn register_cvars(console: &mut Console, cfg: &ClientConfig) {
    console.register_cvar(
        CVAR_MOVEMENT_SMOOTHING,
        CvarValue::Bool(cfg.movement_smoothing),
        "Interpolate object movement between server ticks",
        CvarFlags::ARCHIVE,
    );
    console.register_cvar(
        CVAR_DRAW_HITBOXES,
        CvarValue::Bool(cfg.draw_hitboxes),
        "Draw debug markers for every synchronized object",
        CvarFlags::DEBUG,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_follows_console() {
        let mut console = Console::new();
        register_cvars(&mut console, &ClientConfig::default());
        assert_eq!(FrameSettings::from_console(&console), FrameSettings::default());

        console.exec("cl_movement_smoothing 0").unwrap();
        console.exec("cl_draw_hitboxes 1").unwrap();
        let settings = FrameSettings::from_console(&console);
        assert!(!settings.movement_smoothing);
        assert!(settings.draw_hitboxes);
    }
}
