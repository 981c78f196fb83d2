//! Synchronized game objects.
//!
//! Every object the server replicates implements [`GameObject`]. Shared
//! state (ID, category, layer, lifecycle flags, interpolated transform,
//! owned timers) lives in [`ObjectBase`], which concrete types embed.
//!
//! Lifecycle: constructed and fed its first payload with `is_new = true`,
//! updated any number of times with `is_new = false`, destroyed exactly once.
//! `dead` is orthogonal: it may flip to true mid-life and never flips back.

use std::{any::Any, time::Instant};

use anyhow::ensure;
use worldsync_shared::{
    event::Notifications,
    math::Vec2,
    protocol::{Layer, ObjectCategory, ObjectData, ObjectId},
    render::Scene,
};

use crate::{
    ancillary::PlayerNames,
    interp::{Angle, Interpolated},
    settings::{FrameContext, FrameSettings},
    timer::{TimerHandle, TimerKind, TimerQueue},
};

/// Largest coordinate accepted from a payload.
pub const MAX_COORDINATE: f32 = 4096.0;

/// Collaborators available while applying network data.
pub struct SyncContext<'a> {
    pub now: Instant,
    pub settings: FrameSettings,
    pub scene: &'a mut dyn Scene,
    pub timers: &'a mut TimerQueue,
    pub notify: &'a mut Notifications,
    pub names: &'a PlayerNames,
}

/// Downcasting support for trait objects.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Contract every synchronized entity satisfies.
pub trait GameObject: AsAny + Send {
    fn base(&self) -> &ObjectBase;
    fn base_mut(&mut self) -> &mut ObjectBase;

    /// Applies a full or partial payload.
    ///
    /// `is_new` is true only for the first payload after construction: snap,
    /// skip transition effects. Errors leave the object usable; the caller
    /// logs and moves on.
    fn update_from_data(&mut self, data: &ObjectData, is_new: bool, ctx: &mut SyncContext<'_>) -> anyhow::Result<()>;

    /// Per-frame logic independent of network data.
    fn update(&mut self, _now: Instant) {}

    /// Recomputes the render transform from the stored samples.
    fn update_interpolation(&mut self, frame: &FrameContext) {
        self.base_mut().update_interpolation(frame);
    }

    /// Releases renderables and kills owned timers. Called exactly once.
    fn destroy(&mut self, ctx: &mut SyncContext<'_>) {
        self.base_mut().destroy(ctx);
    }

    /// Diagnostic overlay, only called when hitbox drawing is enabled.
    fn update_debug_graphics(&self, scene: &mut dyn Scene) {
        scene.draw_debug_circle(self.base().render_position(), 1.0);
    }

    /// A timer this object scheduled came due.
    fn on_timer(&mut self, _kind: TimerKind, _ctx: &mut SyncContext<'_>) {}

    /// Whether the local player can interact with this object right now.
    fn is_interactable(&self) -> bool {
        false
    }

    fn id(&self) -> ObjectId {
        self.base().id
    }

    fn category(&self) -> ObjectCategory {
        self.base().category
    }
}

/// State shared by every synchronized object.
#[derive(Debug)]
pub struct ObjectBase {
    pub id: ObjectId,
    pub category: ObjectCategory,
    pub layer: Layer,
    /// Killed but still shown (corpse, collapsed ceiling, rubble).
    pub dead: bool,
    /// Removed from the pool; timers must not act on it.
    pub destroyed: bool,
    position: Interpolated<Vec2>,
    rotation: Interpolated<Angle>,
    render_position: Vec2,
    render_rotation: f32,
    timers: Vec<TimerHandle>,
}

impl ObjectBase {
    pub fn new(id: ObjectId, category: ObjectCategory) -> Self {
        Self {
            id,
            category,
            layer: Layer::GROUND,
            dead: false,
            destroyed: false,
            position: Interpolated::new(Vec2::ZERO),
            rotation: Interpolated::new(Angle(0.0)),
            render_position: Vec2::ZERO,
            render_rotation: 0.0,
            timers: Vec::new(),
        }
    }

    /// Latest authoritative position.
    pub fn position(&self) -> Vec2 {
        self.position.current()
    }

    /// Latest authoritative rotation.
    pub fn rotation(&self) -> f32 {
        self.rotation.current().0
    }

    pub fn render_position(&self) -> Vec2 {
        self.render_position
    }

    pub fn render_rotation(&self) -> f32 {
        self.render_rotation
    }

    /// Validates then applies optional position/rotation fields.
    pub fn apply_transform(
        &mut self,
        position: Option<Vec2>,
        rotation: Option<f32>,
        is_new: bool,
        ctx: &SyncContext<'_>,
    ) -> anyhow::Result<()> {
        if let Some(p) = position {
            ensure!(
                p.x.is_finite() && p.y.is_finite() && p.x.abs() <= MAX_COORDINATE && p.y.abs() <= MAX_COORDINATE,
                "position {:?} out of range",
                p
            );
        }
        if let Some(r) = rotation {
            ensure!(r.is_finite(), "rotation {} not finite", r);
        }

        if let Some(p) = position {
            if is_new {
                self.position.snap(p);
            } else {
                self.position.set(p, ctx.now);
            }
            if is_new || !ctx.settings.movement_smoothing || !self.position.has_previous() {
                self.render_position = p;
            }
        }
        if let Some(r) = rotation {
            if is_new {
                self.rotation.snap(Angle(r));
            } else {
                self.rotation.set(Angle(r), ctx.now);
            }
            if is_new || !ctx.settings.movement_smoothing || !self.rotation.has_previous() {
                self.render_rotation = r;
            }
        }
        Ok(())
    }

    pub fn set_layer(&mut self, layer: Layer, is_new: bool, ctx: &mut SyncContext<'_>) {
        if layer != self.layer && !is_new {
            ctx.scene.set_layer(self.id, layer);
        }
        self.layer = layer;
    }

    /// Marks the object dead. Returns true on the alive -> dead transition.
    pub fn kill(&mut self) -> bool {
        let transition = !self.dead;
        self.dead = true;
        transition
    }

    /// Schedules a timer owned by this object.
    pub fn schedule(&mut self, kind: TimerKind, delay: std::time::Duration, ctx: &mut SyncContext<'_>) -> TimerHandle {
        self.timers.retain(|t| !t.is_killed());
        let handle = ctx.timers.schedule(self.id, kind, delay, ctx.now);
        self.timers.push(handle.clone());
        handle
    }

    /// Kills every timer this object scheduled.
    pub fn kill_timers(&mut self) {
        for timer in self.timers.drain(..) {
            timer.kill();
        }
    }

    pub fn update_interpolation(&mut self, frame: &FrameContext) {
        if !frame.settings.movement_smoothing {
            self.render_position = self.position.current();
            self.render_rotation = self.rotation.current().0;
            return;
        }
        if self.position.has_previous() {
            self.render_position = self.position.sample(frame.now, frame.tick_interval);
        }
        if self.rotation.has_previous() {
            self.render_rotation = self.rotation.sample(frame.now, frame.tick_interval).0;
        }
    }

    pub fn destroy(&mut self, ctx: &mut SyncContext<'_>) {
        self.kill_timers();
        ctx.scene.remove_object(self.id);
        self.destroyed = true;
    }
}

/// Error for a payload whose variant does not match the object.
pub fn payload_mismatch(base: &ObjectBase, data: &ObjectData) -> anyhow::Error {
    anyhow::anyhow!(
        "object {} is a {:?}, payload is for {:?}",
        base.id,
        base.category,
        data.category()
    )
}

/// Rejects non-finite or negative scalar fields.
pub fn check_scalar(name: &str, value: f32) -> anyhow::Result<f32> {
    ensure!(value.is_finite() && value >= 0.0, "{} out of range: {}", name, value);
    Ok(value)
}
