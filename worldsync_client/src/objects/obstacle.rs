use worldsync_shared::protocol::{ObjectCategory, ObjectData, ObjectId};

use crate::{
    notify::{EffectEvent, SoundCue},
    object::{check_scalar, payload_mismatch, GameObject, ObjectBase, SyncContext},
};

/// Trees, crates, walls and doors.
#[derive(Debug)]
pub struct Obstacle {
    base: ObjectBase,
    definition: String,
    scale: f32,
    /// `Some` only for doors.
    door_open: Option<bool>,
}

impl Obstacle {
    pub fn new(id: ObjectId) -> Self {
        Self {
            base: ObjectBase::new(id, ObjectCategory::Obstacle),
            definition: String::new(),
            scale: 1.0,
            door_open: None,
        }
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn is_door(&self) -> bool {
        self.door_open.is_some()
    }

    pub fn door_open(&self) -> Option<bool> {
        self.door_open
    }
}

impl GameObject for Obstacle {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn update_from_data(&mut self, data: &ObjectData, is_new: bool, ctx: &mut SyncContext<'_>) -> anyhow::Result<()> {
        let ObjectData::Obstacle(data) = data else {
            return Err(payload_mismatch(&self.base, data));
        };
        let scale = data.scale.map(|s| check_scalar("scale", s)).transpose()?;
        self.base.apply_transform(data.position, data.rotation, is_new, ctx)?;

        if let Some(definition) = &data.definition {
            self.definition.clone_from(definition);
        }
        if let Some(layer) = data.layer {
            self.base.set_layer(layer, is_new, ctx);
        }
        if let Some(scale) = scale {
            self.scale = scale;
        }
        if let Some(open) = data.door_open {
            if !is_new && self.door_open.is_some_and(|was| was != open) {
                let sound = if open { "door_open" } else { "door_close" };
                ctx.notify
                    .emit(SoundCue::at(sound, self.base.position(), self.base.layer));
            }
            self.door_open = Some(open);
        }
        if data.dead == Some(true) && self.base.kill() && !is_new {
            ctx.notify.emit(EffectEvent::Debris {
                definition: self.definition.clone(),
                position: self.base.position(),
            });
            ctx.notify.emit(SoundCue::at(
                format!("{}_destroyed", self.definition),
                self.base.position(),
                self.base.layer,
            ));
        }
        Ok(())
    }

    fn update_debug_graphics(&self, scene: &mut dyn worldsync_shared::render::Scene) {
        scene.draw_debug_circle(self.base.render_position(), self.scale);
    }

    fn is_interactable(&self) -> bool {
        self.is_door() && !self.base.dead
    }
}
