use worldsync_shared::protocol::{ObjectCategory, ObjectData, ObjectId};

use crate::{
    notify::{EffectEvent, SoundCue},
    object::{payload_mismatch, GameObject, ObjectBase, SyncContext},
};

/// A building. "Dead" means the ceiling has collapsed.
#[derive(Debug)]
pub struct Building {
    base: ObjectBase,
    definition: String,
}

impl Building {
    pub fn new(id: ObjectId) -> Self {
        Self {
            base: ObjectBase::new(id, ObjectCategory::Building),
            definition: String::new(),
        }
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    pub fn ceiling_collapsed(&self) -> bool {
        self.base.dead
    }
}

impl GameObject for Building {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn update_from_data(&mut self, data: &ObjectData, is_new: bool, ctx: &mut SyncContext<'_>) -> anyhow::Result<()> {
        let ObjectData::Building(data) = data else {
            return Err(payload_mismatch(&self.base, data));
        };
        self.base.apply_transform(data.position, data.rotation, is_new, ctx)?;
        if let Some(definition) = &data.definition {
            self.definition.clone_from(definition);
        }
        if let Some(layer) = data.layer {
            self.base.set_layer(layer, is_new, ctx);
        }
        if data.dead == Some(true) && self.base.kill() && !is_new {
            ctx.notify.emit(EffectEvent::CeilingCollapse {
                building: self.base.id,
                position: self.base.position(),
            });
            ctx.notify.emit(SoundCue::at(
                "ceiling_collapse",
                self.base.position(),
                self.base.layer,
            ));
        }
        Ok(())
    }
}
