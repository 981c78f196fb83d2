use worldsync_shared::protocol::{ObjectCategory, ObjectData, ObjectId};

use crate::object::{payload_mismatch, GameObject, ObjectBase, SyncContext};

const LOOT_RADIUS: f32 = 1.5;

/// An item lying on the ground.
#[derive(Debug)]
pub struct Loot {
    base: ObjectBase,
    definition: String,
    count: u32,
}

impl Loot {
    pub fn new(id: ObjectId) -> Self {
        Self {
            base: ObjectBase::new(id, ObjectCategory::Loot),
            definition: String::new(),
            count: 1,
        }
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

impl GameObject for Loot {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn update_from_data(&mut self, data: &ObjectData, is_new: bool, ctx: &mut SyncContext<'_>) -> anyhow::Result<()> {
        let ObjectData::Loot(data) = data else {
            return Err(payload_mismatch(&self.base, data));
        };
        self.base.apply_transform(data.position, None, is_new, ctx)?;
        if let Some(definition) = &data.definition {
            self.definition.clone_from(definition);
        }
        if let Some(layer) = data.layer {
            self.base.set_layer(layer, is_new, ctx);
        }
        if let Some(count) = data.count {
            self.count = count;
        }
        Ok(())
    }

    fn update_debug_graphics(&self, scene: &mut dyn worldsync_shared::render::Scene) {
        scene.draw_debug_circle(self.base.render_position(), LOOT_RADIUS);
    }

    fn is_interactable(&self) -> bool {
        true
    }
}
