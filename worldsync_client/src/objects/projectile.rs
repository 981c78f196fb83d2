use worldsync_shared::protocol::{ObjectCategory, ObjectData, ObjectId};

use crate::{
    notify::SoundCue,
    object::{payload_mismatch, GameObject, ObjectBase, SyncContext},
};

/// Grenades and other thrown items.
#[derive(Debug)]
pub struct ThrowableProjectile {
    base: ObjectBase,
    definition: String,
    airborne: bool,
    activated: bool,
}

impl ThrowableProjectile {
    pub fn new(id: ObjectId) -> Self {
        Self {
            base: ObjectBase::new(id, ObjectCategory::ThrowableProjectile),
            definition: String::new(),
            airborne: false,
            activated: false,
        }
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    pub fn airborne(&self) -> bool {
        self.airborne
    }

    pub fn activated(&self) -> bool {
        self.activated
    }
}

impl GameObject for ThrowableProjectile {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn update_from_data(&mut self, data: &ObjectData, is_new: bool, ctx: &mut SyncContext<'_>) -> anyhow::Result<()> {
        let ObjectData::ThrowableProjectile(data) = data else {
            return Err(payload_mismatch(&self.base, data));
        };
        self.base.apply_transform(data.position, data.rotation, is_new, ctx)?;
        if let Some(definition) = &data.definition {
            self.definition.clone_from(definition);
        }
        if let Some(layer) = data.layer {
            self.base.set_layer(layer, is_new, ctx);
        }
        if let Some(airborne) = data.airborne {
            self.airborne = airborne;
        }
        if let Some(activated) = data.activated {
            if activated && !self.activated && !is_new {
                ctx.notify.emit(SoundCue::at(
                    format!("{}_fuse", self.definition),
                    self.base.position(),
                    self.base.layer,
                ));
            }
            self.activated = activated;
        }
        Ok(())
    }
}

/// Server-simulated projectile (rockets, arrows) synced like any object.
#[derive(Debug)]
pub struct Projectile {
    base: ObjectBase,
    definition: String,
    owner: Option<ObjectId>,
}

impl Projectile {
    pub fn new(id: ObjectId) -> Self {
        Self {
            base: ObjectBase::new(id, ObjectCategory::Projectile),
            definition: String::new(),
            owner: None,
        }
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    pub fn owner(&self) -> Option<ObjectId> {
        self.owner
    }
}

impl GameObject for Projectile {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn update_from_data(&mut self, data: &ObjectData, is_new: bool, ctx: &mut SyncContext<'_>) -> anyhow::Result<()> {
        let ObjectData::Projectile(data) = data else {
            return Err(payload_mismatch(&self.base, data));
        };
        self.base.apply_transform(data.position, data.rotation, is_new, ctx)?;
        if let Some(definition) = &data.definition {
            self.definition.clone_from(definition);
        }
        if let Some(layer) = data.layer {
            self.base.set_layer(layer, is_new, ctx);
        }
        if let Some(owner) = data.owner {
            self.owner = Some(owner);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use worldsync_shared::protocol::{Layer, ThrowableData};

    use super::*;
    use crate::objects::testing::Harness;

    #[test]
    fn layer_change_reaches_scene_only_after_creation() {
        let mut h = Harness::default();
        let now = Instant::now();
        let mut grenade = ThrowableProjectile::new(ObjectId(20));
        let on = |layer| {
            ObjectData::ThrowableProjectile(ThrowableData {
                layer: Some(layer),
                ..Default::default()
            })
        };
        grenade.update_from_data(&on(Layer::UPSTAIRS), true, &mut h.ctx(now)).unwrap();
        grenade.update_from_data(&on(Layer::UPSTAIRS), false, &mut h.ctx(now)).unwrap();
        grenade.update_from_data(&on(Layer::BASEMENT), false, &mut h.ctx(now)).unwrap();

        assert_eq!(
            h.scene.log().ops,
            vec![worldsync_shared::render::SceneOp::SetLayer(ObjectId(20), Layer::BASEMENT)]
        );
    }

    #[test]
    fn fuse_sound_on_activation() {
        let mut h = Harness::default();
        let now = Instant::now();
        let mut grenade = ThrowableProjectile::new(ObjectId(20));
        grenade
            .update_from_data(
                &ObjectData::ThrowableProjectile(ThrowableData {
                    definition: Some("frag_grenade".into()),
                    activated: Some(false),
                    ..Default::default()
                }),
                true,
                &mut h.ctx(now),
            )
            .unwrap();
        grenade
            .update_from_data(
                &ObjectData::ThrowableProjectile(ThrowableData {
                    activated: Some(true),
                    ..Default::default()
                }),
                false,
                &mut h.ctx(now),
            )
            .unwrap();
        assert!(grenade.activated());
        assert_eq!(h.notify.drain::<SoundCue>()[0].name, "frag_grenade_fuse");
    }
}
