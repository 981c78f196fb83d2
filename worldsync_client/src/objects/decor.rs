//! Decals, airdrop parachutes and server-synced particles.

use anyhow::ensure;
use worldsync_shared::protocol::{ObjectCategory, ObjectData, ObjectId};

use crate::object::{check_scalar, payload_mismatch, GameObject, ObjectBase, SyncContext};

#[derive(Debug)]
pub struct Decal {
    base: ObjectBase,
    definition: String,
}

impl Decal {
    pub fn new(id: ObjectId) -> Self {
        Self {
            base: ObjectBase::new(id, ObjectCategory::Decal),
            definition: String::new(),
        }
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }
}

impl GameObject for Decal {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn update_from_data(&mut self, data: &ObjectData, is_new: bool, ctx: &mut SyncContext<'_>) -> anyhow::Result<()> {
        let ObjectData::Decal(data) = data else {
            return Err(payload_mismatch(&self.base, data));
        };
        self.base.apply_transform(data.position, data.rotation, is_new, ctx)?;
        if let Some(definition) = &data.definition {
            self.definition.clone_from(definition);
        }
        if let Some(layer) = data.layer {
            self.base.set_layer(layer, is_new, ctx);
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct Parachute {
    base: ObjectBase,
    /// 1.0 at spawn, 0.0 on landing.
    height: f32,
}

impl Parachute {
    pub fn new(id: ObjectId) -> Self {
        Self {
            base: ObjectBase::new(id, ObjectCategory::Parachute),
            height: 1.0,
        }
    }

    pub fn height(&self) -> f32 {
        self.height
    }
}

impl GameObject for Parachute {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn update_from_data(&mut self, data: &ObjectData, is_new: bool, ctx: &mut SyncContext<'_>) -> anyhow::Result<()> {
        let ObjectData::Parachute(data) = data else {
            return Err(payload_mismatch(&self.base, data));
        };
        if let Some(height) = data.height {
            ensure!((0.0..=1.0).contains(&height), "parachute height out of range: {}", height);
        }
        self.base.apply_transform(data.position, None, is_new, ctx)?;
        if let Some(height) = data.height {
            self.height = height;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct SyncedParticle {
    base: ObjectBase,
    definition: String,
    scale: f32,
    alpha: f32,
}

impl SyncedParticle {
    pub fn new(id: ObjectId) -> Self {
        Self {
            base: ObjectBase::new(id, ObjectCategory::SyncedParticle),
            definition: String::new(),
            scale: 1.0,
            alpha: 1.0,
        }
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

impl GameObject for SyncedParticle {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn update_from_data(&mut self, data: &ObjectData, is_new: bool, ctx: &mut SyncContext<'_>) -> anyhow::Result<()> {
        let ObjectData::SyncedParticle(data) = data else {
            return Err(payload_mismatch(&self.base, data));
        };
        let scale = data.scale.map(|s| check_scalar("scale", s)).transpose()?;
        let alpha = data.alpha.map(|a| check_scalar("alpha", a)).transpose()?;
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
        if let Some(alpha) = alpha {
            self.alpha = alpha.min(1.0);
        }
        Ok(())
    }
}
