//! Scene-graph collaborator.
//!
//! The sync core does not draw. It tells a scene implementation which
//! objects exist, where they are, and (when enabled) what debug overlay to draw.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{
    math::Vec2,
    protocol::{Layer, ObjectCategory, ObjectId},
};

/// What the sync core needs from a renderer.
pub trait Scene: Send {
    /// A synchronized object was created.
    fn add_object(&mut self, id: ObjectId, category: ObjectCategory, layer: Layer);
    /// The object was destroyed; release its renderables.
    fn remove_object(&mut self, id: ObjectId);
    /// Interpolated transform for this frame.
    fn set_transform(&mut self, id: ObjectId, position: Vec2, rotation: f32);
    /// The object moved to another layer.
    fn set_layer(&mut self, id: ObjectId, layer: Layer);
    /// Debug overlay marker.
    fn draw_debug_circle(&mut self, position: Vec2, radius: f32);
}

/// A scene that draws nothing; for headless runs.
#[derive(Default)]
pub struct NullScene;

impl Scene for NullScene {
    fn add_object(&mut self, _id: ObjectId, _category: ObjectCategory, _layer: Layer) {}
    fn remove_object(&mut self, _id: ObjectId) {}
    fn set_transform(&mut self, _id: ObjectId, _position: Vec2, _rotation: f32) {}
    fn set_layer(&mut self, _id: ObjectId, _layer: Layer) {}
    fn draw_debug_circle(&mut self, _position: Vec2, _radius: f32) {}
}

/// One call observed by a `RecordingScene`.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneOp {
    Add(ObjectId, ObjectCategory, Layer),
    Remove(ObjectId),
    SetLayer(ObjectId, Layer),
}

/// Everything a `RecordingScene` has seen.
#[derive(Debug, Default)]
pub struct SceneLog {
    pub ops: Vec<SceneOp>,
    pub transforms: HashMap<ObjectId, (Vec2, f32)>,
    pub debug_circles: usize,
}

impl SceneLog {
    /// How many times `id` was removed.
    pub fn removals(&self, id: ObjectId) -> usize {
        self.ops.iter().filter(|op| **op == SceneOp::Remove(id)).count()
    }

    /// How many times an object with `id` was added.
    pub fn additions(&self, id: ObjectId) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, SceneOp::Add(added, _, _) if *added == id))
            .count()
    }
}

/// A scene that records calls; clones share one log. Useful for headless tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingScene {
    log: Arc<Mutex<SceneLog>>,
}

impl RecordingScene {
    pub fn log(&self) -> MutexGuard<'_, SceneLog> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Scene for RecordingScene {
    fn add_object(&mut self, id: ObjectId, category: ObjectCategory, layer: Layer) {
        self.log().ops.push(SceneOp::Add(id, category, layer));
    }

    fn remove_object(&mut self, id: ObjectId) {
        let mut log = self.log();
        log.ops.push(SceneOp::Remove(id));
        log.transforms.remove(&id);
    }

    fn set_transform(&mut self, id: ObjectId, position: Vec2, rotation: f32) {
        self.log().transforms.insert(id, (position, rotation));
    }

    fn set_layer(&mut self, id: ObjectId, layer: Layer) {
        self.log().ops.push(SceneOp::SetLayer(id, layer));
    }

    fn draw_debug_circle(&mut self, _position: Vec2, _radius: f32) {
        self.log().debug_circles += 1;
    }
}
