//! Fire-and-forget notification queues.
//!
//! Sync code emits notifications (sounds, effects, UI messages) without
//! knowing who consumes them; the embedding app drains them once per frame.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
};

/// Typed notification queues, one per notification type.
#[derive(Default)]
pub struct Notifications {
    queues: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Notifications {
    fn queue_mut<E: 'static + Send + Sync>(&mut self) -> &mut Vec<E> {
        self.queues
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(Vec::<E>::new()))
            .downcast_mut::<Vec<E>>()
            .expect("queue keyed by its own TypeId")
    }

    /// Queues a notification.
    pub fn emit<E: 'static + Send + Sync>(&mut self, event: E) {
        self.queue_mut::<E>().push(event);
    }

    /// Takes every queued notification of type `E`, oldest first.
    pub fn drain<E: 'static + Send + Sync>(&mut self) -> Vec<E> {
        self.queues
            .remove(&TypeId::of::<E>())
            .and_then(|boxed| boxed.downcast::<Vec<E>>().ok())
            .map(|boxed| *boxed)
            .unwrap_or_default()
    }

    /// Queued notifications of type `E`.
    pub fn pending<E: 'static + Send + Sync>(&self) -> &[E] {
        self.queues
            .get(&TypeId::of::<E>())
            .and_then(|boxed| boxed.downcast_ref::<Vec<E>>())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Drops every queue.
    pub fn clear(&mut self) {
        self.queues.clear();
    }
}
