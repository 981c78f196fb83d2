//! Object pool.
//!
//! Maps server object IDs to live objects, with a per-category index kept in
//! insertion order. The pool never calls `destroy`; callers destroy an object
//! exactly once around removing it.

use std::collections::HashMap;

use indexmap::IndexSet;
use worldsync_shared::protocol::{ObjectCategory, ObjectId};

use crate::object::GameObject;

#[derive(Default)]
pub struct ObjectPool {
    objects: HashMap<ObjectId, Box<dyn GameObject>>,
    by_category: HashMap<ObjectCategory, IndexSet<ObjectId>>,
}

impl ObjectPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an object under its own ID.
    ///
    /// # Panics
    /// If a live object already holds that ID: the previous one would never
    /// be destroyed.
    pub fn add(&mut self, object: Box<dyn GameObject>) {
        let id = object.id();
        assert!(
            !self.objects.contains_key(&id),
            "object {id} added to the pool twice"
        );
        self.by_category
            .entry(object.category())
            .or_default()
            .insert(id);
        self.objects.insert(id, object);
    }

    pub fn get(&self, id: ObjectId) -> Option<&dyn GameObject> {
        self.objects.get(&id).map(|o| &**o)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut (dyn GameObject + 'static)> {
        self.objects.get_mut(&id).map(|o| &mut **o)
    }

    /// Typed lookup.
    pub fn get_as<T: GameObject + 'static>(&self, id: ObjectId) -> Option<&T> {
        self.get(id)?.as_any().downcast_ref::<T>()
    }

    /// Typed mutable lookup.
    pub fn get_as_mut<T: GameObject + 'static>(&mut self, id: ObjectId) -> Option<&mut T> {
        self.get_mut(id)?.as_any_mut().downcast_mut::<T>()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Removes the object from both indices and hands it back.
    pub fn delete(&mut self, id: ObjectId) -> Option<Box<dyn GameObject>> {
        let object = self.objects.remove(&id)?;
        if let Some(ids) = self.by_category.get_mut(&object.category()) {
            ids.shift_remove(&id);
        }
        Some(object)
    }

    /// Live objects of one category, in insertion order.
    pub fn category(&self, category: ObjectCategory) -> impl Iterator<Item = &dyn GameObject> + '_ {
        self.by_category
            .get(&category)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(move |id| self.get(*id))
    }

    /// Number of live objects of one category.
    pub fn category_len(&self, category: ObjectCategory) -> usize {
        self.by_category.get(&category).map_or(0, IndexSet::len)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn GameObject> + '_ {
        self.objects.values().map(|o| &**o)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut (dyn GameObject + 'static)> + '_ {
        self.objects.values_mut().map(|o| &mut **o)
    }

    pub fn ids(&self) -> Vec<ObjectId> {
        self.objects.keys().copied().collect()
    }

    /// Empties the pool without destroying anything.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.by_category.clear();
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{construct, Loot, Player};

    fn pool_with(entries: &[(u16, ObjectCategory)]) -> ObjectPool {
        let mut pool = ObjectPool::new();
        for (id, category) in entries {
            pool.add(construct(*category, ObjectId(*id)));
        }
        pool
    }

    #[test]
    fn delete_then_get_is_not_found() {
        let mut pool = pool_with(&[(1, ObjectCategory::Player), (2, ObjectCategory::Loot)]);
        assert!(pool.delete(ObjectId(1)).is_some());
        assert!(pool.get(ObjectId(1)).is_none());
        assert!(pool.delete(ObjectId(1)).is_none());
        assert_eq!(pool.category_len(ObjectCategory::Player), 0);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn category_iteration_is_filtered_and_ordered() {
        let pool = pool_with(&[
            (5, ObjectCategory::Loot),
            (1, ObjectCategory::Player),
            (3, ObjectCategory::Loot),
            (9, ObjectCategory::Loot),
        ]);
        let loot: Vec<ObjectId> = pool.category(ObjectCategory::Loot).map(|o| o.id()).collect();
        assert_eq!(loot, vec![ObjectId(5), ObjectId(3), ObjectId(9)]);
        assert!(pool
            .category(ObjectCategory::Loot)
            .all(|o| o.category() == ObjectCategory::Loot));
        assert_eq!(pool.category(ObjectCategory::Building).count(), 0);
        assert_eq!(pool.iter().count(), 4);
    }

    #[test]
    fn deleting_keeps_remaining_order() {
        let mut pool = pool_with(&[
            (1, ObjectCategory::Loot),
            (2, ObjectCategory::Loot),
            (3, ObjectCategory::Loot),
        ]);
        pool.delete(ObjectId(2));
        pool.add(construct(ObjectCategory::Loot, ObjectId(2)));
        let loot: Vec<ObjectId> = pool.category(ObjectCategory::Loot).map(|o| o.id()).collect();
        assert_eq!(loot, vec![ObjectId(1), ObjectId(3), ObjectId(2)]);
    }

    #[test]
    fn typed_lookup_checks_concrete_type() {
        let pool = pool_with(&[(1, ObjectCategory::Player)]);
        assert!(pool.get_as::<Player>(ObjectId(1)).is_some());
        assert!(pool.get_as::<Loot>(ObjectId(1)).is_none());
    }

    #[test]
    #[should_panic(expected = "added to the pool twice")]
    fn duplicate_live_id_is_fatal() {
        let mut pool = pool_with(&[(1, ObjectCategory::Player)]);
        pool.add(construct(ObjectCategory::Loot, ObjectId(1)));
    }

    #[test]
    fn clear_empties_both_indices() {
        let mut pool = pool_with(&[(1, ObjectCategory::Player), (2, ObjectCategory::Loot)]);
        pool.clear();
        assert!(pool.is_empty());
        assert_eq!(pool.category(ObjectCategory::Loot).count(), 0);
    }
}
