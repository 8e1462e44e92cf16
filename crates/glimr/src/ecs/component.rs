//! # Component — Sparse-Set Storage per Component Type
//!
//! Each component type gets one [`ComponentArray<T>`]: a packed `Vec<T>` plus
//! two index tables that translate between entities and packed slots.
//!
//! ```text
//! dense:    [ Pos(a) | Pos(c) | Pos(d) ]      ← values, no holes
//! entities: [   a    |   c    |   d    ]      ← slot → entity
//! sparse:   [ 0, -, 1, 2, - ... ]             ← entity index → slot
//! ```
//!
//! Iteration walks `dense` front to back, which is what the instanced renderer
//! wants: transforms and colours of every brick sit next to each other.
//!
//! ## Removal
//!
//! Removal swaps the victim with the last slot and pops. Only two sparse
//! entries change (the victim's and the moved entity's), so every operation
//! is O(1) and the arrays never contain holes or dead entities.
//!
//! ## Type Erasure
//!
//! The registry holds arrays of many types in one map. [`ComponentStorage`]
//! is the object-safe part it needs without knowing `T`: remove-if-present
//! (for entity destruction) and downcasting back to the concrete array.
//!
//! ## Comparison
//!
//! - **EnTT (C++)**: The same sparse-set layout, with paged sparse arrays.
//! - **hecs / bevy_ecs**: Archetype tables instead; faster multi-component
//!   iteration, costlier insert/remove.

use std::any::Any;

use super::entity::Entity;

/// Object-safe view of a component array, used by the registry.
pub trait ComponentStorage: Any {
    /// Remove the component for `entity` if it has one. Returns whether
    /// anything was removed.
    fn remove_entity(&mut self, entity: Entity) -> bool;

    fn contains(&self, entity: Entity) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Packed slot → entity table.
    fn entities(&self) -> &[Entity];

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Packed storage for every `T` component in a registry.
pub struct ComponentArray<T> {
    dense: Vec<T>,
    entities: Vec<Entity>,
    sparse: Vec<Option<usize>>,
}

impl<T> ComponentArray<T> {
    pub fn new() -> Self {
        Self {
            dense: Vec::new(),
            entities: Vec::new(),
            sparse: Vec::new(),
        }
    }

    fn slot(&self, entity: Entity) -> Option<usize> {
        let slot = (*self.sparse.get(entity.index as usize)?)?;
        // The slot may belong to a newer entity in the same index.
        (self.entities[slot] == entity).then_some(slot)
    }

    /// Append a component for `entity`.
    ///
    /// Inserting twice for the same entity is a programmer error.
    pub fn insert(&mut self, entity: Entity, value: T) {
        debug_assert!(
            self.slot(entity).is_none(),
            "{entity:?} already has a `{}`",
            std::any::type_name::<T>()
        );
        let idx = entity.index as usize;
        if self.sparse.len() <= idx {
            self.sparse.resize(idx + 1, None);
        }
        self.sparse[idx] = Some(self.dense.len());
        self.dense.push(value);
        self.entities.push(entity);
    }

    /// Swap-remove the component for `entity` and return it.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let slot = self.slot(entity)?;
        let last = self.dense.len() - 1;
        if slot != last {
            let moved = self.entities[last];
            self.sparse[moved.index as usize] = Some(slot);
        }
        self.sparse[entity.index as usize] = None;
        self.entities.swap_remove(slot);
        Some(self.dense.swap_remove(slot))
    }

    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.slot(entity).map(|slot| &self.dense[slot])
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.slot(entity).map(|slot| &mut self.dense[slot])
    }

    /// Packed component values in slot order.
    pub fn values(&self) -> &[T] {
        &self.dense
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.dense.iter())
    }
}

impl<T> Default for ComponentArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> ComponentStorage for ComponentArray<T> {
    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_some()
    }

    fn contains(&self, entity: Entity) -> bool {
        self.slot(entity).is_some()
    }

    fn len(&self) -> usize {
        self.dense.len()
    }

    fn entities(&self) -> &[Entity] {
        &self.entities
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(index: u32) -> Entity {
        Entity {
            index,
            generation: 0,
        }
    }

    #[test]
    fn insert_and_get() {
        let mut arr = ComponentArray::new();
        arr.insert(e(3), 1.5f32);
        arr.insert(e(0), 2.5f32);
        assert_eq!(arr.get(e(3)), Some(&1.5));
        assert_eq!(arr.get(e(0)), Some(&2.5));
        assert_eq!(arr.get(e(1)), None);
        assert_eq!(arr.values(), &[1.5, 2.5]);
    }

    #[test]
    fn remove_middle_swaps_last_in() {
        let mut arr = ComponentArray::new();
        arr.insert(e(0), 10u32);
        arr.insert(e(1), 20u32);
        arr.insert(e(2), 30u32);
        assert_eq!(arr.remove(e(0)), Some(10));
        assert_eq!(arr.values(), &[30, 20]);
        assert_eq!(arr.entities(), &[e(2), e(1)]);
        assert_eq!(arr.get(e(2)), Some(&30));
        assert_eq!(arr.get(e(1)), Some(&20));
    }

    #[test]
    fn remove_last_keeps_order() {
        let mut arr = ComponentArray::new();
        arr.insert(e(0), 'a');
        arr.insert(e(1), 'b');
        assert_eq!(arr.remove(e(1)), Some('b'));
        assert_eq!(arr.values(), &['a']);
        assert!(!arr.contains(e(1)));
    }

    #[test]
    fn stale_generation_does_not_match() {
        let mut arr = ComponentArray::new();
        arr.insert(e(4), 1u8);
        let stale = Entity {
            index: 4,
            generation: 7,
        };
        assert_eq!(arr.get(stale), None);
        assert_eq!(arr.remove(stale), None);
        assert_eq!(arr.len(), 1);
    }

    #[test]
    fn remove_then_reinsert() {
        let mut arr = ComponentArray::new();
        arr.insert(e(0), 1i32);
        arr.remove(e(0));
        arr.insert(e(0), 2i32);
        assert_eq!(arr.get(e(0)), Some(&2));
        assert_eq!(arr.len(), 1);
    }

    #[test]
    fn drop_called_on_remove() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static DROP_COUNT: AtomicUsize = AtomicUsize::new(0);

        struct Tracked;
        impl Drop for Tracked {
            fn drop(&mut self) {
                DROP_COUNT.fetch_add(1, Ordering::SeqCst);
            }
        }

        DROP_COUNT.store(0, Ordering::SeqCst);
        let mut arr = ComponentArray::new();
        arr.insert(e(0), Tracked);
        arr.insert(e(1), Tracked);
        assert!(arr.remove_entity(e(0)));
        assert_eq!(DROP_COUNT.load(Ordering::SeqCst), 1);
        drop(arr);
        assert_eq!(DROP_COUNT.load(Ordering::SeqCst), 2);
    }
}
