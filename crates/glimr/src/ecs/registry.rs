//! # Registry — Entities and Their Component Arrays
//!
//! The [`Registry`] owns:
//!
//! - an [`EntityAllocator`] for ids (generational, bounded by
//!   [`MAX_ENTITIES`](super::entity::MAX_ENTITIES)),
//! - a dense list of live entities plus an index → dense-slot table, so
//!   "iterate every live entity" never touches dead slots,
//! - one type-erased [`ComponentArray`] per component type, keyed by
//!   [`TypeId`].
//!
//! ```text
//! alive:       [ a, c, d ]
//! alive_index: [ 0, -, 1, 2 ]        (entity index → slot in `alive`)
//! arrays:      { Transform → ComponentArray<Transform>,
//!                Tint      → ComponentArray<Tint>, ... }
//! ```
//!
//! Destroying an entity asks every array to drop its component, then removes
//! the entity from `alive` with the same swap-with-last trick the arrays use.
//!
//! ## Misuse
//!
//! Inserting a component twice, removing one that isn't there, or destroying
//! an unknown entity are programmer errors. They trip `debug_assert!`s in
//! debug builds and are ignored in release builds.

use std::any::TypeId;
use std::collections::HashMap;

use super::component::{ComponentArray, ComponentStorage};
use super::entity::{Entity, EntityAllocator};
use super::view::ViewParam;

/// Entity/component storage for the instanced game runtime.
pub struct Registry {
    allocator: EntityAllocator,
    alive: Vec<Entity>,
    alive_index: Vec<Option<usize>>,
    arrays: HashMap<TypeId, Box<dyn ComponentStorage>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            alive: Vec::new(),
            alive_index: Vec::new(),
            arrays: HashMap::new(),
        }
    }

    /// Create a fresh entity with no components.
    ///
    /// # Panics
    ///
    /// Panics when [`MAX_ENTITIES`](super::entity::MAX_ENTITIES) entities are
    /// already alive.
    pub fn create(&mut self) -> Entity {
        let entity = self
            .allocator
            .allocate()
            .unwrap_or_else(|| panic!("entity limit of {} reached", super::entity::MAX_ENTITIES));
        let idx = entity.index as usize;
        if self.alive_index.len() <= idx {
            self.alive_index.resize(idx + 1, None);
        }
        self.alive_index[idx] = Some(self.alive.len());
        self.alive.push(entity);
        entity
    }

    /// Destroy an entity and every component it owns.
    pub fn destroy(&mut self, entity: Entity) {
        if !self.is_alive(entity) {
            debug_assert!(false, "destroying unknown entity {entity:?}");
            return;
        }
        for array in self.arrays.values_mut() {
            array.remove_entity(entity);
        }

        let idx = entity.index as usize;
        if let Some(slot) = self.alive_index[idx].take() {
            let last = self.alive.len() - 1;
            if slot != last {
                let moved = self.alive[last];
                self.alive_index[moved.index as usize] = Some(slot);
            }
            self.alive.swap_remove(slot);
        }
        self.allocator.deallocate(entity);
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
            && self
                .alive_index
                .get(entity.index as usize)
                .is_some_and(|slot| slot.is_some())
    }

    /// Live entities in dense order.
    pub fn entities(&self) -> &[Entity] {
        &self.alive
    }

    pub fn len(&self) -> usize {
        self.alive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alive.is_empty()
    }

    /// Attach a component to a live entity.
    pub fn add<T: 'static>(&mut self, entity: Entity, component: T) {
        debug_assert!(self.is_alive(entity), "adding component to dead {entity:?}");
        self.array_mut_or_insert::<T>().insert(entity, component);
    }

    /// Detach and return a component.
    pub fn remove<T: 'static>(&mut self, entity: Entity) -> Option<T> {
        let removed = self.array_mut::<T>().and_then(|array| array.remove(entity));
        debug_assert!(
            removed.is_some(),
            "{entity:?} has no `{}` to remove",
            std::any::type_name::<T>()
        );
        removed
    }

    pub fn has<T: 'static>(&self, entity: Entity) -> bool {
        self.array::<T>().is_some_and(|array| array.contains(entity))
    }

    pub fn get<T: 'static>(&self, entity: Entity) -> Option<&T> {
        self.array::<T>()?.get(entity)
    }

    pub fn get_mut<T: 'static>(&mut self, entity: Entity) -> Option<&mut T> {
        self.array_mut::<T>()?.get_mut(entity)
    }

    /// Typed access to the packed array for `T`, if any `T` was ever added.
    pub fn array<T: 'static>(&self) -> Option<&ComponentArray<T>> {
        self.arrays
            .get(&TypeId::of::<T>())
            .and_then(|array| array.as_any().downcast_ref())
    }

    fn array_mut<T: 'static>(&mut self) -> Option<&mut ComponentArray<T>> {
        self.arrays
            .get_mut(&TypeId::of::<T>())
            .and_then(|array| array.as_any_mut().downcast_mut())
    }

    fn array_mut_or_insert<T: 'static>(&mut self) -> &mut ComponentArray<T> {
        self.arrays
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentArray::<T>::new()))
            .as_any_mut()
            .downcast_mut()
            .unwrap_or_else(|| panic!("array type mismatch for `{}`", std::any::type_name::<T>()))
    }

    /// Visit every live entity that has all components in `P`.
    ///
    /// ```ignore
    /// registry.view::<(&Transform, &mut Velocity)>(|entity, (t, v)| {
    ///     v.0 *= 0.99;
    /// });
    /// ```
    pub fn view<P: ViewParam>(&mut self, mut f: impl FnMut(Entity, P::Item<'_>)) {
        debug_assert!(
            {
                let ids = P::type_ids();
                ids.iter()
                    .enumerate()
                    .all(|(i, id)| !ids[i + 1..].contains(id))
            },
            "a view may name each component type only once"
        );

        let mut storage = P::extract(&mut self.arrays);
        for entity in P::lead_entities(&storage) {
            if !self.allocator.is_alive(entity) {
                continue;
            }
            if let Some(item) = P::fetch(&mut storage, entity) {
                f(entity, item);
            }
        }
        P::restore(storage, &mut self.arrays);
    }

    /// Number of live entities that have a `T`.
    pub fn count<T: 'static>(&self) -> usize {
        self.array::<T>().map_or(0, |array| array.len())
    }

    /// Destroy every entity.
    pub fn clear(&mut self) {
        for entity in self.alive.clone() {
            self.destroy(entity);
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Pos(f32, f32);

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Vel(f32, f32);

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Tag;

    #[test]
    fn create_and_destroy() {
        let mut reg = Registry::new();
        let a = reg.create();
        let b = reg.create();
        assert_eq!(reg.len(), 2);
        reg.destroy(a);
        assert!(!reg.is_alive(a));
        assert!(reg.is_alive(b));
        assert_eq!(reg.entities(), &[b]);
    }

    #[test]
    fn destroy_removes_every_component() {
        let mut reg = Registry::new();
        let a = reg.create();
        let b = reg.create();
        reg.add(a, Pos(1.0, 2.0));
        reg.add(a, Vel(0.5, 0.0));
        reg.add(b, Pos(3.0, 4.0));

        reg.destroy(a);
        assert!(!reg.has::<Pos>(a));
        assert!(!reg.has::<Vel>(a));
        assert_eq!(reg.count::<Pos>(), 1);
        assert_eq!(reg.count::<Vel>(), 0);
        assert_eq!(reg.get::<Pos>(b), Some(&Pos(3.0, 4.0)));
    }

    #[test]
    fn recycled_entity_starts_empty() {
        let mut reg = Registry::new();
        let a = reg.create();
        reg.add(a, Tag);
        reg.destroy(a);
        let b = reg.create();
        assert_eq!(b.index(), a.index());
        assert!(!reg.has::<Tag>(b));
        assert!(!reg.has::<Tag>(a));
    }

    #[test]
    fn has_tracks_latest_operation() {
        // For every (entity, component) pair `has` follows the most recent
        // add/remove, across a mixed sequence of creates and destroys.
        let mut reg = Registry::new();
        let mut model: Vec<(Entity, bool, bool)> = Vec::new();
        for step in 0..200u32 {
            match step % 7 {
                0 | 3 => {
                    let e = reg.create();
                    model.push((e, false, false));
                }
                1 | 4 if !model.is_empty() => {
                    let i = (step as usize * 31) % model.len();
                    let (e, has_pos, _) = &mut model[i];
                    if *has_pos {
                        reg.remove::<Pos>(*e);
                    } else {
                        reg.add(*e, Pos(step as f32, 0.0));
                    }
                    *has_pos = !*has_pos;
                }
                2 | 5 if !model.is_empty() => {
                    let i = (step as usize * 17) % model.len();
                    let (e, _, has_vel) = &mut model[i];
                    if !*has_vel {
                        reg.add(*e, Vel(0.0, step as f32));
                        *has_vel = true;
                    }
                }
                6 if model.len() > 2 => {
                    let i = (step as usize * 13) % model.len();
                    let (e, _, _) = model.swap_remove(i);
                    reg.destroy(e);
                }
                _ => {}
            }

            for &(e, has_pos, has_vel) in &model {
                assert!(reg.is_alive(e));
                assert_eq!(reg.has::<Pos>(e), has_pos);
                assert_eq!(reg.has::<Vel>(e), has_vel);
            }
            if let Some(array) = reg.array::<Pos>() {
                for (e, _) in array.iter() {
                    assert!(reg.is_alive(e), "dead entity left in dense array");
                }
            }
        }
    }

    #[test]
    fn view_visits_matching_entities() {
        let mut reg = Registry::new();
        let a = reg.create();
        let b = reg.create();
        let c = reg.create();
        reg.add(a, Pos(0.0, 0.0));
        reg.add(a, Vel(1.0, 1.0));
        reg.add(b, Pos(5.0, 5.0));
        reg.add(c, Vel(2.0, 0.0));
        reg.add(c, Pos(1.0, 0.0));

        let mut visited = Vec::new();
        reg.view::<(&mut Pos, &Vel)>(|e, (pos, vel)| {
            pos.0 += vel.0;
            pos.1 += vel.1;
            visited.push(e);
        });

        assert_eq!(visited, vec![a, c]);
        assert_eq!(reg.get::<Pos>(a), Some(&Pos(1.0, 1.0)));
        assert_eq!(reg.get::<Pos>(b), Some(&Pos(5.0, 5.0)));
        assert_eq!(reg.get::<Pos>(c), Some(&Pos(3.0, 0.0)));
    }

    #[test]
    fn view_over_unknown_type_is_empty() {
        let mut reg = Registry::new();
        let a = reg.create();
        reg.add(a, Pos(0.0, 0.0));
        let mut hits = 0;
        reg.view::<(&Pos, &Tag)>(|_, _| hits += 1);
        assert_eq!(hits, 0);
        // The arrays survive the view.
        assert!(reg.has::<Pos>(a));
    }

    #[test]
    fn single_component_view() {
        let mut reg = Registry::new();
        for i in 0..5 {
            let e = reg.create();
            reg.add(e, Pos(i as f32, 0.0));
        }
        let mut sum = 0.0;
        reg.view::<&Pos>(|_, p| sum += p.0);
        assert_eq!(sum, 10.0);
    }

    #[test]
    fn clear_empties_everything() {
        let mut reg = Registry::new();
        for _ in 0..10 {
            let e = reg.create();
            reg.add(e, Tag);
        }
        reg.clear();
        assert!(reg.is_empty());
        assert_eq!(reg.count::<Tag>(), 0);
    }
}
