//! # Entity — Lightweight Identifiers for Game Objects
//!
//! An [`Entity`] is just a number: it doesn't "contain" anything. The
//! [`Registry`](super::registry::Registry) maps entities to their components
//! through per-type [`ComponentArray`](super::component::ComponentArray)s.
//!
//! ## Generational Indices
//!
//! Slots are recycled when entities are destroyed. Each slot carries a
//! generation counter that is bumped on release, so a stale handle to a
//! recycled slot is detected instead of silently aliasing the new entity:
//!
//! ```text
//! Entity { index: 5, generation: 0 }  ← original
//! Entity { index: 5, generation: 1 }  ← after recycle
//! ```
//!
//! ## Capacity
//!
//! The registry has a fixed maximum of [`MAX_ENTITIES`] live entities. A
//! brick-breaker level needs a few hundred; the cap keeps the sparse tables
//! bounded.

use std::fmt;

/// Maximum number of simultaneously live entities.
pub const MAX_ENTITIES: usize = 4096;

/// A lightweight handle to an entity in a [`Registry`](super::registry::Registry).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl Entity {
    /// Returns the raw slot index.
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Hands out entity ids and recycles freed slots.
///
/// ```text
/// generations: [0, 1, 0, 2, 0]   ← one generation per slot ever allocated
/// free_list:   [1, 3]             ← slots available for reuse
/// ```
pub(crate) struct EntityAllocator {
    generations: Vec<u32>,
    free_list: Vec<u32>,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Allocate a new entity, reusing a freed slot when possible. Returns
    /// `None` once [`MAX_ENTITIES`] slots are in use.
    pub fn allocate(&mut self) -> Option<Entity> {
        if let Some(index) = self.free_list.pop() {
            let generation = self.generations[index as usize];
            return Some(Entity { index, generation });
        }
        if self.generations.len() >= MAX_ENTITIES {
            return None;
        }
        let index = self.generations.len() as u32;
        self.generations.push(0);
        Some(Entity {
            index,
            generation: 0,
        })
    }

    /// Release an entity. Returns `false` if the handle was already stale.
    pub fn deallocate(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        self.generations[entity.index as usize] += 1;
        self.free_list.push(entity.index);
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        let idx = entity.index as usize;
        idx < self.generations.len() && self.generations[idx] == entity.generation
    }

    /// Number of slots ever handed out (live + free).
    pub fn slot_count(&self) -> usize {
        self.generations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_sequential() {
        let mut alloc = EntityAllocator::new();
        let e0 = alloc.allocate().unwrap();
        let e1 = alloc.allocate().unwrap();
        assert_eq!((e0.index, e0.generation), (0, 0));
        assert_eq!((e1.index, e1.generation), (1, 0));
    }

    #[test]
    fn recycled_slot_bumps_generation() {
        let mut alloc = EntityAllocator::new();
        let e0 = alloc.allocate().unwrap();
        assert!(alloc.deallocate(e0));
        let e1 = alloc.allocate().unwrap();
        assert_eq!(e1.index, e0.index);
        assert_eq!(e1.generation, 1);
        assert!(!alloc.is_alive(e0));
        assert!(alloc.is_alive(e1));
    }

    #[test]
    fn double_free_is_rejected() {
        let mut alloc = EntityAllocator::new();
        let e = alloc.allocate().unwrap();
        assert!(alloc.deallocate(e));
        assert!(!alloc.deallocate(e));
    }

    #[test]
    fn capacity_is_bounded() {
        let mut alloc = EntityAllocator::new();
        for _ in 0..MAX_ENTITIES {
            assert!(alloc.allocate().is_some());
        }
        assert!(alloc.allocate().is_none());
    }

    #[test]
    fn debug_format() {
        let e = Entity {
            index: 42,
            generation: 3,
        };
        assert_eq!(format!("{e:?}"), "Entity(42v3)");
    }
}
