//! # ECS — Sparse-Set Entity/Component Storage
//!
//! A deliberately small ECS for the instanced game runtime:
//!
//! - [`Entity`]: generational id.
//! - [`ComponentArray`]: packed values + entity ↔ slot tables per type.
//! - [`Registry`]: live entity list, arrays keyed by type, and closure-based
//!   [`views`](Registry::view) over component combinations.
//!
//! Systems are plain functions that take `&mut Registry`; there is no
//! scheduler. The game loop calls them in order each frame.

pub mod component;
pub mod entity;
pub mod registry;
pub mod view;

pub use component::{ComponentArray, ComponentStorage};
pub use entity::{Entity, MAX_ENTITIES};
pub use registry::Registry;
pub use view::ViewParam;
