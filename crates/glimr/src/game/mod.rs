//! # Game — Instanced Brick-Breaker Runtime
//!
//! A paddle, a ball and a 10 × 30 brick grid living in the [`Registry`](crate::ecs::Registry).
//!
//! ```text
//! frame ─► GameInput (cursor, clamped dt)
//!       ─► systems::step   paddle_control ─► ball_physics ─► handle_death
//!       ─► InstancedRenderer::render   cubes + spheres, two draws
//! ```
//!
//! | Module | Role |
//! |---|---|
//! | [`components`] | marker components, tint, velocity, score state |
//! | [`config`] | arena bounds, grid, speeds and scoring |
//! | [`collision`] | AABB vs circle contact |
//! | [`systems`] | per-frame game logic |
//! | [`render`] | instanced drawing |

pub mod collision;
pub mod components;
pub mod config;
pub mod render;
pub mod systems;

pub use collision::{Axis, Contact, aabb_circle};
pub use components::{Ball, Brick, GameInput, GameState, Paddle, Shape, Tint, Velocity};
pub use config::ArenaConfig;
pub use render::{InstanceData, InstancedRenderer};
pub use systems::{Arena, spawn_arena, step};
