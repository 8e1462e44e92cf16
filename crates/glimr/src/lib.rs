//! # Glimr — Real-Time 3D Rendering Runtime
//!
//! A small scene/rendering runtime on top of wgpu: a skinned-mesh importer and
//! skeleton evaluator, a PBR material pipeline with environment reflection and
//! shadow mapping, an HDRI cubemap baker, and an instanced entity/component
//! game runtime.
//!
//! Start with `use glimr::prelude::*`, implement [`Sample`](app::Sample) and
//! hand it to [`app::run`].
//!
//! ## Frame Order
//!
//! ```text
//! update ─► animation clocks + bone palettes
//!        ─► game systems (paddle, ball, collisions)
//! render ─► shadow pass (depth only, per cascade)
//!        ─► main pass: sky ─► opaque ─► transparent (back-to-front)
//!        ─► overlay hook
//!        ─► present
//! ```

pub mod app;
pub mod camera;
pub mod config;
pub mod ecs;
pub mod error;
pub mod game;
pub mod input;
pub mod math;
pub mod model;
pub mod prelude;
pub mod render;
pub mod render3d;
pub mod time;
pub(crate) mod window;

pub use error::{Error, Result};
