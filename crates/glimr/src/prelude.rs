//! Convenience re-exports: `use glimr::prelude::*` for the common items.

pub use crate::app::{Sample, UpdateContext, run};
pub use crate::camera::FpsCamera;
pub use crate::config::{RendererConfig, WindowConfig};
pub use crate::ecs::{Entity, Registry};
pub use crate::error::{Error, Result};
pub use crate::game::{ArenaConfig, GameInput, GameState, InstancedRenderer, Shape, Tint, Velocity};
pub use crate::input::{Input, KeyCode, MouseButton, Pointer};
pub use crate::math::{Mat4, Quat, Transform, Vec2, Vec3, Vec4};
pub use crate::model::{ImportOptions, ModelHandle, SkinnedModel};
pub use crate::render::{FrameContext, GpuContext};
pub use crate::render3d::{
    DirectionalLight, HdriSky, Material, MaterialHandle, MeshHandle, Renderer3d, Scene, SceneObject,
};
pub use crate::time::Time;
