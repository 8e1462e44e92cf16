//! # Render — GPU Context and Resource Wrappers
//!
//! The layer every renderer builds on:
//!
//! - [`GpuContext`]: device, queue and surface.
//! - [`GpuBuffer`], [`VertexArray`], [`Texture`]: owning resource wrappers.
//!   Dropping one releases its GPU memory; none of them are `Clone`.
//! - [`ShaderProgram`] + [`UniformBlock`]: validated modules and named
//!   uniforms.
//! - [`FrameContext`]: the per-frame view of all of the above.

pub mod buffer;
pub mod frame;
pub mod gpu;
pub mod shader;
pub mod texture;
pub mod uniform;
pub mod vertex_array;

pub use buffer::GpuBuffer;
pub use frame::FrameContext;
pub use gpu::GpuContext;
pub use shader::{ShaderProgram, ShaderSource};
pub use texture::Texture;
pub use uniform::{UniformBlock, UniformType};
pub use vertex_array::{StepMode, VertexArray};
