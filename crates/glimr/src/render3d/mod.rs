//! # Render3D — PBR Scenes, Shadows and Environment Lighting
//!
//! The lit renderer built on [`render`](crate::render):
//!
//! | Module | Role |
//! |---|---|
//! | [`vertex`] | vertex, skin, object and material layouts shared with WGSL |
//! | [`shapes`] | plane, cube, sphere and light-frustum builders |
//! | [`mesh`] | GPU meshes and the handle store |
//! | [`material`] | PBR parameters, texture store, material bind groups |
//! | [`pipeline`] | bind group layouts, the four lit pipelines, object buffer |
//! | [`shading`] | CPU reference of the shading maths |
//! | [`shadow`] | single and cascaded directional shadow maps |
//! | [`sky`] | HDRI to cubemap bake and the skybox |
//! | [`mipmap`] | blit-chain mip generation |
//! | [`scene`] | scene objects and the per-frame pass order |
//!
//! ## Comparison
//!
//! - **Bevy**: render graph, extracted render world, clustered lights. Here a
//!   single directional light and a fixed two-pass frame.
//! - **LearnOpenGL**: same Cook-Torrance terms and the same equirect-to-cube
//!   capture, with wgpu in place of GL state.

pub mod material;
pub mod mesh;
pub mod mipmap;
pub mod pipeline;
pub mod scene;
pub mod shading;
pub mod shadow;
pub mod shapes;
pub mod sky;
pub mod vertex;

pub use material::{GpuMaterial, Material, MaterialHandle, MaterialStore, TextureHandle, TextureStore};
pub use mesh::{GpuMesh, MeshHandle, MeshStore};
pub use pipeline::{LitVariant, ObjectBuffer, PbrLayouts, PbrPipelines};
pub use scene::{DrawContext, Drawable, Renderer3d, Scene, SceneObject, ShadowContext};
pub use shadow::{DirectionalLight, ShadowCascades, ShadowMap};
pub use sky::{HdriSky, Skybox};
pub use vertex::{MeshVertex, SkinVertex};
