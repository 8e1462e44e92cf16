//! # Model — Skinned Mesh Import and Skeletal Animation
//!
//! ```text
//! scene file ──► import ──► ModelData ──► SkinnedModel (GPU)
//!                                │
//!                                └─ Rig: NodeTree + Skeleton + AnimationClip[]
//!                                         │
//!                       update_animation(seconds)
//!                                         ▼
//!                           bone palette (≤ 100 × mat4)
//! ```
//!
//! | Module | Role |
//! |---|---|
//! | [`skeleton`] | bones, per-vertex bone bindings, the node tree |
//! | [`animation`] | keyframe tracks, clips, time wrapping |
//! | [`rig`] | playback state and pose evaluation |
//! | [`import`] | glTF to CPU-side [`ModelData`] |
//! | [`skinned`] | upload and drawing |
//!
//! ## Comparison
//!
//! - **Bevy**: skinned meshes are entities with a `SkinnedMesh` component and
//!   joints are entities too. Here a model owns its skeleton outright.
//! - **rend3-anim**: same palette approach; also keeps the rest component of
//!   a node when a clip has no track for it.

pub mod animation;
pub mod import;
pub mod rig;
pub mod skeleton;
pub mod skinned;

pub use animation::{AnimationClip, Channel, Keyframe};
pub use import::{ImportOptions, MaterialData, MeshData, ModelData, TextureSource, import};
pub use rig::Rig;
pub use skeleton::{Bone, MAX_BONES, Node, NodeTree, Skeleton, VertexBoneBinding};
pub use skinned::{ModelHandle, ModelStore, SkinnedModel};
