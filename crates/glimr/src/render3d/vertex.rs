//! # Vertex — Mesh Vertices and Uniform Layouts
//!
//! ## Memory Layout
//!
//! ```text
//! MeshVertex (56 bytes, slot 0)
//! ┌──────────┬──────────┬──────────┬──────────┬───────────┐
//! │ position │ normal   │ uv       │ tangent  │ bitangent │
//! │ [f32; 3] │ [f32; 3] │ [f32; 2] │ [f32; 3] │ [f32; 3]  │
//! │ off 0    │ off 12   │ off 24   │ off 32   │ off 44    │
//! │ loc 0    │ loc 1    │ loc 2    │ loc 3    │ loc 4     │
//! └──────────┴──────────┴──────────┴──────────┴───────────┘
//!
//! SkinVertex (32 bytes, slot 1, skinned meshes only)
//! ┌───────────────┬───────────────┐
//! │ joints [u32;4]│ weights [f32;4]│
//! │ loc 5         │ loc 6          │
//! └───────────────┴───────────────┘
//! ```
//!
//! Skin data lives in a second, parallel buffer so static meshes do not pay
//! for it and the static pipeline never sees locations 5 and 6.
//!
//! ## Uniform Groups
//!
//! ```text
//! group 0  frame     camera, light, cascades, env cube, shadow maps   per frame
//! group 1  material  MaterialUniform + 5 textures + sampler            per material
//! group 2  object    ObjectUniform (dynamic offset)                    per draw
//! group 3  palette   array<mat4x4, 100> bone matrices                  per model
//! ```
//!
//! The normal matrix is stored as a `mat4x4` because a WGSL `mat3x3` pads
//! every column to 16 bytes anyway.

use bytemuck::{Pod, Zeroable};

/// Per-vertex data shared by every lit mesh.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl MeshVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
            ..Self::default()
        }
    }

    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![
            0 => Float32x3,
            1 => Float32x3,
            2 => Float32x2,
            3 => Float32x3,
            4 => Float32x3,
        ],
    };
}

/// Up to four bone influences per vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct SkinVertex {
    pub joints: [u32; 4],
    pub weights: [f32; 4],
}

impl SkinVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<SkinVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![
            5 => Uint32x4,
            6 => Float32x4,
        ],
    };
}

/// Per-draw transform, addressed by dynamic offset.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],         // 64 bytes
    pub normal_matrix: [[f32; 4]; 4], // 64 bytes → 128
}

impl ObjectUniform {
    pub fn new(model: glam::Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: crate::math::normal_matrix(model).to_cols_array_2d(),
        }
    }
}

/// Bits of [`MaterialUniform::texture_flags`].
pub mod texture_flags {
    pub const ALBEDO: u32 = 1;
    pub const NORMAL: u32 = 2;
    pub const METALLIC: u32 = 4;
    pub const ROUGHNESS: u32 = 8;
    pub const AO: u32 = 16;
}

/// PBR material parameters as the fragment shader reads them.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialUniform {
    pub albedo: [f32; 3],         // 12 bytes
    pub alpha: f32,               // 4 → 16
    pub metallic: f32,            // 4
    pub roughness: f32,           // 4
    pub ao: f32,                  // 4
    pub reflection_strength: f32, // 4 → 32
    pub transmission: f32,        // 4
    pub ior: f32,                 // 4
    pub texture_flags: u32,       // 4
    pub _pad: u32,                // 4 → 48
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_match_shader_structs() {
        assert_eq!(std::mem::size_of::<MeshVertex>(), 56);
        assert_eq!(std::mem::size_of::<SkinVertex>(), 32);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 128);
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 48);
    }

    #[test]
    fn attribute_offsets() {
        let offsets: Vec<u64> = MeshVertex::LAYOUT.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24, 32, 44]);
        assert_eq!(SkinVertex::LAYOUT.attributes[1].offset, 16);
    }
}
