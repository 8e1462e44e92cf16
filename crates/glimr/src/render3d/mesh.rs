//! # Mesh — GPU Mesh Storage
//!
//! A [`GpuMesh`] is a vertex buffer, an optional skin buffer and an index
//! buffer. Skinned meshes bind the skin stream to slot 1 next to the regular
//! vertex stream in slot 0.
//!
//! ## The Handle Pattern
//!
//! Scene objects hold a [`MeshHandle`], a copyable index into a
//! [`MeshStore`], never the buffers themselves. The store owns the meshes;
//! a handle outliving its store is a programming error caught by the index
//! bounds check.
//!
//! ## Built-In Meshes
//!
//! | Handle | Shape | Size |
//! |--------|-------|------|
//! | [`MeshStore::CUBE`] | cube | side 1 |
//! | [`MeshStore::SPHERE`] | UV sphere, 32 × 32 | radius 0.5 |
//! | [`MeshStore::PLANE`] | plane on XZ | 1 × 1 |

use super::shapes;
use super::vertex::{MeshVertex, SkinVertex};
use crate::render::{GpuBuffer, GpuContext};

/// Handle to a mesh in the [`MeshStore`]. Lightweight and `Copy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub(crate) usize);

/// A mesh uploaded to GPU buffers.
pub struct GpuMesh {
    vertices: GpuBuffer,
    skin: Option<GpuBuffer>,
    indices: GpuBuffer,
    index_count: u32,
}

impl GpuMesh {
    pub fn upload(gpu: &GpuContext, vertices: &[MeshVertex], indices: &[u32]) -> Self {
        Self {
            vertices: GpuBuffer::with_data(
                &gpu.device,
                "mesh vertex buffer",
                bytemuck::cast_slice(vertices),
                wgpu::BufferUsages::VERTEX,
            ),
            skin: None,
            indices: GpuBuffer::with_data(
                &gpu.device,
                "mesh index buffer",
                bytemuck::cast_slice(indices),
                wgpu::BufferUsages::INDEX,
            ),
            index_count: indices.len() as u32,
        }
    }

    /// Upload a mesh with a parallel skin stream. `skin` must have one entry
    /// per vertex.
    pub fn upload_skinned(gpu: &GpuContext, vertices: &[MeshVertex], skin: &[SkinVertex], indices: &[u32]) -> Self {
        debug_assert_eq!(vertices.len(), skin.len(), "skin stream length mismatch");
        let mut mesh = Self::upload(gpu, vertices, indices);
        mesh.skin = Some(GpuBuffer::with_data(
            &gpu.device,
            "mesh skin buffer",
            bytemuck::cast_slice(skin),
            wgpu::BufferUsages::VERTEX,
        ));
        mesh
    }

    pub fn is_skinned(&self) -> bool {
        self.skin.is_some()
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Bind the vertex streams and index buffer, then draw every index.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        self.draw_instanced(pass, 1);
    }

    pub fn draw_instanced(&self, pass: &mut wgpu::RenderPass<'_>, instances: u32) {
        if self.index_count == 0 || instances == 0 {
            return;
        }
        pass.set_vertex_buffer(0, self.vertices.slice());
        if let Some(skin) = &self.skin {
            pass.set_vertex_buffer(1, skin.slice());
        }
        pass.set_index_buffer(self.indices.slice(), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..instances);
    }
}

/// Owns uploaded meshes. Pre-populated with built-in primitives.
pub struct MeshStore {
    meshes: Vec<GpuMesh>,
}

impl MeshStore {
    pub const CUBE: MeshHandle = MeshHandle(0);
    pub const SPHERE: MeshHandle = MeshHandle(1);
    pub const PLANE: MeshHandle = MeshHandle(2);

    /// Create a store and upload the built-in primitives.
    pub fn new(gpu: &GpuContext) -> Self {
        let mut store = Self { meshes: Vec::new() };
        let (mut v, mut i) = (Vec::new(), Vec::new());

        shapes::cube(1.0, &mut v, &mut i);
        store.upload(gpu, &v, &i);
        shapes::sphere(0.5, 32, 32, &mut v, &mut i);
        store.upload(gpu, &v, &i);
        shapes::plane(1.0, 1.0, 1, 1, 1.0, 1.0, &mut v, &mut i);
        store.upload(gpu, &v, &i);

        store
    }

    /// Upload mesh data and return its handle.
    pub fn upload(&mut self, gpu: &GpuContext, vertices: &[MeshVertex], indices: &[u32]) -> MeshHandle {
        self.add(GpuMesh::upload(gpu, vertices, indices))
    }

    pub fn add(&mut self, mesh: GpuMesh) -> MeshHandle {
        let handle = MeshHandle(self.meshes.len());
        self.meshes.push(mesh);
        handle
    }

    pub fn get(&self, handle: MeshHandle) -> &GpuMesh {
        &self.meshes[handle.0]
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}
