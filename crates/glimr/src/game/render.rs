//! # Instanced Renderer — One Draw per Mesh Kind
//!
//! Every arena entity is a cube or a sphere with a transform and a tint. The
//! renderer gathers them into two instance lists each frame and issues one
//! instanced indexed draw per list.
//!
//! ```text
//! registry.view::<(&Shape, &Transform, &Tint)>
//!        │
//!        ├─ Cube   ─► cubes:   Vec<InstanceData> ─► instance buffer ─► draw_indexed(.., 0..n)
//!        └─ Sphere ─► spheres: Vec<InstanceData> ─► instance buffer ─► draw_indexed(.., 0..m)
//! ```
//!
//! ## Vertex Layout
//!
//! | Slot | Step | Locations |
//! |---|---|---|
//! | 0 | vertex | 0 position, 1 normal, 2 uv |
//! | 1 | instance | 8–11 model matrix columns, 12 colour |
//!
//! The scratch vectors and instance buffers persist across frames. A buffer
//! that is too small is replaced by a larger one; otherwise the new data is
//! written over the old.
//!
//! ## Comparison
//!
//! - **Bevy**: automatic instancing of identical mesh/material pairs.
//! - **macroquad**: merges quads into one vertex buffer per texture
//!   instead of instancing.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use super::components::{Shape, Tint};
use crate::ecs::Registry;
use crate::math::Transform;
use crate::render::{
    FrameContext, GpuBuffer, GpuContext, ShaderProgram, ShaderSource, StepMode, Texture, UniformBlock, UniformType,
    VertexArray,
};
use crate::render3d::mesh::GpuMesh;
use crate::render3d::pipeline::{ColorTarget, DepthTest, PipelineDesc, create_pipeline, uniform_entry};
use crate::render3d::shapes;
use crate::render3d::vertex::MeshVertex;

/// Per-instance data at locations 8–12.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    pub model: [[f32; 4]; 4], // 64 bytes
    pub color: [f32; 4],      // 16 bytes → 80
}

impl InstanceData {
    pub fn new(transform: &Transform, tint: &Tint) -> Self {
        Self {
            model: transform.matrix().to_cols_array_2d(),
            color: tint.0.to_array(),
        }
    }
}

/// Camera block of `instanced.wgsl`. Projection and view arrive premultiplied.
fn camera_block() -> UniformBlock {
    UniformBlock::new(&[
        ("view_projection", UniformType::Mat4),
        ("light_dir", UniformType::Vec3),
        ("ambient", UniformType::F32),
    ])
}

/// Slot layout of the instanced pipeline.
pub fn instanced_vertex_array() -> VertexArray {
    VertexArray::new()
        .with_binding(
            std::mem::size_of::<MeshVertex>() as u64,
            StepMode::Vertex,
            &[
                (0, wgpu::VertexFormat::Float32x3, 0),
                (1, wgpu::VertexFormat::Float32x3, 12),
                (2, wgpu::VertexFormat::Float32x2, 24),
            ],
        )
        .with_binding(
            std::mem::size_of::<InstanceData>() as u64,
            StepMode::Instance,
            &[
                (8, wgpu::VertexFormat::Float32x4, 0),
                (9, wgpu::VertexFormat::Float32x4, 16),
                (10, wgpu::VertexFormat::Float32x4, 32),
                (11, wgpu::VertexFormat::Float32x4, 48),
                (12, wgpu::VertexFormat::Float32x4, 64),
            ],
        )
}

/// Fill `cubes` and `spheres` with one instance per drawable entity.
pub fn gather_instances(registry: &mut Registry, cubes: &mut Vec<InstanceData>, spheres: &mut Vec<InstanceData>) {
    cubes.clear();
    spheres.clear();
    registry.view::<(&Shape, &Transform, &Tint)>(|_, (shape, transform, tint)| {
        let instance = InstanceData::new(transform, tint);
        match shape {
            Shape::Cube => cubes.push(instance),
            Shape::Sphere => spheres.push(instance),
        }
    });
}

/// One mesh kind: its geometry, instance buffer and this frame's count.
struct Batch {
    mesh: GpuMesh,
    instances: GpuBuffer,
    count: u32,
}

impl Batch {
    fn new(gpu: &GpuContext, vertices: &[MeshVertex], indices: &[u32]) -> Self {
        Self {
            mesh: GpuMesh::upload(gpu, vertices, indices),
            instances: GpuBuffer::allocate(
                &gpu.device,
                "instance buffer",
                64 * std::mem::size_of::<InstanceData>() as u64,
                wgpu::BufferUsages::VERTEX,
            ),
            count: 0,
        }
    }

    fn upload(&mut self, gpu: &GpuContext, data: &[InstanceData]) {
        self.count = data.len() as u32;
        if data.is_empty() {
            return;
        }
        let bytes: &[u8] = bytemuck::cast_slice(data);
        self.instances.ensure_capacity(&gpu.device, bytes.len() as u64);
        self.instances.upload(&gpu.queue, bytes);
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.count == 0 {
            return;
        }
        pass.set_vertex_buffer(1, self.instances.slice());
        self.mesh.draw_instanced(pass, self.count);
    }
}

/// Draws every `(Shape, Transform, Tint)` entity with two instanced calls.
pub struct InstancedRenderer {
    program: ShaderProgram,
    pipeline: Option<wgpu::RenderPipeline>,
    camera_buffer: GpuBuffer,
    camera_bind_group: wgpu::BindGroup,
    cubes: Batch,
    spheres: Batch,
    cube_scratch: Vec<InstanceData>,
    sphere_scratch: Vec<InstanceData>,
    depth: Texture,
    pub clear_color: wgpu::Color,
    pub light_dir: Vec3,
}

impl InstancedRenderer {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("instanced camera layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT, false, None)],
        });
        let program = ShaderProgram::build(
            device,
            "instanced",
            &ShaderSource::wgsl(include_str!("shaders/instanced.wgsl")),
            camera_block(),
        );
        let vertex_array = instanced_vertex_array();
        let pipeline = create_pipeline(
            device,
            &PipelineDesc {
                label: "instanced",
                bind_groups: &[&layout],
                program: &program,
                vs_entry: "vs_main",
                fs_entry: Some("fs_main"),
                buffers: &vertex_array.layouts(),
                color: Some(ColorTarget {
                    format: gpu.surface_format(),
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                }),
                depth: Some(DepthTest {
                    write: true,
                    compare: wgpu::CompareFunction::Less,
                }),
                cull: Some(wgpu::Face::Back),
                depth_bias: wgpu::DepthBiasState::default(),
            },
        );

        let camera_buffer = GpuBuffer::allocate(
            device,
            "instanced camera",
            program.uniforms.size(),
            wgpu::BufferUsages::UNIFORM,
        );
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("instanced camera bind group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let (mut vertices, mut indices) = (Vec::new(), Vec::new());
        shapes::cube(1.0, &mut vertices, &mut indices);
        let cubes = Batch::new(gpu, &vertices, &indices);
        shapes::sphere(0.5, 16, 16, &mut vertices, &mut indices);
        let spheres = Batch::new(gpu, &vertices, &indices);

        let (width, height) = gpu.surface_size();
        Self {
            program,
            pipeline,
            camera_buffer,
            camera_bind_group,
            cubes,
            spheres,
            cube_scratch: Vec::new(),
            sphere_scratch: Vec::new(),
            depth: Texture::depth(device, "instanced depth", width, height, 1),
            clear_color: wgpu::Color {
                r: 0.02,
                g: 0.02,
                b: 0.04,
                a: 1.0,
            },
            light_dir: Vec3::new(-0.3, -0.5, -1.0),
        }
    }

    /// Gather this frame's instances and upload them with the camera.
    pub fn prepare(&mut self, gpu: &GpuContext, registry: &mut Registry, view_projection: &Mat4) {
        gather_instances(registry, &mut self.cube_scratch, &mut self.sphere_scratch);
        self.cubes.upload(gpu, &self.cube_scratch);
        self.spheres.upload(gpu, &self.sphere_scratch);

        let uniforms = &mut self.program.uniforms;
        uniforms.set_mat4("view_projection", view_projection);
        uniforms.set_vec3("light_dir", self.light_dir.normalize_or(Vec3::NEG_Z));
        uniforms.set_f32("ambient", 0.35);
        uniforms.flush(&gpu.queue, &self.camera_buffer);
    }

    /// Draw into a pass whose depth attachment uses
    /// [`DEPTH_FORMAT`](crate::render::texture::DEPTH_FORMAT).
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        let Some(pipeline) = &self.pipeline else {
            return;
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.camera_bind_group, &[]);
        self.cubes.draw(pass);
        self.spheres.draw(pass);
    }

    /// Prepare, then record a cleared pass with the arena in it.
    pub fn render(&mut self, frame: &mut FrameContext<'_>, registry: &mut Registry, view_projection: &Mat4) {
        let gpu = frame.gpu;
        let (width, height) = frame.size();
        if (self.depth.width, self.depth.height) != (width.max(1), height.max(1)) {
            self.depth = Texture::depth(&gpu.device, "instanced depth", width, height, 1);
        }
        self.prepare(gpu, registry, view_projection);

        let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("instanced pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: frame.view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        self.draw(&mut pass);
    }

    /// Instances drawn last frame, `(cubes, spheres)`.
    pub fn instance_counts(&self) -> (u32, u32) {
        (self.cubes.count, self.spheres.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn instance_layout_is_80_bytes() {
        assert_eq!(std::mem::size_of::<InstanceData>(), 80);
        let array = instanced_vertex_array();
        assert_eq!(array.locations(), vec![0, 1, 2, 8, 9, 10, 11, 12]);
        assert_eq!(array.bindings()[1].step, StepMode::Instance);
        assert_eq!(array.bindings()[1].stride, 80);
        assert_eq!(array.bindings()[0].stride, 56);
    }

    #[test]
    fn camera_block_carries_combined_matrix() {
        let block = camera_block();
        assert_eq!(block.offset_of("view_projection"), Some(0));
        assert_eq!(block.offset_of("view"), None);
        assert_eq!(block.offset_of("light_dir"), Some(64));
        assert_eq!(block.offset_of("ambient"), Some(76));
        assert_eq!(block.size(), 80);
    }

    #[test]
    fn instances_split_by_shape() {
        let mut registry = Registry::new();
        for (shape, x) in [(Shape::Cube, 1.0), (Shape::Sphere, 2.0), (Shape::Cube, 3.0)] {
            let e = registry.create();
            registry.add(e, Transform::from_xyz(x, 0.0, 0.0));
            registry.add(e, shape);
            registry.add(e, Tint(Vec4::ONE));
        }
        // No tint: not drawn.
        let bare = registry.create();
        registry.add(bare, Transform::IDENTITY);
        registry.add(bare, Shape::Cube);

        let (mut cubes, mut spheres) = (Vec::new(), Vec::new());
        gather_instances(&mut registry, &mut cubes, &mut spheres);
        assert_eq!(cubes.len(), 2);
        assert_eq!(spheres.len(), 1);
        assert_eq!(spheres[0].model[3], [2.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn destroyed_entities_are_not_drawn() {
        let mut registry = Registry::new();
        let e = registry.create();
        registry.add(e, Transform::IDENTITY);
        registry.add(e, Shape::Sphere);
        registry.add(e, Tint(Vec4::ONE));
        registry.destroy(e);

        let (mut cubes, mut spheres) = (vec![InstanceData::zeroed()], Vec::new());
        gather_instances(&mut registry, &mut cubes, &mut spheres);
        assert!(cubes.is_empty() && spheres.is_empty());
    }
}
