//! # Shadow — Directional Shadow Maps
//!
//! Shadows come from a depth-only pass rendered from the light before the
//! main pass. The lit shader projects each fragment into light space and
//! compares its depth with the stored one (see
//! [`pcf_shadow`](super::shading::pcf_shadow) for the filter).
//!
//! ```text
//!        light ──► orthographic box [-o, o]² × [near, far]
//!          │
//!          ▼  depth only, one layer per cascade
//!   ┌──────────────┐
//!   │ Depth32Float │  1024² × MAX_CASCADES (texture array)
//!   └──────────────┘
//!          │
//!          ▼  group 0 binding 3, read with textureLoad
//!     pbr.wgsl fs_main
//! ```
//!
//! ## Single Map vs Cascades
//!
//! With one cascade the box is `shadow_ortho_size` wide, placed
//! `shadow_distance` back from the origin along the light. With three
//! cascades each one covers more of the scene at lower density:
//!
//! | Cascade | far | ortho half-size | light position |
//! |---|---|---|---|
//! | i | `end_i` | `end_i / 2` | `-dir · end_i / 2` |
//!
//! The fragment shader picks the first cascade whose end lies beyond the
//! camera-to-fragment distance.
//!
//! ## Comparison
//!
//! - **Bevy**: cascades fit to the camera frustum slices with texel snapping.
//!   These cascades are fixed boxes around the origin.
//! - **LearnOpenGL**: the same orthographic single map with a 3×3 PCF kernel.

use std::num::NonZeroU64;

use glam::{Mat4, Vec3, Vec4};

use super::pipeline::{DepthTest, PbrLayouts, PipelineDesc, create_pipeline, uniform_entry};
use super::vertex::{MeshVertex, SkinVertex};
use crate::config::RendererConfig;
use crate::render::{GpuBuffer, GpuContext, ShaderProgram, ShaderSource, Texture, UniformBlock, UniformType};

/// Layers in the shadow map array. Must match `MAX_CASCADES` in `pbr.wgsl`.
pub const MAX_CASCADES: usize = 3;

/// Default shadow map resolution.
pub const SHADOW_MAP_SIZE: u32 = 1024;

/// A directional light. `direction` is the way the light travels, so
/// `(0, -1, 0)` shines straight down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-0.4, -1.0, -0.3).normalize(),
            color: Vec3::ONE,
            intensity: 3.0,
        }
    }
}

/// View-projection of an orthographic light looking at `target` from
/// `distance` units back along `direction`.
pub fn light_space_matrix(direction: Vec3, target: Vec3, distance: f32, ortho: f32, near: f32, far: f32) -> Mat4 {
    let dir = direction.normalize_or(Vec3::NEG_Y);
    let eye = target - dir * distance;
    let up = if dir.dot(Vec3::Y).abs() > 0.999 { Vec3::Z } else { Vec3::Y };
    let view = Mat4::look_at_rh(eye, target, up);
    let proj = Mat4::orthographic_rh(-ortho, ortho, -ortho, ortho, near, far);
    proj * view
}

/// Light-space matrices and split distances for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowCascades {
    pub matrices: [Mat4; MAX_CASCADES],
    /// Camera distance each cascade reaches. Unused entries are zero.
    pub ends: [f32; MAX_CASCADES],
    pub count: usize,
}

impl ShadowCascades {
    pub fn new(config: &RendererConfig, direction: Vec3) -> Self {
        let mut matrices = [Mat4::IDENTITY; MAX_CASCADES];
        let mut ends = [0.0; MAX_CASCADES];

        if config.cascade_ends.len() <= 1 {
            matrices[0] = light_space_matrix(
                direction,
                Vec3::ZERO,
                config.shadow_distance,
                config.shadow_ortho_size,
                config.shadow_near,
                config.shadow_far,
            );
            ends[0] = f32::MAX;
            return Self {
                matrices,
                ends,
                count: 1,
            };
        }

        let count = config.cascade_count();
        for (i, &end) in config.cascade_ends.iter().take(count).enumerate() {
            matrices[i] = light_space_matrix(direction, Vec3::ZERO, end * 0.5, end * 0.5, config.shadow_near, end);
            ends[i] = end;
        }
        Self { matrices, ends, count }
    }

    /// Index of the cascade covering a fragment `distance` from the camera.
    pub fn select(&self, distance: f32) -> Option<usize> {
        self.ends[..self.count].iter().position(|&end| end > distance)
    }

    /// Split distances packed for the frame uniform.
    pub fn ends_vec4(&self) -> Vec4 {
        Vec4::new(self.ends[0], self.ends[1], self.ends[2], 0.0)
    }
}

/// The depth texture array and the depth-only pipelines.
pub struct ShadowMap {
    texture: Texture,
    layer_views: Vec<wgpu::TextureView>,
    light_layout: wgpu::BindGroupLayout,
    light_buffers: Vec<GpuBuffer>,
    light_bind_groups: Vec<wgpu::BindGroup>,
    program: ShaderProgram,
    static_pipeline: Option<wgpu::RenderPipeline>,
    skinned_pipeline: Option<wgpu::RenderPipeline>,
    pub cascades: ShadowCascades,
}

impl ShadowMap {
    pub fn new(gpu: &GpuContext, layouts: &PbrLayouts, size: u32) -> Self {
        let device = &gpu.device;
        let texture = Texture::depth(device, "shadow map", size, size, MAX_CASCADES as u32);
        let layer_views = (0..MAX_CASCADES as u32).map(|layer| texture.layer_view(layer, 0)).collect();

        let light_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow light layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX, false, NonZeroU64::new(64))],
        });
        let light_buffers: Vec<GpuBuffer> = (0..MAX_CASCADES)
            .map(|_| GpuBuffer::allocate(device, "shadow light uniform", 64, wgpu::BufferUsages::UNIFORM))
            .collect();
        let light_bind_groups = light_buffers
            .iter()
            .map(|buffer| {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("shadow light bind group"),
                    layout: &light_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    }],
                })
            })
            .collect();

        let program = ShaderProgram::build(
            device,
            "shadow",
            &ShaderSource::wgsl(include_str!("shaders/shadow.wgsl")),
            UniformBlock::new(&[("light_space", UniformType::Mat4)]),
        );
        let static_pipeline = depth_pipeline(
            device,
            &program,
            "shadow static",
            &[&light_layout, &layouts.object],
            "vs_static",
            &[MeshVertex::LAYOUT],
        );
        let skinned_pipeline = depth_pipeline(
            device,
            &program,
            "shadow skinned",
            &[&light_layout, &layouts.object, &layouts.palette],
            "vs_skinned",
            &[MeshVertex::LAYOUT, SkinVertex::LAYOUT],
        );

        Self {
            texture,
            layer_views,
            light_layout,
            light_buffers,
            light_bind_groups,
            program,
            static_pipeline,
            skinned_pipeline,
            cascades: ShadowCascades::new(&RendererConfig::default(), DirectionalLight::default().direction),
        }
    }

    /// Array view bound at group 0 binding 3 of the lit pipelines.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.texture.view
    }

    pub fn size(&self) -> u32 {
        self.texture.width
    }

    pub fn light_layout(&self) -> &wgpu::BindGroupLayout {
        &self.light_layout
    }

    /// Recompute the cascades for this frame's light and upload them.
    pub fn update(&mut self, gpu: &GpuContext, config: &RendererConfig, light: &DirectionalLight) {
        self.cascades = ShadowCascades::new(config, light.direction);
        for (i, buffer) in self.light_buffers.iter().enumerate() {
            self.program.uniforms.set_mat4("light_space", &self.cascades.matrices[i]);
            buffer.upload(&gpu.queue, self.program.uniforms.bytes());
        }
    }

    pub fn pipeline(&self, skinned: bool) -> Option<&wgpu::RenderPipeline> {
        if skinned {
            self.skinned_pipeline.as_ref()
        } else {
            self.static_pipeline.as_ref()
        }
    }

    /// Record one depth pass per active cascade. `draw` receives the pass
    /// with the light bound at group 0 and issues the casters.
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, mut draw: impl FnMut(&mut wgpu::RenderPass<'_>, &Self)) {
        for cascade in 0..self.cascades.count {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shadow pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.layer_views[cascade],
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_bind_group(0, &self.light_bind_groups[cascade], &[]);
            draw(&mut pass, self);
        }
    }
}

fn depth_pipeline(
    device: &wgpu::Device,
    program: &ShaderProgram,
    label: &str,
    bind_groups: &[&wgpu::BindGroupLayout],
    vs_entry: &str,
    buffers: &[wgpu::VertexBufferLayout<'_>],
) -> Option<wgpu::RenderPipeline> {
    create_pipeline(
        device,
        &PipelineDesc {
            label,
            bind_groups,
            program,
            vs_entry,
            fs_entry: None,
            buffers,
            color: None,
            depth: Some(DepthTest {
                write: true,
                compare: wgpu::CompareFunction::Less,
            }),
            cull: None,
            depth_bias: wgpu::DepthBiasState::default(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render3d::shading::pcf_shadow;

    #[test]
    fn vertical_light_uses_z_up() {
        let m = light_space_matrix(Vec3::NEG_Y, Vec3::ZERO, 20.0, 10.0, 0.1, 50.0);
        assert!(m.is_finite());
        let centre = m.project_point3(Vec3::ZERO);
        assert!(centre.x.abs() < 1e-5 && centre.y.abs() < 1e-5);
        assert!((0.0..=1.0).contains(&centre.z));
    }

    #[test]
    fn cascade_selection() {
        let cascades = ShadowCascades::new(&RendererConfig::cascaded(), Vec3::new(-0.3, -1.0, -0.2));
        assert_eq!(cascades.count, 3);
        assert_eq!(cascades.select(5.0), Some(0));
        assert_eq!(cascades.select(10.0), Some(1));
        assert_eq!(cascades.select(50.0), Some(2));
        assert_eq!(cascades.select(100.0), None);

        let single = ShadowCascades::new(&RendererConfig::default(), Vec3::NEG_Y);
        assert_eq!(single.count, 1);
        assert_eq!(single.select(1.0e6), Some(0));
    }

    #[test]
    fn cascade_boxes_grow_with_distance() {
        let cascades = ShadowCascades::new(&RendererConfig::cascaded(), Vec3::NEG_Y);
        // A point 12 units out is inside cascade 1 and 2 but not cascade 0.
        let p = Vec3::new(12.0, 0.0, 0.0);
        let inside = |m: &Mat4| {
            let q = m.project_point3(p);
            q.x.abs() <= 1.0 && q.y.abs() <= 1.0
        };
        assert!(!inside(&cascades.matrices[0]));
        assert!(inside(&cascades.matrices[1]));
        assert!(inside(&cascades.matrices[2]));
    }

    /// A unit cube on the ground under a light pointing straight down: the
    /// shadow edge on the ground lands within one texel of the footprint.
    #[test]
    fn cube_shadow_matches_footprint() {
        let size = SHADOW_MAP_SIZE;
        let config = RendererConfig::default();
        let m = light_space_matrix(
            Vec3::NEG_Y,
            Vec3::ZERO,
            config.shadow_distance,
            config.shadow_ortho_size,
            config.shadow_near,
            config.shadow_far,
        );
        let inv = m.inverse();

        // Rasterise the scene depth: cube top at y = 1 over |x|, |z| <= 0.5,
        // ground at y = 0 elsewhere.
        let mut depth = vec![1.0_f32; (size * size) as usize];
        for ty in 0..size {
            for tx in 0..size {
                let ndc_x = (tx as f32 + 0.5) / size as f32 * 2.0 - 1.0;
                let ndc_y = 1.0 - (ty as f32 + 0.5) / size as f32 * 2.0;
                let world = inv.project_point3(Vec3::new(ndc_x, ndc_y, 0.0));
                let height = if world.x.abs() <= 0.5 && world.z.abs() <= 0.5 { 1.0 } else { 0.0 };
                let hit = Vec3::new(world.x, height, world.z);
                depth[(ty * size + tx) as usize] = m.project_point3(hit).z;
            }
        }

        let texel = 2.0 * config.shadow_ortho_size / size as f32;
        let shadow_at = |x: f32, z: f32| pcf_shadow(&depth, size, m.project_point3(Vec3::new(x, 0.0, z)), 1.0);

        assert_eq!(shadow_at(0.0, 0.0), 1.0);
        assert_eq!(shadow_at(2.0, 0.0), 0.0);

        for axis in [Vec3::X, Vec3::Z, Vec3::NEG_X] {
            let mut t = 0.0;
            while shadow_at(axis.x * t, axis.z * t) >= 0.5 {
                t += texel * 0.25;
                assert!(t < 1.0, "shadow never ended along {axis}");
            }
            assert!((t - 0.5).abs() <= texel, "edge at {t} along {axis}, texel {texel}");
        }
    }
}
