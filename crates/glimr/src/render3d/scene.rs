//! # Scene — Drawables and the Lit Frame
//!
//! A [`SceneObject`] pairs a [`Transform`] with a [`Drawable`]: either a
//! store mesh with a material, or a whole [`SkinnedModel`](crate::model::SkinnedModel).
//! Both variants answer the same two calls, a lit draw and a shadow draw,
//! so [`Renderer3d`] walks one list without caring which kind it holds.
//!
//! ## Frame
//!
//! ```text
//! shadow pass (per cascade)   every object, depth only
//! main pass                   clear
//!                             ├─ skybox             (depth ≤ far, no write)
//!                             ├─ opaque objects      (scene order)
//!                             └─ transparent objects (farthest first)
//! ```
//!
//! Transparent objects are sorted by view-space depth every frame. A model
//! with both kinds of material is visited in both lists and draws only the
//! matching meshes each time.
//!
//! ## Comparison
//!
//! - **Bevy**: phase items sorted per render phase, with batching. Here one
//!   sort, no batching, one draw call per mesh.
//! - **three.js**: `renderer.sortObjects` does the same opaque-then-sorted-
//!   transparent split.

use glam::{Mat4, Vec3};

use super::material::{Material, MaterialHandle, MaterialStore, TextureHandle, TextureStore};
use super::mesh::{MeshHandle, MeshStore};
use super::pipeline::{ObjectBuffer, PbrLayouts, PbrPipelines};
use super::shadow::{DirectionalLight, ShadowMap};
use super::sky::{HdriSky, Skybox};
use super::vertex::ObjectUniform;
use crate::camera::FpsCamera;
use crate::config::RendererConfig;
use crate::error::Result;
use crate::math::Transform;
use crate::model::{ImportOptions, ModelHandle, ModelStore, SkinnedModel};
use crate::render::{FrameContext, GpuBuffer, GpuContext, Texture};

/// What a scene object draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drawable {
    Mesh { mesh: MeshHandle, material: MaterialHandle },
    Model(ModelHandle),
}

/// Stores and per-frame state a lit draw reads.
pub struct DrawContext<'a> {
    pub meshes: &'a MeshStore,
    pub materials: &'a MaterialStore,
    pub models: &'a ModelStore,
    pub pipelines: &'a PbrPipelines,
    pub objects: &'a ObjectBuffer,
    /// Which half of the frame is being drawn.
    pub transparent: bool,
}

/// Stores and state a shadow draw reads.
pub struct ShadowContext<'a> {
    pub meshes: &'a MeshStore,
    pub models: &'a ModelStore,
    pub shadow: &'a ShadowMap,
    pub objects: &'a ObjectBuffer,
}

/// A placed drawable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneObject {
    pub transform: Transform,
    pub drawable: Drawable,
}

impl SceneObject {
    pub fn mesh(transform: Transform, mesh: MeshHandle, material: MaterialHandle) -> Self {
        Self {
            transform,
            drawable: Drawable::Mesh { mesh, material },
        }
    }

    pub fn model(transform: Transform, model: ModelHandle) -> Self {
        Self {
            transform,
            drawable: Drawable::Model(model),
        }
    }

    /// Whether the object has anything to draw in the opaque or transparent
    /// half of the frame.
    pub fn draws_in(&self, materials: &MaterialStore, models: &ModelStore, transparent: bool) -> bool {
        match self.drawable {
            Drawable::Mesh { material, .. } => materials.get(material).material.is_transparent() == transparent,
            Drawable::Model(model) => {
                let model = models.get(model);
                if transparent { model.has_transparent() } else { model.has_opaque() }
            }
        }
    }

    /// Lit draw. The frame group must be bound; `slot` is this object's
    /// entry in the object buffer.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, ctx: &DrawContext<'_>, slot: usize) {
        match self.drawable {
            Drawable::Mesh { mesh, material } => {
                let Some(pipeline) = ctx.pipelines.select(false, ctx.transparent) else {
                    return;
                };
                pass.set_pipeline(pipeline);
                pass.set_bind_group(1, ctx.materials.get(material).bind_group(), &[]);
                pass.set_bind_group(2, ctx.objects.bind_group(), &[ctx.objects.offset(slot)]);
                ctx.meshes.get(mesh).draw(pass);
            }
            Drawable::Model(model) => {
                ctx.models
                    .get(model)
                    .draw(pass, ctx.pipelines, ctx.objects, slot, ctx.transparent);
            }
        }
    }

    /// Depth-only draw into a shadow cascade.
    pub fn draw_for_shadow(&self, pass: &mut wgpu::RenderPass<'_>, ctx: &ShadowContext<'_>, slot: usize) {
        match self.drawable {
            Drawable::Mesh { mesh, .. } => {
                let Some(pipeline) = ctx.shadow.pipeline(false) else {
                    return;
                };
                pass.set_pipeline(pipeline);
                pass.set_bind_group(1, ctx.objects.bind_group(), &[ctx.objects.offset(slot)]);
                ctx.meshes.get(mesh).draw(pass);
            }
            Drawable::Model(model) => {
                ctx.models.get(model).draw_shadow(pass, ctx.shadow, ctx.objects, slot);
            }
        }
    }
}

/// Objects plus the light that shades them.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub light: DirectionalLight,
}

impl Scene {
    pub fn new(light: DirectionalLight) -> Self {
        Self {
            objects: Vec::new(),
            light,
        }
    }

    /// Add an object and return its index.
    pub fn add(&mut self, object: SceneObject) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }
}

/// Order `candidates` (indices into `positions`) farthest-from-camera first.
pub fn sort_back_to_front(view: &Mat4, positions: &[Vec3], candidates: &mut [usize]) {
    // View space looks down -Z: smaller z is farther.
    let depth = |i: usize| view.transform_point3(positions[i]).z;
    candidates.sort_by(|&a, &b| depth(a).total_cmp(&depth(b)));
}

/// Owns the stores, pipelines, shadow map and sky of the lit renderer.
pub struct Renderer3d {
    pub config: RendererConfig,
    pub layouts: PbrLayouts,
    pub meshes: MeshStore,
    pub materials: MaterialStore,
    pub textures: TextureStore,
    pub models: ModelStore,
    pipelines: PbrPipelines,
    objects: ObjectBuffer,
    shadow: ShadowMap,
    sky: HdriSky,
    skybox: Skybox,
    frame_buffer: GpuBuffer,
    frame_bind_group: wgpu::BindGroup,
    depth: Texture,
    uniforms: Vec<ObjectUniform>,
    opaque: Vec<usize>,
    transparent: Vec<usize>,
    positions: Vec<Vec3>,
}

impl Renderer3d {
    pub fn new(gpu: &GpuContext, config: RendererConfig) -> Self {
        let device = &gpu.device;
        let layouts = PbrLayouts::new(device);
        let pipelines = PbrPipelines::new(gpu, &layouts);
        let objects = ObjectBuffer::new(device, &layouts.object);
        let shadow = ShadowMap::new(gpu, &layouts, config.shadow_map_size);
        let sky = HdriSky::placeholder(gpu);
        let skybox = Skybox::new(gpu, &sky);
        let frame_buffer = GpuBuffer::allocate(
            device,
            "frame uniform",
            pipelines.program.uniforms.size(),
            wgpu::BufferUsages::UNIFORM,
        );
        let frame_bind_group = frame_bind_group(device, &layouts, &frame_buffer, &sky, &shadow);
        let (width, height) = gpu.surface_size();
        let depth = Texture::depth(device, "scene depth", width, height, 1);

        log::info!(
            "3D renderer ready: {} cascade(s), shadow map {}²",
            config.cascade_count(),
            config.shadow_map_size
        );

        Self {
            config,
            meshes: MeshStore::new(gpu),
            materials: MaterialStore::new(),
            textures: TextureStore::new(gpu),
            models: ModelStore::new(),
            layouts,
            pipelines,
            objects,
            shadow,
            sky,
            skybox,
            frame_buffer,
            frame_bind_group,
            depth,
            uniforms: Vec::new(),
            opaque: Vec::new(),
            transparent: Vec::new(),
            positions: Vec::new(),
        }
    }

    /// Use a baked sky for reflections and the skybox.
    pub fn set_sky(&mut self, gpu: &GpuContext, sky: HdriSky) {
        self.skybox.set_sky(gpu, &sky);
        self.frame_bind_group = frame_bind_group(&gpu.device, &self.layouts, &self.frame_buffer, &sky, &self.shadow);
        self.sky = sky;
    }

    /// Bake an `.hdr` file at the configured resolution. A failed load keeps
    /// rendering with a placeholder.
    pub fn load_sky(&mut self, gpu: &GpuContext, path: &std::path::Path) {
        let sky = HdriSky::load_or_placeholder(gpu, path, self.config.sky_resolution);
        self.set_sky(gpu, sky);
    }

    pub fn add_material(&mut self, gpu: &GpuContext, material: Material) -> MaterialHandle {
        self.materials.add(gpu, &self.layouts, &self.textures, material)
    }

    pub fn load_texture(&mut self, gpu: &GpuContext, path: &std::path::Path, srgb: bool) -> Result<TextureHandle> {
        self.textures.load(gpu, path, srgb, false)
    }

    /// Import a scene file. Failures are logged and produce an empty model.
    pub fn load_model(&mut self, gpu: &GpuContext, path: &std::path::Path, options: &ImportOptions) -> ModelHandle {
        let model = SkinnedModel::load(gpu, &self.layouts, path, options);
        self.models.add(model)
    }

    pub fn model_mut(&mut self, handle: ModelHandle) -> &mut SkinnedModel {
        self.models.get_mut(handle)
    }

    /// Advance every model's skeleton to `seconds` of playback.
    pub fn update_animations(&mut self, seconds: f32) {
        for model in self.models.iter_mut() {
            model.update_animation(seconds);
        }
    }

    /// Record the shadow and main passes for `scene` seen from `camera`.
    pub fn render(&mut self, frame: &mut FrameContext<'_>, scene: &Scene, camera: &FpsCamera) {
        let gpu = frame.gpu;
        let (width, height) = frame.size();
        if (self.depth.width, self.depth.height) != (width.max(1), height.max(1)) {
            self.depth = Texture::depth(&gpu.device, "scene depth", width, height, 1);
        }

        let view = camera.view();
        let projection = camera.projection(frame.aspect_ratio());

        self.shadow.update(gpu, &self.config, &scene.light);
        self.write_frame_uniforms(gpu, &view, &projection, camera.position, &scene.light);
        self.skybox.update(gpu, &view, &projection);

        self.uniforms.clear();
        self.uniforms
            .extend(scene.objects.iter().map(|o| ObjectUniform::new(o.transform.matrix())));
        self.objects.write(gpu, &self.layouts.object, &self.uniforms);
        for model in self.models.iter_mut() {
            model.upload_palette(gpu);
        }

        self.opaque.clear();
        self.transparent.clear();
        self.positions.clear();
        for (i, object) in scene.objects.iter().enumerate() {
            self.positions.push(object.transform.translation);
            if object.draws_in(&self.materials, &self.models, false) {
                self.opaque.push(i);
            }
            if object.draws_in(&self.materials, &self.models, true) {
                self.transparent.push(i);
            }
        }
        sort_back_to_front(&view, &self.positions, &mut self.transparent);

        let shadow_ctx = ShadowContext {
            meshes: &self.meshes,
            models: &self.models,
            shadow: &self.shadow,
            objects: &self.objects,
        };
        self.shadow.render(frame.encoder, |pass, _| {
            for (slot, object) in scene.objects.iter().enumerate() {
                object.draw_for_shadow(pass, &shadow_ctx, slot);
            }
        });

        let [r, g, b, a] = self.config.clear_color;
        let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scene pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: frame.view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
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

        self.skybox.draw(&mut pass);
        pass.set_bind_group(0, &self.frame_bind_group, &[]);

        let mut ctx = DrawContext {
            meshes: &self.meshes,
            materials: &self.materials,
            models: &self.models,
            pipelines: &self.pipelines,
            objects: &self.objects,
            transparent: false,
        };
        for &i in &self.opaque {
            scene.objects[i].draw(&mut pass, &ctx, i);
        }
        ctx.transparent = true;
        for &i in &self.transparent {
            scene.objects[i].draw(&mut pass, &ctx, i);
        }
    }

    fn write_frame_uniforms(
        &mut self,
        gpu: &GpuContext,
        view: &Mat4,
        projection: &Mat4,
        camera: Vec3,
        light: &DirectionalLight,
    ) {
        let cascades = &self.shadow.cascades;
        let uniforms = &mut self.pipelines.program.uniforms;
        uniforms.set_mat4("view", view);
        uniforms.set_mat4("projection", projection);
        uniforms.set_vec3("camera_pos", camera);
        uniforms.set_u32("cascade_count", cascades.count as u32);
        uniforms.set_vec3("light_dir", light.direction.normalize_or(Vec3::NEG_Y));
        uniforms.set_f32("light_intensity", light.intensity);
        uniforms.set_vec3("light_color", light.color);
        uniforms.set_bool("shadow_enabled", true);
        uniforms.set_vec4("cascade_ends", cascades.ends_vec4());
        for (i, matrix) in cascades.matrices.iter().enumerate() {
            uniforms.set_mat4_at("light_space", i, matrix);
        }
        uniforms.flush(&gpu.queue, &self.frame_buffer);
    }
}

fn frame_bind_group(
    device: &wgpu::Device,
    layouts: &PbrLayouts,
    buffer: &GpuBuffer,
    sky: &HdriSky,
    shadow: &ShadowMap,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("frame bind group"),
        layout: &layouts.frame,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(sky.view()),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(&layouts.env_sampler),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(shadow.view()),
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn farthest_transparent_draws_first() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        let positions = [Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -5.0), Vec3::ZERO];
        let mut order = vec![0, 1, 2];
        sort_back_to_front(&view, &positions, &mut order);
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn sort_uses_view_depth_not_distance() {
        // Off to the side but nearer along the view axis.
        let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let positions = [Vec3::new(50.0, 0.0, -2.0), Vec3::new(0.0, 0.0, -10.0)];
        let mut order = vec![0, 1];
        sort_back_to_front(&view, &positions, &mut order);
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn scene_indices_are_stable() {
        let mut scene = Scene::default();
        let drawable = Drawable::Mesh {
            mesh: MeshStore::CUBE,
            material: MaterialHandle(0),
        };
        let a = scene.add(SceneObject {
            transform: Transform::IDENTITY,
            drawable,
        });
        let b = scene.add(SceneObject::model(Transform::from_xyz(1.0, 0.0, 0.0), ModelHandle(0)));
        assert_eq!((a, b), (0, 1));
        assert_eq!(scene.objects[1].drawable, Drawable::Model(ModelHandle(0)));
    }
}
