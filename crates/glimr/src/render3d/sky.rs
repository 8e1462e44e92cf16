//! # Sky — HDRI Environment Cubemaps
//!
//! An equirectangular `.hdr` panorama is baked once into a cubemap that the
//! lit shader samples for reflections and refraction, and that the
//! [`Skybox`] draws behind the scene.
//!
//! ```text
//!  .hdr (RGB f32) ──flip──► half floats ──► Rgba16Float 2D
//!                                             │
//!                      6 × render inward cube │ equirect.wgsl
//!                                             ▼
//!                           cube 512² Rgba16Float, level 0
//!                                             │ MipmapGenerator
//!                                             ▼
//!                           cube 512² … 1², 10 levels
//! ```
//!
//! ## Capture Cameras
//!
//! Six 90° cameras at the origin, one per face, in layer order
//! `+X, −X, +Y, −Y, +Z, −Z`. Side faces look with up `(0, −1, 0)`; the
//! `±Y` faces use up `(0, 0, ±1)`. Those up vectors follow the cubemap face
//! convention of image row 0 at the top of each face. The capture
//! projection flips clip-space Y to match, so the top row of the `+X` face
//! looks up.
//!
//! ## Direction to Panorama
//!
//! ```text
//! u = atan2(d.z, d.x) / 2π + 0.5
//! v = asin(d.y) / π + 0.5          v = 1 straight up
//! ```
//!
//! The panorama is flipped vertically on load, so row 0 of the uploaded
//! texture is the bottom of the image and `v = 1` lands on the sky.
//!
//! ## Failure Handling
//!
//! Transient capture resources (source texture, depth target, pipeline,
//! buffers) are locals of the bake and drop on every return path.
//! [`HdriSky::load_or_placeholder`] logs a failed load and returns a grey
//! 1-texel cube so a scene without its HDR file still renders.

use wgpu::util::DeviceExt;
use std::f32::consts::{FRAC_PI_2, PI};
use std::path::Path;

use glam::{Mat4, Vec2, Vec3};
use half::f16;

use super::mesh::GpuMesh;
use super::mipmap::MipmapGenerator;
use super::pipeline::{ColorTarget, DepthTest, PipelineDesc, create_pipeline, texture_2d_entry, uniform_entry};
use super::shapes;
use super::vertex::MeshVertex;
use crate::error::{Error, Result};
use crate::render::texture::{HDR_FORMAT, mip_level_count};
use crate::render::{GpuBuffer, GpuContext, ShaderProgram, ShaderSource, Texture, UniformBlock, UniformType};

/// Default face size of a baked cube.
pub const SKY_RESOLUTION: u32 = 512;

const CAPTURE_NEAR: f32 = 0.1;
const CAPTURE_FAR: f32 = 200.0;

/// Map a direction to equirectangular texture coordinates in [0, 1]².
pub fn equirect_uv(dir: Vec3) -> Vec2 {
    let d = dir.normalize_or(Vec3::Z);
    Vec2::new(d.z.atan2(d.x), d.y.clamp(-1.0, 1.0).asin()) * Vec2::new(0.5 / PI, 1.0 / PI) + Vec2::splat(0.5)
}

/// The 90° projection shared by all six capture cameras, with clip-space Y
/// flipped so face rows run top to bottom.
pub fn capture_projection() -> Mat4 {
    Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0)) * Mat4::perspective_rh(FRAC_PI_2, 1.0, CAPTURE_NEAR, CAPTURE_FAR)
}

/// View matrices for the six cube faces in layer order.
pub fn capture_views() -> [Mat4; 6] {
    let look = |dir: Vec3, up: Vec3| Mat4::look_at_rh(Vec3::ZERO, dir, up);
    [
        look(Vec3::X, Vec3::NEG_Y),
        look(Vec3::NEG_X, Vec3::NEG_Y),
        look(Vec3::Y, Vec3::Z),
        look(Vec3::NEG_Y, Vec3::NEG_Z),
        look(Vec3::Z, Vec3::NEG_Y),
        look(Vec3::NEG_Z, Vec3::NEG_Y),
    ]
}

/// Bilinear lookup into RGB f32 panorama rows (row 0 = bottom of the image),
/// clamped at the edges.
pub fn sample_equirect(pixels: &[f32], width: u32, height: u32, uv: Vec2) -> Vec3 {
    if width == 0 || height == 0 || pixels.len() < (width * height * 3) as usize {
        return Vec3::ZERO;
    }
    let texel = |x: i64, y: i64| {
        let x = x.clamp(0, width as i64 - 1) as usize;
        let y = y.clamp(0, height as i64 - 1) as usize;
        let i = (y * width as usize + x) * 3;
        Vec3::new(pixels[i], pixels[i + 1], pixels[i + 2])
    };
    let x = uv.x * width as f32 - 0.5;
    let y = uv.y * height as f32 - 0.5;
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0, y - y0);
    let (x0, y0) = (x0 as i64, y0 as i64);

    let top = texel(x0, y0).lerp(texel(x0 + 1, y0), fx);
    let bottom = texel(x0, y0 + 1).lerp(texel(x0 + 1, y0 + 1), fx);
    top.lerp(bottom, fy)
}

/// World direction through the centre of texel (`x`, `y`) of cube `face`.
pub fn face_direction(face: usize, x: u32, y: u32, size: u32) -> Vec3 {
    let inverse = (capture_projection() * capture_views()[face % 6]).inverse();
    let ndc_x = (x as f32 + 0.5) / size as f32 * 2.0 - 1.0;
    let ndc_y = 1.0 - (y as f32 + 0.5) / size as f32 * 2.0;
    inverse.project_point3(Vec3::new(ndc_x, ndc_y, 0.5)).normalize()
}

/// CPU version of one face bake. Rows run top to bottom.
pub fn bake_face_cpu(pixels: &[f32], width: u32, height: u32, face: usize, size: u32) -> Vec<Vec3> {
    let mut out = Vec::with_capacity((size * size) as usize);
    for y in 0..size {
        for x in 0..size {
            let uv = equirect_uv(face_direction(face, x, y, size));
            out.push(sample_equirect(pixels, width, height, uv));
        }
    }
    out
}

/// Expand RGB f32 pixels to RGBA half floats.
fn to_rgba_f16(rgb: &[f32]) -> Vec<f16> {
    let mut texels = Vec::with_capacity(rgb.len() / 3 * 4);
    for px in rgb.chunks_exact(3) {
        texels.extend(px.iter().map(|&c| f16::from_f32(c)));
        texels.push(f16::ONE);
    }
    texels
}

/// A baked environment cubemap.
pub struct HdriSky {
    cube: Texture,
}

impl HdriSky {
    /// Decode an `.hdr` panorama and bake it into a cube of `resolution`².
    pub fn load(gpu: &GpuContext, path: &Path, resolution: u32) -> Result<Self> {
        let img = image::open(path).map_err(|source| Error::Image {
            path: path.to_path_buf(),
            source,
        })?;
        let rgb = img.flipv().to_rgb32f();
        let (width, height) = rgb.dimensions();
        log::info!("Loaded HDRI '{}' ({width}x{height})", path.display());
        Self::from_pixels(gpu, width, height, rgb.as_raw(), resolution)
    }

    /// Load, or log the failure and fall back to [`HdriSky::placeholder`].
    pub fn load_or_placeholder(gpu: &GpuContext, path: &Path, resolution: u32) -> Self {
        match Self::load(gpu, path, resolution) {
            Ok(sky) => sky,
            Err(e) => {
                log::error!("{e}; using a placeholder sky");
                Self::placeholder(gpu)
            }
        }
    }

    /// Bake from RGB f32 rows already flipped so row 0 is the bottom.
    pub fn from_pixels(gpu: &GpuContext, width: u32, height: u32, rgb: &[f32], resolution: u32) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if width == 0 || height == 0 || rgb.len() != expected {
            return Err(Error::UnsupportedFormat(format!(
                "equirect data has {} floats, expected {expected} for {width}x{height} RGB",
                rgb.len()
            )));
        }

        let texels = to_rgba_f16(rgb);
        let source = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some("equirect source"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: HDR_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            bytemuck::cast_slice(&texels),
        );
        let source_view = source.create_view(&wgpu::TextureViewDescriptor::default());

        let cube = bake(gpu, &source_view, resolution.max(1))?;
        Ok(Self { cube })
    }

    /// A 1-texel mid-grey cube.
    pub fn placeholder(gpu: &GpuContext) -> Self {
        let texels = to_rgba_f16(&[0.5; 18]);
        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some("placeholder sky"),
                size: wgpu::Extent3d {
                    width: 1,
                    height: 1,
                    depth_or_array_layers: 6,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: HDR_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            bytemuck::cast_slice(&texels),
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("placeholder sky"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        Self {
            cube: Texture {
                texture,
                view,
                width: 1,
                height: 1,
                format: HDR_FORMAT,
                mip_level_count: 1,
            },
        }
    }

    pub fn cube(&self) -> &Texture {
        &self.cube
    }

    /// Cube view for sampling.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.cube.view
    }
}

/// Render the six faces of a new cube from `source` and fill its mip chain.
fn bake(gpu: &GpuContext, source: &wgpu::TextureView, resolution: u32) -> Result<Texture> {
    let device = &gpu.device;
    let cube = Texture::cube_target(device, "environment cube", resolution, HDR_FORMAT);
    let depth = Texture::depth(device, "capture depth", resolution, resolution, 1);

    let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("equirect layout"),
        entries: &[
            uniform_entry(0, wgpu::ShaderStages::VERTEX, false, None),
            texture_2d_entry(1),
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    });
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("equirect sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });

    let mut program = ShaderProgram::build(
        device,
        "equirect",
        &ShaderSource::wgsl(include_str!("shaders/equirect.wgsl")),
        UniformBlock::new(&[("view_projection", UniformType::Mat4)]),
    );
    let pipeline = create_pipeline(
        device,
        &PipelineDesc {
            label: "equirect capture",
            bind_groups: &[&layout],
            program: &program,
            vs_entry: "vs_main",
            fs_entry: Some("fs_main"),
            buffers: &[MeshVertex::LAYOUT],
            color: Some(ColorTarget {
                format: HDR_FORMAT,
                blend: None,
            }),
            depth: Some(DepthTest {
                write: true,
                compare: wgpu::CompareFunction::Less,
            }),
            cull: None,
            depth_bias: wgpu::DepthBiasState::default(),
        },
    )
    .ok_or_else(|| Error::ShaderCompile {
        label: "equirect capture".to_string(),
        message: "pipeline could not be created".to_string(),
    })?;

    let (mut vertices, mut indices) = (Vec::new(), Vec::new());
    shapes::cube(2.0, &mut vertices, &mut indices);
    let mesh = GpuMesh::upload(gpu, &vertices, &indices);

    let projection = capture_projection();
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("environment bake"),
    });

    for (face, view) in capture_views().iter().enumerate() {
        program.uniforms.set_mat4("view_projection", &(projection * *view));
        let buffer = GpuBuffer::with_data(device, "capture uniform", program.uniforms.bytes(), wgpu::BufferUsages::UNIFORM);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("equirect bind group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });
        let target = cube.layer_view(face as u32, 0);

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("equirect capture"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        mesh.draw(&mut pass);
    }

    MipmapGenerator::new(device).generate(gpu, &mut encoder, &cube);
    gpu.queue.submit(std::iter::once(encoder.finish()));

    log::info!(
        "Baked environment cube {resolution}x{resolution} with {} mip levels",
        mip_level_count(resolution)
    );
    Ok(cube)
}

/// Draws an [`HdriSky`] behind the scene: depth test `LessEqual` at the far
/// plane, no depth write, Reinhard tone mapping.
pub struct Skybox {
    program: ShaderProgram,
    pipeline: Option<wgpu::RenderPipeline>,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    buffer: GpuBuffer,
    bind_group: wgpu::BindGroup,
    mesh: GpuMesh,
}

impl Skybox {
    pub fn new(gpu: &GpuContext, sky: &HdriSky) -> Self {
        let device = &gpu.device;
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("skybox layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX, false, None),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("skybox sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let program = ShaderProgram::build(
            device,
            "skybox",
            &ShaderSource::wgsl(include_str!("shaders/skybox.wgsl")),
            UniformBlock::new(&[("view", UniformType::Mat4), ("projection", UniformType::Mat4)]),
        );
        let pipeline = create_pipeline(
            device,
            &PipelineDesc {
                label: "skybox",
                bind_groups: &[&layout],
                program: &program,
                vs_entry: "vs_main",
                fs_entry: Some("fs_main"),
                buffers: &[MeshVertex::LAYOUT],
                color: Some(ColorTarget {
                    format: gpu.surface_format(),
                    blend: None,
                }),
                depth: Some(DepthTest {
                    write: false,
                    compare: wgpu::CompareFunction::LessEqual,
                }),
                cull: None,
                depth_bias: wgpu::DepthBiasState::default(),
            },
        );
        let buffer = GpuBuffer::allocate(device, "skybox uniform", program.uniforms.size(), wgpu::BufferUsages::UNIFORM);
        let bind_group = Self::bind(device, &layout, &buffer, &sampler, sky);

        let (mut vertices, mut indices) = (Vec::new(), Vec::new());
        shapes::cube(2.0, &mut vertices, &mut indices);
        let mesh = GpuMesh::upload(gpu, &vertices, &indices);

        Self {
            program,
            pipeline,
            layout,
            sampler,
            buffer,
            bind_group,
            mesh,
        }
    }

    /// Point the skybox at a different cube.
    pub fn set_sky(&mut self, gpu: &GpuContext, sky: &HdriSky) {
        self.bind_group = Self::bind(&gpu.device, &self.layout, &self.buffer, &self.sampler, sky);
    }

    pub fn update(&mut self, gpu: &GpuContext, view: &Mat4, projection: &Mat4) {
        self.program.uniforms.set_mat4("view", view);
        self.program.uniforms.set_mat4("projection", projection);
        self.program.uniforms.flush(&gpu.queue, &self.buffer);
    }

    /// Draw into a pass that already has the scene's depth attachment.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        let Some(pipeline) = &self.pipeline else {
            return;
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        self.mesh.draw(pass);
    }

    fn bind(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        buffer: &GpuBuffer,
        sampler: &wgpu::Sampler,
        sky: &HdriSky,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("skybox bind group"),
            layout,
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
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A panorama whose colour encodes the row: red grows towards the top.
    fn gradient(width: u32, height: u32) -> Vec<f32> {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.extend([y as f32 / (height - 1) as f32, x as f32 / (width - 1) as f32, 0.25]);
            }
        }
        pixels
    }

    #[test]
    fn poles_map_to_v_edges() {
        assert!((equirect_uv(Vec3::Y).y - 1.0).abs() < 1e-6);
        assert!(equirect_uv(Vec3::NEG_Y).y.abs() < 1e-6);
        let horizon = equirect_uv(Vec3::X);
        assert!((horizon - Vec2::new(0.5, 0.5)).length() < 1e-6);
    }

    #[test]
    fn face_centres_look_along_axes() {
        let axes = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];
        for (face, axis) in axes.iter().enumerate() {
            // Even sizes have no centre texel; average the middle four.
            let size = 64;
            let dir = (face_direction(face, 31, 31, size)
                + face_direction(face, 32, 31, size)
                + face_direction(face, 31, 32, size)
                + face_direction(face, 32, 32, size))
            .normalize();
            assert!(dir.dot(*axis) > 0.999, "face {face} looks along {dir}");
        }
    }

    #[test]
    fn top_row_of_side_faces_looks_up() {
        for face in [0, 1, 4, 5] {
            let top = face_direction(face, 8, 0, 16);
            let bottom = face_direction(face, 8, 15, 16);
            assert!(top.y > 0.5 && bottom.y < -0.5, "face {face}: top {top}, bottom {bottom}");
        }
    }

    #[test]
    fn top_face_centre_samples_top_of_panorama() {
        let (w, h) = (64, 32);
        let pixels = gradient(w, h);
        let face = bake_face_cpu(&pixels, w, h, 2, 8);
        let centre = face[(4 * 8 + 4) as usize];
        assert!(centre.x > 0.9, "top face centre red = {}", centre.x);
        let bottom = bake_face_cpu(&pixels, w, h, 3, 8);
        assert!(bottom[(4 * 8 + 4) as usize].x < 0.1);
    }

    #[test]
    fn cpu_bake_is_deterministic() {
        let (w, h) = (32, 16);
        let pixels = gradient(w, h);
        for face in 0..6 {
            assert_eq!(bake_face_cpu(&pixels, w, h, face, 8), bake_face_cpu(&pixels, w, h, face, 8));
        }
    }

    #[test]
    fn bilinear_sampling_clamps() {
        let pixels = vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        assert_eq!(sample_equirect(&pixels, 2, 1, Vec2::new(0.0, 0.5)), Vec3::X);
        assert_eq!(sample_equirect(&pixels, 2, 1, Vec2::new(1.0, 0.5)), Vec3::Y);
        let mid = sample_equirect(&pixels, 2, 1, Vec2::new(0.5, 0.5));
        assert!((mid - Vec3::new(0.5, 0.5, 0.0)).length() < 1e-6);
        assert_eq!(sample_equirect(&[], 0, 0, Vec2::ZERO), Vec3::ZERO);
    }

    #[test]
    fn half_float_expansion_adds_alpha() {
        let texels = to_rgba_f16(&[1.0, 2.0, 3.0]);
        assert_eq!(texels.len(), 4);
        assert_eq!(texels[1].to_f32(), 2.0);
        assert_eq!(texels[3], f16::ONE);
    }
}
