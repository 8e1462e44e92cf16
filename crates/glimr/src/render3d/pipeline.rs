//! # Pipeline — PBR Bind Group Layouts and Render Pipelines
//!
//! The lit renderer splits its bindings by change frequency:
//!
//! | Group | Content | Changes | Strategy |
//! |-------|---------|---------|----------|
//! | 0 | frame uniform, environment cube + sampler, shadow map array | once/frame | [`UniformBlock`] flushed before the pass |
//! | 1 | material uniform, 5 textures, sampler | per material | one bind group per [`GpuMaterial`](super::material::GpuMaterial) |
//! | 2 | model + normal matrix | per draw | one buffer, dynamic offsets ([`ObjectBuffer`]) |
//! | 3 | bone palette, 100 × mat4 | per skinned model | skinned pipelines only |
//!
//! Four pipelines come out of one WGSL module:
//!
//! ```text
//!               opaque (depth write, no blend)   transparent (blend, no depth write)
//! vs_static     static_opaque                     static_blend
//! vs_skinned    skinned_opaque                    skinned_blend
//! ```
//!
//! Static pipelines use a three-group layout; wgpu requires every group of a
//! layout to be bound at draw time, so static draws never need a palette.
//!
//! ## Failure Handling
//!
//! Pipelines are built inside a validation error scope. A pipeline that fails
//! is `None`; draws through it are skipped and the error is logged once at
//! build time.

use std::num::NonZeroU64;

use super::material::Material;
use super::shadow::MAX_CASCADES;
use super::vertex::{MeshVertex, ObjectUniform, SkinVertex};
use crate::render::buffer::align_up;
use crate::render::shader::validated;
use crate::render::texture::DEPTH_FORMAT;
use crate::render::{GpuBuffer, GpuContext, ShaderProgram, ShaderSource, UniformBlock, UniformType};

/// Maximum bones in a palette. Must match `MAX_BONES` in `pbr.wgsl` and
/// `shadow.wgsl`.
pub const MAX_BONES: usize = 100;

/// Fields of the group-0 frame uniform, in WGSL declaration order.
pub fn frame_uniforms() -> UniformBlock {
    UniformBlock::new(&[
        ("view", UniformType::Mat4),
        ("projection", UniformType::Mat4),
        ("camera_pos", UniformType::Vec3),
        ("cascade_count", UniformType::U32),
        ("light_dir", UniformType::Vec3),
        ("light_intensity", UniformType::F32),
        ("light_color", UniformType::Vec3),
        ("shadow_enabled", UniformType::U32),
        ("cascade_ends", UniformType::Vec4),
        ("light_space", UniformType::Mat4Array(MAX_CASCADES as u32)),
    ])
}

/// Bind group layouts and samplers shared by every lit draw.
pub struct PbrLayouts {
    pub frame: wgpu::BindGroupLayout,
    pub material: wgpu::BindGroupLayout,
    pub object: wgpu::BindGroupLayout,
    pub palette: wgpu::BindGroupLayout,
    pub material_sampler: wgpu::Sampler,
    pub env_sampler: wgpu::Sampler,
}

impl PbrLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let frame = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("pbr frame layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT, false, None),
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
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2Array,
                        sample_type: wgpu::TextureSampleType::Depth,
                    },
                    count: None,
                },
            ],
        });

        let mut material_entries = vec![uniform_entry(0, wgpu::ShaderStages::FRAGMENT, false, None)];
        for binding in 1..=5 {
            material_entries.push(texture_2d_entry(binding));
        }
        material_entries.push(wgpu::BindGroupLayoutEntry {
            binding: 6,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
        let material = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("pbr material layout"),
            entries: &material_entries,
        });

        let object = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("pbr object layout"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX,
                true,
                NonZeroU64::new(std::mem::size_of::<ObjectUniform>() as u64),
            )],
        });

        let palette = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bone palette layout"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX,
                false,
                NonZeroU64::new((MAX_BONES * 64) as u64),
            )],
        });

        let material_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("material sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let env_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("environment sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            frame,
            material,
            object,
            palette,
            material_sampler,
            env_sampler,
        }
    }
}

/// Which of the four lit pipelines a draw uses.
///
/// | Variant | Vertex entry | Blend | Depth write |
/// |---|---|---|---|
/// | `StaticOpaque` | `vs_static` | off | on |
/// | `StaticBlend` | `vs_static` | alpha | off |
/// | `SkinnedOpaque` | `vs_skinned` | off | on |
/// | `SkinnedBlend` | `vs_skinned` | alpha | off |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LitVariant {
    StaticOpaque,
    StaticBlend,
    SkinnedOpaque,
    SkinnedBlend,
}

impl LitVariant {
    pub const ALL: [LitVariant; 4] = [
        LitVariant::StaticOpaque,
        LitVariant::StaticBlend,
        LitVariant::SkinnedOpaque,
        LitVariant::SkinnedBlend,
    ];

    pub fn new(skinned: bool, transparent: bool) -> Self {
        match (skinned, transparent) {
            (false, false) => LitVariant::StaticOpaque,
            (false, true) => LitVariant::StaticBlend,
            (true, false) => LitVariant::SkinnedOpaque,
            (true, true) => LitVariant::SkinnedBlend,
        }
    }

    /// Variant for a material drawn on a rigid or skinned mesh.
    pub fn for_material(material: &Material, skinned: bool) -> Self {
        Self::new(skinned, material.is_transparent())
    }

    pub fn is_skinned(self) -> bool {
        matches!(self, LitVariant::SkinnedOpaque | LitVariant::SkinnedBlend)
    }

    pub fn blends(self) -> bool {
        matches!(self, LitVariant::StaticBlend | LitVariant::SkinnedBlend)
    }

    /// `SrcAlpha, OneMinusSrcAlpha` for the blended variants.
    pub fn blend_state(self) -> Option<wgpu::BlendState> {
        self.blends().then_some(wgpu::BlendState::ALPHA_BLENDING)
    }

    pub fn writes_depth(self) -> bool {
        !self.blends()
    }

    pub fn vertex_entry(self) -> &'static str {
        if self.is_skinned() { "vs_skinned" } else { "vs_static" }
    }

    fn label(self) -> &'static str {
        match self {
            LitVariant::StaticOpaque => "pbr static opaque",
            LitVariant::StaticBlend => "pbr static blend",
            LitVariant::SkinnedOpaque => "pbr skinned opaque",
            LitVariant::SkinnedBlend => "pbr skinned blend",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// The four lit pipelines. Any of them may be `None` after a failed build.
pub struct PbrPipelines {
    pub program: ShaderProgram,
    pipelines: [Option<wgpu::RenderPipeline>; 4],
}

impl PbrPipelines {
    pub fn new(gpu: &GpuContext, layouts: &PbrLayouts) -> Self {
        let program = ShaderProgram::build(
            &gpu.device,
            "pbr",
            &ShaderSource::wgsl(include_str!("shaders/pbr.wgsl")),
            frame_uniforms(),
        );
        let static_groups = [&layouts.frame, &layouts.material, &layouts.object];
        let skinned_groups = [&layouts.frame, &layouts.material, &layouts.object, &layouts.palette];
        let static_buffers = [MeshVertex::LAYOUT];
        let skinned_buffers = [MeshVertex::LAYOUT, SkinVertex::LAYOUT];

        let pipelines = LitVariant::ALL.map(|variant| {
            if variant.is_skinned() {
                lit_pipeline(gpu, &program, variant, &skinned_groups, &skinned_buffers)
            } else {
                lit_pipeline(gpu, &program, variant, &static_groups, &static_buffers)
            }
        });

        Self { program, pipelines }
    }

    pub fn get(&self, variant: LitVariant) -> Option<&wgpu::RenderPipeline> {
        self.pipelines[variant.index()].as_ref()
    }

    pub fn select(&self, skinned: bool, transparent: bool) -> Option<&wgpu::RenderPipeline> {
        self.get(LitVariant::new(skinned, transparent))
    }
}

/// One lit pipeline built for `variant`.
fn lit_pipeline(
    gpu: &GpuContext,
    program: &ShaderProgram,
    variant: LitVariant,
    bind_groups: &[&wgpu::BindGroupLayout],
    buffers: &[wgpu::VertexBufferLayout<'_>],
) -> Option<wgpu::RenderPipeline> {
    create_pipeline(
        &gpu.device,
        &PipelineDesc {
            label: variant.label(),
            bind_groups,
            program,
            vs_entry: variant.vertex_entry(),
            fs_entry: Some("fs_main"),
            buffers,
            color: Some(ColorTarget {
                format: gpu.surface_format(),
                blend: variant.blend_state(),
            }),
            depth: Some(DepthTest {
                write: variant.writes_depth(),
                compare: wgpu::CompareFunction::Less,
            }),
            cull: Some(wgpu::Face::Back),
            depth_bias: wgpu::DepthBiasState::default(),
        },
    )
}

/// Colour attachment of a pipeline.
pub(crate) struct ColorTarget {
    pub format: wgpu::TextureFormat,
    pub blend: Option<wgpu::BlendState>,
}

/// Depth test of a pipeline against [`DEPTH_FORMAT`].
pub(crate) struct DepthTest {
    pub write: bool,
    pub compare: wgpu::CompareFunction,
}

/// Everything that differs between the crate's render pipelines.
pub(crate) struct PipelineDesc<'a> {
    pub label: &'a str,
    pub bind_groups: &'a [&'a wgpu::BindGroupLayout],
    pub program: &'a ShaderProgram,
    pub vs_entry: &'a str,
    pub fs_entry: Option<&'a str>,
    pub buffers: &'a [wgpu::VertexBufferLayout<'a>],
    pub color: Option<ColorTarget>,
    pub depth: Option<DepthTest>,
    pub cull: Option<wgpu::Face>,
    pub depth_bias: wgpu::DepthBiasState,
}

/// Build a triangle-list pipeline. Returns `None` (after logging) when the
/// program is invalid or wgpu rejects the pipeline.
pub(crate) fn create_pipeline(device: &wgpu::Device, desc: &PipelineDesc<'_>) -> Option<wgpu::RenderPipeline> {
    let (Some(vs_module), Some(fs_module)) = (desc.program.vertex(), desc.program.fragment()) else {
        log::error!("Skipping pipeline '{}': shader '{}' is invalid", desc.label, desc.program.label());
        return None;
    };

    let result = validated(device, desc.label, || {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(desc.label),
            bind_group_layouts: desc.bind_groups,
            push_constant_ranges: &[],
        });
        let targets = [desc.color.as_ref().map(|c| wgpu::ColorTargetState {
            format: c.format,
            blend: c.blend,
            write_mask: wgpu::ColorWrites::ALL,
        })];
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(desc.label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: vs_module,
                entry_point: Some(desc.vs_entry),
                buffers: desc.buffers,
                compilation_options: Default::default(),
            },
            fragment: desc.fs_entry.map(|entry| wgpu::FragmentState {
                module: fs_module,
                entry_point: Some(entry),
                targets: &targets[..usize::from(desc.color.is_some())],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: desc.cull,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: desc.depth.as_ref().map(|d| wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: d.write,
                depth_compare: d.compare,
                stencil: wgpu::StencilState::default(),
                bias: desc.depth_bias,
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    });

    match result {
        Ok(pipeline) => Some(pipeline),
        Err(e) => {
            log::error!("{e}");
            None
        }
    }
}

pub(crate) fn uniform_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    dynamic: bool,
    min_binding_size: Option<NonZeroU64>,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: dynamic,
            min_binding_size,
        },
        count: None,
    }
}

pub(crate) fn texture_2d_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    }
}

/// Per-draw [`ObjectUniform`]s packed at the device's dynamic-offset
/// alignment in one growable buffer.
pub struct ObjectBuffer {
    buffer: GpuBuffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
    staging: Vec<u8>,
}

impl ObjectBuffer {
    const INITIAL_SLOTS: u64 = 64;

    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout) -> Self {
        let stride = object_stride(device.limits().min_uniform_buffer_offset_alignment as u64);
        let buffer = GpuBuffer::allocate(
            device,
            "object uniforms",
            stride * Self::INITIAL_SLOTS,
            wgpu::BufferUsages::UNIFORM,
        );
        let bind_group = Self::bind(device, layout, &buffer);
        Self {
            buffer,
            bind_group,
            stride,
            staging: Vec::new(),
        }
    }

    /// Upload one uniform per slot. Slot `i` is then addressed by
    /// [`ObjectBuffer::offset`]`(i)`.
    pub fn write(&mut self, gpu: &GpuContext, layout: &wgpu::BindGroupLayout, objects: &[ObjectUniform]) {
        if objects.is_empty() {
            return;
        }
        let stride = self.stride as usize;
        self.staging.clear();
        self.staging.resize(stride * objects.len(), 0);
        for (slot, object) in objects.iter().enumerate() {
            let start = slot * stride;
            self.staging[start..start + std::mem::size_of::<ObjectUniform>()]
                .copy_from_slice(bytemuck::bytes_of(object));
        }
        if self.buffer.ensure_capacity(&gpu.device, self.staging.len() as u64) {
            self.bind_group = Self::bind(&gpu.device, layout, &self.buffer);
        }
        self.buffer.upload(&gpu.queue, &self.staging);
    }

    pub fn offset(&self, slot: usize) -> u32 {
        (slot as u64 * self.stride) as u32
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    fn bind(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, buffer: &GpuBuffer) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("object bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: buffer.raw(),
                    offset: 0,
                    size: NonZeroU64::new(std::mem::size_of::<ObjectUniform>() as u64),
                }),
            }],
        })
    }
}

/// Distance between dynamic-offset slots for a given device alignment.
fn object_stride(alignment: u64) -> u64 {
    align_up(std::mem::size_of::<ObjectUniform>() as u64, alignment.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_uniform_layout_matches_wgsl() {
        let block = frame_uniforms();
        assert_eq!(block.offset_of("view"), Some(0));
        assert_eq!(block.offset_of("projection"), Some(64));
        assert_eq!(block.offset_of("camera_pos"), Some(128));
        assert_eq!(block.offset_of("cascade_count"), Some(140));
        assert_eq!(block.offset_of("light_dir"), Some(144));
        assert_eq!(block.offset_of("light_intensity"), Some(156));
        assert_eq!(block.offset_of("light_color"), Some(160));
        assert_eq!(block.offset_of("shadow_enabled"), Some(172));
        assert_eq!(block.offset_of("cascade_ends"), Some(176));
        assert_eq!(block.offset_of("light_space"), Some(192));
        assert_eq!(block.size(), 384);
    }

    #[test]
    fn transparent_materials_pick_blended_pipelines() {
        let opaque = Material::default();
        let faded = Material {
            alpha: 0.5,
            ..Material::default()
        };
        let tinted = Material {
            transmission: 0.1,
            ..Material::default()
        };
        assert_eq!(LitVariant::for_material(&opaque, false), LitVariant::StaticOpaque);
        assert_eq!(LitVariant::for_material(&faded, false), LitVariant::StaticBlend);
        assert_eq!(LitVariant::for_material(&tinted, true), LitVariant::SkinnedBlend);
        assert_eq!(LitVariant::for_material(&opaque, true), LitVariant::SkinnedOpaque);
    }

    #[test]
    fn blended_variants_skip_depth_writes() {
        for variant in LitVariant::ALL {
            assert_eq!(variant.blend_state().is_some(), variant.blends());
            assert_eq!(variant.writes_depth(), !variant.blends());
        }
        assert_eq!(
            LitVariant::StaticBlend.blend_state(),
            Some(wgpu::BlendState::ALPHA_BLENDING)
        );
        assert_eq!(LitVariant::SkinnedBlend.vertex_entry(), "vs_skinned");
        assert_eq!(LitVariant::StaticOpaque.vertex_entry(), "vs_static");
    }

    #[test]
    fn variants_index_distinct_slots() {
        let slots: Vec<usize> = LitVariant::ALL.iter().map(|v| v.index()).collect();
        assert_eq!(slots, vec![0, 1, 2, 3]);
        for (skinned, blend) in [(false, false), (false, true), (true, false), (true, true)] {
            let v = LitVariant::new(skinned, blend);
            assert_eq!((v.is_skinned(), v.blends()), (skinned, blend));
        }
    }

    #[test]
    fn object_stride_respects_alignment() {
        assert_eq!(object_stride(256), 256);
        assert_eq!(object_stride(64), 128);
        assert_eq!(object_stride(1), 128);
    }
}
