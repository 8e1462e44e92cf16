//! # Mipmap — Blit-Chain Mip Generation
//!
//! wgpu has no `generate_mipmap`. Each level is rendered from the one above
//! it with a fullscreen triangle and a linear sampler:
//!
//! ```text
//! level 0 ──blit──► level 1 ──blit──► level 2 ── … ──► 1×1
//!  512²              256²              128²
//! ```
//!
//! Array and cube textures are processed one layer at a time, so each cube
//! face gets its own independent chain.

use std::collections::HashMap;

use super::pipeline::{ColorTarget, PipelineDesc, create_pipeline};
use crate::render::{GpuContext, ShaderProgram, ShaderSource, Texture, UniformBlock};

/// Builds mip chains for colour textures. Pipelines are created on first use
/// per format.
pub struct MipmapGenerator {
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    program: ShaderProgram,
    pipelines: HashMap<wgpu::TextureFormat, Option<wgpu::RenderPipeline>>,
}

impl MipmapGenerator {
    pub fn new(device: &wgpu::Device) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("mipmap layout"),
            entries: &[
                super::pipeline::texture_2d_entry(0),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("mipmap sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let program = ShaderProgram::build(
            device,
            "mipmap",
            &ShaderSource::wgsl(include_str!("shaders/mipmap.wgsl")),
            UniformBlock::new(&[]),
        );
        Self {
            layout,
            sampler,
            program,
            pipelines: HashMap::new(),
        }
    }

    /// Fill levels `1..mip_level_count` of every layer of `texture` from
    /// level 0. The texture needs `RENDER_ATTACHMENT` and `TEXTURE_BINDING`.
    pub fn generate(&mut self, gpu: &GpuContext, encoder: &mut wgpu::CommandEncoder, texture: &Texture) {
        if texture.mip_level_count < 2 {
            return;
        }
        let device = &gpu.device;
        let program = &self.program;
        let layout = &self.layout;
        let pipeline = self
            .pipelines
            .entry(texture.format)
            .or_insert_with(|| blit_pipeline(device, program, layout, texture.format));
        let Some(pipeline) = pipeline.as_ref() else {
            return;
        };

        let layers = texture.texture.depth_or_array_layers();
        for layer in 0..layers {
            for level in 1..texture.mip_level_count {
                let source = texture.layer_view(layer, level - 1);
                let target = texture.layer_view(layer, level);
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("mipmap source"),
                    layout: &self.layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&source),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&self.sampler),
                        },
                    ],
                });

                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("mipmap blit"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &target,
                        depth_slice: None,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &bind_group, &[]);
                pass.draw(0..3, 0..1);
            }
        }
        log::debug!(
            "Generated {} mip levels for {layers} layer(s) of {:?}",
            texture.mip_level_count,
            texture.format
        );
    }
}

fn blit_pipeline(
    device: &wgpu::Device,
    program: &ShaderProgram,
    layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> Option<wgpu::RenderPipeline> {
    create_pipeline(
        device,
        &PipelineDesc {
            label: "mipmap blit",
            bind_groups: &[layout],
            program,
            vs_entry: "vs_main",
            fs_entry: Some("fs_main"),
            buffers: &[],
            color: Some(ColorTarget { format, blend: None }),
            depth: None,
            cull: None,
            depth_bias: wgpu::DepthBiasState::default(),
        },
    )
}
