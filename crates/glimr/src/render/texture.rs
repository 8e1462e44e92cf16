//! # Texture — Owned 2D, Depth and Cube Textures
//!
//! [`Texture`] owns a `wgpu::Texture` plus its default view and remembers the
//! size, format and mip count. Dropping it releases the GPU memory.
//!
//! ## Colour Spaces
//!
//! | Use | Format |
//! |---|---|
//! | albedo / base colour | `Rgba8UnormSrgb` (decoded to linear when sampled) |
//! | normal, metallic, roughness, AO | `Rgba8Unorm` (already linear data) |
//! | HDR environment | `Rgba16Float` |
//! | depth / shadow maps | `Depth32Float` |
//!
//! wgpu has no three-channel half-float format, so HDR data carries an unused
//! alpha channel.

use std::path::Path;
use wgpu::util::DeviceExt;

use crate::error::{Error, Result};
use crate::render::GpuContext;

/// Depth format shared by the main pass, shadow maps and cube capture.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// HDR colour format for environment cubemaps.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// An owned GPU texture with its default view.
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub mip_level_count: u32,
}

impl Texture {
    /// Upload RGBA8 pixels as a single-level 2D texture.
    pub fn from_rgba8(gpu: &GpuContext, label: &str, width: u32, height: u32, data: &[u8], srgb: bool) -> Self {
        let format = if srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };
        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            width,
            height,
            format,
            mip_level_count: 1,
        }
    }

    /// Decode an image file and upload it. `flip` mirrors it vertically first.
    pub fn from_file(gpu: &GpuContext, path: &Path, srgb: bool, flip: bool) -> Result<Self> {
        let mut img = image::open(path).map_err(|source| Error::Image {
            path: path.to_path_buf(),
            source,
        })?;
        if flip {
            img = img.flipv();
        }
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let label = path.display().to_string();
        Ok(Self::from_rgba8(gpu, &label, width, height, &rgba, srgb))
    }

    /// A 1x1 texture of one colour.
    pub fn solid(gpu: &GpuContext, label: &str, rgba: [u8; 4], srgb: bool) -> Self {
        Self::from_rgba8(gpu, label, 1, 1, &rgba, srgb)
    }

    /// A depth texture, optionally with several array layers (shadow
    /// cascades). The default view covers every layer.
    pub fn depth(device: &wgpu::Device, label: &str, width: u32, height: u32, layers: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: layers.max(1),
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(if layers > 1 {
                wgpu::TextureViewDimension::D2Array
            } else {
                wgpu::TextureViewDimension::D2
            }),
            ..Default::default()
        });
        Self {
            texture,
            view,
            width: width.max(1),
            height: height.max(1),
            format: DEPTH_FORMAT,
            mip_level_count: 1,
        }
    }

    /// A renderable cubemap with a full mip chain. The default view has
    /// [`wgpu::TextureViewDimension::Cube`] for sampling.
    pub fn cube_target(device: &wgpu::Device, label: &str, size: u32, format: wgpu::TextureFormat) -> Self {
        let mip_level_count = mip_level_count(size);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 6,
            },
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        Self {
            texture,
            view,
            width: size,
            height: size,
            format,
            mip_level_count,
        }
    }

    /// A 2D view of one mip level of one array layer (a cube face or a
    /// shadow cascade), for use as a render attachment.
    pub fn layer_view(&self, layer: u32, mip: u32) -> wgpu::TextureView {
        self.texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("texture layer view"),
            dimension: Some(wgpu::TextureViewDimension::D2),
            base_mip_level: mip,
            mip_level_count: Some(1),
            base_array_layer: layer,
            array_layer_count: Some(1),
            ..Default::default()
        })
    }
}

/// Number of levels in a full mip chain for a square texture of `size`.
pub fn mip_level_count(size: u32) -> u32 {
    u32::BITS - size.max(1).leading_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_chain_lengths() {
        assert_eq!(mip_level_count(1), 1);
        assert_eq!(mip_level_count(2), 2);
        assert_eq!(mip_level_count(512), 10);
        assert_eq!(mip_level_count(1024), 11);
        assert_eq!(mip_level_count(600), 10);
    }
}
