//! # Material — PBR Surface Parameters and Textures
//!
//! A [`Material`] describes a surface with the metallic-roughness model plus
//! two environment terms:
//!
//! - **reflection_strength** scales the ambient (environment) contribution.
//! - **transmission** / **ior** turn the surface into glass: the environment
//!   is sampled along the refracted and reflected view rays and blended by
//!   Fresnel.
//!
//! Each scalar can be replaced by a texture. A missing texture binds a 1x1
//! default and clears the matching bit in the uniform's `texture_flags`, so
//! the shader picks the scalar without a separate pipeline per combination.
//!
//! ## Texture Defaults
//!
//! | Handle | Pixel | Format | Stands in for |
//! |---|---|---|---|
//! | [`TextureStore::WHITE`] | (255, 255, 255, 255) | sRGB | albedo |
//! | [`TextureStore::FLAT_NORMAL`] | (128, 128, 255, 255) | linear | normal map |
//! | [`TextureStore::WHITE_LINEAR`] | (255, 255, 255, 255) | linear | metallic, roughness, AO |
//!
//! ## Comparison
//!
//! - **glTF**: `pbrMetallicRoughness` packs metallic in B and roughness in G of
//!   one texture. Here both slots may point at the same handle and the shader
//!   reads `.b` and `.g` respectively.
//! - **three.js**: `MeshPhysicalMaterial` exposes `transmission` and `ior`
//!   with the same meaning.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use glam::Vec3;

use super::pipeline::PbrLayouts;
use super::vertex::{MaterialUniform, texture_flags};
use crate::error::Result;
use crate::render::{GpuBuffer, GpuContext, Texture};

/// Handle to a texture in a [`TextureStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub(crate) usize);

/// Owns loaded textures, deduplicated by path.
pub struct TextureStore {
    textures: Vec<Texture>,
    path_cache: HashMap<(PathBuf, bool), TextureHandle>,
}

impl TextureStore {
    pub const WHITE: TextureHandle = TextureHandle(0);
    pub const FLAT_NORMAL: TextureHandle = TextureHandle(1);
    pub const WHITE_LINEAR: TextureHandle = TextureHandle(2);

    /// Create a store holding the three 1x1 defaults.
    pub fn new(gpu: &GpuContext) -> Self {
        Self {
            textures: vec![
                Texture::solid(gpu, "default white", [255, 255, 255, 255], true),
                Texture::solid(gpu, "default flat normal", [128, 128, 255, 255], false),
                Texture::solid(gpu, "default white linear", [255, 255, 255, 255], false),
            ],
            path_cache: HashMap::new(),
        }
    }

    /// Load an image file, or return the handle from an earlier load of the
    /// same path. `srgb` selects the colour-space interpretation.
    pub fn load(&mut self, gpu: &GpuContext, path: &Path, srgb: bool, flip: bool) -> Result<TextureHandle> {
        let key = (path.to_path_buf(), srgb);
        if let Some(&handle) = self.path_cache.get(&key) {
            return Ok(handle);
        }
        let texture = Texture::from_file(gpu, path, srgb, flip)?;
        log::debug!("Loaded texture '{}' ({}x{})", path.display(), texture.width, texture.height);
        let handle = self.add(texture);
        self.path_cache.insert(key, handle);
        Ok(handle)
    }

    pub fn add(&mut self, texture: Texture) -> TextureHandle {
        let handle = TextureHandle(self.textures.len());
        self.textures.push(texture);
        handle
    }

    pub fn get(&self, handle: TextureHandle) -> &Texture {
        &self.textures[handle.0]
    }

    /// Number of textures, defaults included.
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

/// PBR surface description.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub albedo: Vec3,
    pub alpha: f32,
    pub metallic: f32,
    pub roughness: f32,
    pub ao: f32,
    pub reflection_strength: f32,
    pub transmission: f32,
    pub ior: f32,
    pub albedo_map: Option<TextureHandle>,
    pub normal_map: Option<TextureHandle>,
    pub metallic_map: Option<TextureHandle>,
    pub roughness_map: Option<TextureHandle>,
    pub ao_map: Option<TextureHandle>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo: Vec3::ONE,
            alpha: 1.0,
            metallic: 0.0,
            roughness: 0.5,
            ao: 1.0,
            reflection_strength: 1.0,
            transmission: 0.0,
            ior: 1.5,
            albedo_map: None,
            normal_map: None,
            metallic_map: None,
            roughness_map: None,
            ao_map: None,
        }
    }
}

impl Material {
    pub fn from_albedo(albedo: Vec3) -> Self {
        Self {
            albedo,
            ..Self::default()
        }
    }

    pub fn with_metallic_roughness(mut self, metallic: f32, roughness: f32) -> Self {
        self.metallic = metallic;
        self.roughness = roughness;
        self
    }

    /// Clear glass: full transmission at the given index of refraction.
    pub fn glass(ior: f32) -> Self {
        Self {
            roughness: 0.05,
            transmission: 1.0,
            ior,
            alpha: 0.9,
            ..Self::default()
        }
    }

    pub fn uses_albedo_map(&self) -> bool {
        self.albedo_map.is_some()
    }

    pub fn uses_normal_map(&self) -> bool {
        self.normal_map.is_some()
    }

    pub fn uses_metallic_map(&self) -> bool {
        self.metallic_map.is_some()
    }

    pub fn uses_roughness_map(&self) -> bool {
        self.roughness_map.is_some()
    }

    pub fn uses_ao_map(&self) -> bool {
        self.ao_map.is_some()
    }

    /// Drawn with blending, after every opaque surface.
    pub fn is_transparent(&self) -> bool {
        self.transmission > 0.0 || self.alpha < 1.0
    }

    pub fn texture_flags(&self) -> u32 {
        let mut flags = 0;
        if self.uses_albedo_map() {
            flags |= texture_flags::ALBEDO;
        }
        if self.uses_normal_map() {
            flags |= texture_flags::NORMAL;
        }
        if self.uses_metallic_map() {
            flags |= texture_flags::METALLIC;
        }
        if self.uses_roughness_map() {
            flags |= texture_flags::ROUGHNESS;
        }
        if self.uses_ao_map() {
            flags |= texture_flags::AO;
        }
        flags
    }

    pub fn uniform(&self) -> MaterialUniform {
        MaterialUniform {
            albedo: self.albedo.to_array(),
            alpha: self.alpha,
            metallic: self.metallic,
            roughness: self.roughness,
            ao: self.ao,
            reflection_strength: self.reflection_strength,
            transmission: self.transmission,
            ior: self.ior,
            texture_flags: self.texture_flags(),
            _pad: 0,
        }
    }
}

/// A material with its uniform buffer and group-1 bind group.
pub struct GpuMaterial {
    pub material: Material,
    buffer: GpuBuffer,
    bind_group: wgpu::BindGroup,
}

impl GpuMaterial {
    pub fn new(gpu: &GpuContext, layouts: &PbrLayouts, textures: &TextureStore, material: Material) -> Self {
        let buffer = GpuBuffer::with_data(
            &gpu.device,
            "material uniform",
            bytemuck::bytes_of(&material.uniform()),
            wgpu::BufferUsages::UNIFORM,
        );
        let bind_group = Self::bind(gpu, layouts, textures, &material, &buffer);
        Self {
            material,
            buffer,
            bind_group,
        }
    }

    /// Replace the parameters. Texture changes rebuild the bind group.
    pub fn update(&mut self, gpu: &GpuContext, layouts: &PbrLayouts, textures: &TextureStore, material: Material) {
        let maps_changed = material.texture_flags() != self.material.texture_flags()
            || material.albedo_map != self.material.albedo_map
            || material.normal_map != self.material.normal_map
            || material.metallic_map != self.material.metallic_map
            || material.roughness_map != self.material.roughness_map
            || material.ao_map != self.material.ao_map;
        self.buffer.upload(&gpu.queue, bytemuck::bytes_of(&material.uniform()));
        if maps_changed {
            self.bind_group = Self::bind(gpu, layouts, textures, &material, &self.buffer);
        }
        self.material = material;
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    fn bind(
        gpu: &GpuContext,
        layouts: &PbrLayouts,
        textures: &TextureStore,
        material: &Material,
        buffer: &GpuBuffer,
    ) -> wgpu::BindGroup {
        let view = |map: Option<TextureHandle>, fallback: TextureHandle| &textures.get(map.unwrap_or(fallback)).view;
        gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("material bind group"),
            layout: &layouts.material,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(view(material.albedo_map, TextureStore::WHITE)),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(view(
                        material.normal_map,
                        TextureStore::FLAT_NORMAL,
                    )),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(view(
                        material.metallic_map,
                        TextureStore::WHITE_LINEAR,
                    )),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(view(
                        material.roughness_map,
                        TextureStore::WHITE_LINEAR,
                    )),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::TextureView(view(material.ao_map, TextureStore::WHITE_LINEAR)),
                },
                wgpu::BindGroupEntry {
                    binding: 6,
                    resource: wgpu::BindingResource::Sampler(&layouts.material_sampler),
                },
            ],
        })
    }
}

/// Handle to a material in a [`MaterialStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub(crate) usize);

/// Owns materials and their GPU bindings.
#[derive(Default)]
pub struct MaterialStore {
    materials: Vec<GpuMaterial>,
}

impl MaterialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        gpu: &GpuContext,
        layouts: &PbrLayouts,
        textures: &TextureStore,
        material: Material,
    ) -> MaterialHandle {
        let handle = MaterialHandle(self.materials.len());
        self.materials.push(GpuMaterial::new(gpu, layouts, textures, material));
        handle
    }

    pub fn get(&self, handle: MaterialHandle) -> &GpuMaterial {
        &self.materials[handle.0]
    }

    pub fn get_mut(&mut self, handle: MaterialHandle) -> &mut GpuMaterial {
        &mut self.materials[handle.0]
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transparency_rule() {
        assert!(!Material::default().is_transparent());
        assert!(Material::glass(1.5).is_transparent());
        let faded = Material {
            alpha: 0.5,
            ..Material::default()
        };
        assert!(faded.is_transparent());
        let tinted = Material {
            transmission: 0.1,
            ..Material::default()
        };
        assert!(tinted.is_transparent());
    }

    #[test]
    fn flags_follow_texture_slots() {
        let mut m = Material::default();
        assert_eq!(m.texture_flags(), 0);
        m.albedo_map = Some(TextureHandle(3));
        m.ao_map = Some(TextureHandle(4));
        assert!(m.uses_albedo_map());
        assert!(!m.uses_normal_map());
        assert_eq!(m.texture_flags(), texture_flags::ALBEDO | texture_flags::AO);
        assert_eq!(m.uniform().texture_flags, 17);
    }
}
