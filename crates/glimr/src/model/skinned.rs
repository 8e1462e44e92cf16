//! # Skinned Model — Imported Scene on the GPU
//!
//! A [`SkinnedModel`] is the upload of one [`ModelData`]: a skinned
//! [`GpuMesh`] per primitive, a [`GpuMaterial`] per glTF material, and a
//! bone palette buffer bound at group 3 of the skinned pipelines.
//!
//! ```text
//! import ──► ModelData ──► SkinnedModel
//!                           ├─ meshes    (vertex + skin + index buffers)
//!                           ├─ materials (uniform + 5 textures)
//!                           ├─ textures  (per-model store)
//!                           ├─ palette   (100 × mat4, uniform)
//!                           └─ rig       (skeleton, nodes, clips, playback)
//! ```
//!
//! Each model owns its textures, so dropping it frees them.
//!
//! Every mesh goes through the skinned pipelines. Meshes without a skin were
//! bound to bone 0 at import, and bone 0 stays identity, so they render
//! exactly like static geometry.

use std::collections::HashMap;
use std::path::Path;

use glam::Mat4;

use super::import::{ImportOptions, ModelData, TextureSource, import};
use super::rig::Rig;
use super::skeleton::{MAX_BONES, NodeTree, Skeleton};
use crate::error::Result;
use crate::render::{GpuBuffer, GpuContext, Texture};
use crate::render3d::material::{GpuMaterial, Material, TextureHandle, TextureStore};
use crate::render3d::mesh::GpuMesh;
use crate::render3d::pipeline::{ObjectBuffer, PbrLayouts, PbrPipelines};
use crate::render3d::shadow::ShadowMap;

/// Textures uploaded for one model, keyed by source and colour space.
struct ModelTextures {
    store: TextureStore,
    cache: SourceCache<TextureHandle>,
}

impl ModelTextures {
    fn new(gpu: &GpuContext) -> Self {
        Self {
            store: TextureStore::new(gpu),
            cache: SourceCache::default(),
        }
    }
}

/// Memoizes one upload per `(source, srgb)`. Failed uploads are not cached.
struct SourceCache<T> {
    entries: HashMap<(TextureSource, bool), T>,
}

impl<T> Default for SourceCache<T> {
    fn default() -> Self {
        Self { entries: HashMap::new() }
    }
}

impl<T: Clone> SourceCache<T> {
    fn get_or_try_insert_with(&mut self, key: (TextureSource, bool), upload: impl FnOnce() -> Option<T>) -> Option<T> {
        if let Some(value) = self.entries.get(&key) {
            return Some(value.clone());
        }
        let value = upload()?;
        self.entries.insert(key, value.clone());
        Some(value)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

struct ModelMesh {
    mesh: GpuMesh,
    material: usize,
}

/// An imported, animatable model.
pub struct SkinnedModel {
    pub rig: Rig,
    meshes: Vec<ModelMesh>,
    materials: Vec<GpuMaterial>,
    textures: ModelTextures,
    palette: GpuBuffer,
    palette_bind_group: wgpu::BindGroup,
    truncation_warned: bool,
}

impl SkinnedModel {
    /// Import and upload a scene file.
    pub fn try_load(gpu: &GpuContext, layouts: &PbrLayouts, path: &Path, options: &ImportOptions) -> Result<Self> {
        let data = import(path, options)?;
        Ok(Self::from_data(gpu, layouts, data))
    }

    /// Like [`try_load`](Self::try_load), but a failed import is logged and
    /// yields an empty model that draws nothing.
    pub fn load(gpu: &GpuContext, layouts: &PbrLayouts, path: &Path, options: &ImportOptions) -> Self {
        Self::try_load(gpu, layouts, path, options).unwrap_or_else(|e| {
            log::error!("{e}");
            Self::empty(gpu, layouts)
        })
    }

    /// A model with no meshes and an identity skeleton.
    pub fn empty(gpu: &GpuContext, layouts: &PbrLayouts) -> Self {
        let rig = Rig::new(Skeleton::new(), NodeTree::new(), Vec::new());
        let textures = ModelTextures::new(gpu);
        Self::assemble(gpu, layouts, rig, Vec::new(), Vec::new(), textures)
    }

    /// Upload imported data. Textures land in a store owned by the model and
    /// are released with it.
    pub fn from_data(gpu: &GpuContext, layouts: &PbrLayouts, data: ModelData) -> Self {
        let mut textures = ModelTextures::new(gpu);
        let ModelTextures { store, cache } = &mut textures;
        let mut resolve = |source: &Option<TextureSource>, srgb: bool| -> Option<TextureHandle> {
            let source = source.as_ref()?;
            cache.get_or_try_insert_with((source.clone(), srgb), || match source {
                TextureSource::File(path) => store.load(gpu, path, srgb, false).map_err(|e| log::warn!("{e}")).ok(),
                TextureSource::Embedded(index) => {
                    let image = data.images.get(index)?;
                    let label = format!("{} image {index}", data.path.display());
                    let (width, height) = image.dimensions();
                    Some(store.add(Texture::from_rgba8(gpu, &label, width, height, image, srgb)))
                }
            })
        };

        let mut params = Vec::with_capacity(data.materials.len());
        for m in &data.materials {
            let metallic_roughness = resolve(&m.metallic_roughness, false);
            params.push(Material {
                albedo_map: resolve(&m.albedo, true),
                normal_map: resolve(&m.normal, false),
                metallic_map: metallic_roughness,
                roughness_map: metallic_roughness,
                ao_map: resolve(&m.occlusion, false),
                ..m.params.clone()
            });
        }
        let mut materials: Vec<GpuMaterial> = Vec::with_capacity(params.len() + 1);
        materials.extend(
            params
                .into_iter()
                .map(|p| GpuMaterial::new(gpu, layouts, &textures.store, p)),
        );

        let fallback = materials.len();
        let needs_fallback = data
            .meshes
            .iter()
            .any(|m| m.material.is_none_or(|i| i >= fallback));
        if needs_fallback {
            materials.push(GpuMaterial::new(gpu, layouts, &textures.store, Material::default()));
        }

        let meshes = data
            .meshes
            .iter()
            .map(|m| ModelMesh {
                mesh: GpuMesh::upload_skinned(gpu, &m.vertices, &m.skin, &m.indices),
                material: m.material.filter(|&i| i < fallback).unwrap_or(fallback),
            })
            .collect();

        Self::assemble(gpu, layouts, data.rig, meshes, materials, textures)
    }

    fn assemble(
        gpu: &GpuContext,
        layouts: &PbrLayouts,
        rig: Rig,
        meshes: Vec<ModelMesh>,
        materials: Vec<GpuMaterial>,
        textures: ModelTextures,
    ) -> Self {
        let identity = vec![Mat4::IDENTITY; MAX_BONES];
        let palette = GpuBuffer::with_data(
            &gpu.device,
            "bone palette",
            bytemuck::cast_slice(&identity),
            wgpu::BufferUsages::UNIFORM,
        );
        let palette_bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("bone palette bind group"),
            layout: &layouts.palette,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: palette.as_entire_binding(),
            }],
        });
        Self {
            rig,
            meshes,
            materials,
            textures,
            palette,
            palette_bind_group,
            truncation_warned: false,
        }
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn materials(&self) -> &[GpuMaterial] {
        &self.materials
    }

    /// Distinct images uploaded for this model.
    pub fn texture_count(&self) -> usize {
        self.textures.cache.len()
    }

    /// Advance the skeleton to `seconds` of playback.
    pub fn update_animation(&mut self, seconds: f32) {
        self.rig.update_animation(seconds);
    }

    /// Upload the current final transforms. Bones past [`MAX_BONES`] are
    /// dropped with a one-time warning.
    pub fn upload_palette(&mut self, gpu: &GpuContext) {
        let (matrices, truncated) = palette_matrices(&self.rig.skeleton);
        if truncated && !self.truncation_warned {
            log::warn!(
                "Model has {} bones; only the first {MAX_BONES} are animated",
                self.rig.skeleton.len()
            );
            self.truncation_warned = true;
        }
        self.palette.upload(&gpu.queue, bytemuck::cast_slice(&matrices));
    }

    pub fn has_transparent(&self) -> bool {
        self.meshes.iter().any(|m| self.is_transparent(m))
    }

    pub fn has_opaque(&self) -> bool {
        self.meshes.iter().any(|m| !self.is_transparent(m))
    }

    fn is_transparent(&self, mesh: &ModelMesh) -> bool {
        self.materials[mesh.material].material.is_transparent()
    }

    /// Draw the meshes whose material matches `transparent`. The caller has
    /// bound the frame group.
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        pipelines: &PbrPipelines,
        objects: &ObjectBuffer,
        slot: usize,
        transparent: bool,
    ) {
        let Some(pipeline) = pipelines.select(true, transparent) else {
            return;
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(2, objects.bind_group(), &[objects.offset(slot)]);
        pass.set_bind_group(3, &self.palette_bind_group, &[]);
        for mesh in self.meshes.iter().filter(|m| self.is_transparent(m) == transparent) {
            pass.set_bind_group(1, self.materials[mesh.material].bind_group(), &[]);
            mesh.mesh.draw(pass);
        }
    }

    /// Draw every mesh into a shadow pass. The light is bound at group 0.
    pub fn draw_shadow(&self, pass: &mut wgpu::RenderPass<'_>, shadow: &ShadowMap, objects: &ObjectBuffer, slot: usize) {
        let Some(pipeline) = shadow.pipeline(true) else {
            return;
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(1, objects.bind_group(), &[objects.offset(slot)]);
        pass.set_bind_group(2, &self.palette_bind_group, &[]);
        for mesh in &self.meshes {
            mesh.mesh.draw(pass);
        }
    }
}

/// Palette contents for upload and whether bones were cut off.
fn palette_matrices(skeleton: &Skeleton) -> (Vec<Mat4>, bool) {
    let matrices: Vec<Mat4> = skeleton.palette().copied().collect();
    (matrices, skeleton.len() > MAX_BONES)
}

/// Handle to a model in a [`ModelStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelHandle(pub(crate) usize);

/// Owns loaded models.
#[derive(Default)]
pub struct ModelStore {
    models: Vec<SkinnedModel>,
}

impl ModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, model: SkinnedModel) -> ModelHandle {
        let handle = ModelHandle(self.models.len());
        self.models.push(model);
        handle
    }

    pub fn get(&self, handle: ModelHandle) -> &SkinnedModel {
        &self.models[handle.0]
    }

    pub fn get_mut(&mut self, handle: ModelHandle) -> &mut SkinnedModel {
        &mut self.models[handle.0]
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SkinnedModel> {
        self.models.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn palette_is_capped_and_flags_truncation() {
        let mut skeleton = Skeleton::new();
        let (matrices, truncated) = palette_matrices(&skeleton);
        assert_eq!(matrices, vec![Mat4::IDENTITY]);
        assert!(!truncated);

        for i in 0..120 {
            skeleton.add_bone(format!("b{i}"), Mat4::IDENTITY);
        }
        let (matrices, truncated) = palette_matrices(&skeleton);
        assert_eq!(matrices.len(), MAX_BONES);
        assert!(truncated);
    }

    #[test]
    fn repeated_sources_upload_once() {
        let mut cache = SourceCache::default();
        let mut uploads = 0;
        let key = (TextureSource::File(PathBuf::from("tex/skin.png")), true);
        for _ in 0..2 {
            let value = cache.get_or_try_insert_with(key.clone(), || {
                uploads += 1;
                Some(uploads)
            });
            assert_eq!(value, Some(1));
        }
        assert_eq!(uploads, 1);
        assert_eq!(cache.len(), 1);

        // Same file in linear space is a separate upload.
        let linear = (TextureSource::File(PathBuf::from("tex/skin.png")), false);
        assert_eq!(cache.get_or_try_insert_with(linear, || Some(7)), Some(7));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failed_uploads_are_retried() {
        let mut cache: SourceCache<u32> = SourceCache::default();
        let key = (TextureSource::Embedded(3), true);
        assert_eq!(cache.get_or_try_insert_with(key.clone(), || None), None);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.get_or_try_insert_with(key, || Some(1)), Some(1));
    }

    #[test]
    fn dropping_the_cache_releases_entries() {
        let texture = Rc::new(());
        let mut cache = SourceCache::default();
        cache.get_or_try_insert_with((TextureSource::Embedded(0), true), || Some(Rc::clone(&texture)));
        cache.get_or_try_insert_with((TextureSource::Embedded(0), true), || Some(Rc::clone(&texture)));
        assert_eq!(Rc::strong_count(&texture), 2);
        drop(cache);
        assert_eq!(Rc::strong_count(&texture), 1);
    }
}
