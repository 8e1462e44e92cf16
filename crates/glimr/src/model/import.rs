//! # Import — glTF Scenes to CPU Model Data
//!
//! Reads a `.gltf`/`.glb` file into [`ModelData`]: vertex streams, skin
//! bindings, material parameters with texture sources, the node tree, the
//! skeleton and the animation clips. Nothing here touches the GPU;
//! [`SkinnedModel`](super::SkinnedModel) uploads the result.
//!
//! ## What Gets Extracted
//!
//! | glTF | Result |
//! |---|---|
//! | triangle primitives | one [`MeshData`] each (other modes skipped with a warning) |
//! | `NORMAL` / `TANGENT` | read, or generated when missing |
//! | skin joints + inverse bind matrices | [`Skeleton`] bones, joint names deduplicated |
//! | `JOINTS_0` / `WEIGHTS_0` | [`VertexBoneBinding`], at most four per vertex |
//! | mesh on a node without a skin | baked into the node's bind-pose transform, bound to bone 0 |
//! | base colour / KHR diffuse, normal, metallic-roughness, occlusion | [`MaterialData`] slots |
//! | animations | [`AnimationClip`]s at 1 tick per second (glTF times are seconds) |
//!
//! ## Texture Lookup
//!
//! Image URIs are resolved in order: the URI as an absolute path, next to
//! the scene file, then in a `Textures/` directory next to the scene file.
//! A miss logs every searched path and leaves the slot empty. Images stored
//! in buffers (`.glb`) are decoded directly.
//!
//! ## Comparison
//!
//! - **Assimp**: imports many formats, joins identical vertices, bakes
//!   transforms on request. glTF already arrives indexed, so no joining pass.
//! - **rend3-gltf**: keeps the full node graph as scene objects; this
//!   importer flattens it into one model with one skeleton.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use glam::{Mat3, Mat4, Quat, Vec3};
use gltf::animation::util::ReadOutputs;

use super::animation::{AnimationClip, Channel, Keyframe};
use super::rig::Rig;
use super::skeleton::{NodeTree, Skeleton, VertexBoneBinding};
use crate::error::{Error, Result};
use crate::render3d::Material;
use crate::render3d::shapes::{generate_normals, generate_tangents};
use crate::render3d::vertex::{MeshVertex, SkinVertex};

/// Import switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Mirror texture coordinates vertically (`v → 1 − v`).
    pub flip_uvs: bool,
}

/// Where a material texture comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TextureSource {
    File(PathBuf),
    /// Index into [`ModelData::images`].
    Embedded(usize),
}

/// Material parameters plus texture sources for each slot.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialData {
    pub name: String,
    /// Scalar parameters. Texture handles are filled in at upload.
    pub params: Material,
    pub albedo: Option<TextureSource>,
    pub normal: Option<TextureSource>,
    /// glTF packs metallic in `.b` and roughness in `.g` of one image; the
    /// same source feeds both slots.
    pub metallic_roughness: Option<TextureSource>,
    pub occlusion: Option<TextureSource>,
}

/// One triangle list with its skin stream.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<MeshVertex>,
    pub skin: Vec<SkinVertex>,
    pub indices: Vec<u32>,
    pub material: Option<usize>,
}

/// Everything read from one scene file.
#[derive(Debug, Clone)]
pub struct ModelData {
    pub path: PathBuf,
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialData>,
    /// Decoded embedded images by glTF image index.
    pub images: HashMap<usize, image::RgbaImage>,
    pub rig: Rig,
}

/// Paths tried for an image URI, in lookup order.
pub fn texture_candidates(scene: &Path, uri: &str) -> Vec<PathBuf> {
    let uri = uri.replace("%20", " ");
    let relative = Path::new(&uri);
    let dir = scene.parent().unwrap_or_else(|| Path::new(""));
    let mut candidates = Vec::with_capacity(3);
    if relative.is_absolute() {
        candidates.push(relative.to_path_buf());
    }
    candidates.push(dir.join(relative));
    if let Some(file_name) = relative.file_name() {
        candidates.push(dir.join("Textures").join(file_name));
    }
    candidates
}

/// First existing candidate for `uri`, or `None` after logging the search.
pub fn resolve_texture_path(scene: &Path, uri: &str) -> Option<PathBuf> {
    let candidates = texture_candidates(scene, uri);
    if let Some(found) = candidates.iter().find(|p| p.is_file()) {
        return Some(found.clone());
    }
    let searched: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
    log::warn!("Texture '{uri}' not found; searched: {}", searched.join(", "));
    None
}

/// Read a glTF scene from disk.
pub fn import(path: &Path, options: &ImportOptions) -> Result<ModelData> {
    let gltf_error = |source| Error::Gltf {
        path: path.to_path_buf(),
        source,
    };
    let gltf::Gltf { document, blob } = gltf::Gltf::open(path).map_err(gltf_error)?;
    let base = path.parent();
    let buffers = gltf::import_buffers(&document, base, blob).map_err(gltf_error)?;

    let mut importer = Importer {
        path,
        options,
        buffers: &buffers,
        images: HashMap::new(),
        names: unique_node_names(&document),
    };

    let (mut nodes, tree_index) = importer.node_tree(&document);
    let bind_pose = nodes.bind_pose();
    let (skeleton, skin_bones) = importer.skeleton(&document, &mut nodes, &tree_index);

    let mut meshes = Vec::new();
    for node in document.nodes() {
        let (Some(mesh), Some(tree)) = (node.mesh(), tree_index[node.index()]) else {
            continue;
        };
        let skin = node.skin().map(|s| skin_bones[s.index()].as_slice());
        let global = bind_pose[tree];
        meshes.extend(importer.mesh(&mesh, skin, global));
    }

    let materials = document.materials().map(|m| importer.material(&m)).collect();
    let clips = document.animations().map(|a| importer.clip(&a)).collect::<Vec<_>>();

    let rig = Rig::new(skeleton, nodes, clips);
    log::info!(
        "Imported '{}': {} meshes, {} bones, {} clips",
        path.display(),
        meshes.len(),
        rig.skeleton.len(),
        rig.clips().len()
    );

    Ok(ModelData {
        path: path.to_path_buf(),
        meshes,
        materials,
        images: importer.images,
        rig,
    })
}

/// Node names made unique by suffixing the node index on collisions.
fn unique_node_names(document: &gltf::Document) -> Vec<String> {
    let mut seen = HashSet::new();
    document
        .nodes()
        .map(|node| {
            let base = node.name().map_or_else(|| format!("node{}", node.index()), str::to_string);
            if seen.insert(base.clone()) {
                base
            } else {
                let unique = format!("{base}#{}", node.index());
                seen.insert(unique.clone());
                unique
            }
        })
        .collect()
}

struct Importer<'a> {
    path: &'a Path,
    options: &'a ImportOptions,
    buffers: &'a [gltf::buffer::Data],
    images: HashMap<usize, image::RgbaImage>,
    names: Vec<String>,
}

impl Importer<'_> {
    /// Build the node arena from the default scene. Returns the tree and
    /// the tree index of every glTF node that belongs to the scene.
    fn node_tree(&self, document: &gltf::Document) -> (NodeTree, Vec<Option<usize>>) {
        let mut tree = NodeTree::new();
        let mut tree_index = vec![None; document.nodes().len()];
        let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) else {
            return (tree, tree_index);
        };

        let mut stack: Vec<(gltf::Node<'_>, usize)> = scene.nodes().map(|n| (n, NodeTree::ROOT)).collect();
        while let Some((node, parent)) = stack.pop() {
            if tree_index[node.index()].is_some() {
                continue;
            }
            let local = Mat4::from_cols_array_2d(&node.transform().matrix());
            let index = tree.add(parent, self.names[node.index()].clone(), local);
            tree_index[node.index()] = Some(index);
            stack.extend(node.children().map(|child| (child, index)));
        }
        (tree, tree_index)
    }

    /// Create bones for every skin joint. Returns the skeleton and, per skin,
    /// the bone id of each joint slot.
    fn skeleton(
        &self,
        document: &gltf::Document,
        tree: &mut NodeTree,
        tree_index: &[Option<usize>],
    ) -> (Skeleton, Vec<Vec<usize>>) {
        let mut skeleton = Skeleton::new();
        let mut bone_ids: HashMap<String, usize> = HashMap::new();
        let mut skin_bones = Vec::new();

        for skin in document.skins() {
            let reader = skin.reader(|buffer| self.buffers.get(buffer.index()).map(|d| &d[..]));
            let inverse_binds: Vec<Mat4> = reader
                .read_inverse_bind_matrices()
                .map(|iter| iter.map(|m| Mat4::from_cols_array_2d(&m)).collect())
                .unwrap_or_default();

            let mut slots = Vec::new();
            for (slot, joint) in skin.joints().enumerate() {
                let name = &self.names[joint.index()];
                let offset = inverse_binds.get(slot).copied().unwrap_or(Mat4::IDENTITY);
                let id = *bone_ids
                    .entry(name.clone())
                    .or_insert_with(|| skeleton.add_bone(name.clone(), offset));
                if let Some(node) = tree_index[joint.index()] {
                    tree.node_mut(node).bone = Some(id);
                }
                slots.push(id);
            }
            skin_bones.push(slots);
        }
        (skeleton, skin_bones)
    }

    fn mesh(&self, mesh: &gltf::Mesh<'_>, skin: Option<&[usize]>, global: Mat4) -> Vec<MeshData> {
        let name = mesh.name().map_or_else(|| format!("mesh{}", mesh.index()), str::to_string);
        let mut out = Vec::new();

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!("Skipping non-triangle primitive ({:?}) in '{name}'", primitive.mode());
                continue;
            }
            let reader = primitive.reader(|buffer| self.buffers.get(buffer.index()).map(|d| &d[..]));
            let Some(positions) = reader.read_positions() else {
                log::warn!(
                    "{}",
                    Error::MissingAttribute {
                        mesh: name.clone(),
                        attribute: "POSITION",
                    }
                );
                continue;
            };

            let mut vertices: Vec<MeshVertex> = positions.map(|p| MeshVertex::new(p, [0.0; 3], [0.0; 2])).collect();
            let count = vertices.len();
            let indices: Vec<u32> = reader
                .read_indices()
                .map_or_else(|| (0..count as u32).collect(), |i| i.into_u32().collect());
            if let Some(&bad) = indices.iter().find(|&&i| i as usize >= count) {
                log::warn!("Skipping primitive in '{name}': index {bad} out of range for {count} vertices");
                continue;
            }

            if let Some(uvs) = reader.read_tex_coords(0) {
                for (v, uv) in vertices.iter_mut().zip(uvs.into_f32()) {
                    v.uv = if self.options.flip_uvs { [uv[0], 1.0 - uv[1]] } else { uv };
                }
            }

            match reader.read_normals() {
                Some(normals) => {
                    for (v, n) in vertices.iter_mut().zip(normals) {
                        v.normal = n;
                    }
                }
                None => generate_normals(&mut vertices, &indices),
            }

            match reader.read_tangents() {
                Some(tangents) => {
                    for (v, t) in vertices.iter_mut().zip(tangents) {
                        let tangent = Vec3::new(t[0], t[1], t[2]);
                        v.tangent = tangent.to_array();
                        v.bitangent = (Vec3::from(v.normal).cross(tangent) * t[3]).to_array();
                    }
                }
                None => generate_tangents(&mut vertices, &indices),
            }

            let skin_stream = match skin {
                Some(bones) => {
                    let joints = reader.read_joints(0).map(|j| j.into_u16().collect::<Vec<_>>());
                    let weights = reader.read_weights(0).map(|w| w.into_f32().collect::<Vec<_>>());
                    bind_skin(count, joints.as_deref(), weights.as_deref(), bones)
                }
                None => {
                    bake_transform(&mut vertices, global);
                    vec![VertexBoneBinding::rigid(0).to_vertex(); count]
                }
            };

            out.push(MeshData {
                name: name.clone(),
                vertices,
                skin: skin_stream,
                indices,
                material: primitive.material().index(),
            });
        }
        out
    }

    fn material(&mut self, material: &gltf::Material<'_>) -> MaterialData {
        let pbr = material.pbr_metallic_roughness();
        let specular_glossiness = material.pbr_specular_glossiness();
        let [r, g, b, a] = specular_glossiness
            .as_ref()
            .map_or_else(|| pbr.base_color_factor(), |sg| sg.diffuse_factor());

        let mut params = Material {
            albedo: Vec3::new(r, g, b),
            alpha: if material.alpha_mode() == gltf::material::AlphaMode::Blend { a } else { 1.0 },
            metallic: pbr.metallic_factor(),
            roughness: pbr.roughness_factor(),
            ..Material::default()
        };
        if let Some(transmission) = material.transmission() {
            params.transmission = transmission.transmission_factor();
        }
        if let Some(ior) = material.ior() {
            params.ior = ior;
        }

        let albedo = pbr
            .base_color_texture()
            .or_else(|| specular_glossiness.as_ref().and_then(|sg| sg.diffuse_texture()))
            .and_then(|info| self.texture(info.texture()));
        let normal = material.normal_texture().and_then(|t| self.texture(t.texture()));
        let metallic_roughness = pbr.metallic_roughness_texture().and_then(|info| self.texture(info.texture()));
        let occlusion = material.occlusion_texture().and_then(|t| self.texture(t.texture()));

        MaterialData {
            name: material.name().unwrap_or("material").to_string(),
            params,
            albedo,
            normal,
            metallic_roughness,
            occlusion,
        }
    }

    fn texture(&mut self, texture: gltf::Texture<'_>) -> Option<TextureSource> {
        let image = texture.source();
        match image.source() {
            gltf::image::Source::Uri { uri, .. } => {
                if uri.starts_with("data:") {
                    log::warn!("Data-URI image {} in '{}' is not supported", image.index(), self.path.display());
                    return None;
                }
                resolve_texture_path(self.path, uri).map(TextureSource::File)
            }
            gltf::image::Source::View { view, .. } => {
                if !self.images.contains_key(&image.index()) {
                    let buffer = self.buffers.get(view.buffer().index())?;
                    let bytes = buffer.get(view.offset()..view.offset() + view.length())?;
                    match image::load_from_memory(bytes) {
                        Ok(decoded) => {
                            self.images.insert(image.index(), decoded.to_rgba8());
                        }
                        Err(e) => {
                            log::warn!("Embedded image {} in '{}': {e}", image.index(), self.path.display());
                            return None;
                        }
                    }
                }
                Some(TextureSource::Embedded(image.index()))
            }
        }
    }

    fn clip(&self, animation: &gltf::Animation<'_>) -> AnimationClip {
        let name = animation
            .name()
            .map_or_else(|| format!("animation{}", animation.index()), str::to_string);
        let mut channels: Vec<Channel> = Vec::new();
        let mut by_node: HashMap<usize, usize> = HashMap::new();
        let mut duration = 0.0_f32;

        for channel in animation.channels() {
            let node = channel.target().node().index();
            let reader = channel.reader(|buffer| self.buffers.get(buffer.index()).map(|d| &d[..]));
            let (Some(inputs), Some(outputs)) = (reader.read_inputs(), reader.read_outputs()) else {
                continue;
            };
            let times: Vec<f32> = inputs.collect();
            duration = times.iter().copied().fold(duration, f32::max);
            // Cubic spline outputs are (in-tangent, value, out-tangent) triples.
            let cubic = channel.sampler().interpolation() == gltf::animation::Interpolation::CubicSpline;
            let pick = |i: usize| if cubic { i * 3 + 1 } else { i };

            let slot = *by_node.entry(node).or_insert_with(|| {
                channels.push(Channel {
                    target: self.names[node].clone(),
                    ..Default::default()
                });
                channels.len() - 1
            });
            let target = &mut channels[slot];

            match outputs {
                ReadOutputs::Translations(iter) => {
                    let data: Vec<[f32; 3]> = iter.collect();
                    target.positions = keys(&times, |i| data.get(pick(i)).map(|&v| Vec3::from(v)));
                }
                ReadOutputs::Rotations(iter) => {
                    let data: Vec<[f32; 4]> = iter.into_f32().collect();
                    target.rotations = keys(&times, |i| data.get(pick(i)).map(|&q| Quat::from_array(q).normalize()));
                }
                ReadOutputs::Scales(iter) => {
                    let data: Vec<[f32; 3]> = iter.collect();
                    target.scales = keys(&times, |i| data.get(pick(i)).map(|&v| Vec3::from(v)));
                }
                ReadOutputs::MorphTargetWeights(_) => {
                    log::debug!("Ignoring morph target weights in '{name}'");
                }
            }
        }

        // glTF times are seconds; one tick per second keeps them unchanged.
        AnimationClip::new(name, duration, 1.0, channels)
    }
}

/// Keyframes for each input time whose output exists.
fn keys<T>(times: &[f32], value: impl Fn(usize) -> Option<T>) -> Vec<Keyframe<T>> {
    times
        .iter()
        .enumerate()
        .filter_map(|(i, &time)| value(i).map(|v| Keyframe::new(time, v)))
        .collect()
}

/// Per-vertex skin stream from `JOINTS_0`/`WEIGHTS_0`, with joint slots
/// translated to bone ids.
fn bind_skin(count: usize, joints: Option<&[[u16; 4]]>, weights: Option<&[[f32; 4]]>, bones: &[usize]) -> Vec<SkinVertex> {
    (0..count)
        .map(|v| {
            let mut binding = VertexBoneBinding::default();
            if let (Some(j), Some(w)) = (joints.and_then(|j| j.get(v)), weights.and_then(|w| w.get(v))) {
                for k in 0..4 {
                    let bone = bones.get(j[k] as usize).copied().unwrap_or(0);
                    binding.add(bone as u32, w[k]);
                }
            }
            binding.normalize();
            binding.to_vertex()
        })
        .collect()
}

/// Move an unskinned mesh into its node's bind-pose space.
fn bake_transform(vertices: &mut [MeshVertex], global: Mat4) {
    if global == Mat4::IDENTITY {
        return;
    }
    let normal_matrix = Mat3::from_mat4(global).inverse().transpose();
    let linear = Mat3::from_mat4(global);
    for v in vertices {
        v.position = global.transform_point3(Vec3::from(v.position)).to_array();
        v.normal = (normal_matrix * Vec3::from(v.normal)).normalize_or(Vec3::Y).to_array();
        v.tangent = (linear * Vec3::from(v.tangent)).normalize_or_zero().to_array();
        v.bitangent = (linear * Vec3::from(v.bitangent)).normalize_or_zero().to_array();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "name": "tri", "mesh": 0, "translation": [0.0, 1.0, 0.0] }],
        "meshes": [{ "name": "tri", "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1 }] }],
        "buffers": [{
            "byteLength": 76,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAABAAIAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAAEAAAAAAAAAAAA=="
        }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963 },
            { "buffer": 0, "byteOffset": 44, "byteLength": 8 },
            { "buffer": 0, "byteOffset": 52, "byteLength": 24 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 0] },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" },
            { "bufferView": 2, "componentType": 5126, "count": 2, "type": "SCALAR", "min": [0], "max": [1] },
            { "bufferView": 3, "componentType": 5126, "count": 2, "type": "VEC3" }
        ],
        "animations": [{
            "name": "move",
            "channels": [{ "sampler": 0, "target": { "node": 0, "path": "translation" } }],
            "samplers": [{ "input": 2, "output": 3, "interpolation": "LINEAR" }]
        }]
    }"#;

    fn write_scene(name: &str) -> PathBuf {
        write_gltf(name, TRIANGLE)
    }

    fn write_gltf(name: &str, json: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("glimr-import-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("triangle.gltf");
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn out_of_range_index_skips_primitive() {
        // Index buffer 0, 1, 5 against three vertices.
        let json = TRIANGLE.replace("AAABAAIA", "AAABAAUA");
        assert_ne!(json, TRIANGLE);
        let path = write_gltf("bad-index", &json);
        let data = import(&path, &ImportOptions::default()).unwrap();
        assert!(data.meshes.is_empty());
    }

    #[test]
    fn imports_unskinned_triangle() {
        let path = write_scene("mesh");
        let data = import(&path, &ImportOptions::default()).unwrap();

        assert_eq!(data.meshes.len(), 1);
        let mesh = &data.meshes[0];
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        // Baked into the node's translation.
        assert_eq!(mesh.vertices[0].position, [0.0, 1.0, 0.0]);
        // Generated normal faces +Z.
        assert!((Vec3::from(mesh.vertices[0].normal) - Vec3::Z).length() < 1e-5);
        // Rigidly bound to the root bone.
        assert!(mesh.skin.iter().all(|s| s.joints[0] == 0 && s.weights == [1.0, 0.0, 0.0, 0.0]));
        assert_eq!(data.rig.skeleton.len(), 1);
    }

    #[test]
    fn imports_animation_in_seconds() {
        let path = write_scene("anim");
        let data = import(&path, &ImportOptions::default()).unwrap();
        let clip = &data.rig.clips()[0];
        assert_eq!(clip.name, "move");
        assert_eq!(clip.duration, 1.0);
        assert_eq!(clip.ticks_per_second, 1.0);
        let channel = clip.channel("tri").unwrap();
        assert_eq!(channel.positions.len(), 2);
        assert_eq!(channel.positions[1].value, Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = import(Path::new("/nonexistent/scene.gltf"), &ImportOptions::default());
        assert!(matches!(err, Err(Error::Gltf { .. })));
    }

    #[test]
    fn texture_lookup_order() {
        let scene = Path::new("/assets/hero/hero.gltf");
        let candidates = texture_candidates(scene, "maps/skin%20diffuse.png");
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/assets/hero/maps/skin diffuse.png"),
                PathBuf::from("/assets/hero/Textures/skin diffuse.png"),
            ]
        );
        let absolute = texture_candidates(scene, "/opt/tex/a.png");
        assert_eq!(absolute[0], PathBuf::from("/opt/tex/a.png"));
        assert_eq!(absolute.len(), 3);
        assert_eq!(resolve_texture_path(scene, "nope.png"), None);
    }

    #[test]
    fn skin_weights_are_normalised() {
        let joints = [[0u16, 1, 0, 0]];
        let weights = [[0.25f32, 0.25, 0.0, 0.0]];
        let skin = bind_skin(2, Some(&joints), Some(&weights), &[3, 5]);
        assert_eq!(skin[0].joints[..2], [3, 5]);
        assert_eq!(skin[0].weights[..2], [0.5, 0.5]);
        // Second vertex has no data: unassigned, shader falls back to bone 0.
        assert_eq!(skin[1].weights, [0.0; 4]);
    }

    #[test]
    fn node_names_are_unique() {
        let json = r#"{
            "asset": { "version": "2.0" },
            "nodes": [{ "name": "a" }, { "name": "a" }, {}]
        }"#;
        let gltf = gltf::Gltf::from_slice(json.as_bytes()).unwrap();
        assert_eq!(unique_node_names(&gltf.document), vec!["a", "a#1", "node2"]);
    }
}
