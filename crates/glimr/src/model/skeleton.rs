//! # Skeleton — Bones, Skin Bindings and the Node Tree
//!
//! Bones live in one flat `Vec` indexed by bone id, the same order as the
//! palette uploaded to the GPU. Names are resolved to ids only while a model
//! is imported.
//!
//! ```text
//! NodeTree (arena, parent → children by index)      Skeleton (flat)
//!
//!   0 "Scene"                                       0  root     identity
//!   ├─ 1 "Hips"     bone 1  ─────────────────────►  1  Hips     global · offset
//!   │  ├─ 2 "Spine" bone 2  ─────────────────────►  2  Spine    global · offset
//!   │  └─ 3 "Leg"   bone 3  ─────────────────────►  3  Leg      global · offset
//!   └─ 4 "Prop"     (no bone)
//! ```
//!
//! Bone 0 is a reserved identity root. Meshes without a skin bind every
//! vertex to it with weight 1, so the skinned vertex shader never needs a
//! special case and the palette is never empty.

use glam::Mat4;

use crate::render3d::vertex::SkinVertex;

pub use crate::render3d::pipeline::MAX_BONES;

/// One palette entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    /// Inverse bind matrix: mesh space to bone space.
    pub offset: Mat4,
    /// Latest `global · offset`, or identity when not animating.
    pub final_transform: Mat4,
}

/// Bones in palette order.
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    bones: Vec<Bone>,
}

impl Default for Skeleton {
    fn default() -> Self {
        Self::new()
    }
}

impl Skeleton {
    /// A skeleton holding only the identity root.
    pub fn new() -> Self {
        Self {
            bones: vec![Bone {
                name: String::new(),
                offset: Mat4::IDENTITY,
                final_transform: Mat4::IDENTITY,
            }],
        }
    }

    /// Append a bone and return its id.
    pub fn add_bone(&mut self, name: impl Into<String>, offset: Mat4) -> usize {
        self.bones.push(Bone {
            name: name.into(),
            offset,
            final_transform: Mat4::IDENTITY,
        });
        self.bones.len() - 1
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn bone(&self, id: usize) -> Option<&Bone> {
        self.bones.get(id)
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    /// Always false: the root bone is never removed.
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub(crate) fn set_final(&mut self, id: usize, transform: Mat4) {
        if let Some(bone) = self.bones.get_mut(id) {
            bone.final_transform = transform;
        }
    }

    /// Reset every final transform to identity (bind pose).
    pub fn reset(&mut self) {
        for bone in &mut self.bones {
            bone.final_transform = Mat4::IDENTITY;
        }
    }

    /// Final transforms in palette order, truncated to [`MAX_BONES`].
    pub fn palette(&self) -> impl Iterator<Item = &Mat4> {
        self.bones.iter().take(MAX_BONES).map(|b| &b.final_transform)
    }
}

/// Up to four (bone, weight) influences of one vertex.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VertexBoneBinding {
    pub joints: [u32; 4],
    pub weights: [f32; 4],
}

impl VertexBoneBinding {
    /// A vertex rigidly bound to one bone.
    pub fn rigid(bone: u32) -> Self {
        Self {
            joints: [bone, 0, 0, 0],
            weights: [1.0, 0.0, 0.0, 0.0],
        }
    }

    /// Add an influence. Fills an empty slot first; when all four are taken
    /// the smallest weight is replaced if the new one is larger.
    pub fn add(&mut self, bone: u32, weight: f32) {
        let weight = weight.clamp(0.0, 1.0);
        if weight <= 0.0 {
            return;
        }
        if let Some(slot) = self.weights.iter().position(|&w| w == 0.0) {
            self.joints[slot] = bone;
            self.weights[slot] = weight;
            return;
        }
        let (smallest, &min) = self
            .weights
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .unwrap_or((0, &0.0));
        if weight > min {
            self.joints[smallest] = bone;
            self.weights[smallest] = weight;
        }
    }

    /// Scale weights to sum to one. Unassigned bindings are left at zero.
    pub fn normalize(&mut self) {
        let sum: f32 = self.weights.iter().sum();
        if sum > 0.0 {
            for w in &mut self.weights {
                *w /= sum;
            }
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.weights.iter().any(|&w| w > 0.0)
    }

    pub fn to_vertex(self) -> SkinVertex {
        SkinVertex {
            joints: self.joints,
            weights: self.weights,
        }
    }
}

/// One node of the imported hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    /// Static local transform relative to the parent.
    pub local: Mat4,
    pub children: Vec<usize>,
    /// Bone driven by this node, if any.
    pub bone: Option<usize>,
}

/// Node hierarchy stored as an arena. Node 0 is the root.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTree {
    nodes: Vec<Node>,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTree {
    /// A tree with an identity root named `"root"`.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                name: "root".to_string(),
                local: Mat4::IDENTITY,
                children: Vec::new(),
                bone: None,
            }],
        }
    }

    pub const ROOT: usize = 0;

    /// Add a node under `parent` and return its index.
    pub fn add(&mut self, parent: usize, name: impl Into<String>, local: Mat4) -> usize {
        let index = self.nodes.len();
        self.nodes.push(Node {
            name: name.into(),
            local,
            children: Vec::new(),
            bone: None,
        });
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.push(index);
        }
        index
    }

    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub fn node_mut(&mut self, index: usize) -> &mut Node {
        &mut self.nodes[index]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Static global transforms, walking the tree with an explicit stack.
    pub fn bind_pose(&self) -> Vec<Mat4> {
        let mut globals = vec![Mat4::IDENTITY; self.nodes.len()];
        let mut stack = vec![(Self::ROOT, Mat4::IDENTITY)];
        while let Some((index, parent)) = stack.pop() {
            let node = &self.nodes[index];
            let global = parent * node.local;
            globals[index] = global;
            stack.extend(node.children.iter().map(|&child| (child, global)));
        }
        globals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn skeleton_starts_with_identity_root() {
        let mut skeleton = Skeleton::new();
        assert_eq!(skeleton.len(), 1);
        let id = skeleton.add_bone("arm", Mat4::from_translation(Vec3::X));
        assert_eq!(id, 1);
        assert_eq!(skeleton.palette().count(), 2);
        assert!(skeleton.palette().all(|m| *m == Mat4::IDENTITY));
    }

    #[test]
    fn palette_is_truncated() {
        let mut skeleton = Skeleton::new();
        for i in 0..150 {
            skeleton.add_bone(format!("b{i}"), Mat4::IDENTITY);
        }
        assert_eq!(skeleton.palette().count(), MAX_BONES);
    }

    #[test]
    fn binding_fills_then_evicts_smallest() {
        let mut b = VertexBoneBinding::default();
        b.add(1, 0.4);
        b.add(2, 0.1);
        b.add(3, 0.3);
        b.add(4, 0.2);
        b.add(5, 0.05); // smaller than all, dropped
        assert!(!b.joints.contains(&5));
        b.add(6, 0.25); // evicts bone 2 (0.1)
        assert!(!b.joints.contains(&2));
        assert!(b.joints.contains(&6));
    }

    #[test]
    fn weights_sum_to_one_when_assigned() {
        let mut b = VertexBoneBinding::default();
        b.add(1, 0.3);
        b.add(2, 0.3);
        b.normalize();
        let sum: f32 = b.weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(b.weights.iter().all(|w| (0.0..=1.0).contains(w)));

        let mut empty = VertexBoneBinding::default();
        empty.normalize();
        assert!(!empty.is_assigned());
        assert_eq!(empty.weights.iter().sum::<f32>(), 0.0);
    }

    #[test]
    fn out_of_range_weights_are_clamped() {
        let mut b = VertexBoneBinding::default();
        b.add(1, 3.0);
        b.add(2, -1.0);
        assert_eq!(b.weights, [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn bind_pose_composes_parent_first() {
        let mut tree = NodeTree::new();
        let a = tree.add(NodeTree::ROOT, "a", Mat4::from_translation(Vec3::X));
        let b = tree.add(a, "b", Mat4::from_translation(Vec3::Y));
        let globals = tree.bind_pose();
        assert_eq!(globals[b].transform_point3(Vec3::ZERO), Vec3::new(1.0, 1.0, 0.0));
    }
}
