//! # Uniform — Named Uniform Blocks
//!
//! A [`UniformBlock`] is a CPU mirror of one WGSL uniform struct. Fields are
//! declared by name and type; offsets follow the WGSL uniform address space
//! rules, so the mirror can be copied into a buffer byte-for-byte.
//!
//! ```text
//! type        size  align
//! f32/i32/u32    4      4
//! vec2           8      8
//! vec3          12     16   ◄ a scalar may share the last 4 bytes
//! vec4          16     16
//! mat4          64     16
//! array<mat4,N> 64N    16
//! ```
//!
//! Setters look fields up by name on every call. Writing a value that is
//! already stored leaves the block clean, so calling a setter every frame with
//! an unchanged value costs a comparison and no upload. Unknown names are
//! logged once per name and otherwise ignored.
//!
//! ## Comparison
//!
//! - **OpenGL**: `glGetUniformLocation` + `glUniform*` per call. Here the
//!   lookup is a linear scan over a handful of fields and the upload is
//!   deferred to [`UniformBlock::flush`].
//! - **encase / crevice**: derive the layout from a Rust struct at compile
//!   time. A named block trades that static checking for runtime lookup.

use std::collections::HashSet;

use glam::{Mat4, Vec2, Vec3, Vec4};

use super::buffer::{GpuBuffer, align_up};

/// WGSL type of a uniform field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformType {
    F32,
    I32,
    U32,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    Mat4Array(u32),
}

impl UniformType {
    /// `(size, align)` in the uniform address space.
    pub fn layout(self) -> (usize, usize) {
        match self {
            Self::F32 | Self::I32 | Self::U32 => (4, 4),
            Self::Vec2 => (8, 8),
            Self::Vec3 => (12, 16),
            Self::Vec4 => (16, 16),
            Self::Mat4 => (64, 16),
            Self::Mat4Array(n) => (64 * n as usize, 16),
        }
    }
}

#[derive(Debug, Clone)]
struct UniformField {
    name: &'static str,
    ty: UniformType,
    offset: usize,
}

/// CPU mirror of a WGSL uniform struct with set-by-name access.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    fields: Vec<UniformField>,
    data: Vec<u8>,
    dirty: bool,
    reported: HashSet<String>,
}

impl UniformBlock {
    /// Lay out `fields` in declaration order.
    pub fn new(fields: &[(&'static str, UniformType)]) -> Self {
        let mut offset = 0;
        let mut laid_out = Vec::with_capacity(fields.len());
        for &(name, ty) in fields {
            let (size, align) = ty.layout();
            offset = align_up(offset as u64, align as u64) as usize;
            laid_out.push(UniformField { name, ty, offset });
            offset += size;
        }
        // Struct size rounds up to the largest member alignment, which is 16
        // for any block holding a vector or matrix.
        let size = align_up(offset.max(16) as u64, 16) as usize;
        Self {
            fields: laid_out,
            data: vec![0; size],
            dirty: true,
            reported: HashSet::new(),
        }
    }

    /// Byte size of the block.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Byte offset of a field, if declared.
    pub fn offset_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.offset)
    }

    pub fn set_f32(&mut self, name: &str, value: f32) {
        self.write(name, &[UniformType::F32], bytemuck::bytes_of(&value));
    }

    pub fn set_i32(&mut self, name: &str, value: i32) {
        self.write(name, &[UniformType::I32], bytemuck::bytes_of(&value));
    }

    pub fn set_u32(&mut self, name: &str, value: u32) {
        self.write(name, &[UniformType::U32], bytemuck::bytes_of(&value));
    }

    /// Booleans are stored as `u32` 0/1; WGSL has no host-shareable `bool`.
    pub fn set_bool(&mut self, name: &str, value: bool) {
        self.write(name, &[UniformType::U32, UniformType::I32], bytemuck::bytes_of(&(value as u32)));
    }

    pub fn set_vec2(&mut self, name: &str, value: Vec2) {
        self.write(name, &[UniformType::Vec2], bytemuck::bytes_of(&value));
    }

    pub fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.write(name, &[UniformType::Vec3], bytemuck::bytes_of(&value));
    }

    pub fn set_vec4(&mut self, name: &str, value: Vec4) {
        self.write(name, &[UniformType::Vec4], bytemuck::bytes_of(&value));
    }

    pub fn set_mat4(&mut self, name: &str, value: &Mat4) {
        self.write(name, &[UniformType::Mat4], bytemuck::bytes_of(value));
    }

    /// Set element `index` of a `Mat4Array` field. Out-of-range indices are
    /// reported like unknown names.
    pub fn set_mat4_at(&mut self, name: &str, index: usize, value: &Mat4) {
        let Some(field) = self.fields.iter().find(|f| f.name == name) else {
            self.report(name, "no such uniform");
            return;
        };
        match field.ty {
            UniformType::Mat4Array(n) if index < n as usize => {
                let offset = field.offset + index * 64;
                self.store(offset, bytemuck::bytes_of(value));
            }
            UniformType::Mat4Array(_) => self.report(name, "array index out of range"),
            _ => self.report(name, "not a mat4 array"),
        }
    }

    /// Upload the block into `buffer` if anything changed since the last
    /// flush. Returns `true` when an upload happened.
    pub fn flush(&mut self, queue: &wgpu::Queue, buffer: &GpuBuffer) -> bool {
        if !self.dirty {
            return false;
        }
        buffer.upload(queue, &self.data);
        self.dirty = false;
        true
    }

    fn write(&mut self, name: &str, accepted: &[UniformType], bytes: &[u8]) {
        let Some(field) = self.fields.iter().find(|f| f.name == name) else {
            self.report(name, "no such uniform");
            return;
        };
        if !accepted.contains(&field.ty) {
            let message = format!("declared as {:?}", field.ty);
            self.report(name, &message);
            return;
        }
        let offset = field.offset;
        self.store(offset, bytes);
    }

    fn store(&mut self, offset: usize, bytes: &[u8]) {
        let slot = &mut self.data[offset..offset + bytes.len()];
        if slot != bytes {
            slot.copy_from_slice(bytes);
            self.dirty = true;
        }
    }

    fn report(&mut self, name: &str, problem: &str) {
        if self.reported.insert(name.to_string()) {
            log::warn!("Uniform '{name}' ignored: {problem}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block() -> UniformBlock {
        UniformBlock::new(&[
            ("view", UniformType::Mat4),
            ("camera_pos", UniformType::Vec3),
            ("count", UniformType::U32),
            ("tint", UniformType::Vec2),
            ("strength", UniformType::F32),
            ("palette", UniformType::Mat4Array(2)),
        ])
    }

    #[test]
    fn wgsl_offsets() {
        let block = sample_block();
        assert_eq!(block.offset_of("view"), Some(0));
        assert_eq!(block.offset_of("camera_pos"), Some(64));
        // u32 packs into the vec3's trailing four bytes.
        assert_eq!(block.offset_of("count"), Some(76));
        assert_eq!(block.offset_of("tint"), Some(80));
        assert_eq!(block.offset_of("strength"), Some(88));
        assert_eq!(block.offset_of("palette"), Some(96));
        assert_eq!(block.size(), 96 + 128);
    }

    #[test]
    fn setting_same_value_twice_is_idempotent() {
        let mut block = sample_block();
        block.set_vec3("camera_pos", Vec3::new(1.0, 2.0, 3.0));
        block.dirty = false;
        let before = block.bytes().to_vec();

        block.set_vec3("camera_pos", Vec3::new(1.0, 2.0, 3.0));
        assert!(!block.is_dirty());
        assert_eq!(block.bytes(), &before[..]);

        block.set_vec3("camera_pos", Vec3::new(1.0, 2.0, 4.0));
        assert!(block.is_dirty());
    }

    #[test]
    fn unknown_and_mistyped_names_are_ignored() {
        let mut block = sample_block();
        let before = block.bytes().to_vec();
        block.set_f32("missing", 1.0);
        block.set_f32("missing", 2.0);
        block.set_f32("view", 1.0);
        block.set_mat4_at("palette", 5, &Mat4::IDENTITY);
        assert_eq!(block.bytes(), &before[..]);
        assert!(block.reported.contains("missing"));
        assert!(block.reported.contains("view"));
    }

    #[test]
    fn bool_and_array_writes_land_at_offsets() {
        let mut block = sample_block();
        block.set_bool("count", true);
        assert_eq!(&block.bytes()[76..80], &1u32.to_ne_bytes());

        let m = Mat4::from_translation(Vec3::new(7.0, 0.0, 0.0));
        block.set_mat4_at("palette", 1, &m);
        let start = 96 + 64;
        let x = &block.bytes()[start + 48..start + 52];
        assert_eq!(f32::from_ne_bytes([x[0], x[1], x[2], x[3]]), 7.0);
    }
}
