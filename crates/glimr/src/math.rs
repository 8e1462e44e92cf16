//! Math types and glam re-exports.
//!
//! We re-export [glam](https://docs.rs/glam) types so samples don't need to
//! depend on it directly. The [`Transform`] type provides position, Euler
//! rotation, and scale for scene objects and game entities.
//!
//! ## Rotation Order
//!
//! Rotations are stored as three Euler angles in radians and composed as
//! intrinsic **Y-X-Z** (yaw, then pitch, then roll):
//!
//! ```text
//! R = Ry(rotation.y) · Rx(rotation.x) · Rz(rotation.z)
//! M = T · R · S
//! ```
//!
//! The order is part of the public contract: a transform serialized today
//! produces the same matrix tomorrow.

pub use glam::{EulerRot, Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

/// A 3D transform: translation, Euler rotation (radians, YXZ), and scale.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    /// Identity transform (origin, no rotation, uniform scale of 1).
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    /// Create a transform at the given position.
    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self {
            translation: Vec3::new(x, y, z),
            ..Self::IDENTITY
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Return a copy with uniform scale applied.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Return a copy with non-uniform scale applied.
    pub fn with_scale_xyz(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Return a copy rotated by the given Euler angles (radians).
    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// The rotation as a quaternion (YXZ order).
    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.rotation.y, self.rotation.x, self.rotation.z)
    }

    /// Compute the 4x4 model matrix `T · R · S`.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Inverse-transpose of the upper 3x3, widened back to a 4x4 for uniform
/// upload (WGSL's mat3x3 padding makes a mat4x4 simpler to share).
pub fn normal_matrix(model: Mat4) -> Mat4 {
    Mat4::from_mat3(Mat3::from_mat4(model).inverse().transpose())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn sample_transform() -> Transform {
        Transform {
            translation: Vec3::new(3.0, -2.0, 7.5),
            rotation: Vec3::new(0.3, 1.1, -0.4),
            scale: Vec3::new(2.0, 0.5, 1.5),
        }
    }

    #[test]
    fn origin_maps_to_translation() {
        let t = sample_transform();
        let p = t.matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((p - Vec4::new(3.0, -2.0, 7.5, 1.0)).length() < 1e-5);
    }

    #[test]
    fn directions_ignore_translation() {
        let a = sample_transform();
        let mut b = a;
        b.translation = Vec3::new(-100.0, 42.0, 0.25);
        let dir = Vec4::new(0.2, -0.7, 1.3, 0.0);
        let da = a.matrix() * dir;
        let db = b.matrix() * dir;
        assert!((da - db).length() < 1e-5);
        assert!(da.w.abs() < 1e-6);
    }

    #[test]
    fn euler_order_is_yaw_pitch_roll() {
        let t = Transform::IDENTITY.with_rotation(Vec3::new(0.4, 0.9, -1.2));
        let expected = Mat4::from_rotation_y(0.9) * Mat4::from_rotation_x(0.4) * Mat4::from_rotation_z(-1.2);
        assert!(t.matrix().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn yaw_quarter_turn_points_forward_to_minus_x() {
        let t = Transform::IDENTITY.with_rotation(Vec3::new(0.0, FRAC_PI_2, 0.0));
        let forward = t.matrix().transform_vector3(Vec3::NEG_Z);
        assert!((forward - Vec3::NEG_X).length() < 1e-5);
    }

    #[test]
    fn scale_applies_before_rotation() {
        let t = Transform::IDENTITY
            .with_scale_xyz(Vec3::new(2.0, 1.0, 1.0))
            .with_rotation(Vec3::new(0.0, FRAC_PI_2, 0.0));
        // X is stretched first, then rotated onto -Z.
        let v = t.matrix().transform_vector3(Vec3::X);
        assert!((v - Vec3::new(0.0, 0.0, -2.0)).length() < 1e-5);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let m = Transform::IDENTITY.with_scale_xyz(Vec3::new(4.0, 1.0, 1.0)).matrix();
        let n = normal_matrix(m).transform_vector3(Vec3::new(1.0, 1.0, 0.0).normalize());
        // The normal leans toward Y because X got stretched.
        assert!(n.y > n.x);
    }
}
