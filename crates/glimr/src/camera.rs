//! # Camera — First-Person View and Projection
//!
//! [`FpsCamera`] keeps a position plus yaw/pitch angles and derives the view
//! matrix from them each frame. Keyboard input moves along the camera's
//! forward/right axes; mouse deltas turn it.
//!
//! ```text
//!            +Y
//!             │   forward = (cos yaw · cos pitch,
//!             │              sin pitch,
//!             │              sin yaw · cos pitch)
//!             │
//!             └──────── +X
//!            ╱
//!          +Z
//! ```
//!
//! With `yaw = -90°` the camera looks down −Z, matching glam's right-handed
//! `look_to_rh` convention. Pitch is clamped to ±89° so the forward vector
//! never becomes parallel to world up.
//!
//! Projection uses `perspective_rh` (depth range 0..1), which is what wgpu
//! expects.

use glam::{Mat4, Vec3};

use crate::input::{Input, KeyCode};

const PITCH_LIMIT: f32 = 89.0;

/// Movement directions accepted by [`FpsCamera::process_keyboard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// A first-person camera driven by yaw/pitch angles (degrees).
#[derive(Debug, Clone)]
pub struct FpsCamera {
    pub position: Vec3,
    /// Degrees around +Y. −90 looks down −Z.
    pub yaw: f32,
    /// Degrees above the horizon, clamped to ±89.
    pub pitch: f32,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    /// World units per second.
    pub speed: f32,
    /// Degrees per pixel of mouse motion.
    pub sensitivity: f32,
}

impl Default for FpsCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.5, 6.0),
            yaw: -90.0,
            pitch: 0.0,
            fov_y: 45.0,
            near: 0.1,
            far: 200.0,
            speed: 4.0,
            sensitivity: 0.1,
        }
    }
}

impl FpsCamera {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        Self {
            position,
            yaw,
            pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            ..Self::default()
        }
    }

    /// Unit vector the camera looks along.
    pub fn forward(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    pub fn up(&self) -> Vec3 {
        self.right().cross(self.forward()).normalize()
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward(), Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y.to_radians(), aspect.max(1e-4), self.near, self.far)
    }

    /// Move the camera for one frame of held key input.
    pub fn process_keyboard(&mut self, movement: Movement, dt: f32) {
        let step = self.speed * dt;
        let delta = match movement {
            Movement::Forward => self.forward(),
            Movement::Backward => -self.forward(),
            Movement::Right => self.right(),
            Movement::Left => -self.right(),
            Movement::Up => Vec3::Y,
            Movement::Down => Vec3::NEG_Y,
        };
        self.position += delta * step;
    }

    /// Turn the camera by a mouse delta in pixels. Screen-space Y grows
    /// downward, so a positive `dy` pitches down.
    pub fn process_mouse(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch = (self.pitch - dy * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// WASD + Space/Shift movement from the frame's key state.
    pub fn apply_input(&mut self, keys: &Input<KeyCode>, dt: f32) {
        let bindings = [
            (KeyCode::KeyW, Movement::Forward),
            (KeyCode::KeyS, Movement::Backward),
            (KeyCode::KeyA, Movement::Left),
            (KeyCode::KeyD, Movement::Right),
            (KeyCode::Space, Movement::Up),
            (KeyCode::ShiftLeft, Movement::Down),
        ];
        for (key, movement) in bindings {
            if keys.pressed(key) {
                self.process_keyboard(movement, dt);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_looks_down_negative_z() {
        let cam = FpsCamera::default();
        assert!((cam.forward() - Vec3::NEG_Z).length() < 1e-5);
        assert!((cam.right() - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut cam = FpsCamera::default();
        cam.process_mouse(0.0, -10_000.0);
        assert_eq!(cam.pitch, PITCH_LIMIT);
        cam.process_mouse(0.0, 10_000.0);
        assert_eq!(cam.pitch, -PITCH_LIMIT);
    }

    #[test]
    fn view_moves_camera_to_origin() {
        let cam = FpsCamera::new(Vec3::new(1.0, 2.0, 3.0), 30.0, 10.0);
        let p = cam.view().transform_point3(cam.position);
        assert!(p.length() < 1e-5);
    }

    #[test]
    fn forward_movement_follows_view_direction() {
        let mut cam = FpsCamera::default();
        cam.speed = 2.0;
        cam.process_keyboard(Movement::Forward, 0.5);
        assert!((cam.position - Vec3::new(0.0, 1.5, 5.0)).length() < 1e-5);
    }
}
