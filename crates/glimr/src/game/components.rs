//! Components and state for the brick-breaker runtime.
//!
//! Entities use the shared [`Transform`](crate::math::Transform): `translation`
//! is the centre, `scale` the full box extents. A box with scale `(10, 2)` spans
//! ±5 in X and ±1 in Y.

use glam::{Vec2, Vec4};

/// Linear velocity in world units per second.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity(pub Vec2);

/// Per-instance colour uploaded with the instance matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tint(pub Vec4);

/// Which mesh an instance is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Cube,
    Sphere,
}

/// Marks the player paddle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paddle {
    pub half_width: f32,
}

/// Marks the ball.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ball {
    pub radius: f32,
}

/// Marks a destructible brick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Brick {
    pub row: u32,
    pub column: u32,
}

/// Score, lives and the run flag. Lives only in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub score: u32,
    pub lives: u32,
    pub running: bool,
    pub bricks_destroyed: u32,
}

impl GameState {
    pub fn new(lives: u32) -> Self {
        Self {
            score: 0,
            lives,
            running: true,
            bricks_destroyed: 0,
        }
    }
}

/// Per-frame input for the game systems.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameInput {
    /// Cursor X in window pixels.
    pub cursor_x: f32,
    pub window_width: f32,
    /// Clamped step in seconds.
    pub dt: f32,
}
