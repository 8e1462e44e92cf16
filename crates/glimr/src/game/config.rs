//! Arena constants for the brick-breaker runtime.
//!
//! Everything here is a compile-time default. [`ArenaConfig::from_json`]
//! lets a sample override a subset without recompiling the library.

use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};

/// Play-field geometry, brick grid, speeds and scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,

    pub brick_rows: u32,
    pub brick_columns: u32,
    /// Full width/height of one brick.
    pub brick_size: Vec2,
    /// Gap between neighbouring bricks.
    pub brick_gap: f32,
    /// Y of the top brick row's centre.
    pub brick_top: f32,

    pub paddle_start: Vec2,
    pub paddle_size: Vec2,
    /// Lerp rate of the paddle toward the cursor target, per second.
    pub paddle_smoothness: f32,
    /// Lateral speed added per unit of normalised hit offset.
    pub paddle_spin: f32,

    pub ball_radius: f32,
    pub ball_start: Vec2,
    pub ball_start_velocity: Vec2,
    /// Velocity multiplier applied after every reflection.
    pub speed_up: f32,
    pub max_speed: f32,

    pub lives: u32,
    pub score_per_brick: u32,

    pub paddle_color: Vec4,
    pub ball_color: Vec4,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            min_x: -15.0,
            max_x: 15.0,
            min_y: -10.0,
            max_y: 10.0,

            brick_rows: 10,
            brick_columns: 30,
            brick_size: Vec2::new(0.9, 0.4),
            brick_gap: 0.1,
            brick_top: 9.0,

            paddle_start: Vec2::new(0.0, -8.5),
            paddle_size: Vec2::new(3.0, 0.5),
            paddle_smoothness: 12.0,
            paddle_spin: 6.0,

            ball_radius: 0.3,
            ball_start: Vec2::new(0.0, -7.5),
            ball_start_velocity: Vec2::new(0.0, 9.0),
            speed_up: 1.03,
            max_speed: 20.0,

            lives: 3,
            score_per_brick: 100,

            paddle_color: Vec4::new(0.85, 0.85, 0.9, 1.0),
            ball_color: Vec4::new(1.0, 0.95, 0.6, 1.0),
        }
    }
}

impl ArenaConfig {
    /// Parse a (possibly partial) JSON override on top of the defaults.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Centre of the brick at `(row, column)`; row 0 is the top row.
    pub fn brick_center(&self, row: u32, column: u32) -> Vec2 {
        let pitch = self.brick_size + Vec2::splat(self.brick_gap);
        let grid_width = pitch.x * self.brick_columns as f32;
        let x = -grid_width * 0.5 + pitch.x * (column as f32 + 0.5);
        let y = self.brick_top - pitch.y * row as f32;
        Vec2::new(x, y)
    }

    /// Row colour gradient, warm at the top.
    pub fn brick_color(&self, row: u32) -> Vec4 {
        let t = row as f32 / self.brick_rows.saturating_sub(1).max(1) as f32;
        let top = Vec4::new(0.95, 0.3, 0.25, 1.0);
        let bottom = Vec4::new(0.25, 0.55, 0.95, 1.0);
        top.lerp(bottom, t)
    }

    pub fn paddle_half_width(&self) -> f32 {
        self.paddle_size.x * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brick_grid_is_centred() {
        let cfg = ArenaConfig::default();
        let left = cfg.brick_center(0, 0);
        let right = cfg.brick_center(0, cfg.brick_columns - 1);
        assert!((left.x + right.x).abs() < 1e-4);
        assert!(left.x - cfg.brick_size.x * 0.5 >= cfg.min_x - 1e-4);
        assert!(right.x + cfg.brick_size.x * 0.5 <= cfg.max_x + 1e-4);
    }

    #[test]
    fn rows_descend_from_top() {
        let cfg = ArenaConfig::default();
        assert_eq!(cfg.brick_center(0, 0).y, cfg.brick_top);
        assert!(cfg.brick_center(1, 0).y < cfg.brick_center(0, 0).y);
    }

    #[test]
    fn json_override() {
        let cfg = ArenaConfig::from_json(r#"{ "lives": 5, "max_speed": 12.0 }"#).unwrap();
        assert_eq!(cfg.lives, 5);
        assert_eq!(cfg.max_speed, 12.0);
        assert_eq!(cfg.brick_columns, 30);
    }

    #[test]
    fn bad_json_is_an_error() {
        assert!(ArenaConfig::from_json("{ lives: }").is_err());
    }
}
