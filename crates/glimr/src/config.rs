//! Window and renderer configuration.
//!
//! Samples have no command-line flags. Everything tunable lives in these
//! structs with compiled-in defaults; they derive serde so a sample can
//! override a subset from JSON if it wants to.

use serde::{Deserialize, Serialize};

/// Window creation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// `true` presents with vsync, `false` renders as fast as possible.
    pub vsync: bool,
    /// Hide and grab the cursor (first-person samples).
    pub grab_cursor: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: String::from("glimr"),
            width: 1280,
            height: 720,
            vsync: true,
            grab_cursor: false,
        }
    }
}

impl WindowConfig {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Settings for the 3D scene renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Side length of each shadow map layer in texels.
    pub shadow_map_size: u32,
    /// Far distances of the shadow cascades. One entry means a single
    /// directional shadow map, three entries the cascaded variant.
    pub cascade_ends: Vec<f32>,
    /// Ortho half-extent of the single (non-cascaded) shadow map.
    pub shadow_ortho_size: f32,
    pub shadow_near: f32,
    pub shadow_far: f32,
    /// Distance from the shadow target to the light position.
    pub shadow_distance: f32,
    /// Face size of the baked environment cubemap.
    pub sky_resolution: u32,
    /// Clear colour used when no sky is set.
    pub clear_color: [f64; 4],
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            shadow_map_size: 1024,
            cascade_ends: vec![20.0],
            shadow_ortho_size: 10.0,
            shadow_near: 0.1,
            shadow_far: 50.0,
            shadow_distance: 20.0,
            sky_resolution: 512,
            clear_color: [0.05, 0.05, 0.08, 1.0],
        }
    }
}

impl RendererConfig {
    /// Three cascades ending at 10, 30 and 80 units from the camera.
    pub fn cascaded() -> Self {
        Self {
            cascade_ends: vec![10.0, 30.0, 80.0],
            ..Self::default()
        }
    }

    pub fn cascade_count(&self) -> usize {
        self.cascade_ends.len().clamp(1, crate::render3d::shadow::MAX_CASCADES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: RendererConfig = serde_json::from_str(r#"{ "shadow_map_size": 2048 }"#).unwrap();
        assert_eq!(cfg.shadow_map_size, 2048);
        assert_eq!(cfg.cascade_ends, vec![20.0]);
    }

    #[test]
    fn cascade_count_is_bounded() {
        let mut cfg = RendererConfig::cascaded();
        assert_eq!(cfg.cascade_count(), 3);
        cfg.cascade_ends = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(cfg.cascade_count(), 3);
        cfg.cascade_ends.clear();
        assert_eq!(cfg.cascade_count(), 1);
    }
}
