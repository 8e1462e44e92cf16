//! # Shading — CPU Reference of the Lighting Model
//!
//! The same functions `pbr.wgsl` evaluates per fragment, in Rust. They are
//! not used for drawing; tests use them to pin down the lighting contract
//! (BRDF terms, tone mapping, shadow filtering) without a GPU.
//!
//! ## Cook-Torrance
//!
//! ```text
//!            D · G · F
//! spec = ─────────────────────          kD = (1 − F)(1 − metallic)
//!        max(4 (N·V)(N·L), 1e-4)
//!
//! Lo      = (kD · albedo / π + spec) · max(N·L, 0) · (1 − shadow) · light
//! ambient = (kD · albedo + F_env · env) · ao · reflection_strength
//! colour  = gamma(aces(Lo + ambient))
//! ```
//!
//! - **D** GGX / Trowbridge-Reitz with `α = roughness²`.
//! - **G** Smith with Schlick-GGX, `k = (roughness + 1)² / 8`.
//! - **F** Schlick, `F0 = mix(0.04, albedo, metallic)`.
//!
//! ## Comparison
//!
//! - **LearnOpenGL**: the same split-sum-free direct + environment-tint model.
//! - **Filament**: adds multi-scattering compensation and a prefiltered
//!   environment with a BRDF lookup table.

use std::f32::consts::PI;

use glam::{Vec2, Vec3};

/// Mip level used when sampling the environment for a given roughness.
pub const ENV_LOD_SCALE: f32 = 5.0;

/// GGX normal distribution.
pub fn distribution_ggx(n_dot_h: f32, roughness: f32) -> f32 {
    let a = roughness * roughness;
    let a2 = a * a;
    let n_dot_h = n_dot_h.max(0.0);
    let denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    a2 / (PI * denom * denom)
}

/// Schlick-GGX geometry term for one direction.
pub fn geometry_schlick_ggx(n_dot_x: f32, roughness: f32) -> f32 {
    let r = roughness + 1.0;
    let k = r * r / 8.0;
    n_dot_x / (n_dot_x * (1.0 - k) + k)
}

/// Smith geometry term: masking times shadowing.
pub fn geometry_smith(n_dot_v: f32, n_dot_l: f32, roughness: f32) -> f32 {
    geometry_schlick_ggx(n_dot_v.max(0.0), roughness) * geometry_schlick_ggx(n_dot_l.max(0.0), roughness)
}

pub fn fresnel_schlick(cos_theta: f32, f0: Vec3) -> Vec3 {
    f0 + (Vec3::ONE - f0) * (1.0 - cos_theta.clamp(0.0, 1.0)).powi(5)
}

/// Reflectance at normal incidence.
pub fn base_reflectance(albedo: Vec3, metallic: f32) -> Vec3 {
    Vec3::splat(0.04).lerp(albedo, metallic)
}

/// ACES RRT + ODT curve fit, clamped to the displayable range.
///
/// `(v (v + 0.0245786) − 0.000090537) / (v (0.983729 v + 0.432951) + 0.238081)`
pub fn aces(v: Vec3) -> Vec3 {
    let a = v * (v + Vec3::splat(0.0245786)) - Vec3::splat(0.000090537);
    let b = v * (0.983729 * v + Vec3::splat(0.432951)) + Vec3::splat(0.238081);
    (a / b).clamp(Vec3::ZERO, Vec3::ONE)
}

pub fn reinhard(x: Vec3) -> Vec3 {
    x / (x + Vec3::ONE)
}

/// Linear to display, gamma 1/2.2.
pub fn gamma_encode(x: Vec3) -> Vec3 {
    x.max(Vec3::ZERO).powf(1.0 / 2.2)
}

/// Surface attributes at one shading point.
#[derive(Debug, Clone, Copy)]
pub struct Surface {
    pub position: Vec3,
    pub normal: Vec3,
    pub albedo: Vec3,
    pub metallic: f32,
    pub roughness: f32,
    pub ao: f32,
    pub reflection_strength: f32,
}

/// A directional light. `direction` is the way the light travels.
#[derive(Debug, Clone, Copy)]
pub struct LightSample {
    pub direction: Vec3,
    pub radiance: Vec3,
}

/// Diffuse weight `kD = (1 − F)(1 − metallic)` with `F` taken at `H·V`.
/// The direct and ambient terms share it.
pub fn diffuse_weight(surface: &Surface, camera: Vec3, light: &LightSample) -> Vec3 {
    let v = (camera - surface.position).normalize();
    let l = (-light.direction).normalize();
    let h = (v + l).normalize();
    let f0 = base_reflectance(surface.albedo, surface.metallic);
    let f = fresnel_schlick(h.dot(v).max(0.0), f0);
    (Vec3::ONE - f) * (1.0 - surface.metallic)
}

/// Direct Cook-Torrance radiance, before shadowing.
pub fn direct_radiance(surface: &Surface, camera: Vec3, light: &LightSample) -> Vec3 {
    let n = surface.normal.normalize();
    let v = (camera - surface.position).normalize();
    let l = (-light.direction).normalize();
    let h = (v + l).normalize();
    let n_dot_v = n.dot(v).max(0.0);
    let n_dot_l = n.dot(l).max(0.0);

    let f0 = base_reflectance(surface.albedo, surface.metallic);
    let f = fresnel_schlick(h.dot(v).max(0.0), f0);
    let d = distribution_ggx(n.dot(h), surface.roughness);
    let g = geometry_smith(n_dot_v, n_dot_l, surface.roughness);
    let specular = d * g * f / (4.0 * n_dot_v * n_dot_l).max(1e-4);
    let kd = diffuse_weight(surface, camera, light);

    (kd * surface.albedo / PI + specular) * n_dot_l * light.radiance
}

/// Full opaque shading: direct light attenuated by `shadow` plus the
/// environment term, tone mapped and gamma encoded.
pub fn shade(surface: &Surface, camera: Vec3, light: &LightSample, shadow: f32, environment: Vec3) -> Vec3 {
    let n = surface.normal.normalize();
    let v = (camera - surface.position).normalize();
    let f0 = base_reflectance(surface.albedo, surface.metallic);
    let f_env = fresnel_schlick(n.dot(v).max(0.0), f0);
    let kd = diffuse_weight(surface, camera, light);

    let direct = direct_radiance(surface, camera, light) * (1.0 - shadow);
    let ambient = (kd * surface.albedo + f_env * environment) * surface.ao * surface.reflection_strength;
    gamma_encode(aces(direct + ambient))
}

/// Transmissive shading: the refracted and reflected environment samples
/// mixed by Schlick Fresnel of `N·V`, tone mapped and gamma encoded.
pub fn shade_transmissive(normal: Vec3, view: Vec3, f0: Vec3, through: Vec3, mirror: Vec3) -> Vec3 {
    let fresnel = fresnel_schlick(normal.normalize().dot(view.normalize()).max(0.0), f0);
    gamma_encode(aces(through + (mirror - through) * fresnel))
}

/// Depth bias for a given `N·L`; grazing angles get more.
pub fn shadow_bias(n_dot_l: f32) -> f32 {
    (0.005 * (1.0 - n_dot_l)).max(0.0005)
}

/// Map light-space NDC (x, y in [-1, 1], z in [0, 1]) to shadow-map UV with
/// V pointing down, and depth.
pub fn shadow_coords(ndc: Vec3) -> (Vec2, f32) {
    (Vec2::new(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5), ndc.z)
}

/// 3×3 percentage-closer filter over a square depth map of `size` texels.
///
/// Returns the shadowed fraction in [0, 1]. Fragments beyond the light's far
/// plane (`z > 1`) are unshadowed, and taps outside the map count as lit.
pub fn pcf_shadow(depth_map: &[f32], size: u32, ndc: Vec3, n_dot_l: f32) -> f32 {
    let (uv, z) = shadow_coords(ndc);
    if z > 1.0 {
        return 0.0;
    }
    let bias = shadow_bias(n_dot_l);
    let size_i = size as i32;
    let centre = (uv * size as f32).floor();
    let (cx, cy) = (centre.x as i32, centre.y as i32);

    let mut shadow = 0.0;
    for dy in -1..=1 {
        for dx in -1..=1 {
            let (x, y) = (cx + dx, cy + dy);
            if x < 0 || y < 0 || x >= size_i || y >= size_i {
                continue;
            }
            let closest = depth_map[(y * size_i + x) as usize];
            if z - bias > closest {
                shadow += 1.0;
            }
        }
    }
    shadow / 9.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> Surface {
        Surface {
            position: Vec3::ZERO,
            normal: Vec3::Y,
            albedo: Vec3::new(0.8, 0.2, 0.2),
            metallic: 0.0,
            roughness: 0.5,
            ao: 1.0,
            reflection_strength: 1.0,
        }
    }

    fn sun() -> LightSample {
        LightSample {
            direction: Vec3::NEG_Y,
            radiance: Vec3::splat(3.0),
        }
    }

    #[test]
    fn ggx_peaks_at_aligned_half_vector() {
        assert!(distribution_ggx(1.0, 0.3) > distribution_ggx(0.8, 0.3));
        assert!(distribution_ggx(1.0, 0.1) > distribution_ggx(1.0, 0.9));
    }

    #[test]
    fn fresnel_limits() {
        let f0 = Vec3::splat(0.04);
        assert!((fresnel_schlick(1.0, f0) - f0).length() < 1e-6);
        assert!((fresnel_schlick(0.0, f0) - Vec3::ONE).length() < 1e-6);
        assert_eq!(base_reflectance(Vec3::X, 1.0), Vec3::X);
    }

    #[test]
    fn light_from_below_adds_nothing() {
        let up = LightSample {
            direction: Vec3::Y,
            radiance: Vec3::splat(3.0),
        };
        assert_eq!(direct_radiance(&surface(), Vec3::new(0.0, 5.0, 5.0), &up), Vec3::ZERO);
    }

    #[test]
    fn full_shadow_leaves_only_ambient() {
        let cam = Vec3::new(0.0, 5.0, 5.0);
        let lit = shade(&surface(), cam, &sun(), 0.0, Vec3::ZERO);
        let dark = shade(&surface(), cam, &sun(), 1.0, Vec3::ZERO);
        let no_light = LightSample {
            direction: Vec3::NEG_Y,
            radiance: Vec3::ZERO,
        };
        let ambient_only = shade(&surface(), cam, &no_light, 0.0, Vec3::ZERO);
        assert!(lit.x > dark.x);
        assert!((dark - ambient_only).length() < 1e-6);
    }

    #[test]
    fn aces_matches_rrt_odt_fit() {
        let mid = aces(Vec3::splat(0.5));
        assert!((mid.x - 0.374_308_3).abs() < 1e-5, "got {}", mid.x);
        assert_eq!(mid.x, mid.z);
        // Near black the fit dips below zero and is clamped.
        assert_eq!(aces(Vec3::ZERO), Vec3::ZERO);
    }

    #[test]
    fn ambient_reuses_direct_diffuse_weight() {
        let cam = Vec3::new(0.0, 5.0, 5.0);
        let s = surface();
        let dark = |direction| LightSample {
            direction,
            radiance: Vec3::ZERO,
        };
        // No direct light and no environment: only kD · albedo · ao remains.
        for light in [dark(Vec3::NEG_Y), dark(Vec3::Z)] {
            let expected = gamma_encode(aces(diffuse_weight(&s, cam, &light) * s.albedo));
            let got = shade(&s, cam, &light, 0.0, Vec3::ZERO);
            assert!((got - expected).length() < 1e-6);
        }
        // kD follows the half vector, so the light direction matters.
        let overhead = shade(&s, cam, &dark(Vec3::NEG_Y), 0.0, Vec3::ZERO);
        let grazing = shade(&s, cam, &dark(Vec3::Z), 0.0, Vec3::ZERO);
        assert!(overhead.x > grazing.x);
    }

    #[test]
    fn transmission_mixes_by_view_angle() {
        let f0 = Vec3::splat(0.04);
        let (through, mirror) = (Vec3::ZERO, Vec3::ONE);
        let head_on = shade_transmissive(Vec3::Z, Vec3::Z, f0, through, mirror);
        assert!((head_on - gamma_encode(aces(f0))).length() < 1e-6);
        let grazing = shade_transmissive(Vec3::Z, Vec3::X, f0, through, mirror);
        assert!((grazing - gamma_encode(aces(Vec3::ONE))).length() < 1e-6);
        // Dark mirror, bright refraction: mostly see-through head on.
        let clear = shade_transmissive(Vec3::Z, Vec3::Z, f0, Vec3::ONE, Vec3::ZERO);
        assert!(clear.x > 0.5);
    }

    #[test]
    fn tone_mapping_is_bounded() {
        let big = Vec3::splat(1000.0);
        assert!(aces(big).max_element() <= 1.0);
        assert!(reinhard(big).max_element() < 1.0);
        assert_eq!(reinhard(Vec3::ONE), Vec3::splat(0.5));
        assert!((gamma_encode(Vec3::ONE) - Vec3::ONE).length() < 1e-6);
    }

    #[test]
    fn beyond_far_plane_is_unshadowed() {
        let map = vec![0.0; 16];
        assert_eq!(pcf_shadow(&map, 4, Vec3::new(0.0, 0.0, 1.5), 1.0), 0.0);
        assert_eq!(pcf_shadow(&map, 4, Vec3::new(0.0, 0.0, 0.9), 1.0), 1.0);
    }

    #[test]
    fn taps_off_the_map_count_as_lit() {
        let map = vec![0.0; 16];
        // Corner texel: only 4 of 9 taps land on the map.
        let shadow = pcf_shadow(&map, 4, Vec3::new(-0.99, 0.99, 0.5), 1.0);
        assert!((shadow - 4.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn bias_grows_at_grazing_angles() {
        assert_eq!(shadow_bias(1.0), 0.0005);
        assert!((shadow_bias(0.0) - 0.005).abs() < 1e-7);
    }
}
