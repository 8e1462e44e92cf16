//! # Animation — Keyframe Tracks and Clips
//!
//! A clip is a set of channels, one per animated node, each with separate
//! position, rotation and scale tracks. Times are in ticks; a clip's
//! `ticks_per_second` converts seconds to ticks.
//!
//! ## Sampling
//!
//! ```text
//! keys:   k0        k1              k2
//!         │─────────│───────────────│
//! ticks:        ▲ t
//!         mix(k0, k1, (t − k0.time) / (k1.time − k0.time))
//! ```
//!
//! - one key: that key, whatever the time
//! - before the first key: the first key
//! - past the last key: the last key
//!
//! One generic [`sample`] serves all three track types; the caller passes the
//! mixer (`Vec3::lerp` or `Quat::slerp`).
//!
//! ## Wrapping
//!
//! Clip time loops over `[0, duration)` unless a sub-range `[start, end]` is
//! active, in which case it loops inside the range.

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};

/// Ticks per second used when a clip declares zero.
pub const DEFAULT_TICKS_PER_SECOND: f32 = 25.0;

/// A value at a point in time (ticks).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe<T> {
    pub time: f32,
    pub value: T,
}

impl<T> Keyframe<T> {
    pub fn new(time: f32, value: T) -> Self {
        Self { time, value }
    }
}

/// Interpolate a track at `ticks`. Returns `None` for an empty track.
pub fn sample<T: Copy>(keys: &[Keyframe<T>], ticks: f32, mix: impl Fn(T, T, f32) -> T) -> Option<T> {
    let first = keys.first()?;
    let last = keys.last()?;
    if keys.len() == 1 || ticks <= first.time {
        return Some(first.value);
    }
    if ticks >= last.time {
        return Some(last.value);
    }
    let next = keys.iter().position(|k| k.time > ticks).unwrap_or(keys.len() - 1);
    let prev = next.saturating_sub(1);
    let (a, b) = (&keys[prev], &keys[next]);
    let span = b.time - a.time;
    let factor = if span > 0.0 {
        ((ticks - a.time) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };
    Some(mix(a.value, b.value, factor))
}

/// Keyframe tracks for one node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Channel {
    /// Name of the animated node.
    pub target: String,
    pub positions: Vec<Keyframe<Vec3>>,
    pub rotations: Vec<Keyframe<Quat>>,
    pub scales: Vec<Keyframe<Vec3>>,
}

impl Channel {
    /// Local transform at `ticks`. Missing tracks keep the node's static
    /// component from `rest`.
    pub fn local_transform(&self, ticks: f32, rest: &Mat4) -> Mat4 {
        let (rest_scale, rest_rotation, rest_translation) = rest.to_scale_rotation_translation();
        let translation = sample(&self.positions, ticks, Vec3::lerp).unwrap_or(rest_translation);
        let rotation = sample(&self.rotations, ticks, Quat::slerp).unwrap_or(rest_rotation);
        let scale = sample(&self.scales, ticks, Vec3::lerp).unwrap_or(rest_scale);
        Mat4::from_translation(translation) * Mat4::from_quat(rotation.normalize()) * Mat4::from_scale(scale)
    }

    /// Time of the earliest key on any track.
    pub fn first_time(&self) -> Option<f32> {
        [
            self.positions.first().map(|k| k.time),
            self.rotations.first().map(|k| k.time),
            self.scales.first().map(|k| k.time),
        ]
        .into_iter()
        .flatten()
        .reduce(f32::min)
    }
}

/// A named animation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    /// Length in ticks.
    pub duration: f32,
    pub ticks_per_second: f32,
    pub channels: Vec<Channel>,
    by_target: HashMap<String, usize>,
}

impl AnimationClip {
    /// Build a clip. A zero (or negative) `ticks_per_second` becomes
    /// [`DEFAULT_TICKS_PER_SECOND`].
    pub fn new(name: impl Into<String>, duration: f32, ticks_per_second: f32, channels: Vec<Channel>) -> Self {
        let by_target = channels
            .iter()
            .enumerate()
            .map(|(i, c)| (c.target.clone(), i))
            .collect();
        Self {
            name: name.into(),
            duration: duration.max(0.0),
            ticks_per_second: if ticks_per_second > 0.0 {
                ticks_per_second
            } else {
                DEFAULT_TICKS_PER_SECOND
            },
            channels,
            by_target,
        }
    }

    pub fn channel(&self, target: &str) -> Option<&Channel> {
        self.by_target.get(target).map(|&i| &self.channels[i])
    }

    /// Length in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.duration / self.ticks_per_second
    }

    /// Clip-local ticks for `seconds` of playback, wrapped over the whole
    /// clip or inside `range`.
    pub fn ticks_at(&self, seconds: f32, range: Option<(f32, f32)>) -> f32 {
        let ticks = seconds * self.ticks_per_second;
        match range {
            Some((start, end)) if start < end => {
                if ticks < start {
                    start
                } else {
                    start + (ticks - start).rem_euclid(end - start)
                }
            }
            _ if self.duration > 0.0 => ticks.rem_euclid(self.duration),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Vec<Keyframe<Vec3>> {
        vec![
            Keyframe::new(0.0, Vec3::ZERO),
            Keyframe::new(10.0, Vec3::new(10.0, 0.0, 0.0)),
            Keyframe::new(20.0, Vec3::new(10.0, 10.0, 0.0)),
        ]
    }

    #[test]
    fn sampling_interpolates_between_brackets() {
        let keys = ramp();
        assert_eq!(sample(&keys, 5.0, Vec3::lerp), Some(Vec3::new(5.0, 0.0, 0.0)));
        assert_eq!(sample(&keys, 15.0, Vec3::lerp), Some(Vec3::new(10.0, 5.0, 0.0)));
    }

    #[test]
    fn sampling_edges() {
        let keys = ramp();
        assert_eq!(sample(&keys, -3.0, Vec3::lerp), Some(Vec3::ZERO));
        assert_eq!(sample(&keys, 99.0, Vec3::lerp), Some(Vec3::new(10.0, 10.0, 0.0)));
        let single = [Keyframe::new(4.0, Vec3::ONE)];
        assert_eq!(sample(&single, 0.0, Vec3::lerp), Some(Vec3::ONE));
        assert_eq!(sample::<Vec3>(&[], 0.0, Vec3::lerp), None);
    }

    #[test]
    fn rotations_slerp() {
        let keys = [
            Keyframe::new(0.0, Quat::IDENTITY),
            Keyframe::new(2.0, Quat::from_rotation_y(std::f32::consts::PI)),
        ];
        let half = sample(&keys, 1.0, Quat::slerp).unwrap();
        let expected = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        assert!(half.angle_between(expected) < 1e-4);
    }

    #[test]
    fn zero_rate_defaults_to_25() {
        let clip = AnimationClip::new("idle", 100.0, 0.0, Vec::new());
        assert_eq!(clip.ticks_per_second, DEFAULT_TICKS_PER_SECOND);
        assert_eq!(clip.duration_secs(), 4.0);
    }

    #[test]
    fn wrapping() {
        let clip = AnimationClip::new("walk", 100.0, 25.0, Vec::new());
        assert_eq!(clip.ticks_at(1.0, None), 25.0);
        assert_eq!(clip.ticks_at(5.0, None), 25.0);
        assert_eq!(clip.ticks_at(0.5, Some((25.0, 50.0))), 25.0);
        assert_eq!(clip.ticks_at(1.5, Some((25.0, 50.0))), 37.5);
        assert_eq!(clip.ticks_at(2.5, Some((25.0, 50.0))), 37.5);
    }

    #[test]
    fn missing_tracks_keep_rest_pose() {
        let rest = Mat4::from_scale_rotation_translation(Vec3::splat(2.0), Quat::IDENTITY, Vec3::new(0.0, 3.0, 0.0));
        let channel = Channel {
            target: "n".into(),
            positions: vec![Keyframe::new(0.0, Vec3::X)],
            ..Default::default()
        };
        let m = channel.local_transform(0.0, &rest);
        let (scale, _, translation) = m.to_scale_rotation_translation();
        assert!((scale - Vec3::splat(2.0)).length() < 1e-5);
        assert!((translation - Vec3::X).length() < 1e-5);
    }
}
