//! # Rig — Skeleton Playback
//!
//! A [`Rig`] owns a model's node tree, skeleton and clips, plus the playback
//! state: current clip, playing flag, speed and an optional loop sub-range.
//!
//! ## Evaluation
//!
//! ```text
//! seconds ─► ticks = seconds · speed · tps ─► wrap (clip or sub-range)
//!
//! stack: [(root, I)]
//! pop (node, parent):
//!     local  = channel(node)? T · R · S : node.local
//!     global = parent · local
//!     bone?  → bones[b].final = global · bones[b].offset
//!     push children with global
//! ```
//!
//! With no clip, or when stopped, every final transform is identity and the
//! mesh renders in bind pose.

use glam::Mat4;

use super::animation::AnimationClip;
use super::skeleton::{NodeTree, Skeleton};
use crate::error::{Error, Result};

/// Node tree, skeleton, clips and playback state of one model.
#[derive(Debug, Clone)]
pub struct Rig {
    pub skeleton: Skeleton,
    pub nodes: NodeTree,
    clips: Vec<AnimationClip>,
    current: Option<usize>,
    playing: bool,
    speed: f32,
    /// Active sub-range in ticks.
    loop_range: Option<(f32, f32)>,
}

impl Rig {
    /// A rig that plays its first clip, if it has one.
    pub fn new(skeleton: Skeleton, nodes: NodeTree, clips: Vec<AnimationClip>) -> Self {
        let current = (!clips.is_empty()).then_some(0);
        Self {
            skeleton,
            nodes,
            current,
            playing: current.is_some(),
            clips,
            speed: 1.0,
            loop_range: None,
        }
    }

    pub fn clips(&self) -> &[AnimationClip] {
        &self.clips
    }

    pub fn animation_names(&self) -> Vec<&str> {
        self.clips.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn current_animation(&self) -> Option<&AnimationClip> {
        self.current.and_then(|i| self.clips.get(i))
    }

    /// Switch to clip `index` and start playing. Clears any loop range.
    /// Out-of-range indices are ignored with a warning.
    pub fn play(&mut self, index: usize) {
        if index >= self.clips.len() {
            log::warn!("No animation {index} (model has {})", self.clips.len());
            return;
        }
        if self.current != Some(index) {
            self.loop_range = None;
        }
        self.current = Some(index);
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing && self.current.is_some()
    }

    pub fn set_playback_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    pub fn playback_speed(&self) -> f32 {
        self.speed
    }

    /// Loop only between `start` and `end` seconds of the current clip.
    ///
    /// The range must satisfy `0 ≤ start < end ≤ duration`. An invalid range
    /// is reported, the sub-range is disabled and full-clip looping resumes.
    pub fn set_animation_loop_range(&mut self, start_secs: f32, end_secs: f32) -> Result<()> {
        let Some(clip) = self.current_animation() else {
            self.loop_range = None;
            log::warn!("Loop range set with no animation playing; ignored");
            return Err(Error::InvalidLoopRange {
                start: start_secs,
                end: end_secs,
                duration: 0.0,
            });
        };
        let start = start_secs * clip.ticks_per_second;
        let end = end_secs * clip.ticks_per_second;
        if !(start >= 0.0 && start < end && end <= clip.duration) {
            let err = Error::InvalidLoopRange {
                start,
                end,
                duration: clip.duration,
            };
            log::warn!("{err}; looping the whole clip");
            self.loop_range = None;
            return Err(err);
        }
        log::debug!("Looping '{}' between ticks {start} and {end}", clip.name);
        self.loop_range = Some((start, end));
        Ok(())
    }

    pub fn disable_animation_loop_range(&mut self) {
        self.loop_range = None;
    }

    /// Active loop range in ticks.
    pub fn loop_range(&self) -> Option<(f32, f32)> {
        self.loop_range
    }

    /// Pose the skeleton for `seconds` of playback.
    pub fn update_animation(&mut self, seconds: f32) {
        if !self.playing {
            self.skeleton.reset();
            return;
        }
        let Some(ticks) = self
            .current_animation()
            .map(|clip| clip.ticks_at(seconds * self.speed, self.loop_range))
        else {
            self.skeleton.reset();
            return;
        };
        self.pose_at_ticks(ticks);
    }

    /// Pose the skeleton at an exact clip time, ignoring play state.
    pub fn pose_at_ticks(&mut self, ticks: f32) {
        let clip = self.current.and_then(|i| self.clips.get(i));
        let mut stack = vec![(NodeTree::ROOT, Mat4::IDENTITY)];
        while let Some((index, parent)) = stack.pop() {
            let node = self.nodes.node(index);
            let local = clip
                .and_then(|c| c.channel(&node.name))
                .map_or(node.local, |channel| channel.local_transform(ticks, &node.local));
            let global = parent * local;
            if let Some(bone) = node.bone {
                let offset = self.skeleton.bone(bone).map_or(Mat4::IDENTITY, |b| b.offset);
                self.skeleton.set_final(bone, global * offset);
            }
            stack.extend(node.children.iter().map(|&child| (child, global)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::animation::{Channel, Keyframe};
    use glam::{Quat, Vec3};

    /// root ─ hips (bone 1, animated) ─ hand (bone 2, static)
    fn rig() -> Rig {
        let mut skeleton = Skeleton::new();
        let hips_bone = skeleton.add_bone("hips", Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)));
        let hand_bone = skeleton.add_bone("hand", Mat4::from_translation(Vec3::new(0.0, -2.0, 0.0)));

        let mut nodes = NodeTree::new();
        let hips = nodes.add(NodeTree::ROOT, "hips", Mat4::from_translation(Vec3::Y));
        let hand = nodes.add(hips, "hand", Mat4::from_translation(Vec3::Y));
        nodes.node_mut(hips).bone = Some(hips_bone);
        nodes.node_mut(hand).bone = Some(hand_bone);

        let channel = Channel {
            target: "hips".into(),
            positions: vec![
                Keyframe::new(0.0, Vec3::ZERO),
                Keyframe::new(100.0, Vec3::new(100.0, 0.0, 0.0)),
            ],
            rotations: vec![Keyframe::new(0.0, Quat::IDENTITY)],
            scales: vec![Keyframe::new(0.0, Vec3::ONE)],
        };
        let clip = AnimationClip::new("slide", 100.0, 25.0, vec![channel]);
        Rig::new(skeleton, nodes, vec![clip])
    }

    fn pose(rig: &Rig) -> Vec<Mat4> {
        rig.skeleton.palette().copied().collect()
    }

    fn pose_at(ticks: f32) -> Vec<Mat4> {
        let mut r = rig();
        r.pose_at_ticks(ticks);
        pose(&r)
    }

    #[test]
    fn sub_range_loop_matches_expected_ticks() {
        let mut r = rig();
        r.set_animation_loop_range(1.0, 2.0).unwrap();
        r.update_animation(0.5);
        assert_eq!(pose(&r), pose_at(25.0));
        r.update_animation(1.5);
        assert_eq!(pose(&r), pose_at(37.5));
        r.update_animation(2.5);
        assert_eq!(pose(&r), pose_at(37.5));
    }

    #[test]
    fn animated_bone_at_first_key_is_global_times_offset() {
        let r = {
            let mut r = rig();
            r.pose_at_ticks(0.0);
            r
        };
        let hips = r.skeleton.bone(1).unwrap();
        // Channel at tick 0 translates to the origin.
        assert_eq!(hips.final_transform, Mat4::IDENTITY * hips.offset);

        let hand = r.skeleton.bone(2).unwrap();
        let expected = Mat4::from_translation(Vec3::Y) * hand.offset;
        assert_eq!(hand.final_transform, expected);
    }

    #[test]
    fn stopped_rig_is_identity() {
        let mut r = rig();
        r.update_animation(1.0);
        assert!(pose(&r).iter().any(|m| *m != Mat4::IDENTITY));
        r.stop();
        r.update_animation(1.0);
        assert!(pose(&r).iter().all(|m| *m == Mat4::IDENTITY));
        assert!(!r.is_playing());

        let mut empty = Rig::new(Skeleton::new(), NodeTree::new(), Vec::new());
        empty.update_animation(3.0);
        assert_eq!(pose(&empty), vec![Mat4::IDENTITY]);
    }

    #[test]
    fn disabling_range_restores_pose() {
        let mut r = rig();
        r.update_animation(0.7);
        let before = pose(&r);

        r.set_animation_loop_range(2.0, 3.0).unwrap();
        r.update_animation(0.7);
        assert_ne!(pose(&r), before);

        r.disable_animation_loop_range();
        r.update_animation(0.7);
        assert_eq!(pose(&r), before);
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        let mut r = rig();
        for (start, end) in [(2.0, 2.0), (3.0, 1.0), (1.0, 5.0), (-1.0, 1.0)] {
            r.set_animation_loop_range(0.5, 1.0).unwrap();
            assert!(r.set_animation_loop_range(start, end).is_err(), "{start}..{end}");
            assert_eq!(r.loop_range(), None);
        }
    }

    #[test]
    fn playback_controls() {
        let mut r = rig();
        assert_eq!(r.animation_names(), vec!["slide"]);
        assert!(r.is_playing());
        r.set_playback_speed(2.0);
        r.update_animation(0.5);
        assert_eq!(pose(&r), pose_at(25.0));
        r.play(7);
        assert_eq!(r.current_animation().map(|c| c.name.as_str()), Some("slide"));
    }
}
