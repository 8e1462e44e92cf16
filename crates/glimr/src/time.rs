//! Frame timing and delta time.
//!
//! [`Time`] is updated by the app shell at the start of each frame and handed
//! to the sample through the frame context. Animation clocks read
//! [`Time::elapsed_secs`]; game logic reads [`Time::clamped_delta_secs`] so a
//! long hitch (window drag, breakpoint) never turns into one huge physics step.

use std::time::{Duration, Instant};

/// Upper bound for the game-logic step, in seconds.
pub const MAX_GAME_STEP: f32 = 0.033;

/// Frame timing state.
#[derive(Clone, Copy)]
pub struct Time {
    startup: Instant,
    frame_start: Instant,
    delta: Duration,
    elapsed: Duration,
    frame_count: u64,
}

impl Time {
    pub(crate) fn new() -> Self {
        let now = Instant::now();
        Self {
            startup: now,
            frame_start: now,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Call at the start of each frame to update timing.
    pub(crate) fn update(&mut self) {
        let now = Instant::now();
        self.delta = now - self.frame_start;
        self.frame_start = now;
        self.elapsed = now - self.startup;
        self.frame_count += 1;
    }

    /// Duration of the previous frame.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Delta time in seconds (f32).
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Delta time clamped to [`MAX_GAME_STEP`].
    pub fn clamped_delta_secs(&self) -> f32 {
        clamp_step(self.delta_secs())
    }

    /// Total elapsed time since app start.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Total elapsed time in seconds (f32). Monotonic.
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Number of frames rendered so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Estimated FPS based on the last frame's delta.
    pub fn fps(&self) -> f32 {
        if self.delta.as_secs_f32() > 0.0 {
            1.0 / self.delta.as_secs_f32()
        } else {
            0.0
        }
    }
}

/// Clamp a raw frame delta to the game-logic step limit.
pub fn clamp_step(dt: f32) -> f32 {
    dt.clamp(0.0, MAX_GAME_STEP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_frames_are_clamped() {
        assert_eq!(clamp_step(0.5), MAX_GAME_STEP);
        assert_eq!(clamp_step(0.016), 0.016);
        assert_eq!(clamp_step(-1.0), 0.0);
    }

    #[test]
    fn update_advances_frame_count() {
        let mut time = Time::new();
        time.update();
        time.update();
        assert_eq!(time.frame_count(), 2);
        assert!(time.clamped_delta_secs() <= MAX_GAME_STEP);
    }
}
