//! Keyboard and mouse input state.
//!
//! The [`Input`] type tracks which keys/buttons are currently pressed, just
//! pressed this frame, or just released this frame. The window shell owns one
//! per device and passes them to the sample through the frame context.

use std::collections::HashSet;
use std::hash::Hash;

use glam::Vec2;

pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;

/// Tracks the state of a set of inputs (keys or mouse buttons).
pub struct Input<T: Eq + Hash + Copy> {
    pressed: HashSet<T>,
    just_pressed: HashSet<T>,
    just_released: HashSet<T>,
}

impl<T: Eq + Hash + Copy> Input<T> {
    pub fn new() -> Self {
        Self {
            pressed: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
        }
    }

    /// Returns `true` if the input is currently held down.
    pub fn pressed(&self, input: T) -> bool {
        self.pressed.contains(&input)
    }

    /// Returns `true` if the input was pressed this frame.
    pub fn just_pressed(&self, input: T) -> bool {
        self.just_pressed.contains(&input)
    }

    /// Returns `true` if the input was released this frame.
    pub fn just_released(&self, input: T) -> bool {
        self.just_released.contains(&input)
    }

    pub(crate) fn press(&mut self, input: T) {
        if self.pressed.insert(input) {
            self.just_pressed.insert(input);
        }
    }

    pub(crate) fn release(&mut self, input: T) {
        if self.pressed.remove(&input) {
            self.just_released.insert(input);
        }
    }

    /// Clear per-frame state. Called after the sample has seen the frame.
    pub(crate) fn clear_just(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

impl<T: Eq + Hash + Copy> Default for Input<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Pointer state for one frame: cursor position in window pixels and the raw
/// motion accumulated since the previous frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pointer {
    pub position: Vec2,
    pub motion: Vec2,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release_cycle() {
        let mut input = Input::new();
        input.press(KeyCode::KeyA);
        assert!(input.pressed(KeyCode::KeyA));
        assert!(input.just_pressed(KeyCode::KeyA));

        input.clear_just();
        assert!(input.pressed(KeyCode::KeyA));
        assert!(!input.just_pressed(KeyCode::KeyA));

        input.release(KeyCode::KeyA);
        assert!(!input.pressed(KeyCode::KeyA));
        assert!(input.just_released(KeyCode::KeyA));
    }

    #[test]
    fn repeated_press_is_not_just_pressed_again() {
        let mut input = Input::new();
        input.press(MouseButton::Left);
        input.clear_just();
        input.press(MouseButton::Left);
        assert!(!input.just_pressed(MouseButton::Left));
    }
}
