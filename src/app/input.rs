//! Platform-agnostic input state
//!
//! Platform adapters (see [`winit::input_adapter`](super::winit::input_adapter))
//! translate window events into [`Input`]. Once per frame the app condenses
//! it into a [`FrameInput`], the only input the demos and the camera see.

use std::collections::HashSet;

use glam::Vec2;

use crate::scene::{CameraInputs, MoveMask};

/// Keys the demos react to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    Z,
    S,
    A,
    Q,
    D,
    Space,
    ShiftLeft,
    ShiftRight,
    ControlLeft,
    ControlRight,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ButtonState {
    Pressed,
    Released,
}

/// Everything a frame reads from the platform, sampled once.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameInput {
    /// Seconds since the previous frame.
    pub delta_time: f32,
    /// Seconds since startup.
    pub time: f32,
    pub mask: MoveMask,
    /// Mouse motion this frame, in pixels.
    pub mouse_delta: Vec2,
    /// Cursor position in physical pixels, top-left origin.
    pub cursor: Vec2,
    /// Right button held: mouse motion turns the camera.
    pub looking: bool,
    /// Left button went down this frame.
    pub just_clicked: bool,
}

impl FrameInput {
    /// Camera input for this frame. Mouse motion only counts while looking.
    #[must_use]
    pub fn camera_inputs(&self) -> CameraInputs {
        let (mouse_dx, mouse_dy) = if self.looking {
            (self.mouse_delta.x, self.mouse_delta.y)
        } else {
            (0.0, 0.0)
        };
        CameraInputs {
            delta_time: self.delta_time,
            mask: self.mask,
            mouse_dx,
            mouse_dy,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Input {
    pressed_keys: HashSet<Key>,

    pressed_mouse: HashSet<MouseButton>,
    just_pressed_mouse: HashSet<MouseButton>,

    mouse_position: Vec2,
    mouse_delta: Vec2,
    has_position: bool,
}

impl Input {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Adapter API ==========

    /// Clears per-frame state (just-pressed buttons, mouse delta).
    pub fn start_frame(&mut self) {
        self.just_pressed_mouse.clear();
        self.mouse_delta = Vec2::ZERO;
    }

    pub fn inject_key(&mut self, key: Key, state: ButtonState) {
        match state {
            ButtonState::Pressed => {
                self.pressed_keys.insert(key);
            }
            ButtonState::Released => {
                self.pressed_keys.remove(&key);
            }
        }
    }

    pub fn inject_mouse_button(&mut self, button: MouseButton, state: ButtonState) {
        match state {
            ButtonState::Pressed => {
                if self.pressed_mouse.insert(button) {
                    self.just_pressed_mouse.insert(button);
                }
            }
            ButtonState::Released => {
                self.pressed_mouse.remove(&button);
            }
        }
    }

    pub fn inject_mouse_position(&mut self, x: f32, y: f32) {
        let position = Vec2::new(x, y);
        if self.has_position {
            self.mouse_delta += position - self.mouse_position;
        }
        self.mouse_position = position;
        self.has_position = true;
    }

    /// Forgets held keys and buttons, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.pressed_keys.clear();
        self.pressed_mouse.clear();
    }

    // ========== Queries ==========

    #[must_use]
    pub fn get_key(&self, key: Key) -> bool {
        self.pressed_keys.contains(&key)
    }

    #[must_use]
    pub fn get_mouse_button(&self, button: MouseButton) -> bool {
        self.pressed_mouse.contains(&button)
    }

    #[must_use]
    pub fn get_mouse_button_down(&self, button: MouseButton) -> bool {
        self.just_pressed_mouse.contains(&button)
    }

    #[must_use]
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    #[must_use]
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Movement keys as a camera mask. Z and Q mirror W and A for AZERTY
    /// layouts.
    #[must_use]
    pub fn move_mask(&self) -> MoveMask {
        let mut mask = MoveMask::empty();
        let any = |keys: &[Key]| keys.iter().any(|k| self.get_key(*k));
        mask.set(MoveMask::FORWARD, any(&[Key::W, Key::Z]));
        mask.set(MoveMask::BACKWARD, any(&[Key::S]));
        mask.set(MoveMask::STRAFE_LEFT, any(&[Key::A, Key::Q]));
        mask.set(MoveMask::STRAFE_RIGHT, any(&[Key::D]));
        mask.set(MoveMask::FAST, any(&[Key::ShiftLeft, Key::ShiftRight]));
        mask.set(MoveMask::UP, any(&[Key::Space]));
        mask.set(MoveMask::DOWN, any(&[Key::ControlLeft, Key::ControlRight]));
        mask
    }

    /// Samples this frame's input.
    #[must_use]
    pub fn frame_input(&self, delta_time: f32, time: f32) -> FrameInput {
        FrameInput {
            delta_time,
            time,
            mask: self.move_mask(),
            mouse_delta: self.mouse_delta,
            cursor: self.mouse_position,
            looking: self.get_mouse_button(MouseButton::Right),
            just_clicked: self.get_mouse_button_down(MouseButton::Left),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn azerty_keys_share_directions() {
        let mut input = Input::new();
        input.inject_key(Key::Z, ButtonState::Pressed);
        input.inject_key(Key::Q, ButtonState::Pressed);
        assert_eq!(input.move_mask(), MoveMask::FORWARD | MoveMask::STRAFE_LEFT);

        input.inject_key(Key::Z, ButtonState::Released);
        input.inject_key(Key::ControlRight, ButtonState::Pressed);
        assert_eq!(input.move_mask(), MoveMask::STRAFE_LEFT | MoveMask::DOWN);
    }

    #[test]
    fn click_is_reported_for_one_frame() {
        let mut input = Input::new();
        input.inject_mouse_button(MouseButton::Left, ButtonState::Pressed);
        assert!(input.frame_input(0.016, 0.0).just_clicked);

        input.start_frame();
        assert!(!input.frame_input(0.016, 0.0).just_clicked);
        assert!(input.get_mouse_button(MouseButton::Left));
    }

    #[test]
    fn mouse_moves_camera_only_while_looking() {
        let mut input = Input::new();
        input.inject_mouse_position(10.0, 10.0);
        input.inject_mouse_position(14.0, 7.0);
        assert_eq!(input.mouse_delta(), Vec2::new(4.0, -3.0));

        let idle = input.frame_input(0.016, 0.0).camera_inputs();
        assert_eq!((idle.mouse_dx, idle.mouse_dy), (0.0, 0.0));

        input.inject_mouse_button(MouseButton::Right, ButtonState::Pressed);
        let looking = input.frame_input(0.016, 0.0).camera_inputs();
        assert_eq!((looking.mouse_dx, looking.mouse_dy), (4.0, -3.0));
    }
}
