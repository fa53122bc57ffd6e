//! Winit input adapter
//!
//! Translates winit window events into the platform-agnostic [`Input`].

use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::app::input::{ButtonState, Input, Key, MouseButton};

/// Physical key to demo key. Physical codes keep W/A/S/D and Z/Q/S/D on
/// the same keys whatever the keyboard layout.
#[must_use]
pub fn translate_key(physical_key: PhysicalKey) -> Option<Key> {
    let PhysicalKey::Code(code) = physical_key else {
        return None;
    };

    let key = match code {
        KeyCode::KeyW => Key::W,
        KeyCode::KeyZ => Key::Z,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyQ => Key::Q,
        KeyCode::KeyD => Key::D,
        KeyCode::Space => Key::Space,
        KeyCode::ShiftLeft => Key::ShiftLeft,
        KeyCode::ShiftRight => Key::ShiftRight,
        KeyCode::ControlLeft => Key::ControlLeft,
        KeyCode::ControlRight => Key::ControlRight,
        _ => return None,
    };

    Some(key)
}

#[must_use]
pub fn translate_mouse_button(button: winit::event::MouseButton) -> MouseButton {
    match button {
        winit::event::MouseButton::Left => MouseButton::Left,
        winit::event::MouseButton::Right => MouseButton::Right,
        winit::event::MouseButton::Middle => MouseButton::Middle,
        winit::event::MouseButton::Back => MouseButton::Other(3),
        winit::event::MouseButton::Forward => MouseButton::Other(4),
        winit::event::MouseButton::Other(id) => MouseButton::Other(id),
    }
}

#[must_use]
pub fn translate_element_state(state: ElementState) -> ButtonState {
    match state {
        ElementState::Pressed => ButtonState::Pressed,
        ElementState::Released => ButtonState::Released,
    }
}

/// Feeds one window event into `input`.
pub fn process_window_event(input: &mut Input, event: &WindowEvent) {
    match event {
        WindowEvent::KeyboardInput { event, .. } => {
            if let Some(key) = translate_key(event.physical_key) {
                input.inject_key(key, translate_element_state(event.state));
            }
        }

        WindowEvent::CursorMoved { position, .. } => {
            input.inject_mouse_position(position.x as f32, position.y as f32);
        }

        WindowEvent::MouseInput { state, button, .. } => {
            input.inject_mouse_button(
                translate_mouse_button(*button),
                translate_element_state(*state),
            );
        }

        // Releases never arrive while unfocused; drop everything held.
        WindowEvent::Focused(false) => input.release_all(),

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn azerty_and_qwerty_keys_both_map() {
        assert_eq!(translate_key(PhysicalKey::Code(KeyCode::KeyZ)), Some(Key::Z));
        assert_eq!(translate_key(PhysicalKey::Code(KeyCode::KeyW)), Some(Key::W));
        assert_eq!(translate_key(PhysicalKey::Code(KeyCode::KeyQ)), Some(Key::Q));
        assert_eq!(translate_key(PhysicalKey::Code(KeyCode::KeyE)), None);
    }

    #[test]
    fn extra_mouse_buttons_become_other() {
        assert_eq!(
            translate_mouse_button(winit::event::MouseButton::Back),
            MouseButton::Other(3)
        );
        assert_eq!(
            translate_mouse_button(winit::event::MouseButton::Right),
            MouseButton::Right
        );
    }
}
