use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::PhysicalKey;

use super::event::{
    Event, KeyPressed, KeyReleased, MouseButtonPressed, MouseButtonReleased, MouseMoved,
    MouseScrolled, WindowClosed, WindowResized,
};

/// Translates one winit window event into the engine's [`Event`]. Events the layers never see
/// (focus, IME, redraw, ...) map to `None`.
pub fn translate_window_event(event: &WindowEvent) -> Option<Event> {
    match event {
        WindowEvent::CloseRequested => Some(Event::from(WindowClosed)),
        WindowEvent::Resized(size) => Some(Event::from(WindowResized {
            width: size.width,
            height: size.height,
        })),
        WindowEvent::KeyboardInput { event, .. } => translate_key_event(event),
        WindowEvent::MouseInput { state, button, .. } => {
            Some(translate_mouse_button(*button, *state))
        }
        WindowEvent::CursorMoved { position, .. } => Some(Event::from(MouseMoved {
            x: position.x as f32,
            y: position.y as f32,
        })),
        WindowEvent::MouseWheel { delta, .. } => {
            let (x_offset, y_offset) = scroll_offsets(*delta);
            Some(Event::from(MouseScrolled { x_offset, y_offset }))
        }
        _ => None,
    }
}

fn translate_key_event(key_event: &KeyEvent) -> Option<Event> {
    translate_key(key_event.physical_key, key_event.state, key_event.repeat)
}

fn translate_key(key: PhysicalKey, state: ElementState, repeat: bool) -> Option<Event> {
    let PhysicalKey::Code(key) = key else {
        return None;
    };
    Some(match state {
        ElementState::Pressed => Event::from(KeyPressed { key, repeat }),
        ElementState::Released => Event::from(KeyReleased { key }),
    })
}

fn translate_mouse_button(button: MouseButton, state: ElementState) -> Event {
    match state {
        ElementState::Pressed => Event::from(MouseButtonPressed { button }),
        ElementState::Released => Event::from(MouseButtonReleased { button }),
    }
}

/// Line deltas pass through; pixel deltas (touchpads) collapse to one line in their direction.
fn scroll_offsets(delta: MouseScrollDelta) -> (f32, f32) {
    match delta {
        MouseScrollDelta::LineDelta(x, y) => (x, y),
        MouseScrollDelta::PixelDelta(position) => {
            (unit_step(position.x as f32), unit_step(position.y as f32))
        }
    }
}

fn unit_step(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use winit::dpi::{PhysicalPosition, PhysicalSize};
    use winit::keyboard::{KeyCode, NativeKeyCode};

    use super::*;
    use crate::app::event::{EventKind, EventType};

    #[test]
    fn close_and_resize_translate_directly() {
        let close = translate_window_event(&WindowEvent::CloseRequested).expect("close");
        assert_eq!(close.event_type(), EventType::WindowClose);

        let resize = translate_window_event(&WindowEvent::Resized(PhysicalSize::new(800, 600)))
            .expect("resize");
        assert_eq!(
            resize.kind(),
            &EventKind::WindowResize(WindowResized {
                width: 800,
                height: 600
            })
        );
        assert!(!resize.is_handled());
    }

    #[test]
    fn uninteresting_window_events_are_dropped() {
        assert!(translate_window_event(&WindowEvent::RedrawRequested).is_none());
        assert!(translate_window_event(&WindowEvent::Focused(true)).is_none());
    }

    #[test]
    fn key_state_selects_pressed_or_released() {
        let pressed = translate_key(
            PhysicalKey::Code(KeyCode::F5),
            ElementState::Pressed,
            true,
        )
        .expect("pressed");
        assert_eq!(
            pressed.kind(),
            &EventKind::KeyPressed(KeyPressed {
                key: KeyCode::F5,
                repeat: true
            })
        );

        let released = translate_key(
            PhysicalKey::Code(KeyCode::Escape),
            ElementState::Released,
            false,
        )
        .expect("released");
        assert_eq!(
            released.kind(),
            &EventKind::KeyReleased(KeyReleased {
                key: KeyCode::Escape
            })
        );
    }

    #[test]
    fn unidentified_keys_are_dropped() {
        let key = PhysicalKey::Unidentified(NativeKeyCode::Unidentified);
        assert!(translate_key(key, ElementState::Pressed, false).is_none());
    }

    #[test]
    fn mouse_buttons_keep_their_identity() {
        let pressed = translate_mouse_button(MouseButton::Right, ElementState::Pressed);
        assert_eq!(
            pressed.kind(),
            &EventKind::MouseButtonPressed(MouseButtonPressed {
                button: MouseButton::Right
            })
        );
        let released = translate_mouse_button(MouseButton::Left, ElementState::Released);
        assert_eq!(released.event_type(), EventType::MouseButtonReleased);
    }

    #[test]
    fn line_scroll_passes_through() {
        assert_eq!(
            scroll_offsets(MouseScrollDelta::LineDelta(0.0, -2.0)),
            (0.0, -2.0)
        );
    }

    #[test]
    fn pixel_scroll_maps_to_single_line_direction() {
        let positive = scroll_offsets(MouseScrollDelta::PixelDelta(PhysicalPosition::new(
            0.0, 3.0,
        )));
        let negative = scroll_offsets(MouseScrollDelta::PixelDelta(PhysicalPosition::new(
            -4.0, -5.0,
        )));
        let none = scroll_offsets(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 0.0)));

        assert_eq!(positive, (0.0, 1.0));
        assert_eq!(negative, (-1.0, -1.0));
        assert_eq!(none, (0.0, 0.0));
    }
}
