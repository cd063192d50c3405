use std::fmt;

pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    WindowClose,
    WindowResize,
    KeyPressed,
    KeyReleased,
    MouseButtonPressed,
    MouseButtonReleased,
    MouseMoved,
    MouseScrolled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowClosed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowResized {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPressed {
    pub key: KeyCode,
    pub repeat: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyReleased {
    pub key: KeyCode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseButtonPressed {
    pub button: MouseButton,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseButtonReleased {
    pub button: MouseButton,
}

/// Cursor position in window pixels, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseMoved {
    pub x: f32,
    pub y: f32,
}

/// Scroll amount in lines; positive `y_offset` scrolls up/away from the user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseScrolled {
    pub x_offset: f32,
    pub y_offset: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventKind {
    WindowClose(WindowClosed),
    WindowResize(WindowResized),
    KeyPressed(KeyPressed),
    KeyReleased(KeyReleased),
    MouseButtonPressed(MouseButtonPressed),
    MouseButtonReleased(MouseButtonReleased),
    MouseMoved(MouseMoved),
    MouseScrolled(MouseScrolled),
}

impl EventKind {
    pub fn event_type(&self) -> EventType {
        match self {
            EventKind::WindowClose(_) => EventType::WindowClose,
            EventKind::WindowResize(_) => EventType::WindowResize,
            EventKind::KeyPressed(_) => EventType::KeyPressed,
            EventKind::KeyReleased(_) => EventType::KeyReleased,
            EventKind::MouseButtonPressed(_) => EventType::MouseButtonPressed,
            EventKind::MouseButtonReleased(_) => EventType::MouseButtonReleased,
            EventKind::MouseMoved(_) => EventType::MouseMoved,
            EventKind::MouseScrolled(_) => EventType::MouseScrolled,
        }
    }
}

/// A payload type that can be selected out of an [`EventKind`] by [`EventDispatcher`].
pub trait EventPayload: Sized {
    const TYPE: EventType;

    fn from_kind_mut(kind: &mut EventKind) -> Option<&mut Self>;

    fn into_kind(self) -> EventKind;
}

macro_rules! event_payload {
    ($payload:ident, $variant:ident) => {
        impl EventPayload for $payload {
            const TYPE: EventType = EventType::$variant;

            fn from_kind_mut(kind: &mut EventKind) -> Option<&mut Self> {
                match kind {
                    EventKind::$variant(payload) => Some(payload),
                    _ => None,
                }
            }

            fn into_kind(self) -> EventKind {
                EventKind::$variant(self)
            }
        }

        impl From<$payload> for Event {
            fn from(payload: $payload) -> Self {
                Event::new(payload.into_kind())
            }
        }
    };
}

event_payload!(WindowClosed, WindowClose);
event_payload!(WindowResized, WindowResize);
event_payload!(KeyPressed, KeyPressed);
event_payload!(KeyReleased, KeyReleased);
event_payload!(MouseButtonPressed, MouseButtonPressed);
event_payload!(MouseButtonReleased, MouseButtonReleased);
event_payload!(MouseMoved, MouseMoved);
event_payload!(MouseScrolled, MouseScrolled);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    kind: EventKind,
    handled: bool,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            handled: false,
        }
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    pub fn event_type(&self) -> EventType {
        self.kind.event_type()
    }

    pub fn is_handled(&self) -> bool {
        self.handled
    }

}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            EventKind::WindowClose(_) => write!(f, "WindowClose"),
            EventKind::WindowResize(e) => write!(f, "WindowResize: {}, {}", e.width, e.height),
            EventKind::KeyPressed(e) => write!(f, "KeyPressed: {:?} (repeat={})", e.key, e.repeat),
            EventKind::KeyReleased(e) => write!(f, "KeyReleased: {:?}", e.key),
            EventKind::MouseButtonPressed(e) => write!(f, "MouseButtonPressed: {:?}", e.button),
            EventKind::MouseButtonReleased(e) => write!(f, "MouseButtonReleased: {:?}", e.button),
            EventKind::MouseMoved(e) => write!(f, "MouseMoved: {}, {}", e.x, e.y),
            EventKind::MouseScrolled(e) => {
                write!(f, "MouseScrolled: {}, {}", e.x_offset, e.y_offset)
            }
        }
    }
}

/// Routes one event to typed handlers. Each handler runs only when the event has its payload
/// type and nobody has handled it yet; its return value becomes the handled flag.
pub struct EventDispatcher<'a> {
    event: &'a mut Event,
}

impl<'a> EventDispatcher<'a> {
    pub fn new(event: &'a mut Event) -> Self {
        Self { event }
    }

    pub fn dispatch<T: EventPayload>(&mut self, handler: impl FnOnce(&mut T) -> bool) -> bool {
        if self.event.handled {
            return false;
        }
        let Some(payload) = T::from_kind_mut(&mut self.event.kind) else {
            return false;
        };
        let handled = handler(payload);
        self.event.handled = handled;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_runs_only_matching_type() {
        let mut event = Event::from(MouseMoved { x: 3.0, y: 4.0 });
        let mut dispatcher = EventDispatcher::new(&mut event);

        let mut key_calls = 0;
        let ran_key = dispatcher.dispatch::<KeyPressed>(|_| {
            key_calls += 1;
            true
        });
        let mut seen = None;
        let ran_move = dispatcher.dispatch::<MouseMoved>(|moved| {
            seen = Some((moved.x, moved.y));
            false
        });

        assert!(!ran_key);
        assert_eq!(key_calls, 0);
        assert!(ran_move);
        assert_eq!(seen, Some((3.0, 4.0)));
        assert!(!event.is_handled());
    }

    #[test]
    fn handled_event_short_circuits_later_dispatches() {
        let mut event = Event::from(MouseButtonPressed {
            button: MouseButton::Left,
        });
        let mut dispatcher = EventDispatcher::new(&mut event);

        assert!(dispatcher.dispatch::<MouseButtonPressed>(|_| true));
        let mut second_ran = false;
        assert!(!dispatcher.dispatch::<MouseButtonPressed>(|_| {
            second_ran = true;
            false
        }));

        assert!(!second_ran);
        assert!(event.is_handled());
    }

    #[test]
    fn handler_may_mutate_payload() {
        let mut event = Event::from(WindowResized {
            width: 10,
            height: 20,
        });
        EventDispatcher::new(&mut event).dispatch::<WindowResized>(|resized| {
            resized.width = 99;
            false
        });

        assert!(matches!(
            event.kind(),
            EventKind::WindowResize(WindowResized { width: 99, .. })
        ));
        assert_eq!(event.event_type(), EventType::WindowResize);
    }

    #[test]
    fn display_names_the_event() {
        let event = Event::from(KeyPressed {
            key: KeyCode::KeyA,
            repeat: true,
        });
        assert_eq!(event.to_string(), "KeyPressed: KeyA (repeat=true)");
    }
}
