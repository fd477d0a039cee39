use peniko::kurbo::{Point, Vec2};
use ui_events::keyboard::{Code, Key, Modifiers, NamedKey};

use crate::pointer::{MouseButton, PointerId, PointerType};

/// Payload of pointer events (including click, enter/leave and capture events).
#[derive(Debug, Clone, PartialEq)]
pub struct PointerData {
    pub pointer_id: PointerId,
    pub pointer_type: PointerType,
    /// The first contact of its device type. Only primary pointers produce
    /// compatibility mouse events.
    pub is_primary: bool,
    pub position: Point,
    pub delta: Vec2,
    /// The button that changed state, for down and up events.
    pub button: Option<MouseButton>,
    /// Mask of buttons held after this event, see [`MouseButton::mask`].
    pub pressed_buttons: u32,
    pub pressure: f32,
    pub click_count: u32,
}

impl Default for PointerData {
    fn default() -> Self {
        Self::new(PointerId::MOUSE, Point::ZERO)
    }
}

impl PointerData {
    pub fn new(pointer_id: PointerId, position: Point) -> Self {
        let raw = pointer_id.raw() as u8;
        Self {
            pointer_id,
            pointer_type: pointer_id.pointer_type(),
            is_primary: raw == 0 || raw == PointerId::TOUCH_FIRST || raw == PointerId::PEN_FIRST,
            position,
            delta: Vec2::ZERO,
            button: None,
            pressed_buttons: 0,
            pressure: 0.0,
            click_count: 0,
        }
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = Some(button);
        self
    }

    pub fn with_pressed_buttons(mut self, pressed_buttons: u32) -> Self {
        self.pressed_buttons = pressed_buttons;
        self
    }
}

/// Payload of mouse events.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MouseData {
    pub position: Point,
    /// Movement since the previous event, or the scroll amount for wheel events.
    pub delta: Vec2,
    pub button: Option<MouseButton>,
    pub pressed_buttons: u32,
    pub click_count: u32,
}

impl MouseData {
    pub fn new(position: Point) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }
}

impl From<&PointerData> for MouseData {
    fn from(pointer: &PointerData) -> Self {
        Self {
            position: pointer.position,
            delta: pointer.delta,
            button: pointer.button,
            pressed_buttons: pointer.pressed_buttons,
            click_count: pointer.click_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyData {
    pub key: Key,
    pub code: Code,
    pub repeat: bool,
}

impl Default for KeyData {
    fn default() -> Self {
        Self {
            key: Key::Named(NamedKey::Unidentified),
            code: Code::Unidentified,
            repeat: false,
        }
    }
}

impl KeyData {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandData {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum NavigationDirection {
    #[default]
    None,
    Left,
    Up,
    Right,
    Down,
    Next,
    Previous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NavigationData {
    pub direction: NavigationDirection,
}

/// Typed payload of an [`Event`](super::Event).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EventData {
    #[default]
    None,
    Pointer(PointerData),
    Mouse(MouseData),
    Key(KeyData),
    Command(CommandData),
    Navigation(NavigationData),
}

/// Kind of a host input snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawInputKind {
    MouseDown,
    MouseUp,
    MouseMove,
    MouseDrag,
    ScrollWheel,
    KeyDown,
    KeyUp,
    MouseEnterWindow,
    MouseLeaveWindow,
    ValidateCommand,
    ExecuteCommand,
    Repaint,
    Layout,
    Ignore,
    Used,
}

/// Snapshot of an input event as delivered by the host input pump.
///
/// Events built with [`Event::from_raw_input`](super::Event::from_raw_input) keep
/// a copy, so native surfaces can replay the original input.
#[derive(Debug, Clone, PartialEq)]
pub struct RawInput {
    pub kind: RawInputKind,
    pub position: Point,
    pub delta: Vec2,
    pub button: Option<MouseButton>,
    pub click_count: u32,
    pub modifiers: Modifiers,
    pub key: Option<Key>,
    pub code: Code,
    pub command: Option<String>,
}

impl RawInput {
    pub fn new(kind: RawInputKind) -> Self {
        Self {
            kind,
            position: Point::ZERO,
            delta: Vec2::ZERO,
            button: None,
            click_count: 0,
            modifiers: Modifiers::default(),
            key: None,
            code: Code::Unidentified,
            command: None,
        }
    }

    pub fn with_position(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = Some(button);
        self
    }

    pub fn with_delta(mut self, delta: Vec2) -> Self {
        self.delta = delta;
        self
    }

    pub fn with_key(mut self, key: Key) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}
