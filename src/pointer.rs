//! Pointer identities and the per-pointer device state.
//!
//! Pointer ids are laid out in fixed ranges so that per-pointer state can live in
//! flat arrays: the mouse is id `0`, touches use ids `1..=20` and pens `21..=22`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use peniko::kurbo::Point;

use crate::error::EventError;
use crate::panel::PanelId;

/// Identifies one pointing device contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerId(u8);

impl PointerId {
    /// The mouse pointer.
    pub const MOUSE: PointerId = PointerId(0);
    /// Number of pointer slots tracked per panel and per device state.
    pub const MAX_POINTERS: usize = 32;
    /// First touch pointer id.
    pub const TOUCH_FIRST: u8 = 1;
    /// Number of simultaneous touches tracked.
    pub const TOUCH_COUNT: u8 = 20;
    /// First pen pointer id.
    pub const PEN_FIRST: u8 = Self::TOUCH_FIRST + Self::TOUCH_COUNT;
    /// Number of simultaneous pens tracked.
    pub const PEN_COUNT: u8 = 2;

    /// Returns the pointer id for a raw value, if it is inside the tracked range.
    pub fn new(raw: u32) -> Result<Self, EventError> {
        if (raw as usize) < Self::MAX_POINTERS {
            Ok(PointerId(raw as u8))
        } else {
            Err(EventError::InvalidPointerId(raw))
        }
    }

    /// The id of the `index`-th touch contact.
    pub fn touch(index: u8) -> Result<Self, EventError> {
        if index < Self::TOUCH_COUNT {
            Ok(PointerId(Self::TOUCH_FIRST + index))
        } else {
            Err(EventError::InvalidPointerId(
                Self::TOUCH_FIRST as u32 + index as u32,
            ))
        }
    }

    /// The id of the `index`-th pen.
    pub fn pen(index: u8) -> Result<Self, EventError> {
        if index < Self::PEN_COUNT {
            Ok(PointerId(Self::PEN_FIRST + index))
        } else {
            Err(EventError::InvalidPointerId(
                Self::PEN_FIRST as u32 + index as u32,
            ))
        }
    }

    /// Index into per-pointer arrays.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn raw(self) -> u32 {
        self.0 as u32
    }

    pub fn is_mouse(self) -> bool {
        self == Self::MOUSE
    }

    /// The device family implied by the id range.
    pub fn pointer_type(self) -> PointerType {
        match self.0 {
            0 => PointerType::Mouse,
            id if (Self::TOUCH_FIRST..Self::PEN_FIRST).contains(&id) => PointerType::Touch,
            id if (Self::PEN_FIRST..Self::PEN_FIRST + Self::PEN_COUNT).contains(&id) => {
                PointerType::Pen
            }
            _ => PointerType::Unknown,
        }
    }

    /// Iterate over every tracked pointer id.
    pub fn all() -> impl Iterator<Item = PointerId> {
        (0..Self::MAX_POINTERS as u8).map(PointerId)
    }
}

impl Default for PointerId {
    fn default() -> Self {
        Self::MOUSE
    }
}

impl fmt::Display for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerType {
    Mouse,
    Touch,
    Pen,
    Unknown,
}

impl PointerType {
    /// Touch and pen contacts manipulate content directly; their capture and hover
    /// state end when the contact is lifted.
    pub fn is_direct_manipulation(self) -> bool {
        matches!(self, PointerType::Touch | PointerType::Pen)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash, Ord, PartialOrd)]
pub enum MouseButton {
    Primary,
    Secondary,
    Auxiliary,
    X1,
    X2,
    Other(u8),
}

impl MouseButton {
    /// Bit index of this button in a pressed-buttons mask.
    pub fn index(self) -> u32 {
        match self {
            MouseButton::Primary => 0,
            MouseButton::Secondary => 1,
            MouseButton::Auxiliary => 2,
            MouseButton::X1 => 3,
            MouseButton::X2 => 4,
            MouseButton::Other(n) => (n as u32).min(31),
        }
    }

    pub fn from_index(index: u32) -> Self {
        match index {
            0 => MouseButton::Primary,
            1 => MouseButton::Secondary,
            2 => MouseButton::Auxiliary,
            3 => MouseButton::X1,
            4 => MouseButton::X2,
            n => MouseButton::Other(n.min(31) as u8),
        }
    }

    /// The single-bit mask for this button.
    pub fn mask(self) -> u32 {
        1 << self.index()
    }

    pub fn is_primary(&self) -> bool {
        self == &MouseButton::Primary
    }

    pub fn is_secondary(&self) -> bool {
        self == &MouseButton::Secondary
    }

    pub fn is_auxiliary(&self) -> bool {
        self == &MouseButton::Auxiliary
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct PointerLocation {
    position: Point,
    panel: Option<PanelId>,
}

/// Last known location and pressed buttons of every pointer.
///
/// One instance is shared by all panels fed from the same input source; it is
/// mutated only while pointer and mouse events are dispatched.
#[derive(Debug, Clone)]
pub struct PointerDeviceState {
    locations: [PointerLocation; PointerId::MAX_POINTERS],
    pressed_buttons: [u32; PointerId::MAX_POINTERS],
}

impl Default for PointerDeviceState {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerDeviceState {
    pub fn new() -> Self {
        Self {
            locations: [PointerLocation::default(); PointerId::MAX_POINTERS],
            pressed_buttons: [0; PointerId::MAX_POINTERS],
        }
    }

    /// Wrap a fresh state for sharing between panels.
    pub fn shared() -> SharedDeviceState {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn save_pointer_position(
        &mut self,
        pointer_id: PointerId,
        position: Point,
        panel: Option<PanelId>,
    ) {
        self.locations[pointer_id.index()] = PointerLocation { position, panel };
    }

    pub fn pointer_position(&self, pointer_id: PointerId) -> Point {
        self.locations[pointer_id.index()].position
    }

    /// The panel that last received an event from this pointer.
    pub fn pointer_panel(&self, pointer_id: PointerId) -> Option<PanelId> {
        self.locations[pointer_id.index()].panel
    }

    pub fn press_button(&mut self, pointer_id: PointerId, button: MouseButton) {
        self.pressed_buttons[pointer_id.index()] |= button.mask();
    }

    pub fn release_button(&mut self, pointer_id: PointerId, button: MouseButton) {
        self.pressed_buttons[pointer_id.index()] &= !button.mask();
    }

    pub fn release_all_buttons(&mut self, pointer_id: PointerId) {
        self.pressed_buttons[pointer_id.index()] = 0;
    }

    pub fn pressed_buttons(&self, pointer_id: PointerId) -> u32 {
        self.pressed_buttons[pointer_id.index()]
    }

    pub fn is_button_pressed(&self, pointer_id: PointerId, button: MouseButton) -> bool {
        self.pressed_buttons(pointer_id) & button.mask() != 0
    }

    /// Whether any button other than `except` is held on this pointer.
    pub fn has_additional_pressed_buttons(&self, pointer_id: PointerId, except: MouseButton) -> bool {
        self.pressed_buttons(pointer_id) & !except.mask() != 0
    }

    /// Forget everything. Mostly useful between tests.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Device state shared by every panel of one input source.
pub type SharedDeviceState = Rc<RefCell<PointerDeviceState>>;
