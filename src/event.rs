//! Events and their propagation state.
//!
//! An [`Event`] is a plain value describing one occurrence. While it is being
//! dispatched it also carries the dispatch state: the current phase, the target
//! and current target, and the propagation and lifecycle flags handlers use to
//! control delivery.
//!
//! Events are normally owned by an [`EventPool`] and referred to through
//! [`EventRef`] handles, see [`pool`].

pub mod callback;
mod data;
pub mod dispatch;
pub mod path;
pub mod pool;
pub(crate) mod strategy;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use bitflags::bitflags;
use peniko::kurbo::{Point, Vec2};
use smallvec::SmallVec;
use ui_events::keyboard::{Key, Modifiers};

pub use callback::{CallbackPhase, CallbackRegistry, EventCallback, callback};
pub use data::{
    CommandData, EventData, KeyData, MouseData, NavigationData, NavigationDirection,
    PointerData, RawInput, RawInputKind,
};
pub use dispatch::{DispatchMode, EventCx, EventInspector};
pub use path::PropagationPath;
pub use pool::{EventPool, EventRef};

use crate::element::ElementId;
use crate::pointer::{MouseButton, PointerId};

static NEXT_EVENT_ID: AtomicU64 = AtomicU64::new(1);

fn next_event_id() -> u64 {
    NEXT_EVENT_ID.fetch_add(1, Ordering::Relaxed)
}

bitflags! {
    /// How an event travels through the hierarchy.
    #[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct Propagation: u8 {
        /// Delivered to the target's ancestors after the target, leaf to root.
        const BUBBLES = 1;
        /// Delivered to the target's ancestors before the target, root to leaf.
        const TRICKLES_DOWN = 1 << 1;
        /// `prevent_default` has an effect.
        const CANCELLABLE = 1 << 2;
    }
}

bitflags! {
    /// Dispatch bookkeeping of one event instance.
    #[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct LifecycleFlags: u16 {
        const PROPAGATION_STOPPED = 1;
        const IMMEDIATE_PROPAGATION_STOPPED = 1 << 1;
        const DEFAULT_PREVENTED = 1 << 2;
        /// Currently inside the dispatcher.
        const DISPATCHING = 1 << 3;
        /// Obtained from an [`EventPool`] free list.
        const POOLED = 1 << 4;
        /// Received by a dispatcher, either processed or queued.
        const DISPATCHED = 1 << 5;
        /// Dispatch has completed.
        const PROCESSED = 1 << 6;
        /// No further dispatch strategy runs for this event.
        const STOP_DISPATCH = 1 << 7;
        /// Unhandled input is offered to native surfaces after propagation.
        const PROPAGATE_TO_RAW_INPUT = 1 << 8;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum PropagationPhase {
    #[default]
    None,
    TrickleDown,
    AtTarget,
    DefaultActionAtTarget,
    BubbleUp,
    DefaultAction,
}

/// Families of events, each routed by its own dispatch strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    Pointer,
    Mouse,
    Keyboard,
    Focus,
    Command,
    Navigation,
    NativeInput,
    Generic,
}

#[derive(Debug, Hash, PartialEq, Eq, Copy, Clone)]
pub enum EventKind {
    PointerDown,
    PointerMove,
    PointerUp,
    PointerCancel,
    /// Sent to each element the pointer enters, outer elements first.
    PointerEnter,
    /// Sent to each element the pointer leaves, inner elements first.
    PointerLeave,
    /// Sent to the new topmost element under the pointer.
    PointerOver,
    /// Sent to the previous topmost element under the pointer.
    PointerOut,
    /// Sent to an element that gained capture of a pointer.
    PointerCapture,
    /// Sent to an element that lost capture of a pointer.
    PointerCaptureOut,
    /// Sent to the nearest common ancestor of a pointer down and up pair.
    Click,
    MouseDown,
    MouseMove,
    MouseUp,
    MouseEnter,
    MouseLeave,
    MouseOver,
    MouseOut,
    MouseCapture,
    MouseCaptureOut,
    MouseEnterWindow,
    MouseLeaveWindow,
    Wheel,
    KeyDown,
    KeyUp,
    Focus,
    Blur,
    FocusIn,
    FocusOut,
    ValidateCommand,
    ExecuteCommand,
    NavigationMove,
    NavigationSubmit,
    NavigationCancel,
    /// Host input without a typed counterpart, handled by native surfaces.
    NativeInput,
    /// Application-defined event, routed like a generic event.
    Custom(u32),
}

impl EventKind {
    pub fn category(self) -> EventCategory {
        use EventKind::*;
        match self {
            PointerDown | PointerMove | PointerUp | PointerCancel | PointerEnter | PointerLeave
            | PointerOver | PointerOut | PointerCapture | PointerCaptureOut | Click => {
                EventCategory::Pointer
            }
            MouseDown | MouseMove | MouseUp | MouseEnter | MouseLeave | MouseOver | MouseOut
            | MouseCapture | MouseCaptureOut | MouseEnterWindow | MouseLeaveWindow | Wheel => {
                EventCategory::Mouse
            }
            KeyDown | KeyUp => EventCategory::Keyboard,
            Focus | Blur | FocusIn | FocusOut => EventCategory::Focus,
            ValidateCommand | ExecuteCommand => EventCategory::Command,
            NavigationMove | NavigationSubmit | NavigationCancel => EventCategory::Navigation,
            NativeInput => EventCategory::NativeInput,
            Custom(_) => EventCategory::Generic,
        }
    }

    pub fn default_propagation(self) -> Propagation {
        use EventKind::*;
        match self {
            PointerEnter | PointerLeave | MouseEnter | MouseLeave => {
                Propagation::TRICKLES_DOWN | Propagation::CANCELLABLE
            }
            PointerCapture | PointerCaptureOut | MouseCapture | MouseCaptureOut | Focus | Blur => {
                Propagation::TRICKLES_DOWN
            }
            MouseEnterWindow | MouseLeaveWindow => Propagation::CANCELLABLE,
            FocusIn | FocusOut => Propagation::BUBBLES | Propagation::TRICKLES_DOWN,
            _ => Propagation::BUBBLES | Propagation::TRICKLES_DOWN | Propagation::CANCELLABLE,
        }
    }

    fn default_data(self) -> EventData {
        match self.category() {
            EventCategory::Pointer => EventData::Pointer(PointerData::default()),
            EventCategory::Mouse => EventData::Mouse(MouseData::default()),
            EventCategory::Keyboard => EventData::Key(KeyData::default()),
            EventCategory::Command => EventData::Command(CommandData::default()),
            EventCategory::Navigation => EventData::Navigation(NavigationData::default()),
            EventCategory::Focus | EventCategory::NativeInput | EventCategory::Generic => {
                EventData::None
            }
        }
    }
}

/// One occurrence travelling through the element hierarchy.
#[derive(Debug)]
pub struct Event {
    id: u64,
    kind: EventKind,
    timestamp: Instant,
    propagation: Propagation,
    pub(crate) flags: LifecycleFlags,
    pub(crate) phase: PropagationPhase,
    target: Option<ElementId>,
    leaf_target: Option<ElementId>,
    pub(crate) current_target: Option<ElementId>,
    related_target: Option<ElementId>,
    pub(crate) skip_elements: SmallVec<[ElementId; 2]>,
    pub(crate) path: Option<PropagationPath>,
    modifiers: Modifiers,
    data: EventData,
    raw_input: Option<RawInput>,
    pub(crate) handle: Option<EventRef>,
    pub(crate) ref_count: u32,
    pub(crate) recompute_under_pointer: bool,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        let mut event = Self {
            id: 0,
            kind,
            timestamp: Instant::now(),
            propagation: Propagation::empty(),
            flags: LifecycleFlags::empty(),
            phase: PropagationPhase::None,
            target: None,
            leaf_target: None,
            current_target: None,
            related_target: None,
            skip_elements: SmallVec::new(),
            path: None,
            modifiers: Modifiers::default(),
            data: EventData::None,
            raw_input: None,
            handle: None,
            ref_count: 0,
            recompute_under_pointer: true,
        };
        event.reset();
        event
    }

    /// Reset every field to the defaults of the event's kind and assign a fresh id.
    ///
    /// A non-zero reference count at this point means the instance is still
    /// referenced somewhere; it is logged and forced back to zero.
    pub fn init(&mut self) {
        if self.ref_count != 0 {
            log::warn!(
                "event {} ({:?}) improperly released, reference count was {}",
                self.id,
                self.kind,
                self.ref_count
            );
            self.ref_count = 0;
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.id = next_event_id();
        self.timestamp = Instant::now();
        self.propagation = self.kind.default_propagation();
        self.flags = LifecycleFlags::PROPAGATE_TO_RAW_INPUT;
        self.phase = PropagationPhase::None;
        self.target = None;
        self.leaf_target = None;
        self.current_target = None;
        self.related_target = None;
        self.skip_elements.clear();
        self.path = None;
        self.modifiers = Modifiers::default();
        self.data = self.kind.default_data();
        self.raw_input = None;
        self.handle = None;
        self.recompute_under_pointer = true;
    }

    pub fn pointer(kind: EventKind, data: PointerData) -> Self {
        Self::new(kind).with_data(EventData::Pointer(data))
    }

    pub fn pointer_down(pointer_id: PointerId, position: Point, button: MouseButton) -> Self {
        Self::pointer(
            EventKind::PointerDown,
            PointerData::new(pointer_id, position)
                .with_button(button)
                .with_pressed_buttons(button.mask()),
        )
    }

    pub fn pointer_up(pointer_id: PointerId, position: Point, button: MouseButton) -> Self {
        Self::pointer(
            EventKind::PointerUp,
            PointerData::new(pointer_id, position).with_button(button),
        )
    }

    pub fn pointer_move(pointer_id: PointerId, position: Point) -> Self {
        Self::pointer(EventKind::PointerMove, PointerData::new(pointer_id, position))
    }

    pub fn pointer_cancel(pointer_id: PointerId, position: Point) -> Self {
        Self::pointer(EventKind::PointerCancel, PointerData::new(pointer_id, position))
    }

    pub fn mouse(kind: EventKind, data: MouseData) -> Self {
        Self::new(kind).with_data(EventData::Mouse(data))
    }

    pub fn mouse_down(position: Point, button: MouseButton) -> Self {
        Self::mouse(
            EventKind::MouseDown,
            MouseData {
                button: Some(button),
                pressed_buttons: button.mask(),
                ..MouseData::new(position)
            },
        )
    }

    pub fn mouse_up(position: Point, button: MouseButton) -> Self {
        Self::mouse(
            EventKind::MouseUp,
            MouseData {
                button: Some(button),
                ..MouseData::new(position)
            },
        )
    }

    pub fn mouse_move(position: Point) -> Self {
        Self::mouse(EventKind::MouseMove, MouseData::new(position))
    }

    pub fn wheel(position: Point, delta: Vec2) -> Self {
        Self::mouse(
            EventKind::Wheel,
            MouseData {
                delta,
                ..MouseData::new(position)
            },
        )
    }

    pub fn mouse_enter_window(position: Point) -> Self {
        Self::mouse(EventKind::MouseEnterWindow, MouseData::new(position))
    }

    pub fn mouse_leave_window(position: Point) -> Self {
        Self::mouse(EventKind::MouseLeaveWindow, MouseData::new(position))
    }

    pub fn key_down(key: Key) -> Self {
        Self::new(EventKind::KeyDown).with_data(EventData::Key(KeyData::new(key)))
    }

    pub fn key_up(key: Key) -> Self {
        Self::new(EventKind::KeyUp).with_data(EventData::Key(KeyData::new(key)))
    }

    pub fn validate_command(name: impl Into<String>) -> Self {
        Self::new(EventKind::ValidateCommand)
            .with_data(EventData::Command(CommandData { name: name.into() }))
    }

    pub fn execute_command(name: impl Into<String>) -> Self {
        Self::new(EventKind::ExecuteCommand)
            .with_data(EventData::Command(CommandData { name: name.into() }))
    }

    pub fn navigation_move(direction: NavigationDirection) -> Self {
        Self::new(EventKind::NavigationMove)
            .with_data(EventData::Navigation(NavigationData { direction }))
    }

    pub fn navigation_submit() -> Self {
        Self::new(EventKind::NavigationSubmit)
    }

    pub fn navigation_cancel() -> Self {
        Self::new(EventKind::NavigationCancel)
    }

    pub fn custom(id: u32) -> Self {
        Self::new(EventKind::Custom(id))
    }

    /// Convert a host input snapshot into the matching typed event.
    ///
    /// The snapshot is embedded in the event. Snapshots without a typed
    /// counterpart become [`EventKind::NativeInput`] events.
    pub fn from_raw_input(raw: &RawInput) -> Self {
        let mouse = MouseData {
            position: raw.position,
            delta: raw.delta,
            button: raw.button,
            pressed_buttons: raw.button.map_or(0, MouseButton::mask),
            click_count: raw.click_count,
        };
        let mut event = match raw.kind {
            RawInputKind::MouseDown => Self::mouse(EventKind::MouseDown, mouse),
            RawInputKind::MouseUp => Self::mouse(
                EventKind::MouseUp,
                MouseData {
                    pressed_buttons: 0,
                    ..mouse
                },
            ),
            RawInputKind::MouseMove | RawInputKind::MouseDrag => {
                Self::mouse(EventKind::MouseMove, mouse)
            }
            RawInputKind::ScrollWheel => Self::mouse(EventKind::Wheel, mouse),
            RawInputKind::MouseEnterWindow => Self::mouse(EventKind::MouseEnterWindow, mouse),
            RawInputKind::MouseLeaveWindow => Self::mouse(EventKind::MouseLeaveWindow, mouse),
            RawInputKind::KeyDown | RawInputKind::KeyUp if raw.key.is_some() => {
                let kind = if raw.kind == RawInputKind::KeyDown {
                    EventKind::KeyDown
                } else {
                    EventKind::KeyUp
                };
                let mut key = KeyData::default();
                if let Some(k) = &raw.key {
                    key.key = k.clone();
                }
                key.code = raw.code;
                Self::new(kind).with_data(EventData::Key(key))
            }
            RawInputKind::ValidateCommand | RawInputKind::ExecuteCommand
                if raw.command.is_some() =>
            {
                let name = raw.command.clone().unwrap_or_default();
                if raw.kind == RawInputKind::ValidateCommand {
                    Self::validate_command(name)
                } else {
                    Self::execute_command(name)
                }
            }
            _ => Self::new(EventKind::NativeInput),
        };
        event.modifiers = raw.modifiers;
        event.raw_input = Some(raw.clone());
        event
    }

    /// A fresh instance carrying the same kind, payload, targets and path, with a
    /// new id and cleared lifecycle state. Use it to re-dispatch an event from
    /// inside its own handlers.
    pub fn duplicate(&self) -> Self {
        let mut copy = Self::new(self.kind);
        copy.timestamp = self.timestamp;
        copy.propagation = self.propagation;
        copy.target = self.target;
        copy.leaf_target = self.leaf_target;
        copy.related_target = self.related_target;
        copy.path = self.path.clone();
        copy.modifiers = self.modifiers;
        copy.data = self.data.clone();
        copy.raw_input = self.raw_input.clone();
        copy.recompute_under_pointer = self.recompute_under_pointer;
        copy
    }

    pub fn with_target(mut self, target: ElementId) -> Self {
        self.set_target(Some(target));
        self
    }

    pub fn with_related_target(mut self, related: ElementId) -> Self {
        self.related_target = Some(related);
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_timestamp(mut self, timestamp: Instant) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_propagation(mut self, propagation: Propagation) -> Self {
        self.propagation = propagation;
        self
    }

    pub fn with_data(mut self, data: EventData) -> Self {
        self.data = data;
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn category(&self) -> EventCategory {
        self.kind.category()
    }

    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    pub fn propagation(&self) -> Propagation {
        self.propagation
    }

    pub fn bubbles(&self) -> bool {
        self.propagation.contains(Propagation::BUBBLES)
    }

    pub fn trickles_down(&self) -> bool {
        self.propagation.contains(Propagation::TRICKLES_DOWN)
    }

    pub fn is_cancellable(&self) -> bool {
        self.propagation.contains(Propagation::CANCELLABLE)
    }

    pub fn flags(&self) -> LifecycleFlags {
        self.flags
    }

    pub fn phase(&self) -> PropagationPhase {
        self.phase
    }

    pub fn target(&self) -> Option<ElementId> {
        self.target
    }

    /// Set the nominal target. The first target ever set is also remembered as
    /// the leaf target.
    pub fn set_target(&mut self, target: Option<ElementId>) {
        self.target = target;
        if self.leaf_target.is_none() {
            self.leaf_target = target;
        }
    }

    /// The original target, before target-phase substitution by composite roots.
    pub fn leaf_target(&self) -> Option<ElementId> {
        self.leaf_target
    }

    /// The element whose callbacks are currently running.
    pub fn current_target(&self) -> Option<ElementId> {
        self.current_target
    }

    /// The other element involved in focus and capture transitions.
    pub fn related_target(&self) -> Option<ElementId> {
        self.related_target
    }

    pub(crate) fn set_related_target(&mut self, related: Option<ElementId>) {
        self.related_target = related;
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn data(&self) -> &EventData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut EventData {
        &mut self.data
    }

    pub fn pointer_data(&self) -> Option<&PointerData> {
        match &self.data {
            EventData::Pointer(p) => Some(p),
            _ => None,
        }
    }

    pub fn mouse_data(&self) -> Option<&MouseData> {
        match &self.data {
            EventData::Mouse(m) => Some(m),
            _ => None,
        }
    }

    pub fn key_data(&self) -> Option<&KeyData> {
        match &self.data {
            EventData::Key(k) => Some(k),
            _ => None,
        }
    }

    pub fn command_data(&self) -> Option<&CommandData> {
        match &self.data {
            EventData::Command(c) => Some(c),
            _ => None,
        }
    }

    pub fn navigation_data(&self) -> Option<&NavigationData> {
        match &self.data {
            EventData::Navigation(n) => Some(n),
            _ => None,
        }
    }

    pub fn raw_input(&self) -> Option<&RawInput> {
        self.raw_input.as_ref()
    }

    /// The propagation path of the last propagation pass.
    pub fn path(&self) -> Option<&PropagationPath> {
        self.path.as_ref()
    }

    /// The pointer this event belongs to. Mouse events belong to the mouse pointer.
    pub fn pointer_id(&self) -> Option<PointerId> {
        match &self.data {
            EventData::Pointer(p) => Some(p.pointer_id),
            EventData::Mouse(_) => Some(PointerId::MOUSE),
            _ => None,
        }
    }

    pub fn position(&self) -> Option<Point> {
        match &self.data {
            EventData::Pointer(p) => Some(p.position),
            EventData::Mouse(m) => Some(m.position),
            _ => None,
        }
    }

    /// The pool handle of this instance, if it was inserted into a pool.
    pub fn handle(&self) -> Option<EventRef> {
        self.handle
    }

    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    /// Stop traversal to further elements. Remaining callbacks of the current
    /// element still run.
    pub fn stop_propagation(&mut self) {
        self.flags.insert(LifecycleFlags::PROPAGATION_STOPPED);
    }

    /// Stop traversal and skip the remaining callbacks of the current element.
    pub fn stop_immediate_propagation(&mut self) {
        self.flags.insert(
            LifecycleFlags::PROPAGATION_STOPPED | LifecycleFlags::IMMEDIATE_PROPAGATION_STOPPED,
        );
    }

    /// Skip the default actions of a cancellable event. No-op otherwise.
    pub fn prevent_default(&mut self) {
        if self.is_cancellable() {
            self.flags.insert(LifecycleFlags::DEFAULT_PREVENTED);
        }
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.flags.contains(LifecycleFlags::PROPAGATION_STOPPED)
    }

    pub fn is_immediate_propagation_stopped(&self) -> bool {
        self.flags
            .contains(LifecycleFlags::IMMEDIATE_PROPAGATION_STOPPED)
    }

    pub fn is_default_prevented(&self) -> bool {
        self.flags.contains(LifecycleFlags::DEFAULT_PREVENTED)
    }

    pub fn is_dispatching(&self) -> bool {
        self.flags.contains(LifecycleFlags::DISPATCHING)
    }

    pub fn is_pooled(&self) -> bool {
        self.flags.contains(LifecycleFlags::POOLED)
    }

    pub fn is_processed(&self) -> bool {
        self.flags.contains(LifecycleFlags::PROCESSED)
    }

    /// Prevent default actions regardless of cancellability.
    pub(crate) fn suppress_default(&mut self) {
        self.flags.insert(LifecycleFlags::DEFAULT_PREVENTED);
    }

    pub(crate) fn stop_dispatch(&mut self) {
        self.flags.insert(LifecycleFlags::STOP_DISPATCH);
    }

    pub(crate) fn is_dispatch_stopped(&self) -> bool {
        self.flags.contains(LifecycleFlags::STOP_DISPATCH)
    }

    pub(crate) fn propagates_to_raw_input(&self) -> bool {
        self.flags.contains(LifecycleFlags::PROPAGATE_TO_RAW_INPUT)
    }

    pub(crate) fn set_propagate_to_raw_input(&mut self, propagate: bool) {
        self.flags
            .set(LifecycleFlags::PROPAGATE_TO_RAW_INPUT, propagate);
    }

    pub(crate) fn skips(&self, element: ElementId) -> bool {
        self.skip_elements.contains(&element)
    }

    pub(crate) fn skip_element(&mut self, element: ElementId) {
        if !self.skips(element) {
            self.skip_elements.push(element);
        }
    }

    /// Whether dispatching this event should refresh the element under its pointer.
    pub fn recomputes_element_under_pointer(&self) -> bool {
        self.recompute_under_pointer
    }

    pub(crate) fn set_recompute_element_under_pointer(&mut self, recompute: bool) {
        self.recompute_under_pointer = recompute;
    }
}
