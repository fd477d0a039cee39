//! Test harness for driving a panel without a host window.
//!
//! This module provides utilities for building element hierarchies and
//! simulating user input against them, so dispatch behavior can be verified in
//! unit tests, integration tests and benchmarks.
//!
//! # Example
//!
//! ```rust
//! use floem_dispatch::prelude::*;
//! use floem_dispatch::test_harness::TestHarness;
//! use floem_dispatch::kurbo::Rect;
//!
//! let mut harness = TestHarness::new();
//! let root = harness.root();
//! let behind = harness.add(root, "behind", Rect::new(0.0, 0.0, 100.0, 100.0));
//! let front = harness.add(root, "front", Rect::new(0.0, 0.0, 50.0, 50.0));
//!
//! assert_eq!(harness.element_at(25.0, 25.0), Some(front));
//! assert_eq!(harness.element_at(75.0, 75.0), Some(behind));
//!
//! let result = harness.click(25.0, 25.0);
//! assert!(!result.handled);
//! ```

use peniko::kurbo::{Point, Rect};
use ui_events::keyboard::Key;

use crate::config::DispatchConfig;
use crate::element::ElementId;
use crate::event::{Event, LifecycleFlags};
use crate::panel::Panel;
use crate::pointer::{MouseButton, PointerId};

/// Result of an event dispatch operation.
#[derive(Debug, Clone, Copy)]
pub struct EventResult {
    /// Whether propagation was stopped.
    pub handled: bool,
    /// Whether the default actions were prevented.
    pub default_prevented: bool,
    pub flags: LifecycleFlags,
}

impl From<LifecycleFlags> for EventResult {
    fn from(flags: LifecycleFlags) -> Self {
        Self {
            handled: flags.contains(LifecycleFlags::PROPAGATION_STOPPED),
            default_prevented: flags.contains(LifecycleFlags::DEFAULT_PREVENTED),
            flags,
        }
    }
}

/// A panel plus helpers to build its hierarchy and feed it input.
pub struct TestHarness {
    panel: Panel,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(DispatchConfig::default())
    }

    pub fn with_config(config: DispatchConfig) -> Self {
        Self {
            panel: Panel::with_config(config),
        }
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut Panel {
        &mut self.panel
    }

    pub fn root(&self) -> ElementId {
        self.panel.root()
    }

    /// Append a named element with the given bounds under `parent`.
    ///
    /// Later siblings are on top of earlier ones for hit testing.
    pub fn add(&mut self, parent: ElementId, name: &str, bounds: Rect) -> ElementId {
        let tree = self.panel.tree_mut();
        let id = tree.create_named(name);
        tree.append_child(parent, id)
            .and_then(|()| tree.set_bounds(id, bounds))
            .expect("parent must be a live element");
        id
    }

    /// Append an unnamed element covering `(x0, y0)-(x1, y1)` under `parent`.
    pub fn add_rect(&mut self, parent: ElementId, x0: f64, y0: f64, x1: f64, y1: f64) -> ElementId {
        self.add(parent, "", Rect::new(x0, y0, x1, y1))
    }

    /// Dispatch an event to the panel.
    pub fn dispatch(&mut self, event: Event) -> EventResult {
        self.panel.dispatch(event).into()
    }

    /// Simulate a primary-button mouse pointer down at the given position.
    pub fn pointer_down(&mut self, x: f64, y: f64) -> EventResult {
        self.dispatch(Event::pointer_down(
            PointerId::MOUSE,
            Point::new(x, y),
            MouseButton::Primary,
        ))
    }

    /// Simulate a primary-button mouse pointer up at the given position.
    pub fn pointer_up(&mut self, x: f64, y: f64) -> EventResult {
        self.dispatch(Event::pointer_up(
            PointerId::MOUSE,
            Point::new(x, y),
            MouseButton::Primary,
        ))
    }

    /// Simulate a mouse pointer move to the given position.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> EventResult {
        self.dispatch(Event::pointer_move(PointerId::MOUSE, Point::new(x, y)))
    }

    /// Simulate a click (pointer down + pointer up) at the given position.
    ///
    /// Returns the result of the pointer up.
    pub fn click(&mut self, x: f64, y: f64) -> EventResult {
        self.pointer_down(x, y);
        self.pointer_up(x, y)
    }

    /// Simulate a touch contact going down. `finger` 0 is the primary touch.
    pub fn touch_down(&mut self, finger: u8, x: f64, y: f64) -> EventResult {
        self.dispatch(Event::pointer_down(
            touch_id(finger),
            Point::new(x, y),
            MouseButton::Primary,
        ))
    }

    pub fn touch_move(&mut self, finger: u8, x: f64, y: f64) -> EventResult {
        self.dispatch(Event::pointer_move(touch_id(finger), Point::new(x, y)))
    }

    pub fn touch_up(&mut self, finger: u8, x: f64, y: f64) -> EventResult {
        self.dispatch(Event::pointer_up(
            touch_id(finger),
            Point::new(x, y),
            MouseButton::Primary,
        ))
    }

    /// Simulate the mouse leaving the host window.
    pub fn mouse_leave_window(&mut self, x: f64, y: f64) -> EventResult {
        self.dispatch(Event::mouse_leave_window(Point::new(x, y)))
    }

    /// Simulate a key press, delivered to the focused element.
    pub fn key_down(&mut self, key: Key) -> EventResult {
        self.dispatch(Event::key_down(key))
    }

    /// Find the element at the given position (hit test).
    pub fn element_at(&self, x: f64, y: f64) -> Option<ElementId> {
        self.panel.tree().pick(Point::new(x, y))
    }

    /// The committed or pending element under the mouse pointer.
    pub fn element_under_mouse(&self) -> Option<ElementId> {
        self.panel.element_under_pointer(PointerId::MOUSE)
    }
}

fn touch_id(finger: u8) -> PointerId {
    PointerId::touch(finger).expect("touch index out of range")
}
