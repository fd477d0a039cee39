//! # floem-dispatch
//! A retained-mode event dispatch engine: events travel through an element
//! hierarchy in trickle-down, target and bubble-up phases, followed by default
//! actions, with pointer capture, hover tracking, focus routing and the
//! pointer-to-mouse compatibility layer on top.
//!
//! ## Example
//! ```rust
//! use floem_dispatch::prelude::*;
//! use floem_dispatch::kurbo::{Point, Rect};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let mut panel = Panel::new();
//! let root = panel.root();
//! let button = panel.tree_mut().create_named("button");
//! panel.tree_mut().append_child(root, button).unwrap();
//! panel
//!     .tree_mut()
//!     .set_bounds(button, Rect::new(0.0, 0.0, 100.0, 30.0))
//!     .unwrap();
//!
//! let clicks = Rc::new(Cell::new(0));
//! let counter = clicks.clone();
//! panel
//!     .on(button, EventKind::Click, move |_cx, _event| {
//!         counter.set(counter.get() + 1)
//!     })
//!     .unwrap();
//!
//! let position = Point::new(10.0, 10.0);
//! panel.dispatch(Event::pointer_down(PointerId::MOUSE, position, MouseButton::Primary));
//! panel.dispatch(Event::pointer_up(PointerId::MOUSE, position, MouseButton::Primary));
//! assert_eq!(clicks.get(), 1);
//! ```
//!
//! ## Elements
//! A [`Panel`](panel::Panel) owns an [`ElementTree`](element::ElementTree). Each
//! element carries flags that influence dispatch (enabled, visible, picking mode,
//! composite root, focusable), bounds used for hit testing, its callbacks and
//! optional [default actions](element::ElementBehavior).
//!
//! ## Dispatch
//! Sending an event runs the [strategy table](event::dispatch): pointer and mouse
//! events are routed to the capturing element or to the element under the
//! pointer, keyboard, command and navigation events to the focused element, and
//! everything else to its explicit target or the root. Events sent from handlers
//! are queued and processed once the current event has run to completion.
//!
//! ## Pooling
//! Events can be drawn from the panel's [`EventPool`](event::EventPool) and are
//! referred to by [`EventRef`](event::EventRef) handles with explicit reference
//! counting, so hot paths such as pointer moves reuse allocations.

pub mod config;
pub mod element;
pub mod error;
pub mod event;
pub mod panel;
pub mod pointer;
pub mod test_harness;

pub use config::DispatchConfig;
pub use element::{ElementId, ElementTree};
pub use error::EventError;
pub use panel::{Panel, PanelId};
pub use peniko;
pub use peniko::kurbo;
pub use ui_events;

pub mod prelude {
    pub use crate::DispatchConfig;
    pub use crate::element::{ElementBehavior, ElementId, NativeInputSurface, PickingMode};
    pub use crate::event::{
        CallbackPhase, DispatchMode, Event, EventCategory, EventCx, EventKind, LifecycleFlags,
        PropagationPhase, callback,
    };
    pub use crate::panel::Panel;
    pub use crate::pointer::{MouseButton, PointerId, PointerType};
}
