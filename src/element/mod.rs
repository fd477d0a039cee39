//! The element hierarchy events are dispatched through.
//!
//! Elements live in an [`ElementTree`] arena. Each element has a parent link, an
//! ordered child list, a few flags that influence dispatch (enabled, visible,
//! picking mode, composite root, focusable), world-space bounds used for hit
//! testing, and a [`CallbackRegistry`](crate::event::callback::CallbackRegistry).

mod id;
mod state;
mod tree;

pub use id::ElementId;
pub use state::ElementState;
pub use tree::ElementTree;

use crate::event::{Event, EventCx};

/// How an element takes part in hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PickingMode {
    /// The element is hit when the point is inside its bounds.
    #[default]
    Position,
    /// The element is never hit itself, but its children still are.
    Ignore,
}

/// Default actions an element runs for events that were not default-prevented.
///
/// `execute_default_action_at_target` runs right after the target phase for each
/// element of the event's target list. `execute_default_action` runs once after
/// the whole dispatch, on the event's final target.
pub trait ElementBehavior {
    fn execute_default_action_at_target(&self, _cx: &mut EventCx<'_>, _event: &mut Event) {}

    fn execute_default_action(&self, _cx: &mut EventCx<'_>, _event: &mut Event) {}
}

/// An element hosting its own input handling, e.g. an embedded immediate-mode
/// surface.
///
/// Focus-routed events whose target is a native surface are handed to it before
/// normal propagation. Returning `true` consumes the event.
pub trait NativeInputSurface {
    fn handle_native_event(&self, cx: &mut EventCx<'_>, event: &mut Event) -> bool;
}
