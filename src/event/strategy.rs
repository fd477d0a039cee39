//! The ordered table of dispatch strategies.
//!
//! Every strategy that accepts an event gets to dispatch it, in table order,
//! until one of them stops dispatching or propagation is stopped. Capture
//! strategies run before the hit-testing ones and add the capturing element to
//! the event's skip list, so the capturer is not delivered the event twice.

mod capture;
mod focused;
mod native;
mod pointer;

use super::path::propagate;
use super::{Event, EventCategory, EventCx};
use crate::element::ElementId;

pub(crate) trait DispatchStrategy: Sync {
    fn name(&self) -> &'static str;

    fn can_dispatch(&self, event: &Event) -> bool;

    fn dispatch(&self, cx: &mut EventCx<'_>, event: &mut Event);

    /// Runs for every event after the default-action phase.
    fn post_dispatch(&self, _cx: &mut EventCx<'_>, _event: &mut Event) {}
}

const STRATEGIES: &[&dyn DispatchStrategy] = &[
    &DebuggerStrategy,
    &capture::PointerCaptureStrategy,
    &capture::MouseCaptureStrategy,
    &focused::FocusedElementStrategy {
        category: EventCategory::Keyboard,
        name: "keyboard",
    },
    &pointer::PointerStrategy,
    &pointer::MouseStrategy,
    &focused::FocusedElementStrategy {
        category: EventCategory::Command,
        name: "command",
    },
    &focused::FocusedElementStrategy {
        category: EventCategory::Navigation,
        name: "navigation",
    },
    &native::NativeInputStrategy,
    &DefaultStrategy,
];

pub(crate) fn dispatch(cx: &mut EventCx<'_>, event: &mut Event) {
    for strategy in STRATEGIES {
        if !strategy.can_dispatch(event) {
            continue;
        }
        log::trace!("{} strategy dispatching {:?}", strategy.name(), event.kind());
        strategy.dispatch(cx, event);
        if event.is_dispatch_stopped() || event.is_propagation_stopped() {
            break;
        }
    }
}

pub(crate) fn post_dispatch(cx: &mut EventCx<'_>, event: &mut Event) {
    for strategy in STRATEGIES {
        strategy.post_dispatch(cx, event);
    }
}

/// Whether an event built from raw input was left unhandled by the elements.
pub(super) fn wants_native_fallback(event: &Event) -> bool {
    event.raw_input().is_some()
        && event.propagates_to_raw_input()
        && !event.is_propagation_stopped()
}

/// Offer an event that no element handled to the native input surfaces, deepest
/// and last-drawn first. Stops at the first surface that consumes it.
pub(super) fn offer_to_native_surfaces(cx: &mut EventCx<'_>, event: &mut Event) -> bool {
    let root = cx.tree.root();
    let surfaces: Vec<ElementId> = cx
        .tree
        .subtree(root)
        .into_iter()
        .rev()
        .filter(|el| cx.tree.state(*el).is_some_and(|s| s.is_native_surface()))
        .collect();
    for element in surfaces {
        if event.is_propagation_stopped() {
            break;
        }
        if forward_to_native_surface(cx, event, element) {
            return true;
        }
    }
    false
}

/// Hand `event` to the native surface of `element`. A consumed event stops
/// propagating and loses its default actions.
pub(super) fn forward_to_native_surface(
    cx: &mut EventCx<'_>,
    event: &mut Event,
    element: ElementId,
) -> bool {
    let Some(surface) = cx.tree.native_surface(element) else {
        return false;
    };
    if !surface.handle_native_event(cx, event) {
        return false;
    }
    log::debug!("{:?} consumed by native surface {element:?}", event.kind());
    event.stop_propagation();
    event.suppress_default();
    true
}

/// Lets an [`EventInspector`](super::EventInspector) swallow events first.
struct DebuggerStrategy;

impl DispatchStrategy for DebuggerStrategy {
    fn name(&self) -> &'static str {
        "debugger"
    }

    fn can_dispatch(&self, _event: &Event) -> bool {
        true
    }

    fn dispatch(&self, cx: &mut EventCx<'_>, event: &mut Event) {
        let Some(inspector) = cx.dispatcher.inspector.clone() else {
            return;
        };
        if inspector.intercept_event(cx.panel(), event) {
            log::debug!("{:?} intercepted by inspector", event.kind());
            event.stop_propagation();
            event.suppress_default();
            event.stop_dispatch();
        }
    }

    fn post_dispatch(&self, cx: &mut EventCx<'_>, event: &mut Event) {
        if let Some(inspector) = cx.dispatcher.inspector.clone() {
            inspector.post_process_event(cx.panel(), event);
        }
    }
}

/// Catch-all: propagates from the event's target, or from the root.
struct DefaultStrategy;

impl DispatchStrategy for DefaultStrategy {
    fn name(&self) -> &'static str {
        "default"
    }

    fn can_dispatch(&self, _event: &Event) -> bool {
        true
    }

    fn dispatch(&self, cx: &mut EventCx<'_>, event: &mut Event) {
        if event.target().is_none() {
            event.set_target(Some(cx.root()));
        }
        propagate(cx, event);
        if wants_native_fallback(event) {
            offer_to_native_surfaces(cx, event);
        }
        event.stop_dispatch();
    }
}
