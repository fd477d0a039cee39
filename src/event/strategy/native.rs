use super::{DispatchStrategy, forward_to_native_surface, offer_to_native_surfaces};
use crate::event::path::propagate;
use crate::event::{Event, EventCategory, EventCx};

/// Raw input meant for embedded native surfaces.
///
/// A targeted event goes to its target's surface. Otherwise every surface is
/// offered the event until one consumes it; when none does, it propagates from
/// the root like any other event.
pub(crate) struct NativeInputStrategy;

impl DispatchStrategy for NativeInputStrategy {
    fn name(&self) -> &'static str {
        "native input"
    }

    fn can_dispatch(&self, event: &Event) -> bool {
        event.category() == EventCategory::NativeInput
    }

    fn dispatch(&self, cx: &mut EventCx<'_>, event: &mut Event) {
        let consumed = match event.target() {
            Some(target) => forward_to_native_surface(cx, event, target),
            None => offer_to_native_surfaces(cx, event),
        };
        if !consumed {
            if event.target().is_none() {
                event.set_target(Some(cx.root()));
            }
            propagate(cx, event);
        }
        event.stop_dispatch();
    }
}
