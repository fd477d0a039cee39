use super::{DispatchStrategy, forward_to_native_surface, offer_to_native_surfaces, wants_native_fallback};
use crate::event::path::propagate;
use crate::event::{Event, EventCategory, EventCx};

/// Routes keyboard, command and navigation events to the focused element, or to
/// the root when nothing has focus.
pub(crate) struct FocusedElementStrategy {
    pub(crate) category: EventCategory,
    pub(crate) name: &'static str,
}

impl DispatchStrategy for FocusedElementStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    fn can_dispatch(&self, event: &Event) -> bool {
        event.category() == self.category
    }

    fn dispatch(&self, cx: &mut EventCx<'_>, event: &mut Event) {
        if event.target().is_none() {
            match cx.focused_element() {
                Some(focused) => {
                    event.set_target(Some(focused));
                    event.set_propagate_to_raw_input(false);
                }
                None => event.set_target(Some(cx.root())),
            }
        }

        if let Some(target) = event.target()
            && cx.tree.state(target).is_some_and(|s| s.is_native_surface())
            && forward_to_native_surface(cx, event, target)
        {
            event.stop_dispatch();
            return;
        }

        propagate(cx, event);
        if wants_native_fallback(event) {
            offer_to_native_surfaces(cx, event);
        }
        event.stop_dispatch();
    }
}
