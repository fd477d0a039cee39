//! Delivery to the element holding a pointer capture.

use super::DispatchStrategy;
use crate::event::callback::invoke_callbacks;
use crate::event::{Event, EventCategory, EventCx, PropagationPhase};
use crate::pointer::PointerId;

pub(crate) struct PointerCaptureStrategy;

impl DispatchStrategy for PointerCaptureStrategy {
    fn name(&self) -> &'static str {
        "pointer capture"
    }

    fn can_dispatch(&self, event: &Event) -> bool {
        event.category() == EventCategory::Pointer
    }

    fn dispatch(&self, cx: &mut EventCx<'_>, event: &mut Event) {
        if let Some(pointer_id) = event.pointer_id() {
            dispatch_to_capturer(cx, event, pointer_id);
        }
    }
}

/// Same as [`PointerCaptureStrategy`] for the compatibility mouse events, which
/// follow the capture of [`PointerId::MOUSE`].
pub(crate) struct MouseCaptureStrategy;

impl DispatchStrategy for MouseCaptureStrategy {
    fn name(&self) -> &'static str {
        "mouse capture"
    }

    fn can_dispatch(&self, event: &Event) -> bool {
        event.category() == EventCategory::Mouse
    }

    fn dispatch(&self, cx: &mut EventCx<'_>, event: &mut Event) {
        dispatch_to_capturer(cx, event, PointerId::MOUSE);
    }
}

fn dispatch_to_capturer(cx: &mut EventCx<'_>, event: &mut Event, pointer_id: PointerId) {
    let Some(capturer) = cx.capturing_element(pointer_id) else {
        return;
    };
    if !cx.tree.is_attached(capturer) {
        log::debug!("releasing capture of {pointer_id} held by detached element {capturer:?}");
        cx.capture.force_release(pointer_id);
        return;
    }
    // events explicitly sent to another element are not redirected
    if let Some(target) = event.target()
        && target != capturer
    {
        return;
    }

    event.set_target(Some(capturer));
    event.current_target = Some(capturer);
    event.phase = PropagationPhase::AtTarget;
    invoke_callbacks(cx, event, capturer);

    if !event.is_default_prevented()
        && let Some(behavior) = cx.tree.behavior(capturer)
    {
        event.phase = PropagationPhase::DefaultActionAtTarget;
        behavior.execute_default_action_at_target(cx, event);
    }

    event.current_target = None;
    event.phase = PropagationPhase::None;
    event.skip_element(capturer);
}
