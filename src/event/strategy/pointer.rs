//! Hit-test driven delivery of pointer and mouse events.

use super::DispatchStrategy;
use crate::event::path::propagate;
use crate::event::{Event, EventCategory, EventCx, EventData, EventKind};
use crate::pointer::PointerId;

pub(crate) struct PointerStrategy;

impl DispatchStrategy for PointerStrategy {
    fn name(&self) -> &'static str {
        "pointer"
    }

    fn can_dispatch(&self, event: &Event) -> bool {
        event.category() == EventCategory::Pointer
    }

    fn dispatch(&self, cx: &mut EventCx<'_>, event: &mut Event) {
        let input = matches!(
            event.kind(),
            EventKind::PointerDown
                | EventKind::PointerMove
                | EventKind::PointerUp
                | EventKind::PointerCancel
        );
        if input {
            update_device_state(cx, event);
            if event.recomputes_element_under_pointer() {
                cx.recompute_element_under_pointer(event);
            }
        }

        if event.target().is_none() {
            let under = event
                .pointer_id()
                .filter(|_| input)
                .and_then(|pointer_id| cx.element_under_pointer(pointer_id));
            event.set_target(Some(under.unwrap_or_else(|| cx.root())));
        }
        event.set_propagate_to_raw_input(false);

        propagate(cx, event);
        event.stop_dispatch();
    }
}

pub(crate) struct MouseStrategy;

impl DispatchStrategy for MouseStrategy {
    fn name(&self) -> &'static str {
        "mouse"
    }

    fn can_dispatch(&self, event: &Event) -> bool {
        event.category() == EventCategory::Mouse
    }

    fn dispatch(&self, cx: &mut EventCx<'_>, event: &mut Event) {
        match event.kind() {
            EventKind::MouseEnterWindow | EventKind::MouseLeaveWindow => {
                if event.kind() == EventKind::MouseLeaveWindow {
                    let position = event.position().unwrap_or_default();
                    cx.set_element_under_pointer(None, PointerId::MOUSE, position);
                    cx.device.borrow_mut().release_all_buttons(PointerId::MOUSE);
                    write_pressed_buttons(cx, event);
                }
                if event.target().is_none() {
                    event.set_target(Some(cx.root()));
                }
            }
            kind => {
                let input = matches!(
                    kind,
                    EventKind::MouseDown | EventKind::MouseMove | EventKind::MouseUp | EventKind::Wheel
                );
                if input {
                    update_device_state(cx, event);
                }
                if event.target().is_none() {
                    let under = if input && event.recomputes_element_under_pointer() {
                        cx.recompute_element_under_pointer(event)
                    } else if input {
                        cx.element_under_pointer(PointerId::MOUSE)
                    } else {
                        None
                    };
                    event.set_target(Some(under.unwrap_or_else(|| cx.root())));
                }
            }
        }
        event.set_propagate_to_raw_input(false);

        propagate(cx, event);
        event.stop_dispatch();
    }
}

/// Record the event's position and button transition for its pointer, then
/// copy the resulting button mask into the event.
fn update_device_state(cx: &mut EventCx<'_>, event: &mut Event) {
    let (Some(pointer_id), Some(position)) = (event.pointer_id(), event.position()) else {
        return;
    };
    let button = match event.data() {
        EventData::Pointer(p) => p.button,
        EventData::Mouse(m) => m.button,
        _ => None,
    };
    let panel = cx.id();
    {
        let mut device = cx.device.borrow_mut();
        device.save_pointer_position(pointer_id, position, Some(panel));
        match (event.kind(), button) {
            (EventKind::PointerDown | EventKind::MouseDown, Some(button)) => {
                device.press_button(pointer_id, button);
            }
            (EventKind::PointerUp | EventKind::MouseUp, Some(button)) => {
                device.release_button(pointer_id, button);
            }
            (EventKind::PointerCancel, _) => device.release_all_buttons(pointer_id),
            _ => {}
        }
    }
    write_pressed_buttons(cx, event);
}

fn write_pressed_buttons(cx: &EventCx<'_>, event: &mut Event) {
    let Some(pointer_id) = event.pointer_id() else {
        return;
    };
    let pressed = cx.device.borrow().pressed_buttons(pointer_id);
    match event.data_mut() {
        EventData::Pointer(p) => p.pressed_buttons = pressed,
        EventData::Mouse(m) => m.pressed_buttons = pressed,
        _ => {}
    }
}
