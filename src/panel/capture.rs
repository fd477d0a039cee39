//! Per-pointer capture.
//!
//! Capture changes are two-phase. [`Panel::capture_pointer`] and
//! [`Panel::release_pointer`] only record the *pending* capturer; the change is
//! applied by [`Panel::process_pointer_capture`], which runs before every pointer
//! and mouse event and fires the capture-out / capture notifications. Until then
//! events keep going to the *current* capturer.

use super::Panel;
use crate::element::ElementId;
use crate::error::{EventError, Result};
use crate::event::{DispatchMode, Event, EventCategory, EventKind, MouseData, PointerData};
use crate::pointer::PointerId;

#[derive(Debug, Default)]
pub(crate) struct CaptureController {
    current: [Option<ElementId>; PointerId::MAX_POINTERS],
    pending: [Option<ElementId>; PointerId::MAX_POINTERS],
}

impl CaptureController {
    pub(crate) fn current(&self, pointer_id: PointerId) -> Option<ElementId> {
        self.current[pointer_id.index()]
    }

    pub(crate) fn pending(&self, pointer_id: PointerId) -> Option<ElementId> {
        self.pending[pointer_id.index()]
    }

    /// Drop both the current and pending capture without notifications.
    pub(crate) fn force_release(&mut self, pointer_id: PointerId) {
        self.current[pointer_id.index()] = None;
        self.pending[pointer_id.index()] = None;
    }

    /// Forget pending captures held by `elements`.
    pub(crate) fn release_elements(&mut self, elements: &[ElementId]) {
        for pending in &mut self.pending {
            if pending.is_some_and(|el| elements.contains(&el)) {
                *pending = None;
            }
        }
    }
}

impl Panel {
    /// Route every event of `pointer_id` to `element`, replacing any previous
    /// capturer. Takes effect with the next pointer event.
    pub fn capture_pointer(&mut self, element: ElementId, pointer_id: PointerId) -> Result<()> {
        if !self.tree.contains(element) {
            return Err(EventError::UnknownElement(element));
        }
        if !self.tree.is_attached(element) {
            return Err(EventError::DetachedElement(element));
        }
        self.capture.pending[pointer_id.index()] = Some(element);
        Ok(())
    }

    /// Release whatever holds `pointer_id`.
    pub fn release_pointer(&mut self, pointer_id: PointerId) {
        self.capture.pending[pointer_id.index()] = None;
    }

    /// Release `pointer_id` only if `element` holds it. Returns whether it did.
    pub fn release_pointer_from(&mut self, element: ElementId, pointer_id: PointerId) -> bool {
        if self.has_pointer_capture(element, pointer_id) {
            self.release_pointer(pointer_id);
            true
        } else {
            false
        }
    }

    /// Whether `element` holds, or is about to hold, `pointer_id`.
    pub fn has_pointer_capture(&self, element: ElementId, pointer_id: PointerId) -> bool {
        self.capture.pending(pointer_id) == Some(element)
    }

    /// The element events of `pointer_id` are currently routed to.
    pub fn capturing_element(&self, pointer_id: PointerId) -> Option<ElementId> {
        self.capture.current(pointer_id)
    }

    /// Apply a pending capture change for `pointer_id`.
    ///
    /// The old capturer receives `PointerCaptureOut` (if it is still attached),
    /// then the new one receives `PointerCapture`. For the mouse pointer both are
    /// followed by their `MouseCaptureOut` / `MouseCapture` counterparts.
    pub fn process_pointer_capture(&mut self, pointer_id: PointerId) {
        let old = self.capture.current(pointer_id);
        let new = self
            .capture
            .pending(pointer_id)
            .filter(|el| self.tree.is_attached(*el));
        if old == new {
            self.capture.pending[pointer_id.index()] = new;
            return;
        }
        log::debug!("pointer {pointer_id} capture: {old:?} -> {new:?}");
        self.capture.current[pointer_id.index()] = new;
        self.capture.pending[pointer_id.index()] = new;

        let position = self.device.borrow().pointer_position(pointer_id);
        if let Some(old) = old.filter(|el| self.tree.is_attached(*el)) {
            self.send_capture_event(EventKind::PointerCaptureOut, pointer_id, old, new, position);
            if pointer_id.is_mouse() {
                self.send_capture_event(EventKind::MouseCaptureOut, pointer_id, old, new, position);
            }
        }
        if let Some(new) = new {
            self.send_capture_event(EventKind::PointerCapture, pointer_id, new, old, position);
            if pointer_id.is_mouse() {
                self.send_capture_event(EventKind::MouseCapture, pointer_id, new, old, position);
            }
        }
    }

    fn send_capture_event(
        &mut self,
        kind: EventKind,
        pointer_id: PointerId,
        target: ElementId,
        related: Option<ElementId>,
        position: peniko::kurbo::Point,
    ) {
        let pointer = PointerData::new(pointer_id, position);
        let mut event = if kind.category() == EventCategory::Mouse {
            Event::mouse(kind, MouseData::from(&pointer))
        } else {
            Event::pointer(kind, pointer)
        }
        .with_target(target);
        event.set_related_target(related);
        event.set_recompute_element_under_pointer(false);
        self.dispatch_with_mode(event, DispatchMode::Immediate);
    }
}
