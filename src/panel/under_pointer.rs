//! Tracking of the topmost element under each pointer.
//!
//! Hit tests only record a *pending* element. Transitions are committed once per
//! processed event, after its dispatch, so enter/leave notifications never
//! interleave with the event that caused them.

use std::time::Instant;

use peniko::kurbo::Point;
use ui_events::keyboard::Modifiers;

use super::Panel;
use crate::element::{ElementId, ElementTree};
use crate::event::{Event, EventCategory, EventKind, MouseData, PointerData};
use crate::pointer::PointerId;

/// Input state of the event that last changed a pointer's pending element.
#[derive(Debug, Clone, Copy)]
struct PointerTrigger {
    position: Point,
    modifiers: Modifiers,
    timestamp: Instant,
}

#[derive(Debug, Default)]
pub(crate) struct ElementUnderPointer {
    committed: [Option<ElementId>; PointerId::MAX_POINTERS],
    pending: [Option<ElementId>; PointerId::MAX_POINTERS],
    triggers: [Option<PointerTrigger>; PointerId::MAX_POINTERS],
}

impl ElementUnderPointer {
    pub(crate) fn pending(&self, pointer_id: PointerId) -> Option<ElementId> {
        self.pending[pointer_id.index()]
    }

    fn set_pending(&mut self, pointer_id: PointerId, element: Option<ElementId>, trigger: PointerTrigger) {
        self.pending[pointer_id.index()] = element;
        self.triggers[pointer_id.index()] = Some(trigger);
    }

    /// Forget `elements` as pending elements under any pointer.
    pub(crate) fn clear_elements(&mut self, elements: &[ElementId]) {
        for pending in &mut self.pending {
            if pending.is_some_and(|el| elements.contains(&el)) {
                *pending = None;
            }
        }
    }

    /// Pointers whose pending element differs from the committed one, marking
    /// them committed.
    fn take_changes(
        &mut self,
        tree: &ElementTree,
    ) -> Vec<(PointerId, Option<ElementId>, Option<ElementId>, PointerTrigger)> {
        let mut changes = Vec::new();
        for pointer_id in PointerId::all() {
            let i = pointer_id.index();
            let pending = self.pending[i].filter(|el| tree.is_attached(*el));
            self.pending[i] = pending;
            if pending == self.committed[i] {
                continue;
            }
            let previous = std::mem::replace(&mut self.committed[i], pending);
            let trigger = self.triggers[i].unwrap_or(PointerTrigger {
                position: Point::ZERO,
                modifiers: Modifiers::default(),
                timestamp: Instant::now(),
            });
            changes.push((pointer_id, previous, pending, trigger));
        }
        changes
    }
}

impl Panel {
    /// The element `pointer_id` is over, including a change not committed yet.
    pub fn element_under_pointer(&self, pointer_id: PointerId) -> Option<ElementId> {
        self.under_pointer.pending(pointer_id)
    }

    /// Record `element` as the element under `pointer_id`. Enter/leave
    /// notifications are sent on the next commit.
    pub fn set_element_under_pointer(
        &mut self,
        element: Option<ElementId>,
        pointer_id: PointerId,
        position: Point,
    ) {
        self.under_pointer.set_pending(
            pointer_id,
            element,
            PointerTrigger {
                position,
                modifiers: Modifiers::default(),
                timestamp: Instant::now(),
            },
        );
    }

    /// Hit test at the position of `event` and record the result for its pointer.
    pub fn recompute_element_under_pointer(&mut self, event: &Event) -> Option<ElementId> {
        let (pointer_id, position) = (event.pointer_id()?, event.position()?);
        let element = self.tree.pick(position);
        self.under_pointer.set_pending(
            pointer_id,
            element,
            PointerTrigger {
                position,
                modifiers: event.modifiers(),
                timestamp: event.timestamp(),
            },
        );
        element
    }

    /// Send the enter/leave and over/out notifications of every pointer whose
    /// element changed since the last commit.
    ///
    /// Leave events go from the previous element up to the nearest common
    /// ancestor (deepest first), enter events from below that ancestor down to the
    /// new element (shallowest first). Out is sent to the previous element and
    /// over to the new one. The mouse pointer repeats the sequence with mouse
    /// events when compatibility events are enabled.
    pub fn commit_element_under_pointers(&mut self) {
        let changes = self.under_pointer.take_changes(&self.tree);
        for (pointer_id, previous, current, trigger) in changes {
            log::debug!("pointer {pointer_id} now over {current:?} (was {previous:?})");
            let (leaving, entering) = transition(&self.tree, previous, current);
            let kinds = [
                (
                    EventKind::PointerLeave,
                    EventKind::PointerEnter,
                    EventKind::PointerOut,
                    EventKind::PointerOver,
                ),
                (
                    EventKind::MouseLeave,
                    EventKind::MouseEnter,
                    EventKind::MouseOut,
                    EventKind::MouseOver,
                ),
            ];
            let mirror = pointer_id.is_mouse() && self.config.compatibility_mouse_events;
            for (i, (leave, enter, out, over)) in kinds.into_iter().enumerate() {
                if i == 1 && !mirror {
                    break;
                }
                for &element in &leaving {
                    self.send_hover_event(leave, pointer_id, element, current, trigger);
                }
                for &element in &entering {
                    self.send_hover_event(enter, pointer_id, element, previous, trigger);
                }
                if let Some(previous) = previous.filter(|el| self.tree.is_attached(*el)) {
                    self.send_hover_event(out, pointer_id, previous, current, trigger);
                }
                if let Some(current) = current {
                    self.send_hover_event(over, pointer_id, current, previous, trigger);
                }
            }
        }
    }

    fn send_hover_event(
        &mut self,
        kind: EventKind,
        pointer_id: PointerId,
        target: ElementId,
        related: Option<ElementId>,
        trigger: PointerTrigger,
    ) {
        let pressed_buttons = self.device.borrow().pressed_buttons(pointer_id);
        let pointer =
            PointerData::new(pointer_id, trigger.position).with_pressed_buttons(pressed_buttons);
        let mut event = if kind.category() == EventCategory::Mouse {
            Event::mouse(kind, MouseData::from(&pointer))
        } else {
            Event::pointer(kind, pointer)
        }
        .with_target(target)
        .with_modifiers(trigger.modifiers)
        .with_timestamp(trigger.timestamp);
        event.set_related_target(related);
        event.set_recompute_element_under_pointer(false);
        self.dispatch(event);
    }
}

/// Elements left (deepest first) and entered (shallowest first) when moving from
/// `previous` to `current`. A detached or missing endpoint is at depth zero.
fn transition(
    tree: &ElementTree,
    previous: Option<ElementId>,
    current: Option<ElementId>,
) -> (Vec<ElementId>, Vec<ElementId>) {
    let previous = previous.filter(|el| tree.is_attached(*el));
    let depth = |el: Option<ElementId>| el.map_or(0, |el| tree.depth(el));

    let mut leaving = Vec::new();
    let mut entering = Vec::new();
    let (mut prev, mut curr) = (previous, current);
    let (mut prev_depth, mut curr_depth) = (depth(prev), depth(curr));

    while prev_depth > curr_depth {
        if let Some(el) = prev {
            leaving.push(el);
        }
        prev = prev.and_then(|el| tree.parent(el));
        prev_depth -= 1;
    }
    while curr_depth > prev_depth {
        if let Some(el) = curr {
            entering.push(el);
        }
        curr = curr.and_then(|el| tree.parent(el));
        curr_depth -= 1;
    }
    while prev != curr {
        if let Some(el) = prev {
            leaving.push(el);
        }
        if let Some(el) = curr {
            entering.push(el);
        }
        prev = prev.and_then(|el| tree.parent(el));
        curr = curr.and_then(|el| tree.parent(el));
    }

    entering.reverse();
    (leaving, entering)
}
