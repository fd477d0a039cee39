//! Propagation path building and the trickle-down / target / bubble-up walk.
//!
//! Dispatching one event to a target is split in two steps:
//! 1. **Path Building**: walk from the leaf target to the root, collecting the
//!    ancestors that take part in each phase.
//! 2. **Propagation**: iterate the pre-built path (trickle-down, at-target,
//!    default-action-at-target, bubble-up).
//!
//! The path is built before any callback runs, so tree mutations made by
//! handlers do not change who receives the current event.

use smallvec::SmallVec;

use super::callback::{invoke_callbacks, invoke_target_callbacks};
use super::{Event, EventCx, PropagationPhase};
use crate::element::{ElementId, ElementTree};

/// The elements an event is delivered to, split by phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationPath {
    /// Ancestors with trickle-down handlers, parent first. Walked in reverse.
    trickle_down: SmallVec<[ElementId; 8]>,
    /// The leaf target, followed by any composite-root ancestors.
    target_elements: SmallVec<[ElementId; 2]>,
    /// Ancestors with bubble-up handlers, parent first.
    bubble_up: SmallVec<[ElementId; 8]>,
}

impl PropagationPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the path of `event` for `leaf`, reusing this path's buffers.
    ///
    /// Disabled ancestors are left out but do not end the walk. Composite-root
    /// ancestors join the target list. Other ancestors are only recorded for the
    /// phases they have handlers for and the event takes part in.
    pub fn build(&mut self, tree: &ElementTree, event: &Event, leaf: ElementId) {
        self.clear();
        self.target_elements.push(leaf);

        let trickles = event.trickles_down();
        let bubbles = event.bubbles();
        for ancestor in tree.ancestors(leaf) {
            if !tree.enabled_in_hierarchy(ancestor) {
                continue;
            }
            if tree
                .state(ancestor)
                .is_some_and(|s| s.is_composite_root())
            {
                self.target_elements.push(ancestor);
                continue;
            }
            if trickles && tree.has_trickle_handlers(ancestor) {
                self.trickle_down.push(ancestor);
            }
            if bubbles && tree.has_bubble_handlers(ancestor) {
                self.bubble_up.push(ancestor);
            }
        }
    }

    pub fn clear(&mut self) {
        self.trickle_down.clear();
        self.target_elements.clear();
        self.bubble_up.clear();
    }

    /// Trickle-down elements in delivery order (root first).
    pub fn trickle_down(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.trickle_down.iter().rev().copied()
    }

    pub fn target_elements(&self) -> &[ElementId] {
        &self.target_elements
    }

    /// Bubble-up elements in delivery order (parent first).
    pub fn bubble_up(&self) -> &[ElementId] {
        &self.bubble_up
    }

    pub fn is_empty(&self) -> bool {
        self.target_elements.is_empty()
    }
}

/// Propagate `event` from its current target through the hierarchy.
///
/// Stopping propagation ends the trickle-down and bubble-up walks, but the
/// target-phase callbacks and default actions of the target elements still run.
/// A stop during trickle-down also skips the targets' trickle-down callbacks.
pub(crate) fn propagate(cx: &mut EventCx<'_>, event: &mut Event) {
    let Some(leaf) = event.leaf_target().or(event.target()) else {
        return;
    };
    if !cx.tree.contains(leaf) {
        return;
    }

    let mut path = cx.dispatcher.pool.take_path();
    path.build(&cx.tree, event, leaf);

    // Phase 1: trickle-down
    for element in path.trickle_down() {
        if event.is_propagation_stopped() {
            break;
        }
        if event.skips(element) {
            continue;
        }
        event.current_target = Some(element);
        event.phase = PropagationPhase::TrickleDown;
        invoke_callbacks(cx, event, element);
    }

    // Phase 2: at target
    let trickle_down_stopped = event.is_propagation_stopped();
    for &element in path.target_elements() {
        if event.skips(element) {
            continue;
        }
        event.set_target(Some(element));
        event.current_target = Some(element);
        event.phase = PropagationPhase::AtTarget;
        invoke_target_callbacks(cx, event, element, trickle_down_stopped);
    }

    // Phase 3: default action at target
    for &element in path.target_elements() {
        if event.is_default_prevented() {
            break;
        }
        if event.skips(element) {
            continue;
        }
        event.set_target(Some(element));
        event.current_target = Some(element);
        event.phase = PropagationPhase::DefaultActionAtTarget;
        if let Some(behavior) = cx.tree.behavior(element) {
            behavior.execute_default_action_at_target(cx, event);
        }
    }

    event.set_target(Some(leaf));

    // Phase 4: bubble-up
    if event.bubbles() {
        for &element in path.bubble_up() {
            if event.is_propagation_stopped() {
                break;
            }
            if event.skips(element) {
                continue;
            }
            event.current_target = Some(element);
            event.phase = PropagationPhase::BubbleUp;
            invoke_callbacks(cx, event, element);
        }
    }

    event.current_target = None;
    event.phase = PropagationPhase::None;
    if let Some(old) = event.path.replace(path) {
        cx.dispatcher.pool.recycle_path(old);
    }
}
