//! Per-element callback storage.
//!
//! Each element owns a [`CallbackRegistry`]: an ordered list of
//! `(kind, callback, phase)` entries. The list is copy-on-write while it is being
//! invoked, so handlers can register or unregister callbacks (including
//! themselves) without affecting the pass that is currently running.

use std::rc::Rc;

use super::{Event, EventCx, EventKind, PropagationPhase};
use crate::element::ElementId;

/// A type-erased event handler. Identity is the `Rc` allocation: registering the
/// same `Rc` twice for the same kind and phase is a no-op.
pub type EventCallback = Rc<dyn Fn(&mut EventCx<'_>, &mut Event)>;

/// Wrap a closure into an [`EventCallback`].
pub fn callback<F>(f: F) -> EventCallback
where
    F: Fn(&mut EventCx<'_>, &mut Event) + 'static,
{
    Rc::new(f)
}

/// Which propagation phases a callback listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CallbackPhase {
    /// Trickle-down on ancestors, and the target phase.
    TrickleDownAndTarget,
    /// The target phase, and bubble-up on ancestors.
    #[default]
    TargetAndBubbleUp,
}

#[derive(Clone)]
pub(crate) struct CallbackEntry {
    kind: EventKind,
    callback: EventCallback,
    phase: CallbackPhase,
}

impl CallbackEntry {
    fn matches(&self, kind: EventKind, callback: &EventCallback, phase: CallbackPhase) -> bool {
        self.kind == kind && self.phase == phase && Rc::ptr_eq(&self.callback, callback)
    }

    fn runs_in(&self, phase: PropagationPhase, trickle_down_stopped: bool) -> bool {
        match phase {
            PropagationPhase::TrickleDown => self.phase == CallbackPhase::TrickleDownAndTarget,
            PropagationPhase::BubbleUp => self.phase == CallbackPhase::TargetAndBubbleUp,
            PropagationPhase::AtTarget => {
                !trickle_down_stopped || self.phase == CallbackPhase::TargetAndBubbleUp
            }
            _ => false,
        }
    }
}

#[derive(Default)]
pub struct CallbackRegistry {
    callbacks: Rc<Vec<CallbackEntry>>,
    /// Shadow list receiving mutations while `invoke_depth > 0`.
    pending: Option<Vec<CallbackEntry>>,
    invoke_depth: u32,
    trickle_down_count: usize,
    bubble_up_count: usize,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn writable(&mut self) -> &mut Vec<CallbackEntry> {
        if self.invoke_depth > 0 {
            let callbacks = &self.callbacks;
            self.pending
                .get_or_insert_with(|| callbacks.as_ref().clone())
        } else {
            Rc::make_mut(&mut self.callbacks)
        }
    }

    fn current(&self) -> &[CallbackEntry] {
        self.pending.as_deref().unwrap_or(&self.callbacks)
    }

    /// Add a callback. Returns `false` if the same entry is already registered.
    pub fn register(&mut self, kind: EventKind, callback: EventCallback, phase: CallbackPhase) -> bool {
        let list = self.writable();
        if list.iter().any(|e| e.matches(kind, &callback, phase)) {
            return false;
        }
        list.push(CallbackEntry {
            kind,
            callback,
            phase,
        });
        match phase {
            CallbackPhase::TrickleDownAndTarget => self.trickle_down_count += 1,
            CallbackPhase::TargetAndBubbleUp => self.bubble_up_count += 1,
        }
        true
    }

    /// Remove at most one matching entry. Returns whether one was removed.
    pub fn unregister(
        &mut self,
        kind: EventKind,
        callback: &EventCallback,
        phase: CallbackPhase,
    ) -> bool {
        let list = self.writable();
        let Some(index) = list.iter().position(|e| e.matches(kind, callback, phase)) else {
            return false;
        };
        list.remove(index);
        match phase {
            CallbackPhase::TrickleDownAndTarget => self.trickle_down_count -= 1,
            CallbackPhase::TargetAndBubbleUp => self.bubble_up_count -= 1,
        }
        true
    }

    pub fn contains(&self, kind: EventKind, callback: &EventCallback, phase: CallbackPhase) -> bool {
        self.current()
            .iter()
            .any(|e| e.matches(kind, callback, phase))
    }

    pub fn len(&self) -> usize {
        self.current().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current().is_empty()
    }

    pub fn has_trickle_down_handlers(&self) -> bool {
        self.trickle_down_count > 0
    }

    pub fn has_bubble_up_handlers(&self) -> bool {
        self.bubble_up_count > 0
    }

    pub(crate) fn begin_invoke(&mut self) -> Rc<Vec<CallbackEntry>> {
        self.invoke_depth += 1;
        self.callbacks.clone()
    }

    pub(crate) fn end_invoke(&mut self) {
        self.invoke_depth = self.invoke_depth.saturating_sub(1);
        if self.invoke_depth == 0
            && let Some(pending) = self.pending.take()
        {
            self.callbacks = Rc::new(pending);
        }
    }
}

/// Run the callbacks of `element` matching the event's kind and current phase.
pub(crate) fn invoke_callbacks(cx: &mut EventCx<'_>, event: &mut Event, element: ElementId) {
    invoke_matching(cx, event, element, false);
}

/// Run the target-phase callbacks of `element`. Once propagation was stopped on
/// the way down, the element's trickle-down callbacks are left out and only
/// its target/bubble callbacks run.
pub(crate) fn invoke_target_callbacks(
    cx: &mut EventCx<'_>,
    event: &mut Event,
    element: ElementId,
    trickle_down_stopped: bool,
) {
    invoke_matching(cx, event, element, trickle_down_stopped);
}

fn invoke_matching(
    cx: &mut EventCx<'_>,
    event: &mut Event,
    element: ElementId,
    trickle_down_stopped: bool,
) {
    let Some(entries) = cx.tree.callbacks_mut(element).map(|r| r.begin_invoke()) else {
        return;
    };
    let phase = event.phase();
    for entry in entries.iter() {
        if event.is_immediate_propagation_stopped() {
            break;
        }
        if entry.kind == event.kind() && entry.runs_in(phase, trickle_down_stopped) {
            (entry.callback)(cx, event);
        }
    }
    if let Some(registry) = cx.tree.callbacks_mut(element) {
        registry.end_invoke();
    }
}
