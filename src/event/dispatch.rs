//! The dispatcher: gate, queue and the per-event processing pipeline.
//!
//! Processing one event runs, in order:
//! 1. pre-dispatch: pending pointer capture is applied for pointer and mouse events,
//! 2. the dispatch strategies (see [`strategy`](super::strategy)),
//! 3. the default-action phase on the final target,
//! 4. post-dispatch: inspector hook, compatibility mouse events, clicks, focus,
//!    implicit release of direct-manipulation pointers,
//! 5. the commit of element-under-pointer changes.
//!
//! Events sent while another event is being processed are queued (unless sent
//! with [`DispatchMode::Immediate`]) and drawn one at a time once the gate closes,
//! so every event runs to completion before the next one starts.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use super::{
    Event, EventCategory, EventKind, EventPool, EventRef, LifecycleFlags, MouseData,
    NavigationDirection, PointerData, PropagationPhase, strategy,
};
use crate::element::ElementId;
use crate::error::{EventError, Result};
use crate::panel::Panel;
use crate::pointer::PointerId;

/// How [`Panel::send_event`] treats an event sent during another dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum DispatchMode {
    /// Processed after the events already in progress or queued.
    #[default]
    Queued,
    /// Processed right away, nested inside the current dispatch.
    Immediate,
}

/// Design-time hook that sees every event before the dispatch strategies do.
///
/// Inspectors can be shared between panels to pick elements across them.
pub trait EventInspector {
    /// Return `true` to swallow the event: propagation stops and no default
    /// action runs.
    fn intercept_event(&self, panel: &Panel, event: &Event) -> bool;

    /// Called after the default-action phase of every event.
    fn post_process_event(&self, _panel: &Panel, _event: &Event) {}
}

/// Handler context: the panel the event is being dispatched in.
pub struct EventCx<'a> {
    panel: &'a mut Panel,
}

impl<'a> EventCx<'a> {
    pub(crate) fn new(panel: &'a mut Panel) -> Self {
        Self { panel }
    }

    pub fn panel(&self) -> &Panel {
        self.panel
    }

    pub fn panel_mut(&mut self) -> &mut Panel {
        self.panel
    }
}

impl Deref for EventCx<'_> {
    type Target = Panel;

    fn deref(&self) -> &Panel {
        self.panel
    }
}

impl DerefMut for EventCx<'_> {
    fn deref_mut(&mut self) -> &mut Panel {
        self.panel
    }
}

pub(crate) struct Dispatcher {
    pub(crate) pool: EventPool,
    queue: VecDeque<EventRef>,
    gate_count: u32,
    processing_queue: bool,
    pub(crate) inspector: Option<Rc<dyn EventInspector>>,
}

impl Dispatcher {
    pub(crate) fn new(pool_capacity: usize) -> Self {
        Self {
            pool: EventPool::new(pool_capacity),
            queue: VecDeque::new(),
            gate_count: 0,
            processing_queue: false,
            inspector: None,
        }
    }
}

impl Panel {
    // =========================================================================
    // Public API
    // =========================================================================

    /// Dispatch a pooled event.
    ///
    /// The caller keeps its own reference; a queued event holds an extra one
    /// until it has been processed.
    ///
    /// # Panics
    ///
    /// Panics when `evt` is the event currently being dispatched and `mode` is
    /// [`DispatchMode::Immediate`].
    pub fn send_event(&mut self, evt: EventRef, mode: DispatchMode) -> Result<()> {
        if !self.dispatcher.pool.contains(evt) {
            log::warn!("ignoring dispatch of stale event handle {evt:?}");
            return Err(EventError::StaleEvent(evt));
        }
        if let Some(event) = self.dispatcher.pool.get_mut(evt) {
            event.flags.insert(LifecycleFlags::DISPATCHED);
        }

        let busy = self.dispatcher.gate_count > 0 || self.dispatcher.processing_queue;
        if mode == DispatchMode::Queued && busy {
            self.dispatcher.pool.acquire(evt)?;
            self.dispatcher.queue.push_back(evt);
        } else {
            self.process_event(evt);
        }
        Ok(())
    }

    /// Hand `event` to the pool and dispatch it in [`DispatchMode::Queued`] mode.
    ///
    /// Returns the event's lifecycle flags once `send_event` returns. When called
    /// from a handler the event is only queued, so `PROCESSED` is not set yet.
    pub fn dispatch(&mut self, event: Event) -> LifecycleFlags {
        self.dispatch_with_mode(event, DispatchMode::Queued)
    }

    pub fn dispatch_with_mode(&mut self, event: Event, mode: DispatchMode) -> LifecycleFlags {
        let evt = self.dispatcher.pool.insert(event);
        let flags = match self.send_event(evt, mode) {
            Ok(()) => self
                .dispatcher
                .pool
                .get(evt)
                .map(Event::flags)
                .unwrap_or_default(),
            Err(_) => LifecycleFlags::empty(),
        };
        let _ = self.dispatcher.pool.dispose(evt);
        flags
    }

    /// Run `f` with the dispatch gate held: everything it sends in queued mode is
    /// processed, in order, when it returns.
    pub fn with_gate<R>(&mut self, f: impl FnOnce(&mut Panel) -> R) -> R {
        self.open_gate();
        let result = f(self);
        self.close_gate();
        result
    }

    /// Whether an event is being processed or the gate is held.
    pub fn is_dispatching(&self) -> bool {
        self.dispatcher.gate_count > 0
    }

    pub fn queued_event_count(&self) -> usize {
        self.dispatcher.queue.len()
    }

    pub fn set_inspector(&mut self, inspector: Option<Rc<dyn EventInspector>>) {
        self.dispatcher.inspector = inspector;
    }

    // =========================================================================
    // Gate and queue
    // =========================================================================

    fn open_gate(&mut self) {
        self.dispatcher.gate_count += 1;
    }

    fn close_gate(&mut self) {
        self.dispatcher.gate_count = self.dispatcher.gate_count.saturating_sub(1);
        if self.dispatcher.gate_count == 0 && !self.dispatcher.processing_queue {
            self.process_queue();
        }
    }

    fn process_queue(&mut self) {
        self.dispatcher.processing_queue = true;
        while let Some(evt) = self.dispatcher.queue.pop_front() {
            self.process_event(evt);
            let _ = self.dispatcher.pool.dispose(evt);
        }
        self.dispatcher.processing_queue = false;
    }

    fn process_event(&mut self, evt: EventRef) {
        let Some(mut event) = self.dispatcher.pool.take_for_dispatch(evt) else {
            return;
        };
        self.open_gate();
        log::trace!("dispatch start: event {} {:?}", event.id(), event.kind());
        event.flags.insert(LifecycleFlags::DISPATCHING | LifecycleFlags::DISPATCHED);

        {
            let mut cx = EventCx::new(self);
            pre_dispatch(&mut cx, &mut event);
            strategy::dispatch(&mut cx, &mut event);
            execute_default_action(&mut cx, &mut event);
            strategy::post_dispatch(&mut cx, &mut event);
            post_dispatch(&mut cx, &mut event);
        }

        event.phase = PropagationPhase::None;
        event.current_target = None;
        event.flags.remove(LifecycleFlags::DISPATCHING);
        event.flags.insert(LifecycleFlags::PROCESSED);

        self.commit_element_under_pointers();
        log::trace!("dispatch end: event {} {:?}", event.id(), event.kind());
        self.dispatcher.pool.restore(evt, event);
        self.close_gate();
    }
}

// =========================================================================
// Pipeline steps
// =========================================================================

fn pre_dispatch(cx: &mut EventCx<'_>, event: &mut Event) {
    if matches!(
        event.category(),
        EventCategory::Pointer | EventCategory::Mouse
    ) && let Some(pointer_id) = event.pointer_id()
    {
        cx.process_pointer_capture(pointer_id);
    }
}

fn execute_default_action(cx: &mut EventCx<'_>, event: &mut Event) {
    if event.is_default_prevented() {
        return;
    }
    let Some(target) = event.target() else {
        return;
    };
    let Some(behavior) = cx.tree.behavior(target) else {
        return;
    };
    event.current_target = Some(target);
    event.phase = PropagationPhase::DefaultAction;
    behavior.execute_default_action(cx, event);
    event.current_target = None;
    event.phase = PropagationPhase::None;
}

fn post_dispatch(cx: &mut EventCx<'_>, event: &mut Event) {
    match event.kind() {
        EventKind::PointerDown => pointer_down_post_dispatch(cx, event),
        EventKind::PointerMove => send_compatibility_mouse_event(cx, event, EventKind::MouseMove),
        EventKind::PointerUp => pointer_up_post_dispatch(cx, event),
        EventKind::PointerCancel => pointer_cancel_post_dispatch(cx, event),
        EventKind::NavigationMove if !event.is_default_prevented() => {
            let direction = event
                .navigation_data()
                .map_or(NavigationDirection::None, |n| n.direction);
            if matches!(
                direction,
                NavigationDirection::Next | NavigationDirection::Previous
            ) {
                cx.focus_next(direction);
            }
        }
        _ => {}
    }
}

fn pointer_down_post_dispatch(cx: &mut EventCx<'_>, event: &mut Event) {
    let Some(pointer_id) = event.pointer_id() else {
        return;
    };
    if event.is_default_prevented() {
        cx.compat_suppressed[pointer_id.index()] = true;
    } else {
        send_compatibility_mouse_event(cx, event, EventKind::MouseDown);
        if cx.config.focus_on_pointer_down {
            focus_from_pointer(cx, event.leaf_target());
        }
    }
    if cx.config.click_events {
        cx.clicks.pointer_down(pointer_id, event.leaf_target());
    }
}

fn pointer_up_post_dispatch(cx: &mut EventCx<'_>, event: &mut Event) {
    let Some(pointer) = event.pointer_data().cloned() else {
        return;
    };
    send_compatibility_mouse_event(cx, event, EventKind::MouseUp);
    cx.compat_suppressed[pointer.pointer_id.index()] = false;

    if cx.config.click_events {
        let interval = cx.config.double_click_interval;
        let panel = &mut **cx;
        let click = panel.clicks.pointer_up(
            &panel.tree,
            pointer.pointer_id,
            event.leaf_target(),
            event.timestamp(),
            interval,
        );
        if let Some((target, click_count)) = click {
            let mut click = Event::pointer(
                EventKind::Click,
                PointerData {
                    click_count,
                    ..pointer.clone()
                },
            )
            .with_target(target)
            .with_modifiers(event.modifiers())
            .with_timestamp(event.timestamp());
            click.set_recompute_element_under_pointer(false);
            cx.dispatch(click);
        }
    }

    if pointer.pointer_type.is_direct_manipulation() {
        release_direct_manipulation_pointer(cx, event, pointer.pointer_id);
    }
}

fn pointer_cancel_post_dispatch(cx: &mut EventCx<'_>, event: &mut Event) {
    let Some(pointer) = event.pointer_data().cloned() else {
        return;
    };
    cx.compat_suppressed[pointer.pointer_id.index()] = false;
    cx.clicks.cancel(pointer.pointer_id);
    if pointer.pointer_type.is_direct_manipulation() {
        release_direct_manipulation_pointer(cx, event, pointer.pointer_id);
    }
}

/// A lifted touch or pen contact loses its capture and stops hovering anything.
fn release_direct_manipulation_pointer(
    cx: &mut EventCx<'_>,
    event: &Event,
    pointer_id: PointerId,
) {
    cx.release_pointer(pointer_id);
    cx.process_pointer_capture(pointer_id);
    cx.set_element_under_pointer(
        None,
        pointer_id,
        event.position().unwrap_or_default(),
    );
}

/// Mirror a primary pointer event as a mouse event, unless the pointer's
/// compatibility events were suppressed by a prevented pointer down.
fn send_compatibility_mouse_event(cx: &mut EventCx<'_>, event: &Event, kind: EventKind) {
    let Some(pointer) = event.pointer_data() else {
        return;
    };
    if !cx.config.compatibility_mouse_events
        || !pointer.is_primary
        || cx.compat_suppressed[pointer.pointer_id.index()]
    {
        return;
    }
    let mut mouse = Event::mouse(kind, MouseData::from(pointer))
        .with_modifiers(event.modifiers())
        .with_timestamp(event.timestamp());
    if let Some(target) = event.target() {
        mouse.set_target(Some(target));
    }
    mouse.set_recompute_element_under_pointer(false);
    cx.dispatch(mouse);
}

/// Focus the nearest enabled focusable element at or above `leaf`, or blur when
/// there is none.
fn focus_from_pointer(cx: &mut EventCx<'_>, leaf: Option<ElementId>) {
    let Some(leaf) = leaf else {
        return;
    };
    let tree = &cx.tree;
    let focusable = std::iter::once(leaf)
        .chain(tree.ancestors(leaf))
        .find(|el| {
            tree.state(*el).is_some_and(|s| s.is_focusable()) && tree.enabled_in_hierarchy(*el)
        });
    match focusable {
        Some(element) => {
            if let Err(err) = cx.focus(element) {
                log::debug!("focus on pointer down failed: {err}");
            }
        }
        None => cx.blur(),
    }
}
