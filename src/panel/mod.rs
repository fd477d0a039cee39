//! The panel: root of one element hierarchy and owner of its dispatch state.

mod capture;
mod click;
mod focus;
mod under_pointer;

use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::DispatchConfig;
use crate::element::{ElementId, ElementTree};
use crate::error::{EventError, Result};
use crate::event::dispatch::Dispatcher;
use crate::event::{CallbackPhase, EventCallback, EventKind, EventPool, callback};
use crate::event::{Event, EventCx};
use crate::pointer::{PointerDeviceState, PointerId, SharedDeviceState};

pub(crate) use capture::CaptureController;
pub(crate) use click::ClickDetector;
pub(crate) use focus::FocusController;
pub(crate) use under_pointer::ElementUnderPointer;

static NEXT_PANEL_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies a panel, e.g. in [`PointerDeviceState::pointer_panel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PanelId(u64);

impl PanelId {
    fn next() -> Self {
        Self(NEXT_PANEL_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// One element hierarchy together with everything needed to dispatch events
/// through it: focus, pointer capture, element-under-pointer tracking, click
/// detection, the event pool and the dispatch queue.
///
/// Panels sharing a [`SharedDeviceState`] see the same pointer positions and
/// pressed buttons.
pub struct Panel {
    id: PanelId,
    pub(crate) tree: ElementTree,
    pub(crate) focus: FocusController,
    pub(crate) capture: CaptureController,
    pub(crate) under_pointer: ElementUnderPointer,
    pub(crate) clicks: ClickDetector,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) device: SharedDeviceState,
    pub(crate) config: DispatchConfig,
    /// Pointers whose down event was default-prevented.
    pub(crate) compat_suppressed: [bool; PointerId::MAX_POINTERS],
}

impl Default for Panel {
    fn default() -> Self {
        Self::new()
    }
}

impl Panel {
    pub fn new() -> Self {
        Self::with_config(DispatchConfig::default())
    }

    pub fn with_config(config: DispatchConfig) -> Self {
        Self::with_device_state(config, PointerDeviceState::shared())
    }

    pub fn with_device_state(config: DispatchConfig, device: SharedDeviceState) -> Self {
        let mut tree = ElementTree::new();
        tree.set_hit_test_cache_enabled(config.hit_test_cache);
        Self {
            id: PanelId::next(),
            tree,
            focus: FocusController::default(),
            capture: CaptureController::default(),
            under_pointer: ElementUnderPointer::default(),
            clicks: ClickDetector::default(),
            dispatcher: Dispatcher::new(config.pool_capacity),
            device,
            config,
            compat_suppressed: [false; PointerId::MAX_POINTERS],
        }
    }

    pub fn id(&self) -> PanelId {
        self.id
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    /// Mutable access to the hierarchy. Use [`detach_element`](Self::detach_element)
    /// and [`remove_element`](Self::remove_element) to take elements out, so focus
    /// and capture are cleaned up.
    pub fn tree_mut(&mut self) -> &mut ElementTree {
        &mut self.tree
    }

    pub fn root(&self) -> ElementId {
        self.tree.root()
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn device(&self) -> &SharedDeviceState {
        &self.device
    }

    pub fn pool(&self) -> &EventPool {
        &self.dispatcher.pool
    }

    pub fn pool_mut(&mut self) -> &mut EventPool {
        &mut self.dispatcher.pool
    }

    /// Detach `element` from its parent, dropping focus and pending captures
    /// held inside its subtree.
    pub fn detach_element(&mut self, element: ElementId) -> Result<()> {
        let subtree = self.tree.subtree(element);
        self.tree.detach(element)?;
        self.forget_elements(&subtree);
        Ok(())
    }

    /// Remove `element` and its subtree from the panel.
    pub fn remove_element(&mut self, element: ElementId) -> Result<()> {
        let removed = self.tree.remove(element)?;
        self.forget_elements(&removed);
        Ok(())
    }

    fn forget_elements(&mut self, elements: &[ElementId]) {
        self.capture.release_elements(elements);
        self.focus.clear_elements(elements);
        self.under_pointer.clear_elements(elements);
    }

    /// Register `callback` on `element`. Returns `false` when the same callback is
    /// already registered for `kind` and `phase`.
    pub fn register_callback(
        &mut self,
        element: ElementId,
        kind: EventKind,
        phase: CallbackPhase,
        callback: EventCallback,
    ) -> Result<bool> {
        let registry = self
            .tree
            .callbacks_mut(element)
            .ok_or(EventError::UnknownElement(element))?;
        Ok(registry.register(kind, callback, phase))
    }

    pub fn unregister_callback(
        &mut self,
        element: ElementId,
        kind: EventKind,
        phase: CallbackPhase,
        callback: &EventCallback,
    ) -> Result<bool> {
        let registry = self
            .tree
            .callbacks_mut(element)
            .ok_or(EventError::UnknownElement(element))?;
        Ok(registry.unregister(kind, callback, phase))
    }

    /// Listen to `kind` on `element` in the target and bubble-up phases. The
    /// returned callback can be passed to [`unregister_callback`](Self::unregister_callback).
    pub fn on(
        &mut self,
        element: ElementId,
        kind: EventKind,
        f: impl Fn(&mut EventCx<'_>, &mut Event) + 'static,
    ) -> Result<EventCallback> {
        let cb = callback(f);
        self.register_callback(element, kind, CallbackPhase::TargetAndBubbleUp, cb.clone())?;
        Ok(cb)
    }

    /// Listen to `kind` on `element` in the trickle-down and target phases.
    pub fn on_trickle_down(
        &mut self,
        element: ElementId,
        kind: EventKind,
        f: impl Fn(&mut EventCx<'_>, &mut Event) + 'static,
    ) -> Result<EventCallback> {
        let cb = callback(f);
        self.register_callback(element, kind, CallbackPhase::TrickleDownAndTarget, cb.clone())?;
        Ok(cb)
    }
}

impl std::fmt::Debug for Panel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Panel")
            .field("id", &self.id)
            .field("elements", &self.tree.element_count())
            .field("focused", &self.focused_element())
            .field("pool", &self.dispatcher.pool)
            .finish_non_exhaustive()
    }
}
