use std::rc::Rc;

use peniko::kurbo::Rect;

use super::{ElementBehavior, NativeInputSurface, PickingMode};
use crate::event::callback::CallbackRegistry;

/// Per-element data stored by the [`ElementTree`](super::ElementTree).
pub struct ElementState {
    pub(crate) name: Option<String>,
    pub(crate) enabled: bool,
    pub(crate) visible: bool,
    pub(crate) picking: PickingMode,
    pub(crate) composite_root: bool,
    pub(crate) focusable: bool,
    /// Bounds in panel coordinates.
    pub(crate) bounds: Rect,
    pub(crate) callbacks: CallbackRegistry,
    pub(crate) behavior: Option<Rc<dyn ElementBehavior>>,
    pub(crate) native_surface: Option<Rc<dyn NativeInputSurface>>,
}

impl Default for ElementState {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementState {
    pub fn new() -> Self {
        Self {
            name: None,
            enabled: true,
            visible: true,
            picking: PickingMode::Position,
            composite_root: false,
            focusable: false,
            bounds: Rect::ZERO,
            callbacks: CallbackRegistry::new(),
            behavior: None,
            native_surface: None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether the element itself is enabled, ignoring its ancestors.
    pub fn is_enabled_self(&self) -> bool {
        self.enabled
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn picking_mode(&self) -> PickingMode {
        self.picking
    }

    pub fn is_composite_root(&self) -> bool {
        self.composite_root
    }

    pub fn is_focusable(&self) -> bool {
        self.focusable
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.callbacks
    }

    pub fn has_behavior(&self) -> bool {
        self.behavior.is_some()
    }

    pub fn is_native_surface(&self) -> bool {
        self.native_surface.is_some()
    }
}

impl std::fmt::Debug for ElementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementState")
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .field("visible", &self.visible)
            .field("picking", &self.picking)
            .field("composite_root", &self.composite_root)
            .field("focusable", &self.focusable)
            .field("bounds", &self.bounds)
            .field("callbacks", &self.callbacks.len())
            .finish_non_exhaustive()
    }
}
