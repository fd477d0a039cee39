use std::cell::RefCell;
use std::rc::Rc;

use peniko::kurbo::{Point, Rect};
use slotmap::{SecondaryMap, SlotMap};

use super::{ElementBehavior, ElementId, ElementState, NativeInputSurface, PickingMode};
use crate::error::{EventError, Result};
use crate::event::callback::CallbackRegistry;

// ============================================================================
// Hit Test Result Cache
// ============================================================================
//
// Two entries are enough for the common case of several events arriving at the
// same position (down, up and click), including alternation between two points.

#[derive(Clone, Copy)]
struct HitTestCacheEntry {
    point: Point,
    result: Option<ElementId>,
}

struct HitTestCache {
    entries: [Option<HitTestCacheEntry>; 2],
    /// Index of next slot to write (round-robin)
    next_slot: usize,
}

impl HitTestCache {
    const fn new() -> Self {
        Self {
            entries: [None, None],
            next_slot: 0,
        }
    }

    /// Returns `Some(result)` on a cache hit.
    #[inline]
    fn lookup(&self, point: Point) -> Option<Option<ElementId>> {
        for e in self.entries.iter().flatten() {
            // exact match only
            if e.point.x.to_bits() == point.x.to_bits() && e.point.y.to_bits() == point.y.to_bits()
            {
                return Some(e.result);
            }
        }
        None
    }

    #[inline]
    fn insert(&mut self, point: Point, result: Option<ElementId>) {
        self.entries[self.next_slot] = Some(HitTestCacheEntry { point, result });
        self.next_slot = (self.next_slot + 1) % 2;
    }

    #[inline]
    fn clear(&mut self) {
        self.entries = [None, None];
    }
}

/// Arena holding the element hierarchy of one panel.
///
/// The tree always has a root element, which can be neither detached nor removed.
/// Elements created with [`create`](Self::create) start detached; they only take
/// part in dispatch once appended somewhere below the root.
pub struct ElementTree {
    ids: SlotMap<ElementId, ()>,
    parent: SecondaryMap<ElementId, Option<ElementId>>,
    children: SecondaryMap<ElementId, Vec<ElementId>>,
    states: SecondaryMap<ElementId, ElementState>,
    root: ElementId,
    hit_test_cache: RefCell<HitTestCache>,
    hit_test_cache_enabled: bool,
}

impl Default for ElementTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementTree {
    pub fn new() -> Self {
        let mut ids = SlotMap::with_key();
        let root = ids.insert(());
        let mut parent = SecondaryMap::new();
        parent.insert(root, None);
        let mut children = SecondaryMap::new();
        children.insert(root, Vec::new());
        let mut root_state = ElementState::new();
        root_state.name = Some("root".to_string());
        let mut states = SecondaryMap::new();
        states.insert(root, root_state);

        Self {
            ids,
            parent,
            children,
            states,
            root,
            hit_test_cache: RefCell::new(HitTestCache::new()),
            hit_test_cache_enabled: true,
        }
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    /// Number of live elements, attached or not, including the root.
    pub fn element_count(&self) -> usize {
        self.ids.len()
    }

    /// Create a new detached element.
    pub fn create(&mut self) -> ElementId {
        let id = self.ids.insert(());
        self.parent.insert(id, None);
        self.children.insert(id, Vec::new());
        self.states.insert(id, ElementState::new());
        id
    }

    pub fn create_named(&mut self, name: impl Into<String>) -> ElementId {
        let id = self.create();
        self.states[id].name = Some(name.into());
        id
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.ids.contains_key(id)
    }

    fn check(&self, id: ElementId) -> Result<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(EventError::UnknownElement(id))
        }
    }

    pub fn state(&self, id: ElementId) -> Option<&ElementState> {
        self.states.get(id)
    }

    pub(crate) fn state_mut(&mut self, id: ElementId) -> Option<&mut ElementState> {
        self.states.get_mut(id)
    }

    pub fn name(&self, id: ElementId) -> Option<&str> {
        self.states.get(id).and_then(|s| s.name())
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.parent.get(id).copied().flatten()
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Append `child` as the last (topmost) child of `parent`, detaching it from
    /// its previous parent first.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> Result<()> {
        self.insert_child(parent, usize::MAX, child)
    }

    /// Insert `child` at `index` among the children of `parent`. Indices past the
    /// end append.
    pub fn insert_child(&mut self, parent: ElementId, index: usize, child: ElementId) -> Result<()> {
        self.check(parent)?;
        self.check(child)?;
        if child == self.root {
            return Err(EventError::RootElement);
        }
        if self.is_ancestor_of(child, parent) {
            return Err(EventError::Cycle { parent, child });
        }

        self.unlink(child);
        let siblings = &mut self.children[parent];
        let index = index.min(siblings.len());
        siblings.insert(index, child);
        self.parent[child] = Some(parent);
        self.clear_hit_test_cache();
        Ok(())
    }

    fn unlink(&mut self, id: ElementId) {
        if let Some(Some(parent)) = self.parent.get(id).copied()
            && let Some(siblings) = self.children.get_mut(parent)
        {
            siblings.retain(|c| *c != id);
        }
        if let Some(parent) = self.parent.get_mut(id) {
            *parent = None;
        }
    }

    /// Detach an element (and its subtree) from its parent. The elements stay
    /// alive and can be appended again.
    pub fn detach(&mut self, id: ElementId) -> Result<()> {
        self.check(id)?;
        if id == self.root {
            return Err(EventError::RootElement);
        }
        self.unlink(id);
        self.clear_hit_test_cache();
        Ok(())
    }

    /// Remove an element and its whole subtree, returning the removed ids in
    /// pre-order.
    pub fn remove(&mut self, id: ElementId) -> Result<Vec<ElementId>> {
        self.check(id)?;
        if id == self.root {
            return Err(EventError::RootElement);
        }
        self.unlink(id);
        let removed = self.subtree(id);
        for el in &removed {
            self.ids.remove(*el);
            self.parent.remove(*el);
            self.children.remove(*el);
            self.states.remove(*el);
        }
        self.clear_hit_test_cache();
        Ok(removed)
    }

    /// The element followed by all of its descendants, in pre-order.
    pub fn subtree(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(el) = stack.pop() {
            out.push(el);
            stack.extend(self.children(el).iter().rev().copied());
        }
        out
    }

    /// Iterate over the ancestors of `id`, parent first.
    pub fn ancestors(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        std::iter::successors(self.parent(id), move |el| self.parent(*el))
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor_of(&self, ancestor: ElementId, id: ElementId) -> bool {
        id == ancestor || self.ancestors(id).any(|el| el == ancestor)
    }

    /// Whether the element is reachable from the root.
    pub fn is_attached(&self, id: ElementId) -> bool {
        self.contains(id) && (id == self.root || self.ancestors(id).last() == Some(self.root))
    }

    /// Number of elements on the chain from the root to `id`, both included.
    /// The root has depth 1; unknown elements have depth 0.
    pub fn depth(&self, id: ElementId) -> usize {
        if !self.contains(id) {
            return 0;
        }
        1 + self.ancestors(id).count()
    }

    /// The deepest element that is an ancestor of (or equal to) both `a` and `b`.
    pub fn common_ancestor(&self, a: ElementId, b: ElementId) -> Option<ElementId> {
        let mut a = Some(a).filter(|a| self.contains(*a));
        let mut b = Some(b).filter(|b| self.contains(*b));
        let mut depth_a = a.map_or(0, |a| self.depth(a));
        let mut depth_b = b.map_or(0, |b| self.depth(b));
        while depth_a > depth_b {
            a = a.and_then(|a| self.parent(a));
            depth_a -= 1;
        }
        while depth_b > depth_a {
            b = b.and_then(|b| self.parent(b));
            depth_b -= 1;
        }
        while a != b {
            a = a.and_then(|a| self.parent(a));
            b = b.and_then(|b| self.parent(b));
        }
        a
    }

    /// Whether the element and all of its ancestors are enabled.
    pub fn enabled_in_hierarchy(&self, id: ElementId) -> bool {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .all(|el| self.states.get(el).is_some_and(|s| s.enabled))
    }

    fn update_state(&mut self, id: ElementId, f: impl FnOnce(&mut ElementState)) -> Result<()> {
        let state = self
            .states
            .get_mut(id)
            .ok_or(EventError::UnknownElement(id))?;
        f(state);
        Ok(())
    }

    pub fn set_name(&mut self, id: ElementId, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.update_state(id, |s| s.name = Some(name))
    }

    pub fn set_enabled(&mut self, id: ElementId, enabled: bool) -> Result<()> {
        self.update_state(id, |s| s.enabled = enabled)
    }

    /// Hidden elements and their subtrees are skipped by hit testing.
    pub fn set_visible(&mut self, id: ElementId, visible: bool) -> Result<()> {
        self.update_state(id, |s| s.visible = visible)?;
        self.clear_hit_test_cache();
        Ok(())
    }

    pub fn set_picking_mode(&mut self, id: ElementId, picking: PickingMode) -> Result<()> {
        self.update_state(id, |s| s.picking = picking)?;
        self.clear_hit_test_cache();
        Ok(())
    }

    pub fn set_composite_root(&mut self, id: ElementId, composite_root: bool) -> Result<()> {
        self.update_state(id, |s| s.composite_root = composite_root)
    }

    pub fn set_focusable(&mut self, id: ElementId, focusable: bool) -> Result<()> {
        self.update_state(id, |s| s.focusable = focusable)
    }

    /// Set the element's bounds in panel coordinates.
    pub fn set_bounds(&mut self, id: ElementId, bounds: Rect) -> Result<()> {
        self.update_state(id, |s| s.bounds = bounds)?;
        self.clear_hit_test_cache();
        Ok(())
    }

    pub fn set_behavior(
        &mut self,
        id: ElementId,
        behavior: Option<Rc<dyn ElementBehavior>>,
    ) -> Result<()> {
        self.update_state(id, |s| s.behavior = behavior)
    }

    pub fn set_native_surface(
        &mut self,
        id: ElementId,
        surface: Option<Rc<dyn NativeInputSurface>>,
    ) -> Result<()> {
        self.update_state(id, |s| s.native_surface = surface)
    }

    pub(crate) fn behavior(&self, id: ElementId) -> Option<Rc<dyn ElementBehavior>> {
        self.states.get(id).and_then(|s| s.behavior.clone())
    }

    pub(crate) fn native_surface(&self, id: ElementId) -> Option<Rc<dyn NativeInputSurface>> {
        self.states.get(id).and_then(|s| s.native_surface.clone())
    }

    pub(crate) fn callbacks_mut(&mut self, id: ElementId) -> Option<&mut CallbackRegistry> {
        self.states.get_mut(id).map(|s| &mut s.callbacks)
    }

    pub(crate) fn has_trickle_handlers(&self, id: ElementId) -> bool {
        self.states
            .get(id)
            .is_some_and(|s| s.callbacks.has_trickle_down_handlers())
    }

    pub(crate) fn has_bubble_handlers(&self, id: ElementId) -> bool {
        self.states
            .get(id)
            .is_some_and(|s| s.callbacks.has_bubble_up_handlers())
    }

    /// Find the topmost element under `point`.
    ///
    /// Later children are on top of earlier ones and children on top of their
    /// parent. Elements with [`PickingMode::Ignore`] are transparent but their
    /// children can still be hit.
    pub fn pick(&self, point: Point) -> Option<ElementId> {
        if self.hit_test_cache_enabled
            && let Some(result) = self.hit_test_cache.borrow().lookup(point)
        {
            return result;
        }
        let result = self.pick_from(self.root, point);
        if self.hit_test_cache_enabled {
            self.hit_test_cache.borrow_mut().insert(point, result);
        }
        result
    }

    fn pick_from(&self, id: ElementId, point: Point) -> Option<ElementId> {
        let state = self.states.get(id)?;
        if !state.visible {
            return None;
        }
        for child in self.children(id).iter().rev() {
            if let Some(hit) = self.pick_from(*child, point) {
                return Some(hit);
            }
        }
        (state.picking == PickingMode::Position && state.bounds.contains(point)).then_some(id)
    }

    /// Every attached element whose bounds contain `point`, topmost first.
    pub fn pick_all(&self, point: Point) -> Vec<ElementId> {
        let mut out = Vec::new();
        self.pick_all_from(self.root, point, &mut out);
        out
    }

    fn pick_all_from(&self, id: ElementId, point: Point, out: &mut Vec<ElementId>) {
        let Some(state) = self.states.get(id) else {
            return;
        };
        if !state.visible {
            return;
        }
        for child in self.children(id).iter().rev() {
            self.pick_all_from(*child, point, out);
        }
        if state.picking == PickingMode::Position && state.bounds.contains(point) {
            out.push(id);
        }
    }

    pub fn set_hit_test_cache_enabled(&mut self, enabled: bool) {
        self.hit_test_cache_enabled = enabled;
        self.clear_hit_test_cache();
    }

    /// Forget cached hit-test results. Called by every mutation that can change
    /// what is under a point.
    pub fn clear_hit_test_cache(&self) {
        self.hit_test_cache.borrow_mut().clear();
    }
}

impl std::fmt::Debug for ElementTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementTree")
            .field("root", &self.root)
            .field("elements", &self.ids.len())
            .finish_non_exhaustive()
    }
}
