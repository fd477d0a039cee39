use super::Panel;
use crate::element::ElementId;
use crate::error::{EventError, Result};
use crate::event::{Event, EventKind, NavigationDirection};

#[derive(Debug, Default)]
pub(crate) struct FocusController {
    focused: Option<ElementId>,
}

impl FocusController {
    pub(crate) fn focused(&self) -> Option<ElementId> {
        self.focused
    }

    /// Drop focus without notifications if it lies in `elements`.
    pub(crate) fn clear_elements(&mut self, elements: &[ElementId]) {
        if self.focused.is_some_and(|el| elements.contains(&el)) {
            self.focused = None;
        }
    }
}

impl Panel {
    /// The focused element. Keyboard, command and navigation events go here.
    pub fn focused_element(&self) -> Option<ElementId> {
        self.focus
            .focused()
            .filter(|el| self.tree.is_attached(*el))
    }

    /// Move focus to `element`, sending the focus-out, focus-in, blur and focus
    /// events. Focusing the focused element does nothing.
    pub fn focus(&mut self, element: ElementId) -> Result<()> {
        let Some(state) = self.tree.state(element) else {
            return Err(EventError::UnknownElement(element));
        };
        if !state.is_focusable() || !self.tree.enabled_in_hierarchy(element) {
            return Err(EventError::NotFocusable(element));
        }
        if !self.tree.is_attached(element) {
            return Err(EventError::DetachedElement(element));
        }
        self.change_focus(Some(element));
        Ok(())
    }

    pub fn blur(&mut self) {
        self.change_focus(None);
    }

    /// Focus the next or previous focusable element in tree order, wrapping
    /// around. Other directions are ignored.
    pub fn focus_next(&mut self, direction: NavigationDirection) {
        let forward = match direction {
            NavigationDirection::Next => true,
            NavigationDirection::Previous => false,
            _ => return,
        };
        let tree = &self.tree;
        let candidates: Vec<ElementId> = tree
            .subtree(tree.root())
            .into_iter()
            .filter(|el| {
                tree.state(*el).is_some_and(|s| s.is_focusable() && s.is_visible())
                    && tree.enabled_in_hierarchy(*el)
            })
            .collect();
        if candidates.is_empty() {
            return;
        }
        let len = candidates.len();
        let next = match self
            .focused_element()
            .and_then(|el| candidates.iter().position(|c| *c == el))
        {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None if forward => 0,
            None => len - 1,
        };
        self.change_focus(Some(candidates[next]));
    }

    fn change_focus(&mut self, new: Option<ElementId>) {
        let old = self.focused_element();
        if old == new {
            return;
        }
        log::debug!("focus: {old:?} -> {new:?}");
        self.focus.focused = new;

        self.send_focus_event(EventKind::FocusOut, old, new);
        self.send_focus_event(EventKind::FocusIn, new, old);
        self.send_focus_event(EventKind::Blur, old, new);
        self.send_focus_event(EventKind::Focus, new, old);
    }

    fn send_focus_event(
        &mut self,
        kind: EventKind,
        target: Option<ElementId>,
        related: Option<ElementId>,
    ) {
        if let Some(target) = target {
            let mut event = Event::new(kind).with_target(target);
            event.set_related_target(related);
            self.dispatch(event);
        }
    }
}
