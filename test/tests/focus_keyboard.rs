//! Tests for focus changes and focus-routed events (keyboard, command,
//! navigation), including native input surfaces.

use std::cell::RefCell;
use std::rc::Rc;

use floem_dispatch::DispatchConfig;
use floem_dispatch::event::{NavigationDirection, RawInput, RawInputKind};
use floem_dispatch::ui_events::keyboard::{Key, NamedKey};
use floem_dispatch_test::prelude::*;
use serial_test::serial;

struct Form {
    harness: TestHarness,
    form: ElementId,
    a: ElementId,
    b: ElementId,
}

/// root > form (0..100, not focusable) > [a (0..40), b (60..100)], both focusable.
fn form_with_config(config: DispatchConfig) -> Form {
    init_logs();
    let mut harness = TestHarness::with_config(config);
    let root = harness.root();
    let form = harness.add(root, "form", Rect::new(0.0, 0.0, 100.0, 100.0));
    let a = harness.add(form, "a", Rect::new(0.0, 0.0, 40.0, 100.0));
    let b = harness.add(form, "b", Rect::new(60.0, 0.0, 100.0, 100.0));
    let tree = harness.panel_mut().tree_mut();
    tree.set_focusable(a, true).unwrap();
    tree.set_focusable(b, true).unwrap();
    Form { harness, form, a, b }
}

fn form() -> Form {
    form_with_config(DispatchConfig::default())
}

fn enter() -> Key {
    Key::Named(NamedKey::Enter)
}

/// A native surface that records what it was offered.
struct RecordingSurface {
    seen: Rc<RefCell<Vec<EventKind>>>,
    consume: bool,
}

impl NativeInputSurface for RecordingSurface {
    fn handle_native_event(&self, _cx: &mut EventCx<'_>, event: &mut Event) -> bool {
        self.seen.borrow_mut().push(event.kind());
        self.consume
    }
}

#[test]
#[serial]
fn test_key_without_focus_goes_to_root() {
    let Form { mut harness, .. } = form();
    let root = harness.root();
    let tracker = EventTracker::new();
    tracker.track(harness.panel_mut(), root, EventKind::KeyDown);

    harness.key_down(enter());

    let calls = tracker.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].target, Some(root));
    assert_eq!(calls[0].phase, PropagationPhase::AtTarget);
}

#[test]
#[serial]
fn test_key_goes_to_focused_element_and_bubbles() {
    let Form {
        mut harness,
        form,
        a,
        ..
    } = form();
    let tracker = EventTracker::new();
    let panel = harness.panel_mut();
    tracker.track(panel, a, EventKind::KeyDown);
    tracker.track(panel, form, EventKind::KeyDown);
    panel.focus(a).unwrap();

    harness.key_down(enter());

    assert_eq!(
        tracker.names_and_phases(),
        vec![
            ("a".to_string(), PropagationPhase::AtTarget),
            ("form".to_string(), PropagationPhase::BubbleUp),
        ]
    );
}

#[test]
#[serial]
fn test_focus_change_event_order() {
    let Form {
        mut harness,
        form,
        a,
        b,
    } = form();
    let tracker = EventTracker::new();
    let kinds = [
        EventKind::FocusOut,
        EventKind::FocusIn,
        EventKind::Blur,
        EventKind::Focus,
    ];
    let panel = harness.panel_mut();
    for el in [form, a, b] {
        tracker.track_all(panel, el, &kinds);
    }

    panel.focus(a).unwrap();
    tracker.clear();
    panel.focus(b).unwrap();

    let calls = tracker.calls();
    let seen: Vec<_> = calls
        .iter()
        .map(|c| (c.name.as_str(), c.kind, c.related_target))
        .collect();
    assert_eq!(
        seen,
        vec![
            ("a", EventKind::FocusOut, Some(b)),
            ("form", EventKind::FocusOut, Some(b)),
            ("b", EventKind::FocusIn, Some(a)),
            ("form", EventKind::FocusIn, Some(a)),
            ("a", EventKind::Blur, Some(b)),
            ("b", EventKind::Focus, Some(a)),
        ]
    );

    // focusing the focused element is a no-op
    tracker.clear();
    harness.panel_mut().focus(b).unwrap();
    assert!(tracker.calls().is_empty());
}

#[test]
#[serial]
fn test_pointer_down_focuses_and_blurs() {
    let Form {
        mut harness, a, ..
    } = form();

    harness.pointer_down(20.0, 50.0);
    assert_eq!(harness.panel().focused_element(), Some(a));

    // the gap between a and b only hits the non-focusable form
    harness.pointer_down(50.0, 50.0);
    assert_eq!(harness.panel().focused_element(), None);
}

#[test]
#[serial]
fn test_pointer_down_focuses_focusable_ancestor() {
    let Form {
        mut harness, a, ..
    } = form();
    let inner = harness.add(a, "inner", Rect::new(10.0, 10.0, 30.0, 30.0));

    harness.pointer_down(20.0, 20.0);
    assert_eq!(harness.element_under_mouse(), Some(inner));
    assert_eq!(harness.panel().focused_element(), Some(a));
}

#[test]
#[serial]
fn test_prevented_pointer_down_does_not_focus() {
    let Form {
        mut harness, a, ..
    } = form();
    harness
        .panel_mut()
        .on(a, EventKind::PointerDown, |_cx, event| event.prevent_default())
        .unwrap();

    let result = harness.pointer_down(20.0, 50.0);
    assert!(result.default_prevented);
    assert_eq!(harness.panel().focused_element(), None);
}

#[test]
#[serial]
fn test_pointer_down_focus_can_be_disabled() {
    let Form { mut harness, .. } =
        form_with_config(DispatchConfig::default().focus_on_pointer_down(false));
    harness.pointer_down(20.0, 50.0);
    assert_eq!(harness.panel().focused_element(), None);
}

#[test]
#[serial]
fn test_disabled_element_is_not_focused_by_pointer() {
    let Form {
        mut harness, a, ..
    } = form();
    harness.panel_mut().tree_mut().set_enabled(a, false).unwrap();

    harness.pointer_down(20.0, 50.0);
    assert_eq!(harness.panel().focused_element(), None);
}

#[test]
#[serial]
fn test_navigation_moves_focus_in_tree_order() {
    let Form {
        mut harness, a, b, ..
    } = form();

    harness.dispatch(Event::navigation_move(NavigationDirection::Next));
    assert_eq!(harness.panel().focused_element(), Some(a));
    harness.dispatch(Event::navigation_move(NavigationDirection::Next));
    assert_eq!(harness.panel().focused_element(), Some(b));
    harness.dispatch(Event::navigation_move(NavigationDirection::Next));
    assert_eq!(harness.panel().focused_element(), Some(a));
    harness.dispatch(Event::navigation_move(NavigationDirection::Previous));
    assert_eq!(harness.panel().focused_element(), Some(b));

    // spatial directions leave focus alone
    harness.dispatch(Event::navigation_move(NavigationDirection::Left));
    assert_eq!(harness.panel().focused_element(), Some(b));
}

#[test]
#[serial]
fn test_prevented_navigation_keeps_focus() {
    let Form {
        mut harness, a, ..
    } = form();
    let root = harness.root();
    let panel = harness.panel_mut();
    panel.focus(a).unwrap();
    panel
        .on(root, EventKind::NavigationMove, |_cx, event| {
            event.prevent_default()
        })
        .unwrap();

    harness.dispatch(Event::navigation_move(NavigationDirection::Next));
    assert_eq!(harness.panel().focused_element(), Some(a));
}

#[test]
#[serial]
fn test_command_goes_to_focused_element() {
    let Form {
        mut harness, b, ..
    } = form();
    let names = Rc::new(RefCell::new(Vec::new()));
    let n = names.clone();
    let panel = harness.panel_mut();
    panel
        .on(b, EventKind::ExecuteCommand, move |_cx, event| {
            let name = event.command_data().map(|c| c.name.clone());
            n.borrow_mut().push(name);
        })
        .unwrap();
    panel.focus(b).unwrap();

    harness.dispatch(Event::execute_command("copy"));
    assert_eq!(*names.borrow(), vec![Some("copy".to_string())]);
}

#[test]
#[serial]
fn test_focused_native_surface_consumes_keys() {
    let Form {
        mut harness,
        form,
        a,
        ..
    } = form();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let tracker = EventTracker::new();
    let panel = harness.panel_mut();
    tracker.track(panel, form, EventKind::KeyDown);
    panel
        .tree_mut()
        .set_native_surface(
            a,
            Some(Rc::new(RecordingSurface {
                seen: seen.clone(),
                consume: true,
            })),
        )
        .unwrap();
    panel.focus(a).unwrap();

    let result = harness.key_down(enter());

    assert_eq!(*seen.borrow(), vec![EventKind::KeyDown]);
    assert!(tracker.calls().is_empty());
    assert!(result.handled);
    assert!(result.default_prevented);
}

#[test]
#[serial]
fn test_focused_native_surface_can_pass_keys_on() {
    let Form {
        mut harness,
        form,
        a,
        ..
    } = form();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let tracker = EventTracker::new();
    let panel = harness.panel_mut();
    tracker.track(panel, form, EventKind::KeyDown);
    panel
        .tree_mut()
        .set_native_surface(
            a,
            Some(Rc::new(RecordingSurface {
                seen: seen.clone(),
                consume: false,
            })),
        )
        .unwrap();
    panel.focus(a).unwrap();

    harness.key_down(enter());

    assert_eq!(*seen.borrow(), vec![EventKind::KeyDown]);
    assert_eq!(tracker.names(), vec!["form"]);
}

#[test]
#[serial]
fn test_unhandled_raw_key_is_offered_to_surfaces() {
    let Form {
        mut harness, b, ..
    } = form();
    let seen = Rc::new(RefCell::new(Vec::new()));
    harness
        .panel_mut()
        .tree_mut()
        .set_native_surface(
            b,
            Some(Rc::new(RecordingSurface {
                seen: seen.clone(),
                consume: true,
            })),
        )
        .unwrap();

    let raw = RawInput::new(RawInputKind::KeyDown).with_key(enter());
    let result = harness.dispatch(Event::from_raw_input(&raw));
    assert_eq!(*seen.borrow(), vec![EventKind::KeyDown]);
    assert!(result.handled);

    // a synthesized key without a raw snapshot is never offered
    seen.borrow_mut().clear();
    harness.key_down(enter());
    assert!(seen.borrow().is_empty());
}

#[test]
#[serial]
fn test_raw_key_handled_by_focused_element_is_not_offered() {
    let Form {
        mut harness, a, b, ..
    } = form();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let panel = harness.panel_mut();
    panel
        .tree_mut()
        .set_native_surface(
            b,
            Some(Rc::new(RecordingSurface {
                seen: seen.clone(),
                consume: true,
            })),
        )
        .unwrap();
    panel.focus(a).unwrap();

    let raw = RawInput::new(RawInputKind::KeyDown).with_key(enter());
    harness.dispatch(Event::from_raw_input(&raw));
    assert!(seen.borrow().is_empty());
}

#[test]
#[serial]
fn test_detaching_focused_element_clears_focus_silently() {
    let Form {
        mut harness, a, ..
    } = form();
    let tracker = EventTracker::new();
    let panel = harness.panel_mut();
    tracker.track_all(panel, a, &[EventKind::Blur, EventKind::FocusOut]);
    panel.focus(a).unwrap();

    panel.detach_element(a).unwrap();
    assert_eq!(panel.focused_element(), None);
    assert!(tracker.calls().is_empty());
    assert_eq!(
        panel.focus(a),
        Err(floem_dispatch::EventError::DetachedElement(a))
    );
}
