//! Tests for enter/leave/over/out tracking.
//!
//! Leave notifications for the previous element always precede enter
//! notifications for the new one, and transitions stop at the nearest common
//! ancestor.

use floem_dispatch::DispatchConfig;
use floem_dispatch_test::prelude::*;
use serial_test::serial;

const HOVER_KINDS: &[EventKind] = &[EventKind::PointerEnter, EventKind::PointerLeave];

fn names_and_kinds(pairs: &[(&str, EventKind)]) -> Vec<(String, EventKind)> {
    pairs.iter().map(|(n, k)| (n.to_string(), *k)).collect()
}

#[test]
#[serial]
fn test_enter_and_leave_follow_the_hierarchy() {
    init_logs();
    let mut harness = TestHarness::new();
    let root = harness.root();
    let outer = harness.add(root, "outer", Rect::new(0.0, 0.0, 100.0, 100.0));
    let inner = harness.add(outer, "inner", Rect::new(25.0, 25.0, 75.0, 75.0));
    let tracker = EventTracker::new();
    for el in [root, outer, inner] {
        tracker.track_all(harness.panel_mut(), el, HOVER_KINDS);
    }

    harness.pointer_move(50.0, 50.0);
    assert_eq!(
        tracker.names_and_kinds(),
        names_and_kinds(&[
            ("root", EventKind::PointerEnter),
            ("outer", EventKind::PointerEnter),
            ("inner", EventKind::PointerEnter),
        ])
    );
    assert_eq!(harness.element_under_mouse(), Some(inner));

    tracker.clear();
    harness.pointer_move(10.0, 10.0);
    assert_eq!(
        tracker.names_and_kinds(),
        names_and_kinds(&[("inner", EventKind::PointerLeave)])
    );

    tracker.clear();
    harness.pointer_move(500.0, 500.0);
    assert_eq!(
        tracker.names_and_kinds(),
        names_and_kinds(&[
            ("outer", EventKind::PointerLeave),
            ("root", EventKind::PointerLeave),
        ])
    );
    assert_eq!(harness.element_under_mouse(), None);
}

#[test]
#[serial]
fn test_leave_precedes_enter_between_siblings() {
    let mut harness = TestHarness::new();
    let root = harness.root();
    let a = harness.add(root, "a", Rect::new(0.0, 0.0, 50.0, 100.0));
    let b = harness.add(root, "b", Rect::new(50.0, 0.0, 100.0, 100.0));
    let tracker = EventTracker::new();
    let panel = harness.panel_mut();
    tracker.track_all(panel, a, HOVER_KINDS);
    tracker.track_all(panel, b, HOVER_KINDS);
    tracker.track(panel, a, EventKind::PointerOut);
    tracker.track(panel, b, EventKind::PointerOver);

    harness.pointer_move(25.0, 50.0);
    tracker.clear();
    harness.pointer_move(75.0, 50.0);

    let calls = tracker.calls();
    let seen: Vec<_> = calls
        .iter()
        .map(|c| (c.name.as_str(), c.kind, c.related_target))
        .collect();
    assert_eq!(
        seen,
        vec![
            ("a", EventKind::PointerLeave, Some(b)),
            ("b", EventKind::PointerEnter, Some(a)),
            ("a", EventKind::PointerOut, Some(b)),
            ("b", EventKind::PointerOver, Some(a)),
        ]
    );
}

#[test]
#[serial]
fn test_over_and_out_bubble() {
    let mut harness = TestHarness::new();
    let root = harness.root();
    let parent = harness.add(root, "parent", Rect::new(0.0, 0.0, 100.0, 100.0));
    let a = harness.add(parent, "a", Rect::new(0.0, 0.0, 50.0, 100.0));
    let _b = harness.add(parent, "b", Rect::new(50.0, 0.0, 100.0, 100.0));
    let tracker = EventTracker::new();
    let panel = harness.panel_mut();
    tracker.track_all(
        panel,
        parent,
        &[
            EventKind::PointerOver,
            EventKind::PointerOut,
            EventKind::PointerEnter,
            EventKind::PointerLeave,
        ],
    );

    harness.pointer_move(25.0, 50.0);
    tracker.clear();
    harness.pointer_move(75.0, 50.0);

    // moving between children does not leave the parent, but over/out bubble
    // up from the children
    assert_eq!(
        tracker.names_and_kinds(),
        names_and_kinds(&[
            ("parent", EventKind::PointerOut),
            ("parent", EventKind::PointerOver),
        ])
    );
    let calls = tracker.calls();
    assert_eq!(calls[0].phase, PropagationPhase::BubbleUp);
    assert_eq!(calls[0].target, Some(a));
}

#[test]
#[serial]
fn test_mouse_hover_events_mirror_pointer() {
    let mut harness = TestHarness::new();
    let root = harness.root();
    let a = harness.add(root, "a", Rect::new(0.0, 0.0, 50.0, 100.0));
    let tracker = EventTracker::new();
    tracker.track_all(
        harness.panel_mut(),
        a,
        &[EventKind::PointerEnter, EventKind::MouseEnter, EventKind::MouseOver],
    );

    harness.pointer_move(25.0, 50.0);
    assert_eq!(
        tracker.names_and_kinds(),
        names_and_kinds(&[
            ("a", EventKind::PointerEnter),
            ("a", EventKind::MouseEnter),
            ("a", EventKind::MouseOver),
        ])
    );
}

#[test]
#[serial]
fn test_no_mouse_hover_events_without_compatibility() {
    let mut harness =
        TestHarness::with_config(DispatchConfig::default().compatibility_mouse_events(false));
    let root = harness.root();
    let a = harness.add(root, "a", Rect::new(0.0, 0.0, 50.0, 100.0));
    let tracker = EventTracker::new();
    tracker.track_all(
        harness.panel_mut(),
        a,
        &[EventKind::PointerEnter, EventKind::MouseEnter],
    );

    harness.pointer_move(25.0, 50.0);
    assert_eq!(
        tracker.names_and_kinds(),
        names_and_kinds(&[("a", EventKind::PointerEnter)])
    );
}

#[test]
#[serial]
fn test_touch_pointers_are_tracked_separately() {
    let mut harness = TestHarness::new();
    let root = harness.root();
    let a = harness.add(root, "a", Rect::new(0.0, 0.0, 50.0, 100.0));
    let b = harness.add(root, "b", Rect::new(50.0, 0.0, 100.0, 100.0));

    harness.pointer_move(25.0, 50.0);
    harness.touch_down(1, 75.0, 50.0);

    let panel = harness.panel();
    assert_eq!(panel.element_under_pointer(PointerId::MOUSE), Some(a));
    assert_eq!(
        panel.element_under_pointer(PointerId::touch(1).unwrap()),
        Some(b)
    );
}

#[test]
#[serial]
fn test_leaving_window_clears_hover() {
    let mut harness = TestHarness::new();
    let root = harness.root();
    let a = harness.add(root, "a", Rect::new(0.0, 0.0, 50.0, 100.0));
    let tracker = EventTracker::new();
    tracker.track_all(harness.panel_mut(), a, HOVER_KINDS);

    harness.pointer_down(25.0, 50.0);
    assert!(
        harness
            .panel()
            .device()
            .borrow()
            .is_button_pressed(PointerId::MOUSE, MouseButton::Primary)
    );
    tracker.clear();

    harness.mouse_leave_window(25.0, 50.0);
    assert_eq!(
        tracker.names_and_kinds(),
        names_and_kinds(&[("a", EventKind::PointerLeave)])
    );
    assert_eq!(harness.element_under_mouse(), None);
    assert_eq!(
        harness
            .panel()
            .device()
            .borrow()
            .pressed_buttons(PointerId::MOUSE),
        0
    );
}

#[test]
#[serial]
fn test_detached_element_gets_no_leave() {
    let mut harness = TestHarness::new();
    let root = harness.root();
    let a = harness.add(root, "a", Rect::new(0.0, 0.0, 50.0, 100.0));
    let tracker = EventTracker::new();
    tracker.track_all(harness.panel_mut(), a, HOVER_KINDS);
    tracker.track(harness.panel_mut(), a, EventKind::PointerOut);

    harness.pointer_move(25.0, 50.0);
    tracker.clear();

    harness.panel_mut().detach_element(a).unwrap();
    harness.pointer_move(25.0, 50.0);
    assert!(tracker.calls().is_empty());
}

#[test]
#[serial]
fn test_set_element_under_pointer_commits_after_dispatch() {
    let mut harness = TestHarness::new();
    let root = harness.root();
    let a = harness.add(root, "a", Rect::new(0.0, 0.0, 50.0, 100.0));
    let tracker = EventTracker::new();
    tracker.track_all(harness.panel_mut(), a, HOVER_KINDS);

    let panel = harness.panel_mut();
    panel.set_element_under_pointer(Some(a), PointerId::MOUSE, Point::new(1.0, 1.0));
    assert!(tracker.calls().is_empty());
    panel.commit_element_under_pointers();
    assert_eq!(
        tracker.names_and_kinds(),
        names_and_kinds(&[("a", EventKind::PointerEnter)])
    );
}

#[test]
#[serial]
fn test_transition_between_disjoint_branches() {
    init_logs();
    let mut harness = TestHarness::new();
    let root = harness.root();
    // root > a1 > x (depth 3) and root > b1 > b2 > b3 > y (depth 5)
    let a1 = harness.add(root, "a1", Rect::new(0.0, 0.0, 50.0, 100.0));
    let x = harness.add(a1, "x", Rect::new(0.0, 0.0, 50.0, 100.0));
    let b1 = harness.add(root, "b1", Rect::new(50.0, 0.0, 100.0, 100.0));
    let b2 = harness.add(b1, "b2", Rect::new(50.0, 0.0, 100.0, 100.0));
    let b3 = harness.add(b2, "b3", Rect::new(50.0, 0.0, 100.0, 100.0));
    let y = harness.add(b3, "y", Rect::new(50.0, 0.0, 100.0, 100.0));
    let tracker = EventTracker::new();
    let kinds = [
        EventKind::PointerEnter,
        EventKind::PointerLeave,
        EventKind::PointerOver,
        EventKind::PointerOut,
    ];
    for el in [root, a1, x, b1, b2, b3, y] {
        tracker.track_all(harness.panel_mut(), el, &kinds);
    }

    harness.pointer_move(25.0, 50.0);
    assert_eq!(harness.element_under_mouse(), Some(x));
    tracker.clear();
    harness.pointer_move(75.0, 50.0);
    assert_eq!(harness.element_under_mouse(), Some(y));

    // over/out bubble, so only look at their targets
    let calls = tracker.calls();
    let at_target: Vec<_> = calls
        .iter()
        .filter(|c| c.phase == PropagationPhase::AtTarget)
        .map(|c| (c.name.clone(), c.kind))
        .collect();
    assert_eq!(
        at_target,
        names_and_kinds(&[
            ("x", EventKind::PointerLeave),
            ("a1", EventKind::PointerLeave),
            ("b1", EventKind::PointerEnter),
            ("b2", EventKind::PointerEnter),
            ("b3", EventKind::PointerEnter),
            ("y", EventKind::PointerEnter),
            ("x", EventKind::PointerOut),
            ("y", EventKind::PointerOver),
        ])
    );
    assert!(!calls.iter().any(|c| {
        c.name == "root" && matches!(c.kind, EventKind::PointerEnter | EventKind::PointerLeave)
    }));

    // one out for x and one over for y, seen along their ancestor chains
    let count = |target: ElementId, kind: EventKind| {
        calls
            .iter()
            .filter(|c| c.target == Some(target) && c.kind == kind)
            .count()
    };
    assert_eq!(count(x, EventKind::PointerOut), 3);
    assert_eq!(count(y, EventKind::PointerOver), 5);
    assert_eq!(count(y, EventKind::PointerOut), 0);
    assert_eq!(count(x, EventKind::PointerOver), 0);
}
