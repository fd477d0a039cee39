//! Tests for pointer capture.
//!
//! These tests verify:
//! - Two-phase capture (pending → current) applied before the next pointer event
//! - `PointerCapture` / `PointerCaptureOut` notifications and their mouse mirrors
//! - Capture routing (events go to the capturing element, bypassing hit testing)
//! - Self-healing release when the capturing element leaves the panel
//! - Implicit release for touch contacts

use std::cell::RefCell;
use std::rc::Rc;

use floem_dispatch_test::prelude::*;
use serial_test::serial;

struct Split {
    harness: TestHarness,
    left: ElementId,
    right: ElementId,
}

/// Two side-by-side elements: left (0..50) and right (50..100).
fn split() -> Split {
    init_logs();
    let mut harness = TestHarness::new();
    let root = harness.root();
    let left = harness.add(root, "left", Rect::new(0.0, 0.0, 50.0, 100.0));
    let right = harness.add(root, "right", Rect::new(50.0, 0.0, 100.0, 100.0));
    Split {
        harness,
        left,
        right,
    }
}

const CAPTURE_KINDS: &[EventKind] = &[
    EventKind::PointerMove,
    EventKind::PointerCapture,
    EventKind::PointerCaptureOut,
];

#[test]
#[serial]
fn test_captured_pointer_events_go_to_capturer() {
    let Split {
        mut harness,
        left,
        right,
    } = split();
    let tracker = EventTracker::new();
    let panel = harness.panel_mut();
    tracker.track_all(panel, left, CAPTURE_KINDS);
    tracker.track_all(panel, right, CAPTURE_KINDS);

    panel.capture_pointer(left, PointerId::MOUSE).unwrap();
    // pending until the next pointer event
    assert_eq!(panel.capturing_element(PointerId::MOUSE), None);

    harness.pointer_move(75.0, 50.0);
    assert_eq!(
        tracker.names_and_kinds(),
        vec![
            ("left".to_string(), EventKind::PointerCapture),
            ("left".to_string(), EventKind::PointerMove),
        ]
    );
    let calls = tracker.calls();
    assert_eq!(calls[1].phase, PropagationPhase::AtTarget);
    assert_eq!(
        harness.panel().capturing_element(PointerId::MOUSE),
        Some(left)
    );
    // hover tracking keeps following the pointer
    assert_eq!(harness.element_under_mouse(), Some(right));
}

#[test]
#[serial]
fn test_release_restores_hit_testing() {
    let Split {
        mut harness,
        left,
        right,
    } = split();
    let tracker = EventTracker::new();
    let panel = harness.panel_mut();
    tracker.track_all(panel, left, CAPTURE_KINDS);
    tracker.track_all(panel, right, CAPTURE_KINDS);

    panel.capture_pointer(left, PointerId::MOUSE).unwrap();
    harness.pointer_move(75.0, 50.0);
    tracker.clear();

    harness.panel_mut().release_pointer(PointerId::MOUSE);
    harness.pointer_move(75.0, 50.0);

    assert_eq!(
        tracker.names_and_kinds(),
        vec![
            ("left".to_string(), EventKind::PointerCaptureOut),
            ("right".to_string(), EventKind::PointerMove),
        ]
    );
    assert_eq!(harness.panel().capturing_element(PointerId::MOUSE), None);
}

#[test]
#[serial]
fn test_capture_transfer_notifies_both_elements() {
    let Split {
        mut harness,
        left,
        right,
    } = split();
    let tracker = EventTracker::new();
    let panel = harness.panel_mut();
    tracker.track_all(
        panel,
        left,
        &[EventKind::PointerCapture, EventKind::PointerCaptureOut],
    );
    tracker.track_all(
        panel,
        right,
        &[EventKind::PointerCapture, EventKind::PointerCaptureOut],
    );

    panel.capture_pointer(left, PointerId::MOUSE).unwrap();
    panel.process_pointer_capture(PointerId::MOUSE);
    tracker.clear();

    // capturing with another element replaces the previous capture
    harness
        .panel_mut()
        .capture_pointer(right, PointerId::MOUSE)
        .unwrap();
    harness.pointer_move(10.0, 10.0);

    let calls = tracker.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        (calls[0].name.as_str(), calls[0].kind, calls[0].related_target),
        ("left", EventKind::PointerCaptureOut, Some(right))
    );
    assert_eq!(
        (calls[1].name.as_str(), calls[1].kind, calls[1].related_target),
        ("right", EventKind::PointerCapture, Some(left))
    );
}

#[test]
#[serial]
fn test_mouse_pointer_capture_is_mirrored() {
    let Split {
        mut harness, left, ..
    } = split();
    let tracker = EventTracker::new();
    let panel = harness.panel_mut();
    tracker.track_all(
        panel,
        left,
        &[
            EventKind::PointerCapture,
            EventKind::MouseCapture,
            EventKind::MouseMove,
        ],
    );

    panel.capture_pointer(left, PointerId::MOUSE).unwrap();
    harness.pointer_move(75.0, 50.0);

    assert_eq!(tracker.count(EventKind::PointerCapture), 1);
    assert_eq!(tracker.count(EventKind::MouseCapture), 1);
    // the compatibility move follows the pointer move to the capturer
    assert_eq!(tracker.count(EventKind::MouseMove), 1);
}

#[test]
#[serial]
fn test_capture_events_carry_their_category_payload() {
    let Split {
        mut harness, left, ..
    } = split();
    let payloads = Rc::new(RefCell::new(Vec::new()));
    let panel = harness.panel_mut();
    for kind in [EventKind::PointerCapture, EventKind::MouseCapture] {
        let p = payloads.clone();
        panel
            .on(left, kind, move |_cx, event| {
                p.borrow_mut().push((
                    event.kind(),
                    event.pointer_data().is_some(),
                    event.mouse_data().is_some(),
                ));
            })
            .unwrap();
    }

    panel.capture_pointer(left, PointerId::MOUSE).unwrap();
    harness.pointer_move(75.0, 50.0);

    assert_eq!(
        *payloads.borrow(),
        vec![
            (EventKind::PointerCapture, true, false),
            (EventKind::MouseCapture, false, true),
        ]
    );
}

#[test]
#[serial]
fn test_touch_capture_is_not_mirrored_to_mouse() {
    let Split {
        mut harness, left, ..
    } = split();
    let tracker = EventTracker::new();
    let panel = harness.panel_mut();
    tracker.track_all(panel, left, &[EventKind::PointerCapture, EventKind::MouseCapture]);

    let touch = PointerId::touch(0).unwrap();
    panel.capture_pointer(left, touch).unwrap();
    harness.touch_move(0, 75.0, 50.0);

    assert_eq!(tracker.count(EventKind::PointerCapture), 1);
    assert_eq!(tracker.count(EventKind::MouseCapture), 0);
}

#[test]
#[serial]
fn test_detached_capturer_is_released() {
    let Split {
        mut harness,
        left,
        right,
    } = split();
    let tracker = EventTracker::new();
    let panel = harness.panel_mut();
    tracker.track_all(panel, left, CAPTURE_KINDS);
    tracker.track(panel, right, EventKind::PointerMove);

    panel.capture_pointer(left, PointerId::MOUSE).unwrap();
    harness.pointer_move(10.0, 10.0);
    tracker.clear();

    // detach without going through the panel, leaving the capture stale
    harness.panel_mut().tree_mut().detach(left).unwrap();
    harness.pointer_move(75.0, 50.0);

    assert_eq!(
        tracker.names_and_kinds(),
        vec![("right".to_string(), EventKind::PointerMove)]
    );
    assert_eq!(harness.panel().capturing_element(PointerId::MOUSE), None);
}

#[test]
#[serial]
fn test_detach_element_drops_pending_capture() {
    let Split {
        mut harness, left, ..
    } = split();
    let panel = harness.panel_mut();
    panel.capture_pointer(left, PointerId::MOUSE).unwrap();
    panel.detach_element(left).unwrap();
    assert!(!panel.has_pointer_capture(left, PointerId::MOUSE));
}

#[test]
#[serial]
fn test_touch_capture_is_released_on_touch_up() {
    let Split {
        mut harness,
        left,
        right,
    } = split();
    let tracker = EventTracker::new();
    let panel = harness.panel_mut();
    tracker.track_all(
        panel,
        left,
        &[
            EventKind::PointerUp,
            EventKind::PointerCapture,
            EventKind::PointerCaptureOut,
        ],
    );
    tracker.track(panel, right, EventKind::PointerUp);
    panel
        .on(left, EventKind::PointerDown, |cx, event| {
            let pointer_id = event.pointer_id().unwrap();
            let element = event.current_target().unwrap();
            cx.capture_pointer(element, pointer_id).unwrap();
        })
        .unwrap();

    let touch = PointerId::touch(0).unwrap();
    harness.touch_down(0, 25.0, 50.0);
    assert!(harness.panel().has_pointer_capture(left, touch));

    harness.touch_up(0, 75.0, 50.0);
    assert_eq!(
        tracker.names_and_kinds(),
        vec![
            ("left".to_string(), EventKind::PointerCapture),
            ("left".to_string(), EventKind::PointerUp),
            ("left".to_string(), EventKind::PointerCaptureOut),
        ]
    );
    let panel = harness.panel();
    assert_eq!(panel.capturing_element(touch), None);
    assert_eq!(panel.element_under_pointer(touch), None);
}
