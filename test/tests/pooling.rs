//! Tests for pooled events and their reference counts across dispatch.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use floem_dispatch::DispatchConfig;
use floem_dispatch::error::EventError;
use floem_dispatch::event::EventRef;
use floem_dispatch_test::prelude::*;
use serial_test::serial;

fn setup() -> (TestHarness, ElementId) {
    init_logs();
    let mut harness = TestHarness::new();
    let root = harness.root();
    let el = harness.add(root, "el", Rect::new(0.0, 0.0, 100.0, 100.0));
    (harness, el)
}

#[test]
#[serial]
fn test_queued_pooled_event_holds_a_reference() {
    let (mut harness, el) = setup();
    let tracker = EventTracker::new();
    tracker.track(harness.panel_mut(), el, EventKind::Custom(2));
    let ref_counts = Rc::new(RefCell::new(Vec::new()));

    let counts = ref_counts.clone();
    harness
        .panel_mut()
        .on(el, EventKind::Custom(1), move |cx, _event| {
            let evt = cx.pool_mut().get_pooled(EventKind::Custom(2));
            cx.pool_mut().get_mut(evt).unwrap().set_target(Some(el));
            cx.send_event(evt, DispatchMode::Queued).unwrap();
            counts
                .borrow_mut()
                .push(cx.pool().get(evt).unwrap().ref_count());
            // the queue keeps the event alive after the sender lets go
            cx.pool_mut().dispose(evt).unwrap();
            assert!(cx.pool().contains(evt));
        })
        .unwrap();

    harness.dispatch(Event::custom(1).with_target(el));

    assert_eq!(*ref_counts.borrow(), vec![2]);
    assert_eq!(tracker.count(EventKind::Custom(2)), 1);
    let pool = harness.panel().pool();
    assert_eq!(pool.free_count(EventKind::Custom(2)), 1);
}

#[test]
#[serial]
fn test_released_pooled_event_is_reused() {
    let (mut harness, el) = setup();
    let panel = harness.panel_mut();

    let first = panel.pool_mut().get_pooled(EventKind::Custom(5));
    panel.pool_mut().get_mut(first).unwrap().set_target(Some(el));
    panel.send_event(first, DispatchMode::Queued).unwrap();
    assert!(panel.pool().get(first).unwrap().is_processed());
    panel.pool_mut().dispose(first).unwrap();
    assert_eq!(panel.pool().free_count(EventKind::Custom(5)), 1);

    let second = panel.pool_mut().get_pooled(EventKind::Custom(5));
    assert_eq!(panel.pool().free_count(EventKind::Custom(5)), 0);
    let event = panel.pool().get(second).unwrap();
    assert!(!event.is_processed());
    assert_eq!(event.target(), None);
}

#[test]
#[serial]
#[should_panic(expected = "dispatched recursively")]
fn test_immediate_redispatch_of_the_same_instance_panics() {
    let (mut harness, el) = setup();
    let slot: Rc<Cell<Option<EventRef>>> = Rc::default();

    let s = slot.clone();
    harness
        .panel_mut()
        .on(el, EventKind::Custom(1), move |cx, _event| {
            if let Some(evt) = s.get() {
                let _ = cx.send_event(evt, DispatchMode::Immediate);
            }
        })
        .unwrap();

    let panel = harness.panel_mut();
    let evt = panel.pool_mut().get_pooled(EventKind::Custom(1));
    panel.pool_mut().get_mut(evt).unwrap().set_target(Some(el));
    slot.set(Some(evt));
    let _ = panel.send_event(evt, DispatchMode::Immediate);
}

#[test]
#[serial]
fn test_duplicate_can_be_redispatched_from_a_handler() {
    let (mut harness, el) = setup();
    let ids = Rc::new(RefCell::new(Vec::new()));

    let seen = ids.clone();
    harness
        .panel_mut()
        .on(el, EventKind::Custom(1), move |cx, event| {
            seen.borrow_mut().push(event.id());
            if seen.borrow().len() == 1 {
                cx.dispatch_with_mode(event.duplicate(), DispatchMode::Immediate);
            }
        })
        .unwrap();

    harness.dispatch(Event::custom(1).with_target(el));

    let ids = ids.borrow();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
}

#[test]
#[serial]
fn test_stale_handle_is_rejected() {
    let (mut harness, _el) = setup();
    let panel = harness.panel_mut();
    let evt = panel.pool_mut().get_pooled(EventKind::Custom(1));
    panel.pool_mut().dispose(evt).unwrap();

    assert_eq!(
        panel.send_event(evt, DispatchMode::Queued),
        Err(EventError::StaleEvent(evt))
    );
}

#[test]
#[serial]
fn test_dispatch_leaves_no_live_events() {
    let (mut harness, el) = setup();
    let result = harness.dispatch(Event::custom(1).with_target(el));
    assert!(result.flags.contains(LifecycleFlags::PROCESSED));
    assert_eq!(harness.panel().pool().live_count(), 0);

    harness.click(50.0, 50.0);
    let pool = harness.panel().pool();
    assert_eq!(pool.live_count(), 0);
    // hand-built events are dropped, not recycled
    assert_eq!(pool.free_count(EventKind::Custom(1)), 0);
}

#[test]
#[serial]
fn test_nested_dispatch_reports_queued_flags() {
    let (mut harness, el) = setup();
    let flags = Rc::new(Cell::new(LifecycleFlags::empty()));

    let f = flags.clone();
    harness
        .panel_mut()
        .on(el, EventKind::Custom(1), move |cx, _event| {
            f.set(cx.dispatch(Event::custom(2).with_target(el)));
        })
        .unwrap();
    harness.dispatch(Event::custom(1).with_target(el));

    let flags = flags.get();
    assert!(flags.contains(LifecycleFlags::DISPATCHED));
    assert!(!flags.contains(LifecycleFlags::PROCESSED));
}

#[test]
#[serial]
fn test_pool_capacity_comes_from_config() {
    let harness = TestHarness::with_config(DispatchConfig::default().pool_capacity(3));
    assert_eq!(harness.panel().pool().capacity(), 3);
}
