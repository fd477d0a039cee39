//! Arena of live events with per-kind free lists.
//!
//! Live events are addressed through generational [`EventRef`] handles. Every
//! handle owner holds one reference: [`EventPool::acquire`] adds one and
//! [`EventPool::dispose`] drops one. When the count reaches zero the event leaves
//! the arena; events that came from a free list are reset with
//! [`Event::init`] and returned to it, so no element reference survives into the
//! next use.

use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};

use super::{Event, EventKind, LifecycleFlags, PropagationPath};
use crate::error::{EventError, Result};

new_key_type! {
    /// Handle to an event owned by an [`EventPool`].
    pub struct EventRef;
}

struct EventSlot {
    /// `None` while the event is being dispatched.
    event: Option<Event>,
    /// Reference count changes made while the event was out for dispatch.
    ref_delta: i64,
}

pub struct EventPool {
    live: SlotMap<EventRef, EventSlot>,
    free: FxHashMap<EventKind, Vec<Event>>,
    paths: Vec<PropagationPath>,
    capacity: usize,
}

impl Default for EventPool {
    fn default() -> Self {
        Self::new(100)
    }
}

impl EventPool {
    /// `capacity` is the maximum number of released instances kept per kind.
    pub fn new(capacity: usize) -> Self {
        Self {
            live: SlotMap::with_key(),
            free: FxHashMap::default(),
            paths: Vec::new(),
            capacity,
        }
    }

    /// Get an initialized event of `kind` with a reference count of one,
    /// recycling a released instance when one is available.
    pub fn get_pooled(&mut self, kind: EventKind) -> EventRef {
        let mut event = self
            .free
            .get_mut(&kind)
            .and_then(Vec::pop)
            .unwrap_or_else(|| Event::new(kind));
        event.init();
        event.flags.insert(LifecycleFlags::POOLED);
        self.insert_live(event)
    }

    /// Take ownership of an event built by hand. It is dropped, not recycled, once
    /// its last reference is disposed.
    pub fn insert(&mut self, mut event: Event) -> EventRef {
        event.flags.remove(LifecycleFlags::POOLED);
        self.insert_live(event)
    }

    fn insert_live(&mut self, mut event: Event) -> EventRef {
        event.ref_count = 1;
        self.live.insert_with_key(|key| {
            event.handle = Some(key);
            EventSlot {
                event: Some(event),
                ref_delta: 0,
            }
        })
    }

    pub fn contains(&self, evt: EventRef) -> bool {
        self.live.contains_key(evt)
    }

    /// The event behind `evt`, unless it is stale or currently being dispatched.
    pub fn get(&self, evt: EventRef) -> Option<&Event> {
        self.live.get(evt).and_then(|slot| slot.event.as_ref())
    }

    pub fn get_mut(&mut self, evt: EventRef) -> Option<&mut Event> {
        self.live.get_mut(evt).and_then(|slot| slot.event.as_mut())
    }

    /// Add a reference to a live event.
    pub fn acquire(&mut self, evt: EventRef) -> Result<()> {
        let slot = self.live.get_mut(evt).ok_or(EventError::StaleEvent(evt))?;
        match slot.event.as_mut() {
            Some(event) => event.ref_count += 1,
            None => slot.ref_delta += 1,
        }
        Ok(())
    }

    /// Drop a reference. The last one releases the event.
    pub fn dispose(&mut self, evt: EventRef) -> Result<()> {
        let slot = self.live.get_mut(evt).ok_or(EventError::StaleEvent(evt))?;
        match slot.event.as_mut() {
            Some(event) => {
                event.ref_count = event.ref_count.saturating_sub(1);
                if event.ref_count == 0 {
                    self.release(evt);
                }
            }
            None => slot.ref_delta -= 1,
        }
        Ok(())
    }

    fn release(&mut self, evt: EventRef) {
        let Some(mut event) = self.live.remove(evt).and_then(|slot| slot.event) else {
            return;
        };
        if let Some(path) = event.path.take() {
            self.recycle_path(path);
        }
        if !event.is_pooled() {
            return;
        }
        event.init();
        let free = self.free.entry(event.kind()).or_default();
        if free.len() < self.capacity {
            free.push(event);
        }
    }

    /// Move the event out of the arena for the duration of its dispatch.
    ///
    /// # Panics
    ///
    /// Panics if the event is already being dispatched. Dispatching the same
    /// instance recursively is a programming error; dispatch a
    /// [`duplicate`](Event::duplicate) instead.
    pub(crate) fn take_for_dispatch(&mut self, evt: EventRef) -> Option<Event> {
        let slot = self.live.get_mut(evt)?;
        match slot.event.take() {
            Some(event) => {
                assert!(
                    !event.is_dispatching(),
                    "event {} ({:?}) is already being dispatched",
                    event.id(),
                    event.kind()
                );
                Some(event)
            }
            None => panic!(
                "event {evt:?} is being dispatched recursively; dispatch a duplicate instead"
            ),
        }
    }

    /// Put a dispatched event back, applying reference changes made meanwhile.
    pub(crate) fn restore(&mut self, evt: EventRef, mut event: Event) {
        let Some(slot) = self.live.get_mut(evt) else {
            return;
        };
        let count = (event.ref_count as i64 + slot.ref_delta).max(0);
        event.ref_count = count as u32;
        slot.ref_delta = 0;
        slot.event = Some(event);
        if count == 0 {
            self.release(evt);
        }
    }

    pub(crate) fn take_path(&mut self) -> PropagationPath {
        self.paths.pop().unwrap_or_default()
    }

    pub(crate) fn recycle_path(&mut self, mut path: PropagationPath) {
        if self.paths.len() < self.capacity {
            path.clear();
            self.paths.push(path);
        }
    }

    /// Number of events currently alive (referenced).
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Number of released instances of `kind` ready for reuse.
    pub fn free_count(&self, kind: EventKind) -> usize {
        self.free.get(&kind).map_or(0, Vec::len)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl std::fmt::Debug for EventPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPool")
            .field("live", &self.live.len())
            .field("free", &self.free.values().map(Vec::len).sum::<usize>())
            .field("capacity", &self.capacity)
            .finish()
    }
}
