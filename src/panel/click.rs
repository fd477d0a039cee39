use std::time::{Duration, Instant};

use crate::element::{ElementId, ElementTree};
use crate::pointer::PointerId;

#[derive(Debug, Clone, Copy)]
struct LastClick {
    target: ElementId,
    time: Instant,
    count: u32,
}

/// Pairs pointer downs with pointer ups into clicks and counts repeated clicks.
#[derive(Debug, Default)]
pub(crate) struct ClickDetector {
    down: [Option<ElementId>; PointerId::MAX_POINTERS],
    last: [Option<LastClick>; PointerId::MAX_POINTERS],
}

impl ClickDetector {
    pub(crate) fn pointer_down(&mut self, pointer_id: PointerId, target: Option<ElementId>) {
        self.down[pointer_id.index()] = target;
    }

    /// Complete a click. Returns the click target, the nearest common ancestor of
    /// the down and up targets, and the click count.
    pub(crate) fn pointer_up(
        &mut self,
        tree: &ElementTree,
        pointer_id: PointerId,
        target: Option<ElementId>,
        time: Instant,
        interval: Duration,
    ) -> Option<(ElementId, u32)> {
        let down = self.down[pointer_id.index()].take()?;
        let target = tree
            .common_ancestor(down, target?)
            .filter(|el| tree.is_attached(*el))?;

        let last = &mut self.last[pointer_id.index()];
        let count = match *last {
            Some(prev)
                if prev.target == target
                    && time.saturating_duration_since(prev.time) <= interval =>
            {
                prev.count + 1
            }
            _ => 1,
        };
        *last = Some(LastClick {
            target,
            time,
            count,
        });
        Some((target, count))
    }

    pub(crate) fn cancel(&mut self, pointer_id: PointerId) {
        self.down[pointer_id.index()] = None;
        self.last[pointer_id.index()] = None;
    }
}
