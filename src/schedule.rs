//! Deferred visual updates.
//!
//! Gravity commits the logical move at once and hands the on-screen move to a
//! [`Scheduler`]. The front-end drains due updates each frame.

use crate::grid::{Coord, Rgb};
use std::collections::VecDeque;
use std::time::Instant;

/// One cell's color sliding from `from` to `to` on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualUpdate {
    pub from: Coord,
    pub to: Coord,
    pub color: Rgb,
    /// Grid generation the coordinates belong to.
    pub generation: u64,
    pub due: Instant,
}

pub trait Scheduler {
    fn schedule(&mut self, update: VisualUpdate);
}

impl Scheduler for Vec<VisualUpdate> {
    fn schedule(&mut self, update: VisualUpdate) {
        self.push(update);
    }
}

/// Pending updates ordered by due time; equal due times keep scheduling order.
#[derive(Debug, Default)]
pub struct DeferredQueue {
    pending: VecDeque<VisualUpdate>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Pop every update due at or before `now`. Updates for a generation other
    /// than `generation` are dropped rather than returned.
    pub fn drain_due(&mut self, now: Instant, generation: u64) -> Vec<VisualUpdate> {
        let mut out = Vec::new();
        let mut stale = 0usize;
        while self.pending.front().is_some_and(|u| u.due <= now) {
            if let Some(update) = self.pending.pop_front() {
                if update.generation == generation {
                    out.push(update);
                } else {
                    stale += 1;
                }
            }
        }
        if stale > 0 {
            tracing::debug!(stale, "dropped visual updates for a rebuilt grid");
        }
        out
    }
}

impl Scheduler for DeferredQueue {
    fn schedule(&mut self, update: VisualUpdate) {
        let at = self.pending.partition_point(|u| u.due <= update.due);
        self.pending.insert(at, update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn update(due: Instant, generation: u64, row: u16) -> VisualUpdate {
        VisualUpdate {
            from: Coord::new(row, 1),
            to: Coord::new(row + 1, 1),
            color: Rgb(1, 2, 3),
            generation,
            due,
        }
    }

    #[test]
    fn drains_only_due_updates_in_order() {
        let t0 = Instant::now();
        let ms = Duration::from_millis;
        let mut q = DeferredQueue::new();
        q.schedule(update(t0 + ms(20), 1, 1));
        q.schedule(update(t0 + ms(10), 1, 2));
        q.schedule(update(t0 + ms(10), 1, 3));

        assert!(q.drain_due(t0 + ms(5), 1).is_empty());
        let first = q.drain_due(t0 + ms(10), 1);
        assert_eq!(first.iter().map(|u| u.from.row).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(q.len(), 1);
        assert_eq!(q.drain_due(t0 + ms(25), 1).len(), 1);
        assert!(q.is_empty());
    }

    #[test]
    fn stale_generation_is_dropped() {
        let t0 = Instant::now();
        let mut q = DeferredQueue::new();
        q.schedule(update(t0, 1, 1));
        q.schedule(update(t0, 2, 2));
        let out = q.drain_due(t0, 2);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].generation, 2);
        assert!(q.is_empty());
    }
}
