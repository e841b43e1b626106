//! Gravity: drop every colored cell straight down, one row per pass, until a
//! pass moves nothing.

use crate::grid::{Coord, Grid};
use crate::schedule::{Scheduler, VisualUpdate};
use std::time::{Duration, Instant};

/// Where the simulator is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Sorting,
    Simulating,
}

/// Animation clock for one run: pass `n` becomes visible at `start + n * per_row`.
#[derive(Debug, Clone, Copy)]
pub struct FallTiming {
    pub start: Instant,
    pub per_row: Duration,
}

impl FallTiming {
    /// Spread `fall_duration` over the rows of a `grid_size` grid.
    pub fn new(start: Instant, fall_duration: Duration, grid_size: u16) -> Self {
        Self {
            start,
            per_row: fall_duration / u32::from(grid_size.max(1)),
        }
    }

    pub fn due(&self, pass: u32) -> Instant {
        self.start + self.per_row * pass
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GravityReport {
    /// Passes run, counting the final pass in which nothing moved.
    pub passes: u32,
    /// Single-row moves across all passes.
    pub moves: usize,
    /// Where each cell of the order ended up, in order.
    pub settled: Vec<Coord>,
}

/// One pass over `order`. Moves are committed to `grid` immediately and the
/// matching screen update is handed to `scheduler`. Returns how many cells moved.
pub fn step<S: Scheduler>(
    order: &mut [Coord],
    grid: &mut Grid,
    scheduler: &mut S,
    due: Instant,
) -> usize {
    let size = grid.size();
    let generation = grid.generation();
    let mut moved = 0;
    for slot in order.iter_mut() {
        let from = *slot;
        if from.row >= size {
            continue;
        }
        let color = match grid.get(from) {
            Some(cell) if cell.colored => cell.color,
            _ => continue,
        };
        let below = from.below();
        match grid.get(below) {
            Some(lower) if !lower.colored => {}
            _ => continue,
        }
        grid.set_color(below, color);
        grid.clear(from);
        *slot = below;
        scheduler.schedule(VisualUpdate {
            from,
            to: below,
            color,
            generation,
            due,
        });
        moved += 1;
    }
    moved
}

/// Run passes until a fixed point. `order` is updated in place to the settled positions.
pub fn run<S: Scheduler>(
    order: &mut [Coord],
    grid: &mut Grid,
    scheduler: &mut S,
    timing: FallTiming,
) -> GravityReport {
    let mut passes = 0u32;
    let mut moves = 0usize;
    loop {
        passes += 1;
        let moved = step(order, grid, scheduler, timing.due(passes));
        tracing::trace!(pass = passes, moved, "gravity pass");
        if moved == 0 {
            break;
        }
        moves += moved;
    }
    GravityReport {
        passes,
        moves,
        settled: order.to_vec(),
    }
}
