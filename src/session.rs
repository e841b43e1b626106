//! Session: the current grid generation plus everything that acts on it.
//!
//! Every input signal the front-end produces lands on one method here.

use crate::canvas::Canvas;
use crate::grid::{Coord, DEFAULT_GRID_SIZE, Grid, Rgb};
use crate::gravity::{self, FallTiming, GravityReport, Phase};
use crate::order::FallOrder;
use crate::paint::{ColorError, DEFAULT_THROTTLE, PaintEngine};
use crate::schedule::DeferredQueue;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Total time for a cell to fall the full height of the grid.
pub const DEFAULT_FALL_DURATION: Duration = Duration::from_millis(10_000);

/// Settings fixed for the lifetime of a session (CLI derived).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub grid_size: u16,
    pub fall_duration: Duration,
    pub throttle: Duration,
    pub initial_color: Rgb,
    /// When false, moves are shown as soon as gravity finishes.
    pub animate: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            fall_duration: DEFAULT_FALL_DURATION,
            throttle: DEFAULT_THROTTLE,
            initial_color: Rgb::BLACK,
            animate: true,
        }
    }
}

#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    grid: Grid,
    paint: PaintEngine,
    canvas: Canvas,
    pending: DeferredQueue,
    fall_order: Option<FallOrder>,
    phase: Phase,
    last_report: Option<GravityReport>,
}

impl Session {
    pub fn new(config: SessionConfig, now: Instant) -> Self {
        let grid = Grid::new(i64::from(config.grid_size));
        let canvas = Canvas::for_grid(&grid);
        let paint = PaintEngine::new(config.initial_color, config.throttle, now);
        Self {
            config,
            grid,
            paint,
            canvas,
            pending: DeferredQueue::new(),
            fall_order: None,
            phase: Phase::Idle,
            last_report: None,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn palette(&self) -> Rgb {
        self.paint.palette()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn fall_order(&self) -> Option<&FallOrder> {
        self.fall_order.as_ref()
    }

    pub fn last_report(&self) -> Option<&GravityReport> {
        self.last_report.as_ref()
    }

    pub fn painted(&self) -> &[Coord] {
        self.paint.colored().as_slice()
    }

    /// Screen still catching up with a finished gravity run.
    pub fn is_animating(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Build a new grid of `size` (clamped). Pending animation and any fall order are discarded.
    pub fn rebuild(&mut self, size: i64, now: Instant) -> u16 {
        let size = self.grid.build(size);
        self.paint.rebind(now);
        self.canvas.rebuild(&self.grid);
        if !self.pending.is_empty() {
            debug!(pending = self.pending.len(), "discarding in-flight animation");
        }
        self.pending.clear();
        self.fall_order = None;
        self.last_report = None;
        self.phase = Phase::Idle;
        info!(size, generation = self.grid.generation(), "grid built");
        size
    }

    /// Default-size grid, black palette.
    pub fn reset(&mut self, now: Instant) {
        self.rebuild(i64::from(DEFAULT_GRID_SIZE), now);
        self.paint.reset(now);
    }

    pub fn set_stroke(&mut self, active: bool) {
        self.paint.set_stroke(active);
    }

    pub fn stroke_active(&self) -> bool {
        self.paint.stroke_active()
    }

    pub fn set_palette(&mut self, rgb: Rgb) {
        self.paint.set_palette(rgb);
    }

    pub fn set_palette_color(&mut self, hex: &str) -> Result<Rgb, ColorError> {
        self.paint.set_palette_color(hex)
    }

    /// Pointer over `coords` while possibly stroking. Ignored while the screen is still animating.
    pub fn hover(&mut self, coords: &[Coord], now: Instant) -> bool {
        if self.is_animating() {
            return false;
        }
        if !self.paint.hover(&mut self.grid, coords, now) {
            return false;
        }
        for &coord in coords {
            self.canvas.sync_cell(&self.grid, coord);
        }
        true
    }

    /// Snapshot the colored set into fall order ahead of a gravity run.
    pub fn precompute_order(&mut self) -> &FallOrder {
        self.phase = Phase::Sorting;
        let colored = self.paint.colored();
        let order = FallOrder::snapshot(&self.grid, colored.as_slice(), colored.revision());
        debug!(cells = order.cells.len(), "fall order computed");
        self.phase = Phase::Idle;
        self.fall_order.insert(order)
    }

    /// Run gravity to a fixed point. A fall order that no longer matches the
    /// grid or the colored set is recomputed first. Returns None while a
    /// previous run is still animating.
    pub fn start_gravity(&mut self, now: Instant) -> Option<&GravityReport> {
        if self.is_animating() {
            debug!("gravity requested while animating; ignored");
            return None;
        }
        let revision = self.paint.colored().revision();
        let fresh = self
            .fall_order
            .take()
            .filter(|order| !order.is_stale(&self.grid, revision));
        let mut order = match fresh {
            Some(order) => order,
            None => {
                debug!("fall order missing or stale; recomputing");
                self.precompute_order().clone()
            }
        };
        self.fall_order = None;

        self.phase = Phase::Simulating;
        let fall_duration = if self.config.animate {
            self.config.fall_duration
        } else {
            Duration::ZERO
        };
        let timing = FallTiming::new(now, fall_duration, self.grid.size());
        let report = gravity::run(&mut order.cells, &mut self.grid, &mut self.pending, timing);
        self.paint.colored_mut().reseed(report.settled.iter().copied());
        self.phase = Phase::Idle;
        info!(
            passes = report.passes,
            moves = report.moves,
            cells = report.settled.len(),
            "gravity settled"
        );

        if !self.config.animate {
            self.tick(now);
        }
        let report = self.last_report.insert(report);
        Some(&*report)
    }

    /// Present every deferred update due by `now`. Returns how many were shown.
    pub fn tick(&mut self, now: Instant) -> usize {
        let due = self.pending.drain_due(now, self.grid.generation());
        let shown = due.iter().filter(|u| self.canvas.apply(u)).count();
        debug_assert!(!self.pending.is_empty() || self.canvas.matches(&self.grid));
        shown
    }
}
