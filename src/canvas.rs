//! What is on screen: per-cell color as last presented, lagging the logical grid
//! while a fall animation is pending.

use crate::grid::{Coord, Grid, Rgb};
use crate::schedule::VisualUpdate;

#[derive(Debug, Clone)]
pub struct Canvas {
    size: u16,
    generation: u64,
    colors: Vec<Option<Rgb>>,
}

impl Canvas {
    pub fn for_grid(grid: &Grid) -> Self {
        let mut canvas = Self {
            size: 0,
            generation: 0,
            colors: Vec::new(),
        };
        canvas.rebuild(grid);
        canvas
    }

    /// Drop everything drawn and match the (fresh) grid.
    pub fn rebuild(&mut self, grid: &Grid) {
        self.size = grid.size();
        self.generation = grid.generation();
        self.colors = grid
            .cells()
            .map(|c| c.colored.then_some(c.color))
            .collect();
    }

    fn index(&self, coord: Coord) -> Option<usize> {
        let Coord { row, col } = coord;
        (row >= 1 && col >= 1 && row <= self.size && col <= self.size)
            .then(|| (row as usize - 1) * self.size as usize + (col as usize - 1))
    }

    pub fn get(&self, coord: Coord) -> Option<Rgb> {
        self.index(coord).and_then(|i| self.colors[i])
    }

    /// Show `coord` with the grid's current logical state.
    pub fn sync_cell(&mut self, grid: &Grid, coord: Coord) {
        if let (Some(i), Some(cell)) = (self.index(coord), grid.get(coord)) {
            self.colors[i] = cell.colored.then_some(cell.color);
        }
    }

    /// Present one deferred move. Returns false for updates aimed at another generation.
    pub fn apply(&mut self, update: &VisualUpdate) -> bool {
        if update.generation != self.generation {
            return false;
        }
        match (self.index(update.from), self.index(update.to)) {
            (Some(from), Some(to)) => {
                self.colors[to] = Some(update.color);
                self.colors[from] = None;
                true
            }
            _ => false,
        }
    }

    /// True once every cell on screen agrees with the logical grid.
    pub fn matches(&self, grid: &Grid) -> bool {
        self.generation == grid.generation()
            && self
                .colors
                .iter()
                .zip(grid.cells())
                .all(|(shown, cell)| *shown == cell.colored.then_some(cell.color))
    }
}
