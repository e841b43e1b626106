//! Fall order: which colored cell gets to move first within a gravity pass.
//!
//! Cells nearest the floor go first so nothing above can overtake them; ties on
//! the same row resolve left to right.

use crate::grid::{Coord, Grid};
use std::cmp::Ordering;

/// Priority comparison: higher row first, then lower column.
#[inline]
pub fn fall_priority(a: &Coord, b: &Coord) -> Ordering {
    b.row.cmp(&a.row).then(a.col.cmp(&b.col))
}

/// Stable top-down merge sort by [`fall_priority`].
pub fn sort(cells: &[Coord]) -> Vec<Coord> {
    if cells.len() <= 1 {
        return cells.to_vec();
    }
    let (left, right) = cells.split_at(cells.len() / 2);
    merge(&sort(left), &sort(right))
}

fn merge(left: &[Coord], right: &[Coord]) -> Vec<Coord> {
    let mut out = Vec::with_capacity(left.len() + right.len());
    let (mut li, mut ri) = (0, 0);
    while li < left.len() && ri < right.len() {
        // `!= Greater` keeps equal keys in left-then-right order.
        if fall_priority(&left[li], &right[ri]) != Ordering::Greater {
            out.push(left[li]);
            li += 1;
        } else {
            out.push(right[ri]);
            ri += 1;
        }
    }
    out.extend_from_slice(&left[li..]);
    out.extend_from_slice(&right[ri..]);
    out
}

/// A sorted snapshot plus the state it was taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallOrder {
    pub cells: Vec<Coord>,
    pub generation: u64,
    pub revision: u64,
}

impl FallOrder {
    /// Sort the currently colored members of `candidates`.
    pub fn snapshot(grid: &Grid, candidates: &[Coord], revision: u64) -> Self {
        let live: Vec<Coord> = candidates
            .iter()
            .copied()
            .filter(|&c| grid.get(c).is_some_and(|cell| cell.colored))
            .collect();
        Self {
            cells: sort(&live),
            generation: grid.generation(),
            revision,
        }
    }

    /// True if the grid was rebuilt or the colored set changed since the snapshot.
    pub fn is_stale(&self, grid: &Grid, revision: u64) -> bool {
        self.generation != grid.generation() || self.revision != revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Rgb;

    fn c(row: u16, col: u16) -> Coord {
        Coord::new(row, col)
    }

    fn is_fall_ordered(cells: &[Coord]) -> bool {
        cells
            .windows(2)
            .all(|w| w[0].row > w[1].row || (w[0].row == w[1].row && w[0].col < w[1].col))
    }

    #[test]
    fn trivial_inputs_come_back_unchanged() {
        assert!(sort(&[]).is_empty());
        assert_eq!(sort(&[c(2, 3)]), vec![c(2, 3)]);
    }

    #[test]
    fn highest_row_first_then_lowest_column() {
        let input = [c(1, 3), c(3, 2), c(1, 1), c(2, 2), c(3, 1), c(2, 5)];
        let sorted = sort(&input);
        assert_eq!(sorted, vec![c(3, 1), c(3, 2), c(2, 2), c(2, 5), c(1, 1), c(1, 3)]);
    }

    #[test]
    fn sorting_is_deterministic_and_idempotent() {
        // Scrambled 7x7 board worth of coordinates.
        let input: Vec<Coord> = (0..49u16)
            .map(|i| (i * 17) % 49)
            .map(|k| c(k / 7 + 1, k % 7 + 1))
            .collect();
        let once = sort(&input);
        let twice = sort(&input);
        assert_eq!(once, twice);
        assert_eq!(sort(&once), once);
        assert!(is_fall_ordered(&once));
        assert_eq!(once.len(), input.len());
    }

    #[test]
    fn equal_keys_keep_input_order() {
        // Same coordinate twice can't happen on a grid, but the merge must still be stable.
        let input = [c(2, 2), c(1, 1), c(2, 2)];
        assert_eq!(sort(&input), vec![c(2, 2), c(2, 2), c(1, 1)]);
    }

    #[test]
    fn snapshot_skips_uncolored_and_tracks_staleness() {
        let mut grid = Grid::new(3);
        grid.set_color(c(1, 1), Rgb(1, 1, 1));
        grid.set_color(c(2, 3), Rgb(1, 1, 1));
        let order = FallOrder::snapshot(&grid, &[c(1, 1), c(3, 3), c(2, 3)], 7);
        assert_eq!(order.cells, vec![c(2, 3), c(1, 1)]);
        assert!(!order.is_stale(&grid, 7));
        assert!(order.is_stale(&grid, 8));
        grid.build(3);
        assert!(order.is_stale(&grid, 7));
    }
}
