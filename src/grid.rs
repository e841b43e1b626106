//! Grid model: square board of cells addressed by 1-based (row, col).

use std::collections::BTreeMap;
use std::fmt;

/// Grid size used on startup and after a reset.
pub const DEFAULT_GRID_SIZE: u16 = 16;
/// Largest grid we will allocate; larger requests are clamped.
pub const MAX_GRID_SIZE: u16 = 100;

/// 8-bit RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Self = Self(0, 0, 0);
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Cell coordinate. Row 1 is the top row, row `size` is the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord {
    pub row: u16,
    pub col: u16,
}

impl Coord {
    pub const fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }

    /// The coordinate directly underneath (may be off the grid).
    pub const fn below(self) -> Self {
        Self {
            row: self.row.saturating_add(1),
            col: self.col,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub coord: Coord,
    pub colored: bool,
    /// Meaningless while `colored` is false; kept at black.
    pub color: Rgb,
}

impl Cell {
    fn blank(coord: Coord) -> Self {
        Self {
            coord,
            colored: false,
            color: Rgb::BLACK,
        }
    }
}

/// Clamp a requested size into `[1, MAX_GRID_SIZE]`.
pub fn clamp_size(requested: i64) -> u16 {
    requested.clamp(1, i64::from(MAX_GRID_SIZE)) as u16
}

#[derive(Debug, Clone)]
pub struct Grid {
    size: u16,
    /// Row-major; index = (row - 1) * size + (col - 1).
    cells: Vec<Cell>,
    generation: u64,
}

impl Grid {
    pub fn new(size: i64) -> Self {
        let mut grid = Self {
            size: 0,
            cells: Vec::new(),
            generation: 0,
        };
        grid.build(size);
        grid
    }

    /// Throw away every cell and allocate a fresh, uncolored `size x size` board.
    /// Returns the clamped size actually used.
    pub fn build(&mut self, requested: i64) -> u16 {
        let size = clamp_size(requested);
        if i64::from(size) != requested {
            tracing::debug!(requested, size, "grid size clamped");
        }
        self.size = size;
        self.cells = (1..=size)
            .flat_map(|row| (1..=size).map(move |col| Cell::blank(Coord::new(row, col))))
            .collect();
        self.generation = self.generation.wrapping_add(1);
        size
    }

    #[inline]
    pub fn size(&self) -> u16 {
        self.size
    }

    /// Bumped on every `build`; anything tagged with an older value refers to dead cells.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    fn index(&self, coord: Coord) -> Option<usize> {
        let Coord { row, col } = coord;
        if row == 0 || col == 0 || row > self.size || col > self.size {
            return None;
        }
        Some((row as usize - 1) * self.size as usize + (col as usize - 1))
    }

    /// `None` outside the board. Row `size + 1` is how callers find the floor.
    #[inline]
    pub fn cell_at(&self, row: u16, col: u16) -> Option<&Cell> {
        self.get(Coord::new(row, col))
    }

    #[inline]
    pub fn get(&self, coord: Coord) -> Option<&Cell> {
        self.index(coord).map(|i| &self.cells[i])
    }

    /// Mark the cell colored with `rgb`. Returns false if the coordinate is off the grid.
    pub fn set_color(&mut self, coord: Coord, rgb: Rgb) -> bool {
        match self.index(coord) {
            Some(i) => {
                let cell = &mut self.cells[i];
                cell.colored = true;
                cell.color = rgb;
                true
            }
            None => false,
        }
    }

    /// Mark the cell uncolored.
    pub fn clear(&mut self, coord: Coord) -> bool {
        match self.index(coord) {
            Some(i) => {
                let cell = &mut self.cells[i];
                cell.colored = false;
                cell.color = Rgb::BLACK;
                true
            }
            None => false,
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn colored_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| c.colored)
    }

    pub fn colored_count(&self) -> usize {
        self.colored_cells().count()
    }

    /// How many colored cells carry each color.
    pub fn color_census(&self) -> BTreeMap<Rgb, usize> {
        let mut census = BTreeMap::new();
        for cell in self.colored_cells() {
            *census.entry(cell.color).or_insert(0) += 1;
        }
        census
    }
}
