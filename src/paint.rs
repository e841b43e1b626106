//! Paint engine: palette, stroke state, throttled hover painting and the colored set.

use crate::grid::{Coord, Grid, Rgb};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Default minimum spacing between two effective hover paints.
pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(1);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("invalid color format: {0:?} (expected #RRGGBB)")]
    InvalidColorFormat(String),
}

/// Parse `#RRGGBB` (the `#` is optional) into an RGB triple.
pub fn hex_to_rgb(hex: &str) -> Result<Rgb, ColorError> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ColorError::InvalidColorFormat(hex.to_string()));
    }
    let value = u32::from_str_radix(digits, 16)
        .map_err(|_| ColorError::InvalidColorFormat(hex.to_string()))?;
    Ok(Rgb(
        ((value >> 16) & 255) as u8,
        ((value >> 8) & 255) as u8,
        (value & 255) as u8,
    ))
}

/// Lets one call through per `interval`; everything in between is dropped.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    previous: Instant,
}

impl Throttle {
    /// The first window starts at `now`, so a call at exactly `now` is rejected unless interval is zero.
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            previous: now,
        }
    }

    pub fn admit(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.previous) >= self.interval {
            self.previous = now;
            true
        } else {
            false
        }
    }
}

/// Insertion-ordered, deduplicated set of painted coordinates.
#[derive(Debug, Clone, Default)]
pub struct ColoredSet {
    order: Vec<Coord>,
    members: HashSet<Coord>,
    revision: u64,
}

impl ColoredSet {
    /// Returns true if the coordinate was new.
    pub fn insert(&mut self, coord: Coord) -> bool {
        if !self.members.insert(coord) {
            return false;
        }
        self.order.push(coord);
        self.revision = self.revision.wrapping_add(1);
        true
    }

    pub fn as_slice(&self) -> &[Coord] {
        &self.order
    }

    /// Changes every time membership changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
        self.revision = self.revision.wrapping_add(1);
    }

    /// Replace the contents with `coords` (deduplicated, order kept).
    pub fn reseed(&mut self, coords: impl IntoIterator<Item = Coord>) {
        self.clear();
        for coord in coords {
            self.insert(coord);
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaintEngine {
    palette: Rgb,
    stroke_active: bool,
    throttle: Throttle,
    colored: ColoredSet,
}

impl PaintEngine {
    pub fn new(palette: Rgb, throttle: Duration, now: Instant) -> Self {
        Self {
            palette,
            stroke_active: false,
            throttle: Throttle::new(throttle, now),
            colored: ColoredSet::default(),
        }
    }

    pub fn palette(&self) -> Rgb {
        self.palette
    }

    pub fn set_palette(&mut self, rgb: Rgb) {
        self.palette = rgb;
    }

    /// Parse and apply a `#RRGGBB` string. The palette is untouched on error.
    pub fn set_palette_color(&mut self, hex: &str) -> Result<Rgb, ColorError> {
        let rgb = hex_to_rgb(hex)?;
        self.palette = rgb;
        Ok(rgb)
    }

    pub fn stroke_active(&self) -> bool {
        self.stroke_active
    }

    pub fn set_stroke(&mut self, active: bool) {
        self.stroke_active = active;
    }

    pub fn colored(&self) -> &ColoredSet {
        &self.colored
    }

    pub fn colored_mut(&mut self) -> &mut ColoredSet {
        &mut self.colored
    }

    /// Paint one cell with the palette color if a stroke is in progress.
    pub fn paint_cell(&mut self, grid: &mut Grid, coord: Coord) -> bool {
        if !self.stroke_active || !grid.set_color(coord, self.palette) {
            return false;
        }
        self.colored.insert(coord);
        true
    }

    /// Pointer moved over `coords` (one or more cells under the pointer). Throttled.
    pub fn hover(&mut self, grid: &mut Grid, coords: &[Coord], now: Instant) -> bool {
        if !self.stroke_active || !self.throttle.admit(now) {
            return false;
        }
        let mut painted = false;
        for &coord in coords {
            painted |= self.paint_cell(grid, coord);
        }
        painted
    }

    /// Start over for a freshly built grid: colored set emptied, stroke released.
    pub fn rebind(&mut self, now: Instant) {
        self.colored.clear();
        self.stroke_active = false;
        self.throttle = Throttle::new(self.throttle.interval, now);
    }

    /// Grid reset: like `rebind` but the palette goes back to black as well.
    pub fn reset(&mut self, now: Instant) {
        self.rebind(now);
        self.palette = Rgb::BLACK;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_to_rgb_splits_channels() {
        assert_eq!(hex_to_rgb("#FF8000"), Ok(Rgb(255, 128, 0)));
        assert_eq!(hex_to_rgb("00ff7f"), Ok(Rgb(0, 255, 127)));
        assert_eq!(hex_to_rgb("#000000"), Ok(Rgb::BLACK));
    }

    #[test]
    fn hex_to_rgb_rejects_malformed_input() {
        for bad in ["", "#", "#FFF", "#GG0000", "#12345", "#1234567", "+12345"] {
            assert!(
                matches!(hex_to_rgb(bad), Err(ColorError::InvalidColorFormat(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn bad_color_leaves_palette_alone() {
        let now = Instant::now();
        let mut paint = PaintEngine::new(Rgb(1, 2, 3), DEFAULT_THROTTLE, now);
        assert!(paint.set_palette_color("#nothex").is_err());
        assert_eq!(paint.palette(), Rgb(1, 2, 3));
        assert_eq!(paint.set_palette_color("#0000FF"), Ok(Rgb(0, 0, 255)));
        assert_eq!(paint.palette(), Rgb(0, 0, 255));
    }

    #[test]
    fn throttle_drops_calls_inside_interval() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(Duration::from_millis(10), t0);
        assert!(!throttle.admit(t0 + Duration::from_millis(5)));
        assert!(throttle.admit(t0 + Duration::from_millis(10)));
        assert!(!throttle.admit(t0 + Duration::from_millis(19)));
        assert!(throttle.admit(t0 + Duration::from_millis(20)));
    }

    #[test]
    fn paint_requires_active_stroke() {
        let now = Instant::now();
        let mut grid = Grid::new(3);
        let mut paint = PaintEngine::new(Rgb(255, 0, 0), DEFAULT_THROTTLE, now);
        assert!(!paint.paint_cell(&mut grid, Coord::new(1, 1)));
        assert_eq!(grid.colored_count(), 0);

        paint.set_stroke(true);
        assert!(paint.paint_cell(&mut grid, Coord::new(1, 1)));
        assert_eq!(grid.get(Coord::new(1, 1)).unwrap().color, Rgb(255, 0, 0));
    }

    #[test]
    fn colored_set_is_deduplicated() {
        let now = Instant::now();
        let mut grid = Grid::new(3);
        let mut paint = PaintEngine::new(Rgb(255, 0, 0), DEFAULT_THROTTLE, now);
        paint.set_stroke(true);
        paint.paint_cell(&mut grid, Coord::new(1, 1));
        paint.set_palette(Rgb(0, 255, 0));
        paint.paint_cell(&mut grid, Coord::new(1, 1));
        paint.paint_cell(&mut grid, Coord::new(1, 2));
        assert_eq!(paint.colored().as_slice(), &[Coord::new(1, 1), Coord::new(1, 2)]);
        // Repaint takes the newest color.
        assert_eq!(grid.get(Coord::new(1, 1)).unwrap().color, Rgb(0, 255, 0));
    }

    #[test]
    fn hover_is_throttled() {
        let t0 = Instant::now();
        let mut grid = Grid::new(3);
        let mut paint = PaintEngine::new(Rgb(9, 9, 9), Duration::from_millis(4), t0);
        paint.set_stroke(true);
        let ms = Duration::from_millis;
        assert!(paint.hover(&mut grid, &[Coord::new(1, 1)], t0 + ms(4)));
        assert!(!paint.hover(&mut grid, &[Coord::new(1, 2)], t0 + ms(5)));
        assert!(paint.hover(&mut grid, &[Coord::new(1, 3), Coord::new(2, 3)], t0 + ms(8)));
        assert_eq!(grid.colored_count(), 3);
        assert!(!grid.get(Coord::new(1, 2)).unwrap().colored);
    }

    #[test]
    fn off_grid_paint_is_ignored() {
        let now = Instant::now();
        let mut grid = Grid::new(2);
        let mut paint = PaintEngine::new(Rgb(9, 9, 9), DEFAULT_THROTTLE, now);
        paint.set_stroke(true);
        assert!(!paint.paint_cell(&mut grid, Coord::new(3, 1)));
        assert!(paint.colored().as_slice().is_empty());
    }

    #[test]
    fn reset_restores_black_and_empties_set() {
        let now = Instant::now();
        let mut grid = Grid::new(2);
        let mut paint = PaintEngine::new(Rgb(9, 9, 9), DEFAULT_THROTTLE, now);
        paint.set_stroke(true);
        paint.paint_cell(&mut grid, Coord::new(1, 1));
        let rev = paint.colored().revision();
        paint.reset(now);
        assert_eq!(paint.palette(), Rgb::BLACK);
        assert!(!paint.stroke_active());
        assert!(paint.colored().as_slice().is_empty());
        assert_ne!(paint.colored().revision(), rev);
    }
}
