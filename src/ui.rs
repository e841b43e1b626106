//! Layout and drawing: board, colour swatches, size, gravity button, stats, key hints.

use crate::grid::Coord;
use crate::session::Session;
use crate::theme::{SWATCH_COUNT, Theme, to_color};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

const SIDEBAR_WIDTH: u16 = 26;
const COLOURS_HEIGHT: u16 = 5;
const SIZE_HEIGHT: u16 = 3;
const GRAVITY_HEIGHT: u16 = 3;
const STATS_HEIGHT: u16 = 8;
const KEYS_MIN_HEIGHT: u16 = 9;
const SIDEBAR_MIN_HEIGHT: u16 =
    COLOURS_HEIGHT + SIZE_HEIGHT + GRAVITY_HEIGHT + STATS_HEIGHT + KEYS_MIN_HEIGHT;

/// Duration of the fade-in after a grid is built.
const BUILD_FADE_MS: u32 = 350;

/// How grid cells map onto terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellScale {
    /// Each grid cell is `width` columns by one row.
    Full { width: u16 },
    /// One column per cell, two grid rows per terminal row (▀).
    Half,
}

impl CellScale {
    /// Largest scale at which a `size` board fits in `avail_w x avail_h`.
    pub fn pick(size: u16, avail_w: u16, avail_h: u16) -> Self {
        if size.saturating_mul(2) <= avail_w && size <= avail_h {
            Self::Full { width: 2 }
        } else if size <= avail_w && size <= avail_h {
            Self::Full { width: 1 }
        } else {
            Self::Half
        }
    }

    /// Terminal cells needed for a `size` board (no border).
    pub fn board_cells(self, size: u16) -> (u16, u16) {
        match self {
            Self::Full { width } => (size.saturating_mul(width), size),
            Self::Half => (size, size.div_ceil(2)),
        }
    }
}

/// Screen regions shared by drawing and mouse hit-testing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenLayout {
    pub size: u16,
    pub scale: CellScale,
    pub board_outer: Rect,
    /// Board interior; may be smaller than the grid on tiny terminals.
    pub board: Rect,
    pub colours: Rect,
    pub swatches: [Rect; SWATCH_COUNT],
    pub size_box: Rect,
    pub gravity_button: Rect,
    pub stats: Rect,
    pub keys: Rect,
}

fn inset(r: Rect) -> Rect {
    Rect {
        x: r.x.saturating_add(1),
        y: r.y.saturating_add(1),
        width: r.width.saturating_sub(2),
        height: r.height.saturating_sub(2),
    }
}

/// Centre board + sidebar in `area` for a grid of `size`.
pub fn screen_layout(area: Rect, size: u16) -> ScreenLayout {
    let avail_w = area.width.saturating_sub(SIDEBAR_WIDTH + 2);
    let avail_h = area.height.saturating_sub(2);
    let scale = CellScale::pick(size, avail_w, avail_h);
    let (bw, bh) = scale.board_cells(size);
    let (bw, bh) = (bw.min(avail_w), bh.min(avail_h));

    let total_w = (bw + 2 + SIDEBAR_WIDTH).min(area.width);
    let total_h = (bh + 2).max(SIDEBAR_MIN_HEIGHT).min(area.height);
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(total_h) / 2;

    let board_outer = Rect {
        x,
        y,
        width: (bw + 2).min(total_w),
        height: (bh + 2).min(total_h),
    };
    let board = Rect {
        x: x + 1,
        y: y + 1,
        width: bw,
        height: bh,
    };
    let sidebar = Rect {
        x: x + board_outer.width,
        y,
        width: total_w.saturating_sub(board_outer.width),
        height: total_h,
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(COLOURS_HEIGHT),
            Constraint::Length(SIZE_HEIGHT),
            Constraint::Length(GRAVITY_HEIGHT),
            Constraint::Length(STATS_HEIGHT),
            Constraint::Fill(1),
        ])
        .split(sidebar);

    let colours = chunks[0];
    let strip = inset(colours);
    let block_w = (strip.width / SWATCH_COUNT as u16).max(1);
    let swatches = std::array::from_fn(|i| Rect {
        x: strip.x + i as u16 * block_w,
        y: strip.y + 1,
        width: block_w,
        height: strip.height.saturating_sub(1).min(1),
    });

    ScreenLayout {
        size,
        scale,
        board_outer,
        board,
        colours,
        swatches,
        size_box: chunks[1],
        gravity_button: chunks[2],
        stats: chunks[3],
        keys: chunks[4],
    }
}

impl ScreenLayout {
    /// Grid cells under terminal position (x, y). Half scale yields up to two.
    pub fn cells_at(&self, x: u16, y: u16) -> Vec<Coord> {
        if !self.board.contains(Position { x, y }) {
            return Vec::new();
        }
        let dx = x - self.board.x;
        let dy = y - self.board.y;
        let (col, rows) = match self.scale {
            CellScale::Full { width } => (dx / width + 1, [dy + 1, 0]),
            CellScale::Half => (dx + 1, [dy * 2 + 1, dy * 2 + 2]),
        };
        rows.into_iter()
            .filter(|&row| row >= 1 && row <= self.size && col <= self.size)
            .map(|row| Coord::new(row, col))
            .collect()
    }

    pub fn swatch_at(&self, x: u16, y: u16) -> Option<usize> {
        self.swatches
            .iter()
            .position(|r| r.contains(Position { x, y }))
    }

    pub fn over_gravity_button(&self, x: u16, y: u16) -> bool {
        self.gravity_button.contains(Position { x, y })
    }
}

/// Front-end state the renderer needs besides the session.
#[derive(Debug, Clone, Default)]
pub struct View {
    /// Size the next rebuild will use.
    pub pending_size: u16,
    /// Hex digits typed so far while entering a colour.
    pub hex_input: Option<String>,
    pub gravity_hover: bool,
    /// One-line feedback (bad colour, clamped size, ...).
    pub status: Option<String>,
}

/// Fresh fade-in for a newly built board.
pub fn build_fade(theme: &Theme) -> Effect {
    fx::fade_from(theme.bg, theme.bg, (BUILD_FADE_MS, Interpolation::Linear))
}

/// Draw everything. `build_effect` is advanced by the time since `effect_time`.
pub fn draw(
    frame: &mut Frame,
    session: &Session,
    theme: &Theme,
    view: &View,
    build_effect: &mut Option<Effect>,
    effect_time: &mut Option<Instant>,
    now: Instant,
) {
    let layout = screen_layout(frame.area(), session.grid().size());
    draw_board(frame, session, theme, &layout);
    draw_colours(frame, session, theme, view, &layout);
    draw_size(frame, session, theme, view, &layout);
    draw_gravity_button(frame, session, theme, view, &layout);
    draw_stats(frame, session, theme, &layout);
    draw_keys(frame, theme, view, &layout);

    if let Some(effect) = build_effect {
        let delta = effect_time
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or(std::time::Duration::ZERO);
        let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
        *effect_time = Some(now);
        frame.render_effect(effect, layout.board, TfxDuration::from_millis(delta_ms));
    }
}

fn boxed(frame: &mut Frame, theme: &Theme, area: Rect, title: &str, highlight: bool) -> Rect {
    let border = if highlight { theme.title } else { theme.div_line };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border).bg(theme.bg))
        .title(Span::styled(format!(" {title} "), Style::default().fg(theme.title)));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());
    inner
}

fn draw_board(frame: &mut Frame, session: &Session, theme: &Theme, layout: &ScreenLayout) {
    let grid_size = session.grid().size();
    boxed(
        frame,
        theme,
        layout.board_outer,
        &format!("{grid_size}x{grid_size}"),
        false,
    );
    let canvas = session.canvas();
    let board = layout.board;
    let shown = |row: u16, col: u16| -> Color {
        canvas
            .get(Coord::new(row, col))
            .map(to_color)
            .unwrap_or(theme.bg)
    };
    let buf = frame.buffer_mut();

    match layout.scale {
        CellScale::Full { width } => {
            for row in 1..=grid_size {
                let ry = board.y + row - 1;
                if ry >= board.y + board.height {
                    break;
                }
                for col in 1..=grid_size {
                    let color = shown(row, col);
                    let x0 = board.x + (col - 1) * width;
                    for rx in x0..x0 + width {
                        if rx < board.x + board.width {
                            buf[(rx, ry)]
                                .set_symbol("█")
                                .set_style(Style::default().fg(color).bg(theme.bg));
                        }
                    }
                }
            }
        }
        CellScale::Half => {
            for trow in 0..grid_size.div_ceil(2) {
                let ry = board.y + trow;
                if ry >= board.y + board.height {
                    break;
                }
                let top = trow * 2 + 1;
                for col in 1..=grid_size {
                    let rx = board.x + col - 1;
                    if rx >= board.x + board.width {
                        break;
                    }
                    let bottom = if top < grid_size {
                        shown(top + 1, col)
                    } else {
                        theme.bg
                    };
                    buf[(rx, ry)]
                        .set_symbol("▀")
                        .set_style(Style::default().fg(shown(top, col)).bg(bottom));
                }
            }
        }
    }
}

fn draw_colours(
    frame: &mut Frame,
    session: &Session,
    theme: &Theme,
    view: &View,
    layout: &ScreenLayout,
) {
    let inner = boxed(frame, theme, layout.colours, "Colour", view.hex_input.is_some());
    let palette = session.palette();
    for (i, r) in layout.swatches.iter().enumerate() {
        let c = to_color(theme.swatch(i));
        let selected = theme.swatch(i) == palette;
        let symbol = if selected { "▔" } else { "█" };
        let style = if selected {
            Style::default().fg(theme.title).bg(c)
        } else {
            Style::default().fg(c).bg(c)
        };
        Paragraph::new(symbol.repeat(r.width as usize))
            .style(style)
            .render(*r, frame.buffer_mut());
    }

    let line = match &view.hex_input {
        Some(digits) => Line::from(vec![
            Span::styled("Hex: #", Style::default().fg(theme.title)),
            Span::styled(format!("{digits}_"), Style::default().fg(theme.main_fg)),
        ]),
        None => Line::from(vec![
            Span::styled("██ ", Style::default().fg(to_color(palette))),
            Span::styled(palette.to_string(), Style::default().fg(theme.main_fg)),
        ]),
    };
    let row = Rect {
        x: inner.x,
        y: inner.y + inner.height.saturating_sub(1),
        width: inner.width,
        height: inner.height.min(1),
    };
    Paragraph::new(line).render(row, frame.buffer_mut());
}

fn draw_size(frame: &mut Frame, session: &Session, theme: &Theme, view: &View, layout: &ScreenLayout) {
    let inner = boxed(frame, theme, layout.size_box, "Size", false);
    let current = session.grid().size();
    let mut spans = vec![Span::styled(current.to_string(), Style::default().fg(theme.main_fg))];
    if view.pending_size != current {
        spans.push(Span::styled(
            format!(" → {} (Enter)", view.pending_size),
            Style::default().fg(theme.title),
        ));
    }
    Paragraph::new(Line::from(spans)).render(inner, frame.buffer_mut());
}

fn draw_gravity_button(
    frame: &mut Frame,
    session: &Session,
    theme: &Theme,
    view: &View,
    layout: &ScreenLayout,
) {
    let busy = session.is_animating();
    let area = layout.gravity_button;
    let (fg, bg) = if busy {
        (theme.inactive_fg, theme.bg)
    } else if view.gravity_hover {
        (theme.bg, theme.title)
    } else {
        (theme.title, theme.bg)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if busy { theme.div_line } else { theme.title }));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());
    let label = if busy { "Falling…" } else { "Gravity ▼" };
    Paragraph::new(Line::from(Span::styled(label, Style::default().fg(fg).bg(bg).bold())))
        .alignment(Alignment::Center)
        .style(Style::default().bg(bg))
        .render(inner, frame.buffer_mut());
}

fn draw_stats(frame: &mut Frame, session: &Session, theme: &Theme, layout: &ScreenLayout) {
    let inner = boxed(frame, theme, layout.stats, "Stats", false);
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let order = session
        .fall_order()
        .map(|o| o.cells.len().to_string())
        .unwrap_or_else(|| "-".to_string());
    let last = session
        .last_report()
        .map(|r| format!("{} moves / {} passes", r.moves, r.passes))
        .unwrap_or_else(|| "-".to_string());
    let state = if session.is_animating() {
        "falling".to_string()
    } else {
        format!("{:?}", session.phase()).to_lowercase()
    };
    let lines = vec![
        Line::from(vec![
            Span::styled("Cells: ", title_style),
            Span::styled(
                format!("{} / {}", session.grid().colored_count(), session.grid().len()),
                fg_style,
            ),
        ]),
        Line::from(vec![
            Span::styled("Painted: ", title_style),
            Span::styled(session.painted().len().to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Ordered: ", title_style),
            Span::styled(order, fg_style),
        ]),
        Line::from(vec![
            Span::styled("Last: ", title_style),
            Span::styled(last, fg_style),
        ]),
        Line::from(vec![
            Span::styled("State: ", title_style),
            Span::styled(state, fg_style),
        ]),
        Line::from(vec![
            Span::styled("Stroke: ", title_style),
            Span::styled(
                if session.stroke_active() { "down" } else { "up" },
                fg_style,
            ),
        ]),
    ];
    Paragraph::new(Text::from(lines)).render(inner, frame.buffer_mut());
}

fn draw_keys(frame: &mut Frame, theme: &Theme, view: &View, layout: &ScreenLayout) {
    let inner = boxed(frame, theme, layout.keys, "Keys", false);
    let hint = Style::default().fg(theme.inactive_fg);
    let key = Style::default().fg(theme.main_fg);
    let pairs = [
        ("drag", " paint"),
        ("1-6", " swatch  # hex"),
        ("g/spc", " gravity"),
        ("+/-", " size  ⏎ build"),
        ("r", " reset  q quit"),
    ];
    let mut lines: Vec<Line> = pairs
        .iter()
        .map(|(k, d)| Line::from(vec![Span::styled(*k, key), Span::styled(*d, hint)]))
        .collect();
    if let Some(status) = &view.status {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            status.clone(),
            Style::default().fg(theme.title),
        )));
    }
    Paragraph::new(Text::from(lines)).render(inner, frame.buffer_mut());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(w: u16, h: u16) -> Rect {
        Rect::new(0, 0, w, h)
    }

    #[test]
    fn scale_prefers_double_width() {
        assert_eq!(CellScale::pick(16, 40, 20), CellScale::Full { width: 2 });
        assert_eq!(CellScale::pick(16, 20, 20), CellScale::Full { width: 1 });
        assert_eq!(CellScale::pick(100, 120, 40), CellScale::Half);
        assert_eq!(CellScale::Half.board_cells(5), (5, 3));
    }

    #[test]
    fn board_fits_inside_area() {
        for (w, h, size) in [(80, 24, 16), (200, 60, 100), (40, 10, 50)] {
            let l = screen_layout(area(w, h), size);
            assert!(l.board_outer.right() <= w);
            assert!(l.board_outer.bottom() <= h);
            assert!(l.board.width <= l.board_outer.width);
        }
    }

    #[test]
    fn full_scale_hit_test() {
        let l = screen_layout(area(120, 40), 16);
        assert_eq!(l.scale, CellScale::Full { width: 2 });
        let (bx, by) = (l.board.x, l.board.y);
        assert_eq!(l.cells_at(bx, by), vec![Coord::new(1, 1)]);
        assert_eq!(l.cells_at(bx + 1, by), vec![Coord::new(1, 1)]);
        assert_eq!(l.cells_at(bx + 2, by + 3), vec![Coord::new(4, 2)]);
        assert!(l.cells_at(l.board_outer.x, l.board_outer.y).is_empty());
    }

    #[test]
    fn half_scale_hits_two_rows() {
        let l = screen_layout(area(140, 60), 99);
        assert_eq!(l.scale, CellScale::Half);
        let (bx, by) = (l.board.x, l.board.y);
        assert_eq!(l.cells_at(bx + 4, by + 1), vec![Coord::new(3, 5), Coord::new(4, 5)]);
        // Odd size: last terminal row only holds the top half.
        assert_eq!(l.cells_at(bx, by + 49), vec![Coord::new(99, 1)]);
    }

    #[test]
    fn swatches_and_button_are_hit_testable() {
        let l = screen_layout(area(120, 40), 16);
        let s = l.swatches[3];
        assert_eq!(l.swatch_at(s.x, s.y), Some(3));
        let b = l.gravity_button;
        assert!(l.over_gravity_button(b.x + 1, b.y + 1));
        assert!(!l.over_gravity_button(l.board.x, l.board.y));
    }
}
