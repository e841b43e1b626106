//! App: terminal init, main loop, mouse and key handling.

use crate::grid::{DEFAULT_GRID_SIZE, clamp_size};
use crate::input::{Action, key_to_action};
use crate::session::Session;
use crate::theme::Theme;
use crate::ui::{self, View};
use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tachyonfx::Effect;
use tracing::{debug, info, warn};

/// Whether the event loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct App {
    theme: Theme,
    session: Session,
    view: View,
    frame_interval: Duration,
    /// Fade-in played after a grid build (None when disabled or finished).
    build_effect: Option<Effect>,
    effect_time: Option<Instant>,
    fade_enabled: bool,
    /// Last drawn terminal area; mouse positions are resolved against it.
    area: Rect,
}

impl App {
    pub fn new(session: Session, theme: Theme, frame_rate: f64, fade_enabled: bool) -> Self {
        let frame_rate = if frame_rate.is_finite() && frame_rate > 0.0 {
            frame_rate
        } else {
            30.0
        };
        let view = View {
            pending_size: session.grid().size(),
            ..View::default()
        };
        let build_effect = fade_enabled.then(|| ui::build_fade(&theme));
        Self {
            theme,
            session,
            view,
            frame_interval: Duration::from_secs_f64(1.0 / frame_rate),
            build_effect,
            effect_time: None,
            fade_enabled,
            area: Rect::default(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
        info!(size = self.session.grid().size(), "session started");

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            self.session.tick(now);
            if self.build_effect.as_ref().is_some_and(|e| e.done()) {
                self.build_effect = None;
                self.effect_time = None;
            }

            let mut area = self.area;
            terminal.draw(|f| {
                area = f.area();
                ui::draw(
                    f,
                    &self.session,
                    &self.theme,
                    &self.view,
                    &mut self.build_effect,
                    &mut self.effect_time,
                    now,
                );
            })?;
            self.area = area;

            let timeout = self.frame_interval.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let flow = match event::read()? {
                        Event::Key(key) => self.on_key(key, Instant::now()),
                        Event::Mouse(mouse) => self.on_mouse(mouse, Instant::now()),
                        _ => Flow::Continue,
                    };
                    if flow == Flow::Quit {
                        info!("quit");
                        return Ok(());
                    }
                }
            }
        }
    }

    fn on_key(&mut self, key: KeyEvent, now: Instant) -> Flow {
        if key.kind != KeyEventKind::Press {
            return Flow::Continue;
        }
        if self.view.hex_input.is_some() {
            self.on_hex_key(key.code);
            return Flow::Continue;
        }
        self.apply_action(key_to_action(key), now)
    }

    /// Keys while typing a `#RRGGBB` colour.
    fn on_hex_key(&mut self, code: KeyCode) {
        let Some(digits) = self.view.hex_input.as_mut() else {
            return;
        };
        match code {
            KeyCode::Char(c) if c.is_ascii_hexdigit() && digits.len() < 6 => {
                digits.push(c.to_ascii_uppercase());
            }
            KeyCode::Backspace => {
                digits.pop();
            }
            KeyCode::Esc => self.view.hex_input = None,
            KeyCode::Enter => {
                let hex = format!("#{digits}");
                self.view.hex_input = None;
                match self.session.set_palette_color(&hex) {
                    Ok(rgb) => {
                        debug!(%rgb, "palette colour set");
                        self.view.status = None;
                    }
                    Err(e) => {
                        warn!(error = %e, "rejected colour");
                        self.view.status = Some(e.to_string());
                    }
                }
            }
            _ => {}
        }
    }

    fn apply_action(&mut self, action: Action, now: Instant) -> Flow {
        match action {
            Action::Quit => return Flow::Quit,
            Action::Gravity => self.start_gravity(now),
            Action::PrecomputeOrder => {
                self.session.precompute_order();
            }
            Action::Reset => {
                self.session.reset(now);
                self.view = View {
                    pending_size: DEFAULT_GRID_SIZE,
                    ..View::default()
                };
                self.restart_fade();
            }
            Action::Rebuild => self.rebuild(now),
            Action::GrowSize => {
                self.view.pending_size = clamp_size(i64::from(self.view.pending_size) + 1);
            }
            Action::ShrinkSize => {
                self.view.pending_size = clamp_size(i64::from(self.view.pending_size) - 1);
            }
            Action::Swatch(i) => self.session.set_palette(self.theme.swatch(i)),
            Action::BeginHexColor => self.view.hex_input = Some(String::new()),
            Action::None => {}
        }
        Flow::Continue
    }

    fn on_mouse(&mut self, mouse: MouseEvent, now: Instant) -> Flow {
        let layout = ui::screen_layout(self.area, self.session.grid().size());
        let (x, y) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(i) = layout.swatch_at(x, y) {
                    self.session.set_palette(self.theme.swatch(i));
                } else if layout.over_gravity_button(x, y) {
                    self.start_gravity(now);
                } else {
                    self.session.set_stroke(true);
                    self.session.hover(&layout.cells_at(x, y), now);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => self.session.set_stroke(false),
            MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
                let over_button = layout.over_gravity_button(x, y);
                // Entering the button is the cue to get the fall order ready.
                if over_button && !self.view.gravity_hover && !self.session.is_animating() {
                    self.session.precompute_order();
                }
                self.view.gravity_hover = over_button;
                self.session.hover(&layout.cells_at(x, y), now);
            }
            _ => {}
        }
        Flow::Continue
    }

    fn start_gravity(&mut self, now: Instant) {
        self.view.status = match self.session.start_gravity(now) {
            Some(_) => None,
            None => Some("still falling…".to_string()),
        };
    }

    fn rebuild(&mut self, now: Instant) {
        let requested = self.view.pending_size;
        let size = self.session.rebuild(i64::from(requested), now);
        self.view.pending_size = size;
        self.view.status = None;
        self.restart_fade();
    }

    fn restart_fade(&mut self) {
        if self.fade_enabled {
            self.build_effect = Some(ui::build_fade(&self.theme));
            self.effect_time = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Coord, Rgb};
    use crate::session::SessionConfig;
    use crossterm::event::KeyModifiers;

    fn app() -> App {
        let config = SessionConfig {
            grid_size: 8,
            throttle: Duration::ZERO,
            ..SessionConfig::default()
        };
        let mut app = App::new(Session::new(config, Instant::now()), Theme::default(), 30.0, false);
        app.area = Rect::new(0, 0, 120, 40);
        app
    }

    fn key(app: &mut App, code: KeyCode) -> Flow {
        app.on_key(KeyEvent::new(code, KeyModifiers::NONE), Instant::now())
    }

    fn mouse(app: &mut App, kind: MouseEventKind, x: u16, y: u16) {
        let ev = MouseEvent {
            kind,
            column: x,
            row: y,
            modifiers: KeyModifiers::NONE,
        };
        app.on_mouse(ev, Instant::now());
    }

    #[test]
    fn hex_entry_sets_palette() {
        let mut app = app();
        key(&mut app, KeyCode::Char('#'));
        for c in "ff8000".chars() {
            key(&mut app, KeyCode::Char(c));
        }
        key(&mut app, KeyCode::Enter);
        assert_eq!(app.session.palette(), Rgb(255, 128, 0));
        assert!(app.view.hex_input.is_none());
    }

    #[test]
    fn short_hex_entry_reports_and_keeps_palette() {
        let mut app = app();
        app.session.set_palette(Rgb(1, 2, 3));
        key(&mut app, KeyCode::Char('#'));
        key(&mut app, KeyCode::Char('a'));
        key(&mut app, KeyCode::Enter);
        assert_eq!(app.session.palette(), Rgb(1, 2, 3));
        assert!(app.view.status.is_some());
    }

    #[test]
    fn drag_paints_and_release_stops() {
        let mut app = app();
        let layout = ui::screen_layout(app.area, 8);
        let (bx, by) = (layout.board.x, layout.board.y);
        mouse(&mut app, MouseEventKind::Down(MouseButton::Left), bx, by);
        mouse(&mut app, MouseEventKind::Drag(MouseButton::Left), bx + 2, by);
        mouse(&mut app, MouseEventKind::Up(MouseButton::Left), bx + 2, by);
        mouse(&mut app, MouseEventKind::Moved, bx + 4, by);
        assert_eq!(app.session.painted(), &[Coord::new(1, 1), Coord::new(1, 2)]);
    }

    #[test]
    fn size_keys_clamp_and_rebuild() {
        let mut app = app();
        for _ in 0..20 {
            key(&mut app, KeyCode::Char('-'));
        }
        assert_eq!(app.view.pending_size, 1);
        key(&mut app, KeyCode::Enter);
        assert_eq!(app.session.grid().size(), 1);
    }

    #[test]
    fn hovering_gravity_button_precomputes_order() {
        let mut app = app();
        let layout = ui::screen_layout(app.area, 8);
        let (bx, by) = (layout.board.x, layout.board.y);
        mouse(&mut app, MouseEventKind::Down(MouseButton::Left), bx, by);
        mouse(&mut app, MouseEventKind::Up(MouseButton::Left), bx, by);
        assert!(app.session.fall_order().is_none());

        let b = layout.gravity_button;
        mouse(&mut app, MouseEventKind::Moved, b.x + 1, b.y + 1);
        assert_eq!(app.session.fall_order().map(|o| o.cells.len()), Some(1));

        mouse(&mut app, MouseEventKind::Down(MouseButton::Left), b.x + 1, b.y + 1);
        assert!(app.session.grid().cell_at(8, 1).unwrap().colored);
    }

    #[test]
    fn quit_key_stops_loop() {
        let mut app = app();
        assert_eq!(key(&mut app, KeyCode::Char('q')), Flow::Quit);
    }
}
