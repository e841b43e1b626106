//! gravsketch: paint a grid in the terminal, then let gravity settle the painted cells.

mod app;
mod canvas;
mod gravity;
mod grid;
mod input;
mod order;
mod paint;
mod schedule;
mod session;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use grid::{DEFAULT_GRID_SIZE, Rgb};
use session::{Session, SessionConfig};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;
    let theme = match theme::Theme::load(args.theme.as_deref(), args.palette) {
        Ok(theme) => theme,
        Err(e) => {
            tracing::warn!(error = %e, "theme not loaded; using defaults");
            theme::Theme::default()
        }
    };
    let config = SessionConfig::from(&args);
    let session = Session::new(config, Instant::now());
    let mut app = App::new(session, theme, args.frame_rate, !args.no_animation);
    app.run()?;
    Ok(())
}

/// Log to `path` when given; the terminal itself belongs to the UI.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn parse_color(s: &str) -> Result<Rgb, paint::ColorError> {
    paint::hex_to_rgb(s)
}

/// Paint a grid, then drop everything you painted with gravity.
#[derive(Debug, Parser)]
#[command(
    name = "gravsketch",
    version,
    about = "Paint cells on a grid in the terminal, then switch on gravity and watch them fall and stack.",
    long_about = "gravsketch is a terminal sketch pad with gravity.\n\n\
        Hold the left mouse button and drag over the board to paint. Hover the Gravity \
        button to get the fall order ready, click it (or press g) and every painted cell \
        falls straight down, one row at a time, until it rests on the floor or on another cell.\n\n\
        KEYS:\n  1-6         Swatch      #          Type a hex colour (Enter applies, Esc cancels)\n  \
        g / Space   Gravity     o          Prepare fall order\n  \
        + / -       Grid size   Enter      Rebuild at the new size\n  \
        r           Reset       q / Esc    Quit"
)]
pub struct Args {
    /// Grid size (cells per side). Clamped to 1..=100.
    #[arg(short, long, default_value_t = DEFAULT_GRID_SIZE as u32, value_name = "CELLS")]
    pub size: u32,

    /// Time in ms for a cell to fall the full height of the grid (per-row delay = this / size).
    #[arg(long, default_value = "10000", value_name = "MS")]
    pub fall_ms: u64,

    /// Minimum ms between two paints while dragging.
    #[arg(long, default_value = "1", value_name = "MS")]
    pub throttle_ms: u64,

    /// Starting paint colour.
    #[arg(short, long, default_value = "#000000", value_parser = parse_color, value_name = "#RRGGBB")]
    pub color: Rgb,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Swatch palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Target render frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Show gravity results at once instead of animating the fall.
    #[arg(long)]
    pub no_animation: bool,

    /// Write logs here (filter with RUST_LOG). Nothing is logged without it.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

impl From<&Args> for SessionConfig {
    fn from(args: &Args) -> Self {
        Self {
            grid_size: grid::clamp_size(i64::from(args.size)),
            fall_duration: Duration::from_millis(args.fall_ms),
            throttle: Duration::from_millis(args.throttle_ms),
            initial_color: args.color,
            animate: !args.no_animation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
