//! Blockfall: falling-block puzzle in the terminal.

mod app;
mod input;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use blockfall::{PieceSource, RandomPieces, Rules, ScriptedPieces};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Options that affect the front end rather than the rules.
#[derive(Debug, Clone)]
pub struct FrontConfig {
    pub no_menu: bool,
    pub no_animation: bool,
    pub frame_rate: f64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = args.log_file.as_deref() {
        init_logging(path)?;
    }
    let rules = args.rules();
    rules.validate().context("invalid game rules")?;
    let pieces = piece_source(&args)?;
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette)
        .with_context(|| format!("failed to load theme {:?}", args.theme))?;
    let front = FrontConfig {
        no_menu: args.no_menu,
        no_animation: args.no_animation,
        frame_rate: args.frame_rate,
    };

    let mut app = App::new(rules, pieces, theme, front);
    app.run()?;

    // One JSON line per finished game, after the terminal is restored.
    for result in app.results() {
        println!("{}", serde_json::to_string(result)?);
    }
    Ok(())
}

fn piece_source(args: &Args) -> Result<Box<dyn PieceSource>> {
    if let Some(tags) = args.sequence.as_deref() {
        let scripted = ScriptedPieces::parse(tags).context("invalid --sequence")?;
        return Ok(Box::new(scripted));
    }
    Ok(match args.seed {
        Some(seed) => Box::new(RandomPieces::seeded(seed)),
        None => Box::new(RandomPieces::new()),
    })
}

/// The terminal is busy drawing the game, so logs only go to a file.
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

/// Falling-block puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "blockfall",
    version,
    about = "Falling-block puzzle in the terminal. Stack the pieces and clear full rows.",
    long_about = "Blockfall is a falling-block puzzle game for the terminal.\n\n\
        Pieces fall on a timer that speeds up every 20 seconds. Fill a row edge to edge \
        to clear it for 100 points. The game ends when a new piece has no room to spawn.\n\n\
        CONTROLS:\n  Left/h  Move left    Right/l  Move right    Down/j  Soft drop\n  \
        Up/k/Space  Rotate   Enter  Start / restart     q/Esc  Quit\n\n\
        Each finished game is printed to stdout as a JSON line on exit."
)]
pub struct Args {
    /// Playfield width in cells.
    #[arg(long, default_value = "15", value_name = "COLS")]
    pub width: usize,

    /// Playfield height in cells.
    #[arg(long, default_value = "30", value_name = "ROWS")]
    pub height: usize,

    /// Initial drop interval in milliseconds.
    #[arg(long, default_value = "980", value_name = "MS")]
    pub drop_ms: u64,

    /// Fastest drop interval the ramp can reach, in milliseconds.
    #[arg(long, default_value = "100", value_name = "MS")]
    pub min_drop_ms: u64,

    /// How much the interval shrinks per ramp step, in milliseconds.
    #[arg(long, default_value = "33", value_name = "MS")]
    pub ramp_step_ms: u64,

    /// Time between ramp steps, in milliseconds.
    #[arg(long, default_value = "20000", value_name = "MS")]
    pub ramp_period_ms: u64,

    /// Seed for the piece randomizer (same seed, same pieces).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Cycle a fixed piece sequence instead of random pieces, e.g. "TOIL".
    #[arg(long, value_name = "TAGS", conflicts_with = "seed")]
    pub sequence: Option<String>,

    /// Path to theme file (btop-style theme[key]="value"). Keys: piece1..piece7, bg, div_line, main_fg, title.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Skip the start screen and begin immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Disable the line-clear flash.
    #[arg(long)]
    pub no_animation: bool,

    /// Target frames per second for the game loop.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Write logs to this file (filter with RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

impl Args {
    fn rules(&self) -> Rules {
        Rules {
            width: self.width,
            height: self.height,
            initial_interval: Duration::from_millis(self.drop_ms),
            ramp_step: Duration::from_millis(self.ramp_step_ms),
            ramp_period: Duration::from_millis(self.ramp_period_ms),
            min_interval: Duration::from_millis(self.min_drop_ms),
            ..Rules::default()
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
