//! Yoga Levels - five-pose practice journey with live accuracy feedback
//!
//! Single-session, in-memory, self-contained CLI application.
//! Landmarks come from a recording (`--replay`) or the built-in simulator.

mod cli;
mod config;
mod error;
mod estimator;
mod pose;
mod session;

use anyhow::{Context, Result};
use clap::Parser;
use cli::display::{self, Display};
use cli::input::{Input, InputHandler};
use config::Config;
use error::EstimatorError;
use estimator::simulated::SimulationNoise;
use estimator::{LandmarkEstimator, ReplayEstimator, SimulatedEstimator};
use pose::{get_reference, Level, LandmarkSet, PoseComparator};
use session::{Command, SessionController, SessionSnapshot, Stage};
use std::fs::{self, File};
use std::io::{stdout, BufReader};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "yoga-levels")]
#[command(about = "Five-level yoga pose trainer with accuracy scoring and hold timing")]
struct Args {
    /// JSON config file (missing fields use defaults)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Play back a JSON-lines landmark recording instead of simulating
    #[arg(long, value_name = "FILE")]
    replay: Option<PathBuf>,

    /// Frames per second
    #[arg(long, default_value_t = 10)]
    fps: u32,

    /// Starting level (1-5)
    #[arg(short, long, default_value_t = 1)]
    level: u8,

    /// Simulator seed
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Print one JSON snapshot per frame instead of drawing the UI
    #[arg(long)]
    headless: bool,

    /// Stop after this many frames
    #[arg(long)]
    max_frames: Option<u64>,

    /// Show the per-constraint breakdown
    #[arg(short, long)]
    debug: bool,

    /// Score one recorded frame (JSON array) against every level and exit
    #[arg(long, value_name = "FILE", conflicts_with_all = ["replay", "headless"])]
    extract: Option<PathBuf>,
}

/// Where frames come from
enum Source {
    Replay(ReplayEstimator<BufReader<File>>),
    Simulated(SimulatedEstimator),
}

impl LandmarkEstimator for Source {
    type Frame = Level;

    fn estimate(&mut self, level: &Level) -> Result<Option<LandmarkSet>, EstimatorError> {
        match self {
            Source::Replay(replay) => replay.estimate(&()),
            Source::Simulated(sim) => sim.estimate(level),
        }
    }
}

fn init_logging(headless: bool) {
    // The terminal UI owns stdout and the screen, so keep stderr quiet there.
    let default = if headless { "info" } else { "error" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(Config::default()),
    }
}

fn run_extract(path: &Path, config: &Config) -> Result<()> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let landmarks: LandmarkSet = serde_json::from_str(content.trim())
        .with_context(|| format!("{} is not a 33-point landmark array", path.display()))?;

    let comparator = PoseComparator::new(config.comparator_settings());
    let results = Level::all()
        .map(|level| -> Result<_> {
            let reference = get_reference(level.number())?;
            Ok((reference, comparator.compare(Some(&landmarks), reference)))
        })
        .collect::<Result<Vec<_>>>()?;
    display::show_extraction(&results);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.headless);

    let config = load_config(args.config.as_deref())?;

    if let Some(path) = &args.extract {
        return run_extract(path, &config);
    }

    let start = Level::new(args.level).context("--level")?;
    if args.fps == 0 {
        anyhow::bail!("--fps must be at least 1");
    }
    let frame_time = Duration::from_secs_f64(1.0 / f64::from(args.fps));

    let mut source = match &args.replay {
        Some(path) => Source::Replay(
            ReplayEstimator::open(path)
                .with_context(|| format!("opening recording {}", path.display()))?,
        ),
        None => Source::Simulated(SimulatedEstimator::new(args.seed, SimulationNoise::default())),
    };

    let mut controller = SessionController::new(&config);
    if start != Level::FIRST {
        controller.submit(Command::JumpTo(start.number()));
    }
    info!(level = %start, fps = args.fps, "session started");

    if args.headless {
        run_headless(&args, &mut controller, &mut source, frame_time)?;
    } else {
        run_interactive(&args, &mut controller, &mut source, frame_time)?;
    }

    let reached = match controller.stage() {
        Stage::Complete => "the end of the journey".to_string(),
        Stage::Level(level) => format!("level {level}"),
    };
    if args.headless {
        info!(
            frames = controller.stats().frames(),
            detection_rate = controller.stats().detection_rate(),
            reached = %reached,
            "session finished"
        );
    } else {
        display::show_summary(controller.stats(), controller.library(), &reached);
    }
    Ok(())
}

/// `None` once the source has run dry; persistent estimator failure ends the run
fn next_snapshot(step: Result<SessionSnapshot, EstimatorError>) -> Result<Option<SessionSnapshot>> {
    match step {
        Ok(snap) => Ok(Some(snap)),
        Err(EstimatorError::Exhausted) => {
            info!("landmark source exhausted");
            Ok(None)
        }
        Err(e) => Err(e).context("landmark source keeps failing"),
    }
}

/// Fixed time step, JSON out, stops at journey end or when the source runs dry
fn run_headless(
    args: &Args,
    controller: &mut SessionController,
    source: &mut Source,
    frame_time: Duration,
) -> Result<()> {
    let mut out = stdout().lock();
    let mut frames = 0u64;
    loop {
        if args.max_frames.is_some_and(|max| frames >= max) {
            break;
        }
        let level = controller.level();
        let Some(snap) = next_snapshot(controller.step(source, &level, frame_time))? else {
            break;
        };
        display::write_json(&mut out, &snap)?;
        frames += 1;
        if snap.is_complete() {
            break;
        }
    }
    Ok(())
}

/// Wall-clock frames with keyboard control
fn run_interactive(
    args: &Args,
    controller: &mut SessionController,
    source: &mut Source,
    frame_time: Duration,
) -> Result<()> {
    let mut display = Display::new(args.debug);
    let input = InputHandler::new();
    InputHandler::enable_raw_mode()?;
    display.clear()?;

    let mut frames = 0u64;
    let mut last = Instant::now();
    'session: loop {
        if args.max_frames.is_some_and(|max| frames >= max) {
            break;
        }
        for key in input.poll()? {
            match key {
                Input::Quit => break 'session,
                Input::ToggleDebug => display.toggle_debug(),
                Input::Command(command) => controller.submit(command),
            }
        }

        let now = Instant::now();
        let elapsed = now - last;
        last = now;

        let level = controller.level();
        let Some(snap) = next_snapshot(controller.step(source, &level, elapsed))? else {
            break;
        };
        display.render(&snap, controller.current_reference())?;
        frames += 1;

        if let Some(rest) = frame_time.checked_sub(last.elapsed()) {
            thread::sleep(rest);
        }
    }

    display.shutdown()?;
    Ok(())
}
