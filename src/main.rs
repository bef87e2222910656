//! handwave — turn per-frame hand observations into discrete
//! navigation events: left/right swipes and debounced pose gestures.

mod debounce;
mod hand;
mod pipeline;
mod pose;
mod signal;
mod source;
mod swipe;
mod timing;

use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing::{info, warn};

use debounce::{DebounceConfig, Gesture};
use hand::FrameSize;
use pipeline::{run_loop, LoopConfig, Pipeline};
use pose::{TemplateClassifier, MATCH_THRESHOLD};
use source::{FrameSource, ReplaySource, ScriptedSource};
use swipe::{BandMapping, SwipeConfig, SwipeDirection};

#[derive(Parser, Debug)]
#[command(name = "handwave", about = "Hand-gesture navigation pipeline")]
struct Cli {
    /// Replay a recorded detection trace instead of the built-in demo
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Frame dimensions as WxH (fixed for the whole session)
    #[arg(long, default_value = "640x480")]
    resolution: String,

    /// Frame rate to pace the loop at
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Edge-band direction mapping: mirrored or screen
    #[arg(long, default_value = "mirrored")]
    mapping: String,

    /// Pose classifier match threshold (0-10)
    #[arg(long, default_value_t = MATCH_THRESHOLD)]
    threshold: f32,

    /// Exit after N seconds
    #[arg(long)]
    exit_after: Option<u64>,

    /// Seconds between periodic status log lines
    #[arg(long, default_value_t = 10)]
    status_interval: u64,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

/// Demo consumer: maps the event streams to navigation actions the
/// way the host UI does — a right swipe opens the panel, a left swipe
/// closes it, `one`/`two` select a destination, `ok` confirms.
struct NavDemo {
    swipe_rx: Receiver<Option<SwipeDirection>>,
    gesture_rx: Receiver<Option<Gesture>>,
    panel_open: bool,
    selected: Option<u8>,
}

impl NavDemo {
    fn new(
        swipe_rx: Receiver<Option<SwipeDirection>>,
        gesture_rx: Receiver<Option<Gesture>>,
    ) -> Self {
        Self {
            swipe_rx,
            gesture_rx,
            panel_open: false,
            selected: None,
        }
    }

    /// Drain pending events; quiescent `None` values are filtered out.
    fn poll(&mut self) {
        for direction in self.swipe_rx.try_iter().flatten() {
            match direction {
                SwipeDirection::Right => {
                    self.panel_open = true;
                    info!("Navigation panel opened");
                }
                SwipeDirection::Left => {
                    self.panel_open = false;
                    info!("Navigation panel closed");
                }
            }
        }
        for gesture in self.gesture_rx.try_iter().flatten() {
            match gesture {
                Gesture::One => {
                    self.selected = Some(1);
                    info!("Destination 1 selected");
                }
                Gesture::Two => {
                    self.selected = Some(2);
                    info!("Destination 2 selected");
                }
                Gesture::Ok => match self.selected {
                    Some(dest) => info!("Navigating to destination {}", dest),
                    None => warn!("Confirm gesture with no destination selected"),
                },
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("handwave {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "handwave=info".into()),
        )
        .init();

    info!("handwave v{} starting", env!("CARGO_PKG_VERSION"));

    let size = FrameSize::parse(&cli.resolution)
        .ok_or_else(|| anyhow!("invalid resolution \"{}\", expected WxH", cli.resolution))?;
    let mapping = BandMapping::from_str(&cli.mapping)
        .ok_or_else(|| anyhow!("invalid mapping \"{}\", expected mirrored or screen", cli.mapping))?;
    if cli.fps == 0 {
        return Err(anyhow!("fps must be positive"));
    }
    info!(
        "frame {}x{}, {} fps, {} mapping, threshold {:.1}",
        size.width,
        size.height,
        cli.fps,
        mapping.as_str(),
        cli.threshold,
    );

    // Fail fast: a source that cannot be acquired aborts startup.
    let frame_source: Box<dyn FrameSource> = match &cli.replay {
        Some(path) => Box::new(ReplaySource::from_path(path, size)?),
        None => {
            info!("No trace given, running built-in demo script");
            Box::new(ScriptedSource::new(size, cli.fps))
        }
    };

    let mut pipeline = Pipeline::new(
        size,
        SwipeConfig {
            mapping,
            ..SwipeConfig::default()
        },
        DebounceConfig::default(),
        Box::new(TemplateClassifier::new()),
        cli.threshold,
    );

    let mut nav = NavDemo::new(
        pipeline.swipe_signal.subscribe(),
        pipeline.gesture_signal.subscribe(),
    );

    let config = LoopConfig {
        frame_interval: Duration::from_secs_f64(1.0 / cli.fps as f64),
        status_interval: Duration::from_secs(cli.status_interval.max(1)),
        exit_after: cli.exit_after.map(Duration::from_secs),
    };
    run_loop(pipeline, frame_source, config, move |_| nav.poll())
}
