//! # PlotView
//!
//! A headless 3D plot viewer: a polyline of plot points, three dashed axis
//! lines and a lit, fogged scene, viewed through a perspective camera driven
//! by trackball controls.
//!
//! ## Architecture
//!
//! 1. **plotview-core** - Plot points, errors, shared handles, subscription ids
//! 2. **plotview-settings** - Viewer configuration and persistence
//! 3. **plotview-visualizer** - Camera, scene, renderer, controls, viewer state
//! 4. **plotview** - Binary that loads data and drives the animation loop

use anyhow::Context;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::info;

pub use plotview_core::{
    load_plot_points, parse_plot_points, sample_plot_points, DataError, Error, PlotPoint, Result,
    ViewerError, ViewerResult,
};
pub use plotview_settings::{config_dir, ViewerConfig, CONFIG_FILE_NAME};
pub use plotview_visualizer::{
    animate, animate_for, frame_interval, init, AnimationHandle, HeadlessHost, PerspectiveCamera,
    Scene, TrackballControls, ViewerState,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with console output and `RUST_LOG` support.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(())
}

/// What a headless run should load and how long it should animate
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Configuration file; the user config directory is tried when absent
    pub config: Option<PathBuf>,
    /// Plot data file; the bundled sample is used when absent
    pub data: Option<PathBuf>,
    pub frames: u64,
    pub width: u32,
    pub height: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            config: None,
            data: None,
            frames: 120,
            width: 800,
            height: 600,
        }
    }
}

/// Outcome of a headless run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub plot_points: usize,
    pub frames_animated: u64,
    pub frames_rendered: u64,
}

/// Resolve the configuration for a run
pub fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<ViewerConfig> {
    match path {
        Some(path) => ViewerConfig::load_from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => {
            let default_path = config_dir()?.join(CONFIG_FILE_NAME);
            ViewerConfig::load_or_default(&default_path)
                .with_context(|| format!("failed to load config from {}", default_path.display()))
        }
    }
}

/// Initialize a viewer into a headless host and animate it for
/// `options.frames` frames.
///
/// Must be awaited inside a `tokio::task::LocalSet`.
pub async fn run(options: &RunOptions) -> anyhow::Result<RunSummary> {
    let config = load_config(options.config.as_deref())?;
    let points = match &options.data {
        Some(path) => load_plot_points(path)
            .with_context(|| format!("failed to load plot data from {}", path.display()))?,
        None => sample_plot_points()?,
    };
    let interval = frame_interval(&config.renderer);

    let mut host = HeadlessHost::default();
    let mut state = ViewerState::with_config(config);
    init(&mut state, options.width, options.height, &mut host, &points).await?;

    let state = plotview_core::shared(state);
    let frames_animated = animate_for(Rc::clone(&state), interval, options.frames)?
        .wait()
        .await?;

    let frames_rendered = state
        .borrow()
        .renderer()
        .map_or(0, |renderer| renderer.borrow().frames_rendered());

    info!(
        "Animated {} frames, rendered {} frames for {} plot points",
        frames_animated,
        frames_rendered,
        points.len()
    );

    Ok(RunSummary {
        plot_points: points.len(),
        frames_animated,
        frames_rendered,
    })
}
