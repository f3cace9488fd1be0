use clap::Parser;
use plotview::{init_logging, run, RunOptions, BUILD_DATE, VERSION};
use std::path::PathBuf;
use tracing::info;

/// Headless 3D plot viewer
#[derive(Parser, Debug)]
#[command(name = "plotview", version, about)]
struct Args {
    /// Configuration file (JSON or TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Plot data file: a JSON array of {"px", "py", "pz"} objects
    #[arg(long)]
    data: Option<PathBuf>,

    /// Number of frames to animate before exiting
    #[arg(long, default_value_t = 120)]
    frames: u64,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging()?;
    info!("PlotView {} (built {})", VERSION, BUILD_DATE);

    let options = RunOptions {
        config: args.config,
        data: args.data,
        frames: args.frames,
        width: args.width,
        height: args.height,
    };

    let local = tokio::task::LocalSet::new();
    let summary = local.run_until(run(&options)).await?;
    info!(
        "Done: {} points, {} frames animated, {} rendered",
        summary.plot_points, summary.frames_animated, summary.frames_rendered
    );
    Ok(())
}
