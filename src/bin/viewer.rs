/*
 * Boid Flocking Simulation - Viewer
 *
 * Opens a window onto the running flock. Build with `--features viewer`.
 */

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use flock3d::SimConfig;

#[derive(Parser)]
#[command(name = "flock-viewer")]
#[command(about = "Interactive view of the 3D boid flock")]
struct Cli {
    /// Path to config file (JSON); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let cli = Cli::parse();
    let config = match cli.config {
        Some(path) => SimConfig::load(&path).with_context(|| format!("loading config from {}", path.display()))?,
        None => SimConfig::default(),
    };
    flock3d::viewer::run(config).context("running viewer")
}
