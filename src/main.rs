/*
 * Boid Flocking Simulation - Headless Runner
 *
 * Runs the flock for a fixed number of ticks without a window and logs
 * timing. Useful for profiling the octree and checking configs.
 */

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use flock3d::{ControlDirection, FlockSimulator, SimConfig};

#[derive(Parser)]
#[command(name = "flock3d")]
#[command(about = "3D boid flocking simulation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation headless
    Run {
        /// Path to config file (JSON); defaults are used when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of ticks to run
        #[arg(long, default_value_t = 600)]
        ticks: u64,

        /// Steer the predator around the six directions every N ticks (0 = never)
        #[arg(long, default_value_t = 0)]
        chase_every: u64,
    },
    /// Dump the default configuration to stdout
    DumpDefaultConfig,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            ticks,
            chase_every,
        } => {
            let config = match config {
                Some(path) => SimConfig::load(&path)
                    .with_context(|| format!("loading config from {}", path.display()))?,
                None => SimConfig::default(),
            };
            run(config, ticks, chase_every)
        }
        Commands::DumpDefaultConfig => {
            println!("{}", SimConfig::default().to_json_pretty()?);
            Ok(())
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn run(config: SimConfig, ticks: u64, chase_every: u64) -> Result<()> {
    let mut simulator = FlockSimulator::new(config).context("building simulator")?;
    info!(agents = simulator.agents().len(), ticks, "Starting headless run");

    let mut total_ms = 0.0;
    let mut worst_ms: f64 = 0.0;
    for tick in 0..ticks {
        if chase_every > 0 && tick % chase_every == 0 {
            let direction = ControlDirection::ALL[((tick / chase_every) % 6) as usize];
            simulator.push_control(direction);
        }

        let stats = simulator.step();
        total_ms += stats.total_ms();
        worst_ms = worst_ms.max(stats.total_ms());
    }

    let out_of_bounds = simulator
        .agents()
        .iter()
        .filter(|agent| !simulator.config().bounds().contains(agent.position()))
        .count();
    if out_of_bounds > 0 {
        warn!(out_of_bounds, "Agents outside world bounds at end of run");
    }

    info!(
        ticks,
        mean_ms = if ticks > 0 { total_ms / ticks as f64 } else { 0.0 },
        worst_ms,
        overruns = simulator.overrun_count(),
        "Run complete"
    );
    Ok(())
}
