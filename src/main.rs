use std::path::PathBuf;

use anyhow::Context;
use bevy::prelude::*;
use clap::Parser;
use log::info;
use mechwalk::{init_logging, MechPlugin, PathRequest, SetLegCount, SimConfig, Simulation};

/// Ticks between progress reports.
const REPORT_INTERVAL: u64 = 60;

/// A walking mech crossing generated terrain
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Simulation ticks to run before exiting
    #[arg(short, long, default_value_t = 600)]
    ticks: u64,

    /// Rebuild the mech with this many legs
    #[arg(short, long)]
    legs: Option<usize>,

    /// Goal in world space
    #[arg(long, num_args = 2, value_names = ["X", "Z"], allow_negative_numbers = true)]
    goal: Option<Vec<f32>>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => SimConfig::default(),
    };
    let start = config.world.start();
    let goal = match args.goal.as_deref() {
        Some([x, z]) => Vec3::new(*x, 0.0, *z),
        _ => start + Vec3::new(40.0, 0.0, 0.0),
    };

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(MechPlugin::new(config));
    app.finish();
    app.cleanup();
    app.update();

    if let Some(legs) = args.legs {
        app.world_mut().trigger(SetLegCount(legs));
    }
    app.world_mut().trigger(PathRequest::ToPoint(goal));

    let tick = config.world.tick_duration();
    let mut reported = 0;
    loop {
        app.update();
        let sim = app.world().resource::<Simulation>();
        let done = sim.tick_count();
        if done >= reported + REPORT_INTERVAL {
            reported = done;
            info!("tick {done}: body at {}", sim.mech().position);
        }
        if done >= args.ticks {
            info!(
                "stopped after {done} ticks at {} (arrived: {})",
                sim.mech().position,
                sim.mech().has_arrived()
            );
            break;
        }
        std::thread::sleep(tick);
    }
    Ok(())
}
