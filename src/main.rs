pub mod config;
pub mod scenarios;

use crate::config::ScenarioConfig;
use crate::scenarios::Preset;
use anyhow::{Context, Result};
use celestial_simulation::{Simulation, StepMode};
use clap::Parser;
use log::info;
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use std::path::PathBuf;
use std::time::Instant;

/// Steps a two dimensional gravitational n-body system and prints the
/// resulting bodies.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// YAML scenario file. Takes precedence over `--preset`.
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Built-in scenario used when no file is given.
    #[arg(short, long, value_enum, default_value_t = Preset::Solar)]
    preset: Preset,

    /// Number of steps to run.
    #[arg(short = 'n', long)]
    steps: Option<usize>,

    /// Length of one step, in seconds.
    #[arg(long)]
    dt: Option<f64>,

    /// `exact` or `approximate`.
    #[arg(short, long)]
    mode: Option<StepMode>,

    /// Refinement distance of the tree.
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Seed for randomly generated presets.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Print the bodies every this many steps; 0 only prints the final state.
    #[arg(long, default_value_t = 0)]
    report_every: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut scenario = match &args.scenario {
        Some(path) => config::load(path)?,
        None => {
            let mut rng = XorShiftRng::seed_from_u64(args.seed);
            args.preset.build(&mut rng)
        }
    };
    if let Some(threshold) = args.threshold {
        scenario.parameters.threshold = threshold;
    }

    let ScenarioConfig {
        parameters,
        mode,
        dt,
        steps,
        bodies,
    } = scenario;
    let mode = args.mode.unwrap_or(mode);
    let dt = args.dt.unwrap_or(dt);
    let steps = args.steps.unwrap_or(steps);

    let mut simulation = Simulation::new(bodies, parameters).context("invalid scenario")?;
    info!(
        "running {} bodies for {} {} steps of {} s",
        simulation.len(),
        steps,
        mode,
        dt
    );

    let start = Instant::now();
    for step in 1..=steps {
        simulation
            .step(dt, mode)
            .with_context(|| format!("step {} failed", step))?;

        if args.report_every > 0 && step % args.report_every == 0 {
            report(step, &simulation);
        }
    }
    info!("finished in {:.2?}", start.elapsed());

    if args.report_every == 0 || steps % args.report_every != 0 {
        report(steps, &simulation);
    }
    Ok(())
}

fn report(step: usize, simulation: &Simulation) {
    println!("# step {}", step);
    println!("{:>5} {:>12} {:>14} {:>14} {:>12} {:>12}", "body", "mass", "x", "y", "vx", "vy");
    for (i, body) in simulation.bodies().iter().enumerate() {
        println!(
            "{:>5} {:>12.4e} {:>14.6e} {:>14.6e} {:>12.4e} {:>12.4e}",
            i,
            body.mass(),
            body.position().x,
            body.position().y,
            body.velocity().x,
            body.velocity().y,
        );
    }

    let momentum = simulation.total_momentum();
    let kinetic: f64 = simulation.bodies().iter().map(|b| b.kinetic_energy()).sum();
    println!(
        "# total mass {:.4e}, momentum ({:.4e}, {:.4e}), kinetic energy {:.4e}",
        simulation.total_mass(),
        momentum.x,
        momentum.y,
        kinetic
    );
}
