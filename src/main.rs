use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mauritia::{Config, Simulation, SimulationController};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    /// Path to a TOML configuration file; built-in defaults otherwise.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the random source; OS entropy otherwise.
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Populate the field and run the simulation on the scheduler.
    Run {
        #[arg(long)]
        ticks: u64,
    },

    /// Run synchronously and write a MessagePack field snapshot.
    Snapshot {
        #[arg(long)]
        ticks: u64,

        #[arg(long)]
        out: PathBuf,
    },
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let cfg = match &args.config {
        Some(path) => Config::from_file(path).context("failed to load config")?,
        None => Config::default(),
    };

    match args.command {
        Command::Run { ticks } => run_simulation(cfg, args.seed, ticks)?,
        Command::Snapshot { ticks, out } => write_snapshot(cfg, args.seed, ticks, &out)?,
    }

    Ok(())
}

fn run_simulation(cfg: Config, seed: Option<u64>, ticks: u64) -> Result<()> {
    let controller =
        SimulationController::new(cfg, seed).context("failed to construct controller")?;

    controller.run(ticks)?;
    controller.wait();

    let population = controller.population();
    for (label, count) in population.counts() {
        log::info!("{label}: {count}");
    }
    log::info!("finished at tick {}", controller.tick());

    controller.shutdown();
    Ok(())
}

fn write_snapshot(cfg: Config, seed: Option<u64>, ticks: u64, out: &PathBuf) -> Result<()> {
    let mut sim = match seed {
        Some(seed) => Simulation::from_seed(cfg, seed),
        None => Simulation::from_os_rng(cfg),
    }
    .context("failed to construct simulation")?;

    sim.populate();
    for _ in 0..ticks {
        if !sim.is_viable() {
            log::warn!("population is no longer viable, stopping");
            break;
        }
        sim.step_once();
    }

    sim.snapshot()
        .save(out)
        .with_context(|| format!("failed to save snapshot to {out:?}"))?;
    log::info!("wrote snapshot of tick {} to {out:?}", sim.tick());

    Ok(())
}
