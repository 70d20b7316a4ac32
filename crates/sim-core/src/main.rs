//! Gossamer
//!
//! Runs a generated town for a number of days, writing every action as JSONL
//! and a JSON summary of how things turned out.

use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use sim_core::events::ActionLogger;
use sim_core::output::{write_summary, RunSummary};
use sim_core::sifting::{default_pattern_defs, load_pattern_defs};
use sim_core::{Config, Simulation};

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "gossamer")]
#[command(about = "A small-town social history simulation")]
struct Args {
    /// Random seed for reproducibility (overrides the tuning file)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of days to simulate
    #[arg(long)]
    days: Option<u32>,

    /// Number of agents
    #[arg(long)]
    cast_size: Option<usize>,

    /// Tuning file; `tuning.toml` is used when present
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sifting pattern file of `[[pattern]]` tables
    #[arg(long)]
    patterns: Option<PathBuf>,

    /// Write every action to this JSONL file
    #[arg(long)]
    actions_out: Option<PathBuf>,

    /// Write the run summary to this JSON file
    #[arg(long)]
    summary_out: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `sim_core=trace` (defaults to RUST_LOG, then `info`)
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = match &args.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "simulation failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(),
    };
    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }
    if let Some(days) = args.days {
        config.simulation.days = days;
    }
    if let Some(cast_size) = args.cast_size {
        config.simulation.cast_size = cast_size;
    }

    let defs = match &args.patterns {
        Some(path) => load_pattern_defs(path)?,
        None => default_pattern_defs(),
    };

    let mut sim = Simulation::builder(config).patterns(defs).build()?;
    let mut logger = match &args.actions_out {
        Some(path) => ActionLogger::new(path)?,
        None => ActionLogger::null(),
    };

    let days = sim.config().simulation.days;
    let mut reports = Vec::with_capacity(days as usize);
    for _ in 0..days {
        let report = sim.tick()?;
        logger.log_batch(sim.action_log().today())?;
        reports.push(report);
    }
    logger.flush()?;

    let summary = RunSummary::collect(&sim, &reports);
    if let Some(path) = &args.summary_out {
        write_summary(&summary, path)?;
        tracing::info!(path = %path.display(), "summary written");
    }
    tracing::info!(
        days = summary.days,
        actions = summary.total_actions,
        memories = summary.memories_held,
        ships = summary.ships,
        stories = ?summary.stories_by_pattern,
        "run complete"
    );
    Ok(())
}
