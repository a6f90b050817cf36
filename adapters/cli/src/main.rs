#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays an Aerial Tactics skirmish headlessly.

mod pilot;
mod scenario;

use std::{path::PathBuf, time::Duration};

use aerial_tactics_world::{query, World};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

/// Plays a skirmish with both teams under autopilot and prints the outcome.
#[derive(Debug, Parser)]
#[command(name = "aerial-tactics", version, about)]
struct Args {
    /// Scenario file to load instead of the bundled skirmish.
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// Overrides the scenario's attack roll seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Maximum number of ticks to simulate.
    #[arg(long, default_value_t = 20_000)]
    ticks: u64,
    /// Simulated milliseconds per tick.
    #[arg(long = "dt-ms", default_value_t = 100)]
    dt_ms: u64,
    /// Turn at which the skirmish stops.
    #[arg(long, default_value_t = 10)]
    turns: u32,
}

/// Entry point for the Aerial Tactics command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut scenario = scenario::load(args.scenario.as_deref())?;
    if let Some(seed) = args.seed {
        scenario.seed = seed;
    }

    let mut events = Vec::new();
    let mut world =
        World::from_scenario(&scenario, &mut events).context("failed to set up the level")?;
    info!(
        seed = scenario.seed,
        units = scenario.placements.len(),
        "skirmish loaded"
    );

    let summary = pilot::run(
        &mut world,
        events,
        pilot::RunLimits {
            dt: Duration::from_millis(args.dt_ms.max(1)),
            ticks: args.ticks,
            turns: args.turns,
        },
    );

    println!(
        "{} ticks, turn {}: {} attacks, {} hits, {} units downed, {} effects played",
        summary.ticks, summary.turn, summary.attacks, summary.hits, summary.downed, summary.effects
    );
    for view in query::unit_views(&world) {
        let state = view
            .state
            .map_or_else(|| String::from("-"), |state| format!("{state:?}"));
        println!(
            "  unit {:>2} team {:>2} {:<12} {:>5.1}/{:<5.1} hp at ({:.1}, {:.1}) altitude {}",
            view.id.get(),
            view.team.get(),
            state,
            view.pre.health,
            view.stats.max_health,
            view.pre.position.x,
            view.pre.position.z,
            view.pre.altitude
        );
    }
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
