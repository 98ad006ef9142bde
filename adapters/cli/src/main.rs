#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for collapsed-structure route planning.
//!
//! `plan` generates a collapsed layout and runs one planner across it;
//! `run` drives the aftershock replanning loop until the agent reaches
//! the far corner or the tick budget runs out.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use collapse_nav_core::{CellCoord, CellState};
use collapse_nav_system_aftershock::AftershockParams;
use collapse_nav_system_collapse::{simulate_collapse, CollapseParams};
use collapse_nav_system_corridor as corridor;
use collapse_nav_system_extended as extended;
use collapse_nav_system_replan as replan;
use collapse_nav_system_search::{self as search, Algorithm};
use collapse_nav_world::{CostField, OccupancyGrid};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[derive(Parser)]
#[command(name = "collapse-nav", about = "Route planning through collapsing structures")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Plan a single route across a freshly collapsed layout.
    Plan {
        /// Side length of the square layout in cells.
        #[arg(long, default_value_t = 60)]
        size: u32,
        /// Seed for both layout generation and planning.
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Planner to run.
        #[arg(long, value_enum, default_value_t = Planner::Corridor)]
        planner: Planner,
    },
    /// Replan every tick while aftershocks mutate the layout.
    Run {
        /// Side length of the square layout in cells.
        #[arg(long, default_value_t = 60)]
        size: u32,
        /// Seed for layout generation and the aftershock engine.
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Aftershock severity in `[0, 1]`.
        #[arg(long, default_value_t = 0.5)]
        severity: f64,
        /// Ticks between aftershock waves.
        #[arg(long, default_value_t = 5)]
        interval: u32,
        /// Tick budget before the run is abandoned.
        #[arg(long, default_value_t = 400)]
        steps: u32,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Planner {
    /// Uniform-cost search weighted by obstacle proximity.
    Dijkstra,
    /// Heuristic search weighted by obstacle proximity.
    AStar,
    /// Jump-point corridor graph with grid fallback.
    Corridor,
    /// Radius-two moves with exact line of sight.
    Extended,
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Command::Plan { size, seed, planner } => plan_once(size, seed, planner),
        Command::Run {
            size,
            seed,
            severity,
            interval,
            steps,
        } => run_loop(size, seed, severity, interval, steps),
    }
}

/// Generates the layout and pins the corner-to-corner mission open.
fn collapsed_mission(size: u32, seed: u64) -> Result<(OccupancyGrid, CellCoord, CellCoord)> {
    if size < 2 {
        bail!("layout size must be at least 2, got {size}");
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut grid = simulate_collapse(size, &CollapseParams::default(), &mut rng);

    let start = CellCoord::new(0, 0);
    let goal = CellCoord::new(size - 1, size - 1);
    grid.set_state(start, CellState::Free);
    grid.set_state(goal, CellState::Free);
    Ok((grid, start, goal))
}

fn plan_once(size: u32, seed: u64, planner: Planner) -> Result<()> {
    let (grid, start, goal) = collapsed_mission(size, seed)?;
    println!(
        "layout {size}x{size}, seed {seed}: {} of {} cells buried",
        grid.blocked_count(),
        size as usize * size as usize,
    );

    let field = CostField::build(&grid);
    let route = match planner {
        Planner::Dijkstra => search::plan(&grid, start, goal, Algorithm::Dijkstra, Some(&field))?,
        Planner::AStar => search::plan(&grid, start, goal, Algorithm::AStar, Some(&field))?,
        Planner::Corridor => corridor::plan(&grid, start, goal, Some(&field))?,
        Planner::Extended => extended::plan(&grid, start, goal)?,
    };

    match route {
        Some(route) => println!(
            "{planner:?}: route of {} cells, cost {:.3}",
            route.len(),
            route.cost(),
        ),
        None => bail!("{planner:?}: the goal is sealed off"),
    }
    Ok(())
}

fn run_loop(size: u32, seed: u64, severity: f64, interval: u32, steps: u32) -> Result<()> {
    let (mut grid, start, goal) = collapsed_mission(size, seed)?;
    let params = AftershockParams::new(interval, severity);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    println!(
        "running {size}x{size} layout, severity {:.2}, wave interval {} ticks",
        params.severity(),
        params.interval_ticks(),
    );

    let mut agent = start;
    let mut state = None;
    let mut held = 0_u32;
    for _ in 0..steps {
        let outcome = replan::tick(&mut grid, start, goal, agent, &params, state.take(), &mut rng)?;

        if outcome.reason.is_some() {
            held += 1;
        }
        if outcome.agent != agent || !outcome.changed.is_empty() {
            println!(
                "tick {:>4}: agent ({}, {}), {} cells changed, {} expired / {} grown / {} spawned",
                outcome.state.tick(),
                outcome.agent.row(),
                outcome.agent.column(),
                outcome.changed.len(),
                outcome.stats.expired,
                outcome.stats.grown,
                outcome.stats.spawned,
            );
        }

        agent = outcome.agent;
        let done = outcome.done;
        let tick = outcome.state.tick();
        state = Some(outcome.state);
        if done {
            println!("arrived at ({}, {}) after {tick} ticks, held position {held} times", goal.row(), goal.column());
            return Ok(());
        }
    }

    bail!("agent failed to reach the goal within {steps} ticks")
}
