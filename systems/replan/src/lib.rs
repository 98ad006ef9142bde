#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-tick replanning for one agent on a mutating grid.
//!
//! Each call advances the aftershock engine by one tick, pins the mission
//! endpoints open, rebuilds the obstacle-proximity cost field on the
//! post-step grid, and replans from the agent's current position. The
//! agent advances a single cell along the fresh route, or holds its
//! position when the step left it sealed off.

use collapse_nav_core::{CellCoord, CellState, NavError, Route};
use collapse_nav_system_aftershock::{step, AftershockParams, AftershockState, StepStats};
use collapse_nav_system_corridor as corridor;
use collapse_nav_world::{CostField, OccupancyGrid};
use rand::Rng;

/// Why the agent held its position instead of advancing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoldReason {
    /// The post-step grid admits no route from the agent to the goal.
    NoPath,
}

/// Outcome of one replanning tick.
#[derive(Clone, Debug)]
pub struct ReplanOutcome {
    /// Engine state to feed into the next call.
    pub state: AftershockState,
    /// Obstacle churn of the underlying engine step.
    pub stats: StepStats,
    /// Cells whose state differs from before the step, in row-major
    /// order. Includes both new obstacles and expired ones.
    pub changed: Vec<CellCoord>,
    /// Agent position after this tick. Equals the prior position when no
    /// route exists.
    pub agent: CellCoord,
    /// Fresh route from the prior agent position to the goal, planned on
    /// the post-step grid; `None` when the agent is sealed off.
    pub route: Option<Route>,
    /// Set when the agent held its position; `None` whenever a route was
    /// found.
    pub reason: Option<HoldReason>,
    /// Whether the agent reached the goal this tick.
    pub done: bool,
}

/// Advances the world one tick and moves the agent one cell.
///
/// Fails with [`NavError::OutOfRange`] when the start, goal, or agent
/// lies outside the grid. The start and goal cells are forced open after
/// the engine step so the mission endpoints can never be buried; an
/// unreachable goal therefore always means blocked corridors, not a
/// blocked endpoint.
pub fn tick<R: Rng>(
    grid: &mut OccupancyGrid,
    start: CellCoord,
    goal: CellCoord,
    agent: CellCoord,
    params: &AftershockParams,
    state: Option<AftershockState>,
    rng: &mut R,
) -> Result<ReplanOutcome, NavError> {
    grid.ensure_in_bounds(start)?;
    grid.ensure_in_bounds(goal)?;
    grid.ensure_in_bounds(agent)?;

    let snapshot = grid.clone();
    let (state, stats) = step(grid, params, state, rng);

    grid.set_state(start, CellState::Free);
    grid.set_state(goal, CellState::Free);

    let changed: Vec<CellCoord> = snapshot
        .iter()
        .filter(|&(cell, before)| grid.state(cell) != Some(before))
        .map(|(cell, _)| cell)
        .collect();

    let field = CostField::build(grid);
    let route = corridor::plan(grid, agent, goal, Some(&field))?;

    let next = route.as_ref().map_or(agent, |route| {
        route.cells().get(1).copied().unwrap_or(agent)
    });
    let reason = route.is_none().then_some(HoldReason::NoPath);
    let done = next == goal;

    Ok(ReplanOutcome {
        state,
        stats,
        changed,
        agent: next,
        route,
        reason,
        done,
    })
}
