#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tick-driven aftershock obstacle engine with caller-held state.
//!
//! The engine is a pure step function of `(grid, params, prior state,
//! rng)`: it expires obsolete obstacles, optionally grows and spawns new
//! ones behind a spawn-interval gate, advances the tick counter by exactly
//! one, and returns a fresh state snapshot. The snapshot is the entire
//! memory of the simulation: correctness requires the caller to round-trip
//! the exact state value returned by the previous call. The random source
//! is injected so identical seeds replay identical trajectories.

use std::collections::{BTreeMap, HashSet};

use collapse_nav_core::{CellCoord, CellState};
use collapse_nav_world::OccupancyGrid;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Sentinel `last_spawn_tick` for a state that has never spawned.
pub const NEVER_SPAWNED_TICK: i64 = -1_000_000_000;

/// Spawn interval substituted when the caller supplies none.
pub const DEFAULT_INTERVAL_TICKS: u32 = 5;

/// Obstacle lifetime knobs.
#[derive(Clone, Copy, Debug)]
pub struct LifetimeTuning {
    /// Base lifetime expressed as a multiple of the spawn interval.
    pub base_interval_factor: f64,
    /// Additional interval multiples granted at full severity.
    pub severity_factor: f64,
    /// Lower bound of the uniform lifetime jitter.
    pub jitter_low: f64,
    /// Upper bound of the uniform lifetime jitter.
    pub jitter_high: f64,
}

impl Default for LifetimeTuning {
    fn default() -> Self {
        Self {
            base_interval_factor: 1.5,
            severity_factor: 1.0,
            jitter_low: 0.8,
            jitter_high: 1.2,
        }
    }
}

/// Growth-phase knobs: how many existing obstacles expand, and by how much.
#[derive(Clone, Copy, Debug)]
pub struct GrowthTuning {
    /// Active cells sampled for expansion regardless of severity.
    pub attempts_base: f64,
    /// Additional sampled cells granted at full severity.
    pub attempts_per_severity: f64,
    /// Free neighbors activated per sampled cell regardless of severity.
    pub cells_base: f64,
    /// Additional activated neighbors granted at full severity.
    pub cells_per_severity: f64,
}

impl Default for GrowthTuning {
    fn default() -> Self {
        Self {
            attempts_base: 3.0,
            attempts_per_severity: 7.0,
            cells_base: 1.0,
            cells_per_severity: 2.0,
        }
    }
}

/// Spawn-phase knobs: cluster count, total area, and flood bias.
#[derive(Clone, Copy, Debug)]
pub struct SpawnTuning {
    /// Fraction of the grid area targeted by one spawn wave at full
    /// severity.
    pub area_ratio: f64,
    /// Clusters seeded regardless of severity.
    pub clusters_base: f64,
    /// Additional clusters granted at full severity.
    pub clusters_per_severity: f64,
    /// Frontier expansion probability regardless of severity.
    pub bias_base: f64,
    /// Additional expansion probability granted at full severity.
    pub bias_per_severity: f64,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            area_ratio: 0.003,
            clusters_base: 1.0,
            clusters_per_severity: 2.0,
            bias_base: 0.55,
            bias_per_severity: 0.3,
        }
    }
}

/// Aggregated tuning knobs for every adjustable ratio of the engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct AftershockTuning {
    /// Obstacle lifetime behaviour.
    pub lifetime: LifetimeTuning,
    /// Expansion of existing obstacles.
    pub growth: GrowthTuning,
    /// Creation of new obstacle clusters.
    pub spawn: SpawnTuning,
}

/// Per-call parameters of the engine, coerced into their valid ranges.
#[derive(Clone, Copy, Debug)]
pub struct AftershockParams {
    interval_ticks: u32,
    severity: f64,
    tuning: AftershockTuning,
}

impl AftershockParams {
    /// Creates parameters, clamping severity to `[0, 1]` and forcing the
    /// interval to at least one tick.
    #[must_use]
    pub fn new(interval_ticks: u32, severity: f64) -> Self {
        Self {
            interval_ticks: interval_ticks.max(1),
            severity: clamp_severity(severity),
            tuning: AftershockTuning::default(),
        }
    }

    /// Creates parameters from raw caller input; a missing or non-positive
    /// interval falls back to [`DEFAULT_INTERVAL_TICKS`], a missing
    /// severity to zero. Invalid input is recovered locally, never
    /// surfaced.
    #[must_use]
    pub fn from_raw(interval_ticks: Option<i64>, severity: Option<f64>) -> Self {
        let interval = match interval_ticks {
            Some(value) if value >= 1 => u32::try_from(value).unwrap_or(u32::MAX),
            Some(_) => 1,
            None => DEFAULT_INTERVAL_TICKS,
        };
        Self::new(interval, severity.unwrap_or(0.0))
    }

    /// Replaces the default tuning knobs.
    #[must_use]
    pub const fn with_tuning(mut self, tuning: AftershockTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Spawn interval in ticks, at least one.
    #[must_use]
    pub const fn interval_ticks(&self) -> u32 {
        self.interval_ticks
    }

    /// Severity clamped to `[0, 1]`.
    #[must_use]
    pub const fn severity(&self) -> f64 {
        self.severity
    }
}

fn clamp_severity(raw: f64) -> f64 {
    if raw.is_nan() {
        0.0
    } else {
        raw.clamp(0.0, 1.0)
    }
}

/// A temporarily blocked cell with its scheduled expiry and the state the
/// cell held before activation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveObstacle {
    /// Cell forced blocked by the engine.
    pub cell: CellCoord,
    /// First tick at which the obstacle may expire.
    pub until_tick: i64,
    /// State the cell held before activation, restored on expiry.
    pub previous: CellState,
}

/// Externally persisted engine state; the caller round-trips this value
/// between calls and treats it as opaque.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AftershockState {
    tick: i64,
    last_spawn_tick: i64,
    interval_ticks: u32,
    active: Vec<ActiveObstacle>,
}

impl AftershockState {
    /// Reassembles a state snapshot from its parts.
    #[must_use]
    pub fn from_parts(
        tick: i64,
        last_spawn_tick: i64,
        interval_ticks: u32,
        active: Vec<ActiveObstacle>,
    ) -> Self {
        Self {
            tick,
            last_spawn_tick,
            interval_ticks,
            active,
        }
    }

    /// Current simulation tick.
    #[must_use]
    pub const fn tick(&self) -> i64 {
        self.tick
    }

    /// Tick at which the spawn phase last ran.
    #[must_use]
    pub const fn last_spawn_tick(&self) -> i64 {
        self.last_spawn_tick
    }

    /// Spawn interval recorded in the snapshot.
    #[must_use]
    pub const fn interval_ticks(&self) -> u32 {
        self.interval_ticks
    }

    /// Active obstacle records, ordered by cell coordinate.
    #[must_use]
    pub fn active(&self) -> &[ActiveObstacle] {
        &self.active
    }
}

impl Default for AftershockState {
    fn default() -> Self {
        Self {
            tick: 0,
            last_spawn_tick: NEVER_SPAWNED_TICK,
            interval_ticks: DEFAULT_INTERVAL_TICKS,
            active: Vec::new(),
        }
    }
}

/// Cells affected by each phase of one engine step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Obstacles whose deadline passed and whose cells were restored.
    pub expired: usize,
    /// Free neighbors activated by expanding existing obstacles.
    pub grown: usize,
    /// Cells activated by newly seeded clusters.
    pub spawned: usize,
}

/// Advances the simulation by exactly one tick.
///
/// Phases run in order: expiry, then, only when the spawn gate is open,
/// growth of existing obstacles followed by new cluster spawning, then the
/// unconditional tick advance. A missing prior state is treated as tick
/// zero with no active obstacles and a never-fired spawn gate.
pub fn step<R: Rng>(
    grid: &mut OccupancyGrid,
    params: &AftershockParams,
    prior: Option<AftershockState>,
    rng: &mut R,
) -> (AftershockState, StepStats) {
    let prior = prior.unwrap_or_default();
    let mut tick = prior.tick;
    let mut last_spawn_tick = prior.last_spawn_tick;
    let mut active: BTreeMap<CellCoord, ActiveObstacle> = prior
        .active
        .into_iter()
        .map(|record| (record.cell, record))
        .collect();

    let mut stats = StepStats {
        expired: expire(grid, tick, &mut active),
        ..StepStats::default()
    };

    if tick - last_spawn_tick >= i64::from(params.interval_ticks) {
        stats.grown = grow(grid, params, tick, &mut active, rng);
        stats.spawned = spawn(grid, params, tick, &mut active, rng);
        last_spawn_tick = tick;
    }

    tick += 1;

    let state = AftershockState {
        tick,
        last_spawn_tick,
        interval_ticks: params.interval_ticks,
        active: active.into_values().collect(),
    };
    (state, stats)
}

/// Removes every record whose deadline has passed and restores its cell to
/// the recorded pre-activation value.
fn expire(
    grid: &mut OccupancyGrid,
    tick: i64,
    active: &mut BTreeMap<CellCoord, ActiveObstacle>,
) -> usize {
    let expired: Vec<CellCoord> = active
        .values()
        .filter(|record| record.until_tick <= tick)
        .map(|record| record.cell)
        .collect();

    for cell in &expired {
        if let Some(record) = active.remove(cell) {
            grid.set_state(record.cell, record.previous);
        }
    }
    expired.len()
}

/// Expands a random sample of existing obstacles into free 4-neighbors.
fn grow<R: Rng>(
    grid: &mut OccupancyGrid,
    params: &AftershockParams,
    tick: i64,
    active: &mut BTreeMap<CellCoord, ActiveObstacle>,
    rng: &mut R,
) -> usize {
    if active.is_empty() {
        return 0;
    }

    let tuning = params.tuning.growth;
    let severity = params.severity;
    let attempts =
        ((tuning.attempts_base + tuning.attempts_per_severity * severity) as usize).max(1);

    let mut sampled: Vec<CellCoord> = active.keys().copied().collect();
    sampled.shuffle(rng);
    sampled.truncate(attempts);

    let mut grown = 0;
    for cell in sampled {
        let mut budget =
            ((tuning.cells_base + tuning.cells_per_severity * severity) as usize).max(1);
        let neighbors: Vec<CellCoord> = grid.neighbors(cell).collect();
        for neighbor in neighbors {
            if budget == 0 {
                break;
            }
            if grid.is_free(neighbor) {
                let until = tick + jittered_lifetime(params, rng);
                activate(grid, neighbor, until, active);
                grown += 1;
                budget -= 1;
            }
        }
    }
    grown
}

/// Seeds new obstacle clusters and floods each one up to its share of the
/// wave's target area.
fn spawn<R: Rng>(
    grid: &mut OccupancyGrid,
    params: &AftershockParams,
    tick: i64,
    active: &mut BTreeMap<CellCoord, ActiveObstacle>,
    rng: &mut R,
) -> usize {
    let (rows, columns) = (grid.rows(), grid.columns());
    if rows == 0 || columns == 0 {
        return 0;
    }

    let tuning = params.tuning.spawn;
    let severity = params.severity;
    let area = f64::from(rows) * f64::from(columns);
    let target_area = ((severity * tuning.area_ratio * area) as usize).max(1);
    let clusters =
        ((tuning.clusters_base + tuning.clusters_per_severity * severity) as usize).max(1);
    let per_cluster = (target_area / clusters).max(1);
    let bias = tuning.bias_base + tuning.bias_per_severity * severity;

    let mut spawned = 0;
    for _ in 0..clusters {
        let seed = CellCoord::new(rng.gen_range(0..rows), rng.gen_range(0..columns));
        spawned += region_grow(grid, params, seed, per_cluster, tick, bias, active, rng);
    }
    spawned
}

/// Randomized stack-based region growth from a seed cell. Activation
/// spends the target budget on cells that are free or already active
/// (re-activation extends the deadline); each frontier expansion is gated
/// by the bias probability per neighbor.
#[allow(clippy::too_many_arguments)]
fn region_grow<R: Rng>(
    grid: &mut OccupancyGrid,
    params: &AftershockParams,
    seed: CellCoord,
    mut target: usize,
    tick: i64,
    bias: f64,
    active: &mut BTreeMap<CellCoord, ActiveObstacle>,
    rng: &mut R,
) -> usize {
    if !grid.contains(seed) {
        return 0;
    }

    let mut added = 0;
    let mut frontier = vec![seed];
    let mut visited = HashSet::new();

    while let Some(cell) = frontier.pop() {
        if target == 0 {
            break;
        }
        if !visited.insert(cell) {
            continue;
        }
        if grid.is_free(cell) || active.contains_key(&cell) {
            let until = tick + jittered_lifetime(params, rng);
            activate(grid, cell, until, active);
            added += 1;
            target -= 1;
        }
        for neighbor in grid.neighbors(cell).collect::<Vec<_>>() {
            if rng.gen::<f64>() < bias {
                frontier.push(neighbor);
            }
        }
    }
    added
}

/// Forces a cell blocked until the given tick. Re-activating an already
/// active cell extends its deadline to the later of the two; deadlines are
/// never shortened.
fn activate(
    grid: &mut OccupancyGrid,
    cell: CellCoord,
    until_tick: i64,
    active: &mut BTreeMap<CellCoord, ActiveObstacle>,
) {
    if !grid.contains(cell) {
        return;
    }
    match active.get_mut(&cell) {
        Some(record) => record.until_tick = record.until_tick.max(until_tick),
        None => {
            let previous = grid.state(cell).unwrap_or(CellState::Free);
            let _ = active.insert(
                cell,
                ActiveObstacle {
                    cell,
                    until_tick,
                    previous,
                },
            );
        }
    }
    grid.set_state(cell, CellState::Blocked);
}

fn jittered_lifetime<R: Rng>(params: &AftershockParams, rng: &mut R) -> i64 {
    let lifetime = params.tuning.lifetime;
    let base = f64::from(params.interval_ticks)
        * (lifetime.base_interval_factor + lifetime.severity_factor * params.severity);
    let jitter =
        lifetime.jitter_low + (lifetime.jitter_high - lifetime.jitter_low) * rng.gen::<f64>();
    (base * jitter) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn params_clamp_severity_and_interval() {
        let params = AftershockParams::new(0, 7.5);
        assert_eq!(params.interval_ticks(), 1);
        assert!((params.severity() - 1.0).abs() < f64::EPSILON);

        let params = AftershockParams::from_raw(None, Some(-3.0));
        assert_eq!(params.interval_ticks(), DEFAULT_INTERVAL_TICKS);
        assert!(params.severity().abs() < f64::EPSILON);

        let params = AftershockParams::from_raw(Some(-2), Some(f64::NAN));
        assert_eq!(params.interval_ticks(), 1);
        assert!(params.severity().abs() < f64::EPSILON);
    }

    #[test]
    fn activation_extends_but_never_shortens_deadlines() {
        let mut grid = OccupancyGrid::new_free(3, 3);
        let mut active = BTreeMap::new();
        let cell = CellCoord::new(1, 1);

        activate(&mut grid, cell, 10, &mut active);
        activate(&mut grid, cell, 4, &mut active);
        assert_eq!(active[&cell].until_tick, 10);

        activate(&mut grid, cell, 25, &mut active);
        assert_eq!(active[&cell].until_tick, 25);
        assert_eq!(active[&cell].previous, CellState::Free);
        assert!(!grid.is_free(cell));
    }

    #[test]
    fn expiry_restores_the_recorded_previous_state() {
        let mut grid = OccupancyGrid::new_free(2, 2);
        grid.set_state(CellCoord::new(0, 1), CellState::Blocked);
        let mut active = BTreeMap::new();
        activate(&mut grid, CellCoord::new(0, 0), 3, &mut active);
        activate(&mut grid, CellCoord::new(0, 1), 3, &mut active);

        let expired = expire(&mut grid, 3, &mut active);
        assert_eq!(expired, 2);
        assert!(grid.is_free(CellCoord::new(0, 0)));
        // The cell was blocked by the static layout before activation.
        assert!(!grid.is_free(CellCoord::new(0, 1)));
        assert!(active.is_empty());
    }

    #[test]
    fn region_grow_spends_exactly_the_target_budget() {
        let mut grid = OccupancyGrid::new_free(10, 10);
        let mut active = BTreeMap::new();
        let params = AftershockParams::new(5, 1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        let added = region_grow(
            &mut grid,
            &params,
            CellCoord::new(5, 5),
            4,
            0,
            1.0,
            &mut active,
            &mut rng,
        );
        assert_eq!(added, 4);
        assert_eq!(grid.blocked_count(), 4);
    }
}
