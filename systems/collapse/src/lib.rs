#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Collapsed-structure layout generation.
//!
//! Produces square indoor grids damaged by a simulated structural
//! collapse. Damage is layered in a fixed order: clustered room collapse
//! by randomized region growth, belt collapse along outer walls and
//! load-bearing lines, scattered debris, and finally a sparse corridor
//! sweep that reopens parts of the regular corridor lines. The random
//! source is injected so one seed always yields one layout.

use collapse_nav_core::{CellCoord, CellState};
use collapse_nav_world::OccupancyGrid;
use rand::Rng;

/// Spacing of the corridor and load-bearing lines in cells.
pub const ROOM_SIZE: u32 = 10;

/// Damage tuning, every field clamped to `[0, 1]` on construction.
#[derive(Clone, Copy, Debug)]
pub struct CollapseParams {
    intensity: f64,
    corridor_keep: f64,
    cluster_bias: f64,
    debris_ratio: f64,
    wall_belt: f64,
}

impl CollapseParams {
    /// Creates parameters, clamping every value to `[0, 1]`.
    #[must_use]
    pub fn new(
        intensity: f64,
        corridor_keep: f64,
        cluster_bias: f64,
        debris_ratio: f64,
        wall_belt: f64,
    ) -> Self {
        Self {
            intensity: clamp_unit(intensity),
            corridor_keep: clamp_unit(corridor_keep),
            cluster_bias: clamp_unit(cluster_bias),
            debris_ratio: clamp_unit(debris_ratio),
            wall_belt: clamp_unit(wall_belt),
        }
    }

    /// Overall collapse strength; drives seed count and cluster area.
    #[must_use]
    pub const fn intensity(&self) -> f64 {
        self.intensity
    }

    /// Probability of reopening each corridor-line cell.
    #[must_use]
    pub const fn corridor_keep(&self) -> f64 {
        self.corridor_keep
    }

    /// Tendency of collapse clusters to stay contiguous.
    #[must_use]
    pub const fn cluster_bias(&self) -> f64 {
        self.cluster_bias
    }

    /// Fraction of the grid area seeded with loose debris.
    #[must_use]
    pub const fn debris_ratio(&self) -> f64 {
        self.debris_ratio
    }

    /// Collapse probability along walls and load-bearing lines.
    #[must_use]
    pub const fn wall_belt(&self) -> f64 {
        self.wall_belt
    }
}

impl Default for CollapseParams {
    fn default() -> Self {
        Self::new(0.8, 0.6, 0.3, 0.02, 0.3)
    }
}

fn clamp_unit(raw: f64) -> f64 {
    if raw.is_nan() {
        0.0
    } else {
        raw.clamp(0.0, 1.0)
    }
}

/// Generates an `n` by `n` collapsed layout.
///
/// Damage layers run in a fixed order so the corridor sweep can reopen
/// cells the earlier layers buried. A size of zero yields a degenerate
/// empty grid.
pub fn simulate_collapse<R: Rng>(
    n: u32,
    params: &CollapseParams,
    rng: &mut R,
) -> OccupancyGrid {
    let mut grid = OccupancyGrid::new_free(n, n);
    if n == 0 {
        return grid;
    }

    cluster_collapse(&mut grid, params, rng);
    wall_belt_collapse(&mut grid, params, rng);
    scatter_debris(&mut grid, params, rng);
    apply_corridor_keep(&mut grid, params.corridor_keep, rng);
    grid
}

/// Randomized region growth from intensity-scaled seed points. Each
/// cluster buries up to its target cell count; the frontier is a stack, so
/// growth stays compact when the bias is high.
fn cluster_collapse<R: Rng>(grid: &mut OccupancyGrid, params: &CollapseParams, rng: &mut R) {
    let n = grid.rows();
    let seeds = ((params.intensity * 10.0) as usize).max(1);
    let area_scale = (f64::from(n) / 40.0).sqrt() as i64;
    let base_target = params.intensity * f64::from(n / 3);
    let cap = f64::from(n) * f64::from(n) * 0.25;
    let scaled_target =
        (base_target * (area_scale as f64).max(1.0)).min(cap).max(3.0) as usize;
    let spread = 0.5 + 0.5 * params.cluster_bias;

    for _ in 0..seeds {
        let seed = CellCoord::new(rng.gen_range(0..n), rng.gen_range(0..n));
        let mut target = scaled_target;
        let mut frontier = vec![seed];
        let mut visited = std::collections::HashSet::new();

        while let Some(cell) = frontier.pop() {
            if target == 0 {
                break;
            }
            if !visited.insert(cell) {
                continue;
            }
            grid.set_state(cell, CellState::Blocked);
            target -= 1;
            for neighbor in grid.neighbors(cell).collect::<Vec<_>>() {
                if rng.gen::<f64>() < spread {
                    frontier.push(neighbor);
                }
            }
        }
    }
}

/// Probabilistic collapse along the outer wall belt and the interior
/// load-bearing lines spaced every [`ROOM_SIZE`] cells.
fn wall_belt_collapse<R: Rng>(grid: &mut OccupancyGrid, params: &CollapseParams, rng: &mut R) {
    let n = grid.rows();
    let belt = (n / 20).max(1);
    for row in 0..n {
        for column in 0..n {
            let near_wall =
                row < belt || row >= n - belt || column < belt || column >= n - belt;
            if near_wall && rng.gen::<f64>() < params.wall_belt * 0.5 {
                grid.set_state(CellCoord::new(row, column), CellState::Blocked);
            }
        }
    }

    let mut line = ROOM_SIZE;
    while line < n {
        for column in 0..n {
            if rng.gen::<f64>() < params.wall_belt * 0.25 {
                grid.set_state(CellCoord::new(line, column), CellState::Blocked);
            }
        }
        line += ROOM_SIZE;
    }
    let mut line = ROOM_SIZE;
    while line < n {
        for row in 0..n {
            if rng.gen::<f64>() < params.wall_belt * 0.25 {
                grid.set_state(CellCoord::new(row, line), CellState::Blocked);
            }
        }
        line += ROOM_SIZE;
    }
}

/// Scatters loose debris on free cells, occasionally smearing a piece
/// into its neighbors.
fn scatter_debris<R: Rng>(grid: &mut OccupancyGrid, params: &CollapseParams, rng: &mut R) {
    let n = grid.rows();
    let count = (f64::from(n) * f64::from(n) * params.debris_ratio) as usize;
    for _ in 0..count {
        let cell = CellCoord::new(rng.gen_range(0..n), rng.gen_range(0..n));
        if !grid.is_free(cell) {
            continue;
        }
        grid.set_state(cell, CellState::Blocked);
        if rng.gen::<f64>() < 0.3 {
            for neighbor in grid.neighbors(cell).collect::<Vec<_>>() {
                if rng.gen::<f64>() < 0.2 {
                    grid.set_state(neighbor, CellState::Blocked);
                }
            }
        }
    }
}

/// Sparse corridor sweep: each cell on a corridor line reopens with the
/// keep probability, restoring partial connectivity after the damage
/// layers.
fn apply_corridor_keep<R: Rng>(grid: &mut OccupancyGrid, keep_prob: f64, rng: &mut R) {
    let n = grid.rows();
    for row in 0..n {
        for column in 0..n {
            let on_line = row % ROOM_SIZE == 0 || column % ROOM_SIZE == 0;
            if on_line && rng.gen::<f64>() < keep_prob {
                grid.set_state(CellCoord::new(row, column), CellState::Free);
            }
        }
    }
}
