#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Uniform-cost and heuristic search over 4-directional adjacency.
//!
//! Both planners run the same iterative priority-queue relaxation with
//! lazy deletion; Dijkstra is the zero-heuristic case of the A* loop.
//! Edge weight is either one per step or, when a cost field is supplied,
//! the cost of entering the destination cell. Queue entries are ordered by
//! the stable key `(priority, row, column)` so equal-cost expansions are
//! reproducible.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use collapse_nav_core::{CellCoord, NavError, Route};
use collapse_nav_world::{CostField, OccupancyGrid};
use ordered_float::OrderedFloat;

/// Search strategy selected by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    /// Uniform-cost relaxation without a heuristic.
    Dijkstra,
    /// Heuristic relaxation guided by Manhattan distance to the goal.
    AStar,
}

/// Plans a route between two cells over 4-directional adjacency.
///
/// Fails with [`NavError::OutOfRange`] when either endpoint lies outside
/// the grid. Returns `Ok(None)` when either endpoint is blocked or the
/// goal is unreachable. The Manhattan heuristic is admissible and
/// consistent because every edge weight is at least one.
pub fn plan(
    grid: &OccupancyGrid,
    start: CellCoord,
    goal: CellCoord,
    algorithm: Algorithm,
    cost_field: Option<&CostField>,
) -> Result<Option<Route>, NavError> {
    grid.ensure_in_bounds(start)?;
    grid.ensure_in_bounds(goal)?;

    if !grid.is_free(start) || !grid.is_free(goal) {
        return Ok(None);
    }

    let columns = grid.columns() as usize;
    let cell_count = grid.rows() as usize * columns;
    let heuristic = |cell: CellCoord| match algorithm {
        Algorithm::Dijkstra => 0.0,
        Algorithm::AStar => f64::from(cell.manhattan_distance(goal)),
    };

    let mut best = vec![f64::INFINITY; cell_count];
    let mut priority = vec![f64::INFINITY; cell_count];
    let mut previous: Vec<Option<CellCoord>> = vec![None; cell_count];

    let index = |cell: CellCoord| cell.row() as usize * columns + cell.column() as usize;

    best[index(start)] = 0.0;
    priority[index(start)] = heuristic(start);

    let mut queue = BinaryHeap::new();
    queue.push(Reverse((
        OrderedFloat(priority[index(start)]),
        start.row(),
        start.column(),
    )));

    while let Some(Reverse((OrderedFloat(popped), row, column))) = queue.pop() {
        let cell = CellCoord::new(row, column);
        // Lazy deletion: stale entries no longer match the best priority.
        if popped != priority[index(cell)] {
            continue;
        }
        if cell == goal {
            break;
        }

        for neighbor in grid.neighbors(cell) {
            if !grid.is_free(neighbor) {
                continue;
            }
            let step = match cost_field {
                Some(field) => field.cost(neighbor),
                None => 1.0,
            };
            if !step.is_finite() {
                continue;
            }

            let tentative = best[index(cell)] + step;
            if tentative < best[index(neighbor)] {
                best[index(neighbor)] = tentative;
                priority[index(neighbor)] = tentative + heuristic(neighbor);
                previous[index(neighbor)] = Some(cell);
                queue.push(Reverse((
                    OrderedFloat(priority[index(neighbor)]),
                    neighbor.row(),
                    neighbor.column(),
                )));
            }
        }
    }

    if best[index(goal)].is_infinite() {
        return Ok(None);
    }

    let mut cells = vec![goal];
    let mut cursor = goal;
    while let Some(parent) = previous[index(cursor)] {
        cells.push(parent);
        cursor = parent;
    }
    cells.reverse();

    Ok(Some(Route::new(cells, best[index(goal)])))
}
