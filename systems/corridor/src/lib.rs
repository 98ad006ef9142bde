#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Visibility-graph search over jump-point-compressed corridors.
//!
//! Straight corridors are collapsed into single edges between "decision
//! cells": cells adjacent to an obstacle or whose free-neighbor degree is
//! not two. A* runs on that sparse graph, and the winning jump-point
//! sequence is expanded back into unit axis-aligned steps so the reported
//! route carries the same per-cell cost as a full-grid weighted search
//! along the same corridors. Degenerate graphs fall back to the plain
//! 4-direction planner.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use collapse_nav_core::{CellCoord, NavError, Route, CARDINAL_OFFSETS};
use collapse_nav_system_search::{plan as grid_plan, Algorithm};
use collapse_nav_world::{CostField, OccupancyGrid};
use ordered_float::OrderedFloat;

/// Jump-point graphs smaller than this delegate to the full-grid planner.
const MIN_JUMP_POINTS: usize = 3;

/// Plans a route using the jump-point-compressed visibility graph.
///
/// Fails with [`NavError::OutOfRange`] when either endpoint lies outside
/// the grid; returns `Ok(None)` when either endpoint is blocked or the
/// goal is unreachable. When a cost field is supplied, edge weights
/// accumulate the cost of every cell entered along the corridor, matching
/// the weighted full-grid planner's entering-cell semantics.
pub fn plan(
    grid: &OccupancyGrid,
    start: CellCoord,
    goal: CellCoord,
    cost_field: Option<&CostField>,
) -> Result<Option<Route>, NavError> {
    grid.ensure_in_bounds(start)?;
    grid.ensure_in_bounds(goal)?;

    let traversable = |cell: CellCoord| {
        grid.is_free(cell) && cost_field.is_none_or(|field| field.cost(cell).is_finite())
    };

    if !traversable(start) || !traversable(goal) {
        return Ok(None);
    }

    let jump_points = collect_jump_points(grid, start, goal, &traversable);
    if jump_points.len() < MIN_JUMP_POINTS {
        return grid_plan(grid, start, goal, Algorithm::AStar, None);
    }

    let adjacency = build_edges(grid, &jump_points, cost_field, &traversable);

    match search_jump_graph(&adjacency, start, goal) {
        GraphOutcome::Unreachable => Ok(None),
        // A broken parent chain means the compressed graph lost a corridor;
        // the full-grid planner still has the complete picture.
        GraphOutcome::BrokenChain => grid_plan(grid, start, goal, Algorithm::AStar, None),
        GraphOutcome::Sequence(sequence) => Ok(Some(expand_sequence(&sequence, cost_field))),
    }
}

/// Decision cells of the grid: the endpoints plus every free cell that
/// touches an obstacle or whose free-neighbor degree differs from two.
/// Grid borders count as blocked neighbors, so boundary cells qualify.
fn collect_jump_points(
    grid: &OccupancyGrid,
    start: CellCoord,
    goal: CellCoord,
    traversable: &impl Fn(CellCoord) -> bool,
) -> HashSet<CellCoord> {
    let mut jump_points = HashSet::new();
    let _ = jump_points.insert(start);
    let _ = jump_points.insert(goal);

    for (cell, _) in grid.iter() {
        if !traversable(cell) {
            continue;
        }
        let mut free = 0;
        let mut blocked = 0;
        for &delta in &CARDINAL_OFFSETS {
            let neighbor = cell.offset_by(delta).filter(|&n| grid.contains(n));
            match neighbor {
                Some(n) if traversable(n) => free += 1,
                _ => blocked += 1,
            }
        }
        if blocked > 0 || free != 2 {
            let _ = jump_points.insert(cell);
        }
    }

    jump_points
}

/// Casts a ray from every jump point in each cardinal direction, recording
/// an edge when the ray reaches another jump point and stopping at
/// obstacles or the grid boundary. Edge weight is the accumulated
/// entering-cell cost when a field is supplied, the step count otherwise.
fn build_edges(
    grid: &OccupancyGrid,
    jump_points: &HashSet<CellCoord>,
    cost_field: Option<&CostField>,
    traversable: &impl Fn(CellCoord) -> bool,
) -> HashMap<CellCoord, Vec<(CellCoord, f64)>> {
    let mut adjacency: HashMap<CellCoord, Vec<(CellCoord, f64)>> =
        jump_points.iter().map(|&jp| (jp, Vec::new())).collect();

    for &origin in jump_points {
        for &delta in &CARDINAL_OFFSETS {
            let mut steps = 1u32;
            let mut weight = 0.0;
            let mut cursor = origin.offset_by(delta).filter(|&n| grid.contains(n));

            while let Some(cell) = cursor {
                if !traversable(cell) {
                    break;
                }
                if let Some(field) = cost_field {
                    weight += field.cost(cell);
                }
                if jump_points.contains(&cell) {
                    let edge_weight = if cost_field.is_some() {
                        weight
                    } else {
                        f64::from(steps)
                    };
                    adjacency.entry(origin).or_default().push((cell, edge_weight));
                    break;
                }
                cursor = cell.offset_by(delta).filter(|&n| grid.contains(n));
                steps += 1;
            }
        }
    }

    adjacency
}

enum GraphOutcome {
    Unreachable,
    BrokenChain,
    Sequence(Vec<CellCoord>),
}

/// A* over the sparse jump-point graph with a Manhattan heuristic and a
/// closed set; ties break on the stable `(priority, row, column)` key.
fn search_jump_graph(
    adjacency: &HashMap<CellCoord, Vec<(CellCoord, f64)>>,
    start: CellCoord,
    goal: CellCoord,
) -> GraphOutcome {
    let mut g_score: HashMap<CellCoord, f64> = HashMap::new();
    let mut previous: HashMap<CellCoord, CellCoord> = HashMap::new();
    let mut closed: HashSet<CellCoord> = HashSet::new();
    let mut queue = BinaryHeap::new();

    let _ = g_score.insert(start, 0.0);
    queue.push(Reverse((
        OrderedFloat(f64::from(start.manhattan_distance(goal))),
        start.row(),
        start.column(),
    )));

    while let Some(Reverse((_, row, column))) = queue.pop() {
        let cell = CellCoord::new(row, column);
        if cell == goal {
            break;
        }
        if !closed.insert(cell) {
            continue;
        }

        let here = g_score.get(&cell).copied().unwrap_or(f64::INFINITY);
        for &(neighbor, weight) in adjacency.get(&cell).map_or(&[][..], Vec::as_slice) {
            if closed.contains(&neighbor) {
                continue;
            }
            let tentative = here + weight;
            if tentative < g_score.get(&neighbor).copied().unwrap_or(f64::INFINITY) {
                let _ = g_score.insert(neighbor, tentative);
                let _ = previous.insert(neighbor, cell);
                queue.push(Reverse((
                    OrderedFloat(tentative + f64::from(neighbor.manhattan_distance(goal))),
                    neighbor.row(),
                    neighbor.column(),
                )));
            }
        }
    }

    if !previous.contains_key(&goal) && goal != start {
        return GraphOutcome::Unreachable;
    }

    let mut sequence = vec![goal];
    let mut cursor = goal;
    while cursor != start {
        match previous.get(&cursor) {
            Some(&parent) => {
                sequence.push(parent);
                cursor = parent;
            }
            None => return GraphOutcome::BrokenChain,
        }
    }
    sequence.reverse();
    GraphOutcome::Sequence(sequence)
}

/// Expands each jump-point hop into its unit axis-aligned cell run,
/// accumulating true per-cell costs when a field is supplied.
fn expand_sequence(sequence: &[CellCoord], cost_field: Option<&CostField>) -> Route {
    let mut cells: Vec<CellCoord> = Vec::new();
    let mut total = 0.0;

    for pair in sequence.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let (dr, dc) = from.delta_to(to);
        let step = (dr.signum() as i32, dc.signum() as i32);

        if cells.is_empty() {
            cells.push(from);
        }
        let mut cursor = from;
        while cursor != to {
            let Some(next) = cursor.offset_by(step) else {
                break;
            };
            cursor = next;
            cells.push(cursor);
            if let Some(field) = cost_field {
                total += field.cost(cursor);
            }
        }
    }

    if cells.is_empty() {
        cells.push(sequence[0]);
    }

    let cost = if cost_field.is_some() {
        total
    } else {
        (cells.len() - 1) as f64
    };
    Route::new(cells, cost)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn border_cells_are_jump_points() {
        let grid = OccupancyGrid::new_free(4, 4);
        let traversable = |cell: CellCoord| grid.is_free(cell);
        let points = collect_jump_points(
            &grid,
            CellCoord::new(0, 0),
            CellCoord::new(3, 3),
            &traversable,
        );
        assert!(points.contains(&CellCoord::new(0, 2)));
        assert!(points.contains(&CellCoord::new(2, 0)));
        // Interior cells of a 4x4 open grid have degree four.
        assert!(points.contains(&CellCoord::new(1, 1)));
    }

    #[test]
    fn start_equal_to_goal_yields_single_node_route() {
        let grid = OccupancyGrid::new_free(4, 4);
        let route = plan(&grid, CellCoord::new(2, 2), CellCoord::new(2, 2), None)
            .expect("in bounds")
            .expect("trivial route");
        assert_eq!(route.cells(), &[CellCoord::new(2, 2)]);
        assert!(route.cost().abs() < f64::EPSILON);
    }

    #[test]
    fn tiny_graphs_fall_back_to_the_full_grid_planner() {
        let grid = OccupancyGrid::new_free(1, 2);
        let route = plan(&grid, CellCoord::new(0, 0), CellCoord::new(0, 1), None)
            .expect("in bounds")
            .expect("adjacent cells connect");
        assert_eq!(route.len(), 2);
        assert!((route.cost() - 1.0).abs() < f64::EPSILON);
    }
}
