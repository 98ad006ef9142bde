//! Safety cost field derived from obstacle proximity.

use std::collections::VecDeque;

use collapse_nav_core::CellCoord;

use crate::OccupancyGrid;

const UNREACHED: u32 = u32::MAX;

/// Tuning knobs for the proximity-to-cost conversion.
#[derive(Clone, Copy, Debug)]
pub struct CostFieldParams {
    /// Distance in cells beyond which obstacles stop penalizing traversal.
    pub safety_radius: u32,
    /// Weight applied to the proximity penalty inside the safety radius.
    pub safety_weight: f64,
}

impl Default for CostFieldParams {
    fn default() -> Self {
        Self {
            safety_radius: 3,
            safety_weight: 1.25,
        }
    }
}

/// Per-cell traversal costs computed from a grid snapshot.
///
/// Free cells cost `1 + weight * max(0, (radius - d) / radius)` where `d`
/// is the 4-connected distance to the nearest obstacle; blocked cells cost
/// positive infinity. Free cells unreached by any obstacle keep the floor
/// cost of one. The field is rebuilt from scratch whenever the grid
/// changes, never patched in place.
#[derive(Clone, Debug)]
pub struct CostField {
    rows: u32,
    columns: u32,
    costs: Vec<f64>,
}

impl CostField {
    /// Builds the cost field for a grid snapshot using default parameters.
    #[must_use]
    pub fn build(grid: &OccupancyGrid) -> Self {
        Self::build_with(grid, CostFieldParams::default())
    }

    /// Builds the cost field using explicit tuning parameters.
    #[must_use]
    pub fn build_with(grid: &OccupancyGrid, params: CostFieldParams) -> Self {
        let distances = obstacle_distances(grid);
        let radius = f64::from(params.safety_radius);
        let costs = grid
            .iter()
            .zip(distances.iter())
            .map(|((_, state), &distance)| {
                if !state.is_free() {
                    f64::INFINITY
                } else if distance == UNREACHED {
                    1.0
                } else {
                    let penalty = ((radius - f64::from(distance)) / radius.max(1.0)).max(0.0);
                    1.0 + params.safety_weight * penalty
                }
            })
            .collect();

        Self {
            rows: grid.rows(),
            columns: grid.columns(),
            costs,
        }
    }

    /// Traversal cost of the cell; infinite for blocked or out-of-bounds
    /// coordinates.
    #[must_use]
    pub fn cost(&self, cell: CellCoord) -> f64 {
        self.index(cell)
            .map_or(f64::INFINITY, |index| self.costs[index])
    }

    /// Reports whether the cell carries a finite traversal cost.
    #[must_use]
    pub fn is_traversable(&self, cell: CellCoord) -> bool {
        self.cost(cell).is_finite()
    }

    /// Dimensions of the field as `(rows, columns)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.rows, self.columns)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.row() < self.rows && cell.column() < self.columns {
            Some(cell.row() as usize * self.columns as usize + cell.column() as usize)
        } else {
            None
        }
    }
}

/// Multi-source breadth-first distance transform seeded at every blocked
/// cell, expanding through free cells over 4-directional adjacency.
fn obstacle_distances(grid: &OccupancyGrid) -> Vec<u32> {
    let columns = grid.columns() as usize;
    let mut distances = vec![UNREACHED; grid.rows() as usize * columns];
    let mut queue = VecDeque::new();

    for (cell, state) in grid.iter() {
        if !state.is_free() {
            distances[cell.row() as usize * columns + cell.column() as usize] = 0;
            queue.push_back(cell);
        }
    }

    while let Some(cell) = queue.pop_front() {
        let here = distances[cell.row() as usize * columns + cell.column() as usize];
        for neighbor in grid.neighbors(cell) {
            let index = neighbor.row() as usize * columns + neighbor.column() as usize;
            if distances[index] == UNREACHED && grid.is_free(neighbor) {
                distances[index] = here + 1;
                queue.push_back(neighbor);
            }
        }
    }

    distances
}

#[cfg(test)]
mod tests {
    use super::*;
    use collapse_nav_core::CellState;

    fn grid_with_center_obstacle() -> OccupancyGrid {
        let mut grid = OccupancyGrid::new_free(7, 7);
        grid.set_state(CellCoord::new(3, 3), CellState::Blocked);
        grid
    }

    #[test]
    fn blocked_cells_carry_infinite_cost() {
        let grid = grid_with_center_obstacle();
        let field = CostField::build(&grid);
        assert!(field.cost(CellCoord::new(3, 3)).is_infinite());
        assert!(!field.is_traversable(CellCoord::new(3, 3)));
    }

    #[test]
    fn cost_decreases_with_distance_until_the_radius_floor() {
        let grid = grid_with_center_obstacle();
        let field = CostField::build(&grid);

        let at = |row, column| field.cost(CellCoord::new(row, column));
        // d = 1, 2, 3 along a row away from the obstacle.
        assert!((at(3, 4) - (1.0 + 1.25 * (2.0 / 3.0))).abs() < 1e-9);
        assert!((at(3, 5) - (1.0 + 1.25 * (1.0 / 3.0))).abs() < 1e-9);
        assert!((at(3, 6) - 1.0).abs() < 1e-9);
        assert!(at(3, 4) > at(3, 5));
        assert!(at(3, 5) > at(3, 6));
    }

    #[test]
    fn every_free_cell_costs_at_least_one() {
        let grid = grid_with_center_obstacle();
        let field = CostField::build(&grid);
        for (cell, state) in grid.iter() {
            if state.is_free() {
                assert!(field.cost(cell) >= 1.0);
            }
        }
    }

    #[test]
    fn obstacle_free_grid_floors_every_cost_at_one() {
        let grid = OccupancyGrid::new_free(4, 4);
        let field = CostField::build(&grid);
        for (cell, _) in grid.iter() {
            assert!((field.cost(cell) - 1.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn out_of_bounds_cost_is_infinite() {
        let field = CostField::build(&OccupancyGrid::new_free(2, 2));
        assert!(field.cost(CellCoord::new(9, 0)).is_infinite());
    }
}
