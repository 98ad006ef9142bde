#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the collapse navigation engine.
//!
//! This crate defines the vocabulary that connects the occupancy world,
//! the pure planning systems, and the adapters: cell coordinates and
//! states, the direction-code tables used to encode paths as compact
//! triplet sequences, the [`Route`] value returned by every planner, and
//! the structural error kinds. Systems consume immutable grids, return
//! complete result values, and never retain state across calls.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cardinal step offsets in `(row, column)` form, enumerated east, south,
/// west, north. The position in this table plus one is the direction code
/// carried by [`PathTriplet`] values produced from 4-direction planners.
pub const CARDINAL_OFFSETS: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// Extended-neighborhood offsets: every `(dr, dc)` with both components in
/// `-2..=2` except `(0, 0)`, row delta varying slowest. The position in
/// this table plus one is the direction code for extended-search triplets.
pub const EXTENDED_OFFSETS: [(i32, i32); 24] = [
    (-2, -2),
    (-2, -1),
    (-2, 0),
    (-2, 1),
    (-2, 2),
    (-1, -2),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (-1, 2),
    (0, -2),
    (0, -1),
    (0, 1),
    (0, 2),
    (1, -2),
    (1, -1),
    (1, 0),
    (1, 1),
    (1, 2),
    (2, -2),
    (2, -1),
    (2, 0),
    (2, 1),
    (2, 2),
];

/// Direction code reported for a step that matches no table entry.
pub const UNKNOWN_DIRECTION: u8 = 0;

/// Location of a single grid cell expressed as row and column coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    row: u32,
    column: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.row.abs_diff(other.row) + self.column.abs_diff(other.column)
    }

    /// Computes the Euclidean distance between two cell coordinates.
    #[must_use]
    pub fn euclidean_distance(self, other: CellCoord) -> f64 {
        let dr = f64::from(self.row) - f64::from(other.row);
        let dc = f64::from(self.column) - f64::from(other.column);
        (dr * dr + dc * dc).sqrt()
    }

    /// Applies a signed `(row, column)` offset, yielding `None` when either
    /// component would underflow below zero.
    #[must_use]
    pub fn offset_by(self, delta: (i32, i32)) -> Option<CellCoord> {
        let row = self.row.checked_add_signed(delta.0)?;
        let column = self.column.checked_add_signed(delta.1)?;
        Some(CellCoord::new(row, column))
    }

    /// Signed `(row, column)` delta that leads from `self` to `other`.
    #[must_use]
    pub fn delta_to(self, other: CellCoord) -> (i64, i64) {
        (
            i64::from(other.row) - i64::from(self.row),
            i64::from(other.column) - i64::from(self.column),
        )
    }
}

/// Occupancy of a single grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    /// The cell is traversable.
    #[default]
    Free,
    /// The cell is blocked by collapse debris or an active obstacle.
    Blocked,
}

impl CellState {
    /// Coerces an externally supplied raw value: zero is free, any other
    /// value is blocked.
    #[must_use]
    pub const fn from_raw(value: u8) -> Self {
        if value == 0 {
            Self::Free
        } else {
            Self::Blocked
        }
    }

    /// Reports whether the cell is traversable.
    #[must_use]
    pub const fn is_free(self) -> bool {
        matches!(self, Self::Free)
    }
}

/// Looks up the cardinal direction code for a signed step delta.
#[must_use]
pub fn cardinal_code(delta: (i64, i64)) -> u8 {
    code_in(&CARDINAL_OFFSETS, delta)
}

/// Looks up the extended direction code for a signed step delta.
#[must_use]
pub fn extended_code(delta: (i64, i64)) -> u8 {
    code_in(&EXTENDED_OFFSETS, delta)
}

/// Resolves a cardinal direction code back into its step offset.
#[must_use]
pub fn cardinal_offset(code: u8) -> Option<(i32, i32)> {
    let index = usize::from(code.checked_sub(1)?);
    CARDINAL_OFFSETS.get(index).copied()
}

/// Resolves an extended direction code back into its step offset.
#[must_use]
pub fn extended_offset(code: u8) -> Option<(i32, i32)> {
    let index = usize::from(code.checked_sub(1)?);
    EXTENDED_OFFSETS.get(index).copied()
}

fn code_in(table: &[(i32, i32)], delta: (i64, i64)) -> u8 {
    table
        .iter()
        .position(|&(dr, dc)| i64::from(dr) == delta.0 && i64::from(dc) == delta.1)
        .map_or(UNKNOWN_DIRECTION, |index| index as u8 + 1)
}

/// One path node plus the direction code of the step toward its successor.
///
/// A path of `k` nodes encodes as `k - 1` triplets; the final node carries
/// no successor and therefore no triplet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathTriplet {
    /// Row of the path node.
    pub row: u32,
    /// Column of the path node.
    pub column: u32,
    /// Direction code of the step leading to the next node.
    pub direction: u8,
}

/// Complete planner result: the ordered cell sequence from start to goal
/// inclusive and the total accumulated traversal cost.
#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    cells: Vec<CellCoord>,
    cost: f64,
}

impl Route {
    /// Creates a route from an ordered cell sequence and its total cost.
    #[must_use]
    pub fn new(cells: Vec<CellCoord>, cost: f64) -> Self {
        Self { cells, cost }
    }

    /// Ordered cells visited by the route, start and goal inclusive.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// Total accumulated traversal cost of the route.
    #[must_use]
    pub const fn cost(&self) -> f64 {
        self.cost
    }

    /// Number of nodes on the route.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the route visits no cells at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Encodes the route as triplets using cardinal direction codes.
    #[must_use]
    pub fn cardinal_triplets(&self) -> Vec<PathTriplet> {
        self.triplets(cardinal_code)
    }

    /// Encodes the route as triplets using extended direction codes.
    #[must_use]
    pub fn extended_triplets(&self) -> Vec<PathTriplet> {
        self.triplets(extended_code)
    }

    fn triplets(&self, code: impl Fn((i64, i64)) -> u8) -> Vec<PathTriplet> {
        self.cells
            .windows(2)
            .map(|pair| PathTriplet {
                row: pair[0].row(),
                column: pair[0].column(),
                direction: code(pair[0].delta_to(pair[1])),
            })
            .collect()
    }
}

/// Structural failures reported by grid and planner operations.
///
/// An exhausted search is not a failure; planners report it through an
/// empty result variant instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum NavError {
    /// The supplied grid is empty or has rows of unequal length.
    #[error("grid must be a non-empty rectangle of equal-length rows")]
    InvalidGrid,
    /// A start, goal, or agent coordinate lies outside the grid bounds.
    #[error("coordinate ({row}, {column}) lies outside the {rows}x{columns} grid")]
    OutOfRange {
        /// Row of the offending coordinate.
        row: u32,
        /// Column of the offending coordinate.
        column: u32,
        /// Row count of the grid that rejected the coordinate.
        rows: u32,
        /// Column count of the grid that rejected the coordinate.
        columns: u32,
    },
}
