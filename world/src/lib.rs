#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Occupancy-grid world model for the collapse navigation engine.
//!
//! The grid is the single shared representation every planner and the
//! aftershock engine operate on. Callers own the grid for the duration of
//! each call; no component retains it afterwards. Externally supplied raw
//! grids are validated and coerced to binary occupancy on entry.

mod cost;

pub use cost::{CostField, CostFieldParams};

use collapse_nav_core::{CellCoord, CellState, NavError, CARDINAL_OFFSETS};

/// Dense rectangular occupancy grid of [`CellState`] values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OccupancyGrid {
    rows: u32,
    columns: u32,
    cells: Vec<CellState>,
}

impl OccupancyGrid {
    /// Builds a grid from externally supplied raw rows.
    ///
    /// Fails with [`NavError::InvalidGrid`] when the input is empty, has an
    /// empty first row, or any row length differs from the first. Raw
    /// values are coerced defensively: zero becomes free, anything else
    /// blocked.
    pub fn from_rows(raw: &[Vec<u8>]) -> Result<Self, NavError> {
        let rows = u32::try_from(raw.len()).map_err(|_| NavError::InvalidGrid)?;
        if rows == 0 {
            return Err(NavError::InvalidGrid);
        }
        let width = raw[0].len();
        let columns = u32::try_from(width).map_err(|_| NavError::InvalidGrid)?;
        if columns == 0 {
            return Err(NavError::InvalidGrid);
        }

        let mut cells = Vec::with_capacity(width * raw.len());
        for row in raw {
            if row.len() != width {
                return Err(NavError::InvalidGrid);
            }
            cells.extend(row.iter().map(|&value| CellState::from_raw(value)));
        }

        Ok(Self {
            rows,
            columns,
            cells,
        })
    }

    /// Creates a fully traversable grid with the provided dimensions.
    #[must_use]
    pub fn new_free(rows: u32, columns: u32) -> Self {
        let count = rows as usize * columns as usize;
        Self {
            rows,
            columns,
            cells: vec![CellState::Free; count],
        }
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Reports whether the coordinate lies inside the grid bounds.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.row() < self.rows && cell.column() < self.columns
    }

    /// Validates that the coordinate lies inside the grid bounds.
    pub fn ensure_in_bounds(&self, cell: CellCoord) -> Result<(), NavError> {
        if self.contains(cell) {
            Ok(())
        } else {
            Err(NavError::OutOfRange {
                row: cell.row(),
                column: cell.column(),
                rows: self.rows,
                columns: self.columns,
            })
        }
    }

    /// State of the provided cell, if it lies within the grid.
    #[must_use]
    pub fn state(&self, cell: CellCoord) -> Option<CellState> {
        self.index(cell).map(|index| self.cells[index])
    }

    /// Reports whether the cell is in bounds and traversable.
    #[must_use]
    pub fn is_free(&self, cell: CellCoord) -> bool {
        self.state(cell).is_some_and(CellState::is_free)
    }

    /// Overwrites the state of a cell; coordinates outside the grid are
    /// ignored.
    pub fn set_state(&mut self, cell: CellCoord, state: CellState) {
        if let Some(index) = self.index(cell) {
            self.cells[index] = state;
        }
    }

    /// In-bounds 4-neighbors of the provided cell, enumerated in the
    /// canonical east, south, west, north order.
    pub fn neighbors(&self, cell: CellCoord) -> impl Iterator<Item = CellCoord> + '_ {
        CARDINAL_OFFSETS
            .iter()
            .filter_map(move |&delta| cell.offset_by(delta))
            .filter(|candidate| self.contains(*candidate))
    }

    /// Iterates over every cell coordinate paired with its state, in
    /// row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, CellState)> + '_ {
        let columns = self.columns;
        self.cells.iter().enumerate().map(move |(index, &state)| {
            let row = (index / columns as usize) as u32;
            let column = (index % columns as usize) as u32;
            (CellCoord::new(row, column), state)
        })
    }

    /// Number of blocked cells currently present in the grid.
    #[must_use]
    pub fn blocked_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|state| !state.is_free())
            .count()
    }

    /// Exports the grid as raw binary rows.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        (0..self.rows)
            .map(|row| {
                (0..self.columns)
                    .map(|column| {
                        u8::from(!self.is_free(CellCoord::new(row, column)))
                    })
                    .collect()
            })
            .collect()
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if self.contains(cell) {
            let row = cell.row() as usize;
            let column = cell.column() as usize;
            Some(row * self.columns as usize + column)
        } else {
            None
        }
    }
}
