//! Dense build grid tracking obstacles and defender occupancy.

use bastion_core::{CellCoord, CellState, DefenderId, GridLayout};

/// Row-major grid of cell states mirroring the configured layout.
///
/// Occupancy only affects future placement requests; hostile routes are
/// precomputed and never consult the grid.
#[derive(Clone, Debug)]
pub(crate) struct BuildGrid {
    columns: u32,
    rows: u32,
    cells: Vec<CellState>,
}

impl BuildGrid {
    /// Creates a grid with every obstacle of the layout blocked.
    pub(crate) fn new(layout: &GridLayout) -> Self {
        let capacity_u64 = u64::from(layout.columns) * u64::from(layout.rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        let mut grid = Self {
            columns: layout.columns,
            rows: layout.rows,
            cells: vec![CellState::Walkable; capacity],
        };
        for obstacle in &layout.obstacles {
            grid.set(*obstacle, CellState::Obstacle);
        }
        grid
    }

    /// State of the provided cell, or `None` when it lies outside the grid.
    pub(crate) fn state(&self, cell: CellCoord) -> Option<CellState> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Marks a walkable cell as occupied by `defender`.
    pub(crate) fn occupy(&mut self, cell: CellCoord, defender: DefenderId) {
        if self.state(cell) == Some(CellState::Walkable) {
            self.set(cell, CellState::Occupied(defender));
        }
    }

    fn set(&mut self, cell: CellCoord, state: CellState) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = state;
            }
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}
