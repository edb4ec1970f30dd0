//! Set of occupied road cells

use std::collections::HashSet;

use super::error::{SimError, SimResult};
use super::types::Cell;

/// Tracks which cells currently hold a car
///
/// Holds no car data, only the cells. Every mutation goes through [`Road`],
/// which keeps this in lockstep with its active cars.
///
/// [`Road`]: super::road::Road
#[derive(Debug, Clone, Default)]
pub struct OccupancyIndex {
    cells: HashSet<Cell>,
}

impl OccupancyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    /// Mark a cell as occupied
    /// Fails if the cell already holds a car
    pub fn insert(&mut self, cell: Cell) -> SimResult<()> {
        if !self.cells.insert(cell) {
            return Err(SimError::CellOccupied(cell));
        }
        Ok(())
    }

    /// Mark a cell as free
    /// Fails if the cell held no car
    pub fn remove(&mut self, cell: Cell) -> SimResult<()> {
        if !self.cells.remove(&cell) {
            return Err(SimError::CellVacant(cell));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }
}
