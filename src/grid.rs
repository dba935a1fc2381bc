//! Square terrain grid of packed cells, backed by a `GridStore`.
//!
//! The side length is a power of two fixed when the grid is opened or created.
//! Cells live in one row-major buffer; coordinates never wrap.

use std::io;

use crate::codec::Cell;
use crate::error::GridError;
use crate::store::{GridData, GridStore, MAX_POWER_OF_TWO};

pub struct TerrainGrid<S> {
    side: usize,
    cells: Vec<Cell>,
    store: S,
}

impl<S: GridStore> TerrainGrid<S> {
    /// Load an existing grid from its store.
    pub fn open(mut store: S) -> Result<Self, GridError> {
        let data = store.load()?;
        Self::from_data(store, data)
    }

    /// Reset the store to a zero-filled grid of side `2^power_of_two`.
    pub fn create(mut store: S, power_of_two: u32) -> Result<Self, GridError> {
        if power_of_two == 0 || power_of_two > MAX_POWER_OF_TWO {
            return Err(GridError::InvalidSize { power_of_two });
        }
        let data = store.create(power_of_two)?;
        Self::from_data(store, data)
    }

    fn from_data(store: S, data: GridData) -> Result<Self, GridError> {
        let GridData { side, cells } = data;
        if !side.is_power_of_two() || cells.len() != side * side {
            return Err(GridError::SizeMismatch {
                side,
                actual: cells.len(),
            });
        }
        Ok(Self { side, cells, store })
    }

    /// Persist the current cells.
    pub fn save(&mut self) -> io::Result<()> {
        self.store.save(self.side, &self.cells)
    }

    pub fn close(&mut self) -> io::Result<()> {
        self.store.close()
    }
}

impl<S> TerrainGrid<S> {
    pub fn side(&self) -> usize {
        self.side
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.side && y < self.side
    }

    fn index(&self, x: usize, y: usize) -> Result<usize, GridError> {
        if !self.contains(x, y) {
            return Err(GridError::OutOfBounds {
                x,
                y,
                side: self.side,
            });
        }
        Ok(y * self.side + x)
    }

    pub fn get(&self, x: usize, y: usize) -> Result<Cell, GridError> {
        let idx = self.index(x, y)?;
        Ok(self.cells[idx])
    }

    /// Overwrite one cell. No history is kept.
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) -> Result<(), GridError> {
        let idx = self.index(x, y)?;
        self.cells[idx] = cell;
        Ok(())
    }

    /// Cell at coordinates the caller already knows are in range.
    pub(crate) fn at(&self, x: usize, y: usize) -> Cell {
        debug_assert!(self.contains(x, y));
        self.cells[y * self.side + x]
    }

    pub(crate) fn put(&mut self, x: usize, y: usize, cell: Cell) {
        debug_assert!(self.contains(x, y));
        self.cells[y * self.side + x] = cell;
    }

    /// Fill the entire grid with a value.
    pub fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Cell)> + '_ {
        let side = self.side;
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, cell)| (idx % side, idx / side, *cell))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}
