//! Double-buffered cell tables.
//!
//! Two row-major `Vec<Cell>` tables of identical size with a phase bit:
//! `tables[phase]` is the current generation (read side), the other is the
//! next generation (write side). A cycle detaches the write side, fills it,
//! puts it back and flips the phase. Neither table is reallocated.

use super::cell::{Cell, StateModel, TransitionPolicy};

pub struct GenerationBuffers {
    tables: [Vec<Cell>; 2],
    phase: usize,
}

impl GenerationBuffers {
    /// Allocates both tables with fresh cells for every coordinate.
    pub fn new(
        rows: usize,
        columns: usize,
        model: StateModel,
        policy: TransitionPolicy,
    ) -> Self {
        let front = fresh_table(rows, columns, model, policy);
        let back = front.clone();
        Self {
            tables: [front, back],
            phase: 0,
        }
    }

    /// Current generation (read side).
    #[inline(always)]
    pub fn current(&self) -> &[Cell] {
        &self.tables[self.phase]
    }

    /// Mutable current generation, for edits between cycles.
    #[inline(always)]
    pub fn current_mut(&mut self) -> &mut [Cell] {
        &mut self.tables[self.phase]
    }

    /// Detach the next-generation table so it can be written while the
    /// current one is shared. Must be returned with [`Self::restore_next`].
    #[inline]
    pub fn take_next(&mut self) -> Vec<Cell> {
        std::mem::take(&mut self.tables[1 - self.phase])
    }

    #[inline]
    pub fn restore_next(&mut self, next: Vec<Cell>) {
        debug_assert_eq!(next.len(), self.tables[self.phase].len());
        self.tables[1 - self.phase] = next;
    }

    /// Flip phase (swap current/next).
    #[inline(always)]
    pub fn flip(&mut self) {
        self.phase = 1 - self.phase;
    }

    /// Overwrite both tables with fresh cells, keeping their allocations.
    pub fn reset(
        &mut self,
        rows: usize,
        columns: usize,
        model: StateModel,
        policy: TransitionPolicy,
    ) {
        for table in &mut self.tables {
            for (idx, cell) in table.iter_mut().enumerate() {
                *cell = Cell::with_model(idx / columns, idx % columns, model, policy);
            }
            debug_assert_eq!(table.len(), rows * columns);
        }
        self.phase = 0;
    }
}

fn fresh_table(
    rows: usize,
    columns: usize,
    model: StateModel,
    policy: TransitionPolicy,
) -> Vec<Cell> {
    let mut table = Vec::with_capacity(rows * columns);
    for row in 0..rows {
        for column in 0..columns {
            table.push(Cell::with_model(row, column, model, policy));
        }
    }
    table
}
