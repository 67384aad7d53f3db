//! Error type shared by cells, rules and grids.

use thiserror::Error;

use crate::automaton::{CellAction, CellState};

/// Result type returned by fallible engine routines.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error raised by grid construction, indexing or cell transitions.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum Error {
    /// A grid needs at least one row and one column.
    #[error("grid must be at least 1x1, got {rows}x{columns}")]
    InvalidDimensions { rows: usize, columns: usize },
    /// `evolve_for` was asked to advance by zero generations.
    #[error("evolve count must be at least 1")]
    InvalidEvolveCount,
    /// A coordinate outside `[0, rows) x [0, columns)`.
    #[error("({row}, {column}) is outside a {rows}x{columns} grid")]
    OutOfBounds {
        row: usize,
        column: usize,
        rows: usize,
        columns: usize,
    },
    /// A cell transition not allowed from the cell's current state.
    #[error("cannot {action} a cell that is {state}")]
    InvalidState { action: CellAction, state: CellState },
    /// An action or edit replaced a grid-owned cell with one of another
    /// position or transition policy.
    #[error("cell [{row},{column}] was replaced instead of transitioned")]
    IdentityChanged { row: usize, column: usize },
    /// A cell reference that is not part of the grid being queried.
    #[error("cell [{row},{column}] does not belong to this grid")]
    ForeignCell { row: usize, column: usize },
}
