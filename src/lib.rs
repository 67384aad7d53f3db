//! Rule-driven cellular automaton engine on bounded 2D grids.

pub mod automaton;
mod error;

pub use automaton::{
    Cell, CellAction, CellChange, CellMut, CellState, CycleReport, CycleStatistics, Grid,
    GridConfig, GridEvent, Rule, RuleBuilder, RuleFault, StateModel, TransitionPolicy,
};
pub use error::{Error, Result};
