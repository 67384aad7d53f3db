//! Rule-driven automaton internals and public API.

mod buffers;
mod cell;
mod events;
mod grid;
mod rule;
mod stats;

pub use cell::{Cell, CellAction, CellMut, CellState, StateModel, TransitionPolicy};
pub use events::{CellChange, GridEvent};
pub use grid::{Grid, GridConfig, PARALLEL_MIN_CELLS};
pub use rule::{ConditionedRule, FnRule, Rule, RuleBuilder};
pub use stats::{CycleReport, CycleStatistics, RuleFault};
