//! Per-cycle aggregate counts and rule fault reporting.

use std::fmt;
use std::ops::AddAssign;

use super::cell::Cell;
use crate::error::Error;

/// Counts for one completed cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CycleStatistics {
    /// Cells alive in the new generation.
    pub alive: u64,
    /// Cells alive now that were not alive before.
    pub births: u64,
    /// Cells alive before that are not alive now.
    pub deaths: u64,
    /// Cells alive both before and now.
    pub survivors: u64,
}

impl CycleStatistics {
    /// Classify one cell's transition between generations.
    #[inline]
    pub fn of_transition(old: &Cell, new: &Cell) -> Self {
        let was_alive = old.is_alive();
        let is_alive = new.is_alive();
        Self {
            alive: is_alive as u64,
            births: (is_alive && !was_alive) as u64,
            deaths: (!is_alive && was_alive) as u64,
            survivors: (is_alive && was_alive) as u64,
        }
    }
}

impl AddAssign for CycleStatistics {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.alive += rhs.alive;
        self.births += rhs.births;
        self.deaths += rhs.deaths;
        self.survivors += rhs.survivors;
    }
}

impl fmt::Display for CycleStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "alive={} births={} deaths={} survivors={}",
            self.alive, self.births, self.deaths, self.survivors
        )
    }
}

/// A rule action that failed on one cell during a cycle.
///
/// Remaining rules were skipped for that cell only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleFault {
    pub row: usize,
    pub column: usize,
    pub rule: String,
    pub error: Error,
}

impl fmt::Display for RuleFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rule {:?} failed on [{},{}]: {}",
            self.rule, self.row, self.column, self.error
        )
    }
}

/// Outcome of a cycle: the grid age after it, its counts and its faults.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub age: u64,
    pub statistics: CycleStatistics,
    /// Sorted row-major.
    pub faults: Vec<RuleFault>,
}

impl CycleReport {
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}

/// Running totals while a cycle is folded over the cell table.
#[derive(Default)]
pub(crate) struct CycleTally {
    pub statistics: CycleStatistics,
    pub faults: Vec<RuleFault>,
}

impl CycleTally {
    #[inline]
    pub fn record(mut self, statistics: CycleStatistics, fault: Option<RuleFault>) -> Self {
        self.statistics += statistics;
        if let Some(fault) = fault {
            self.faults.push(fault);
        }
        self
    }

    pub fn merge(mut self, mut other: Self) -> Self {
        self.statistics += other.statistics;
        self.faults.append(&mut other.faults);
        self
    }

    pub fn into_report(mut self, age: u64) -> CycleReport {
        self.faults.sort_by_key(|fault| (fault.row, fault.column));
        CycleReport {
            age,
            statistics: self.statistics,
            faults: self.faults,
        }
    }
}
