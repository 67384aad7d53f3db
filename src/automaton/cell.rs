//! Single automaton cell and its lifecycle state machine.
//!
//! `Inactive --revive--> Alive --kill--> Dead --revive--> Alive`, and
//! `Alive --evolve--> Alive` with a growing generation. A cell's generation is
//! zero exactly when it is not alive.

use std::fmt;
use std::ops::Deref;

use crate::error::{Error, Result};

/// Lifecycle state of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellState {
    /// Never revived since creation.
    Inactive,
    /// Killed at least once and not revived since.
    Dead,
    Alive,
}

impl fmt::Display for CellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CellState::Inactive => "Inactive",
            CellState::Dead => "Dead",
            CellState::Alive => "Alive",
        })
    }
}

/// Transition requested on a cell, reported in [`Error::InvalidState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellAction {
    Revive,
    Kill,
    Evolve,
}

impl fmt::Display for CellAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CellAction::Revive => "revive",
            CellAction::Kill => "kill",
            CellAction::Evolve => "evolve",
        })
    }
}

/// How redundant transitions are treated.
///
/// Evolving a cell that is not alive is an error under both policies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TransitionPolicy {
    /// Reviving an alive cell or killing a non-alive cell fails with
    /// [`Error::InvalidState`].
    #[default]
    Strict,
    /// Reviving an alive cell or killing a non-alive cell is a no-op.
    Lenient,
}

/// Which state freshly created cells start in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StateModel {
    /// Cells start [`CellState::Inactive`], distinct from killed cells.
    #[default]
    ThreeState,
    /// Cells start [`CellState::Dead`]; `Inactive` never occurs.
    TwoState,
}

impl StateModel {
    #[inline]
    pub fn initial_state(self) -> CellState {
        match self {
            StateModel::ThreeState => CellState::Inactive,
            StateModel::TwoState => CellState::Dead,
        }
    }
}

/// A single addressable unit of a grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    row: usize,
    column: usize,
    state: CellState,
    generation: u64,
    times_revived: u64,
    times_killed: u64,
    policy: TransitionPolicy,
}

impl Cell {
    /// Creates an inactive cell with the strict transition policy.
    pub fn new(row: usize, column: usize) -> Self {
        Self::with_model(row, column, StateModel::default(), TransitionPolicy::default())
    }

    /// Creates a fresh cell for the given state model and policy.
    pub fn with_model(
        row: usize,
        column: usize,
        model: StateModel,
        policy: TransitionPolicy,
    ) -> Self {
        Self {
            row,
            column,
            state: model.initial_state(),
            generation: 0,
            times_revived: 0,
            times_killed: 0,
            policy,
        }
    }

    #[inline]
    pub fn row(&self) -> usize {
        self.row
    }

    #[inline]
    pub fn column(&self) -> usize {
        self.column
    }

    /// `(row, column)` of this cell.
    #[inline]
    pub fn position(&self) -> (usize, usize) {
        (self.row, self.column)
    }

    #[inline]
    pub fn state(&self) -> CellState {
        self.state
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.state == CellState::Alive
    }

    /// Generations lived since the last revive; zero when not alive.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Lifetime count of successful revives.
    #[inline]
    pub fn times_revived(&self) -> u64 {
        self.times_revived
    }

    /// Lifetime count of successful kills.
    #[inline]
    pub fn times_killed(&self) -> u64 {
        self.times_killed
    }

    #[inline]
    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Makes the cell alive at generation 1.
    pub fn revive(&mut self) -> Result<()> {
        if self.is_alive() {
            return self.redundant(CellAction::Revive);
        }
        self.state = CellState::Alive;
        self.generation = 1;
        self.times_revived += 1;
        Ok(())
    }

    /// Makes the cell dead and resets its generation.
    pub fn kill(&mut self) -> Result<()> {
        if !self.is_alive() {
            return self.redundant(CellAction::Kill);
        }
        self.state = CellState::Dead;
        self.generation = 0;
        self.times_killed += 1;
        Ok(())
    }

    /// Advances an alive cell by one generation.
    #[inline]
    pub fn evolve(&mut self) -> Result<()> {
        self.evolve_for(1)
    }

    /// Advances an alive cell by `times` generations.
    pub fn evolve_for(&mut self, times: u64) -> Result<()> {
        if times < 1 {
            return Err(Error::InvalidEvolveCount);
        }
        if !self.is_alive() {
            return Err(Error::InvalidState {
                action: CellAction::Evolve,
                state: self.state,
            });
        }
        self.generation = self.generation.saturating_add(times);
        Ok(())
    }

    /// Same slot and policy; the lifecycle fields may differ.
    #[inline]
    pub(crate) fn same_identity(&self, other: &Cell) -> bool {
        self.position() == other.position() && self.policy == other.policy
    }

    fn redundant(&self, action: CellAction) -> Result<()> {
        match self.policy {
            TransitionPolicy::Strict => Err(Error::InvalidState {
                action,
                state: self.state,
            }),
            TransitionPolicy::Lenient => Ok(()),
        }
    }
}

/// Mutable access to a grid-owned cell.
///
/// Reads go through `Deref`; writes are limited to lifecycle transitions, so
/// the cell cannot be swapped for another one:
///
/// ```compile_fail
/// use rule_life::{Cell, Grid};
///
/// let mut grid = Grid::new(2, 2, None).unwrap();
/// *grid.cell_mut(0, 0).unwrap() = Cell::new(1, 1);
/// ```
#[derive(Debug)]
pub struct CellMut<'a> {
    cell: &'a mut Cell,
}

impl<'a> CellMut<'a> {
    #[inline]
    pub(crate) fn new(cell: &'a mut Cell) -> Self {
        Self { cell }
    }

    pub fn revive(&mut self) -> Result<()> {
        self.cell.revive()
    }

    pub fn kill(&mut self) -> Result<()> {
        self.cell.kill()
    }

    pub fn evolve(&mut self) -> Result<()> {
        self.cell.evolve()
    }

    pub fn evolve_for(&mut self, times: u64) -> Result<()> {
        self.cell.evolve_for(times)
    }
}

impl Deref for CellMut<'_> {
    type Target = Cell;

    #[inline]
    fn deref(&self) -> &Cell {
        self.cell
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{},{}] - {} - {}",
            self.row, self.column, self.state, self.generation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_generation_invariant(cell: &Cell) {
        assert_eq!(
            cell.generation() == 0,
            !cell.is_alive(),
            "generation/state mismatch: {cell}"
        );
    }

    #[test]
    fn fresh_cell_is_inactive_at_generation_zero() {
        let cell = Cell::new(2, 5);
        assert_eq!(cell.state(), CellState::Inactive);
        assert_eq!(cell.generation(), 0);
        assert_eq!(cell.position(), (2, 5));
        assert_generation_invariant(&cell);
    }

    #[test]
    fn two_state_model_starts_dead() {
        let cell = Cell::with_model(0, 0, StateModel::TwoState, TransitionPolicy::Strict);
        assert_eq!(cell.state(), CellState::Dead);
        assert_eq!(cell.generation(), 0);
    }

    #[test]
    fn revive_kill_revive_cycle() {
        let mut cell = Cell::new(0, 0);
        cell.revive().unwrap();
        assert_eq!(cell.state(), CellState::Alive);
        assert_eq!(cell.generation(), 1);
        assert_generation_invariant(&cell);

        cell.evolve_for(3).unwrap();
        assert_eq!(cell.generation(), 4);

        cell.kill().unwrap();
        assert_eq!(cell.state(), CellState::Dead);
        assert_eq!(cell.generation(), 0);
        assert_generation_invariant(&cell);

        cell.revive().unwrap();
        assert_eq!(cell.generation(), 1);
        assert_eq!(cell.times_revived(), 2);
        assert_eq!(cell.times_killed(), 1);
    }

    #[test]
    fn strict_policy_rejects_redundant_transitions() {
        let mut cell = Cell::new(1, 1);
        assert_eq!(
            cell.kill(),
            Err(Error::InvalidState {
                action: CellAction::Kill,
                state: CellState::Inactive,
            })
        );
        cell.revive().unwrap();
        cell.evolve().unwrap();
        assert_eq!(
            cell.revive(),
            Err(Error::InvalidState {
                action: CellAction::Revive,
                state: CellState::Alive,
            })
        );
        // A failed transition leaves the cell untouched.
        assert_eq!(cell.generation(), 2);
        assert_eq!(cell.times_revived(), 1);
    }

    #[test]
    fn lenient_policy_ignores_redundant_transitions() {
        let mut cell = Cell::with_model(0, 0, StateModel::ThreeState, TransitionPolicy::Lenient);
        cell.kill().unwrap();
        assert_eq!(cell.state(), CellState::Inactive);
        assert_eq!(cell.times_killed(), 0);

        cell.revive().unwrap();
        cell.evolve().unwrap();
        cell.revive().unwrap();
        assert_eq!(cell.generation(), 2);
        assert_eq!(cell.times_revived(), 1);
    }

    #[test]
    fn evolve_requires_alive_under_any_policy() {
        for policy in [TransitionPolicy::Strict, TransitionPolicy::Lenient] {
            let mut cell = Cell::with_model(0, 0, StateModel::ThreeState, policy);
            assert!(matches!(
                cell.evolve(),
                Err(Error::InvalidState {
                    action: CellAction::Evolve,
                    ..
                })
            ));
        }
    }

    #[test]
    fn evolve_for_zero_is_invalid_argument() {
        let mut cell = Cell::new(0, 0);
        cell.revive().unwrap();
        assert_eq!(cell.evolve_for(0), Err(Error::InvalidEvolveCount));
        assert_eq!(cell.generation(), 1);
    }

    #[test]
    fn identity_ignores_lifecycle_but_not_slot_or_policy() {
        let fresh = Cell::new(1, 2);
        let mut alive = fresh.clone();
        alive.revive().unwrap();
        alive.evolve_for(4).unwrap();
        assert!(fresh.same_identity(&alive));
        assert!(!fresh.same_identity(&Cell::new(2, 1)));
        let lenient = Cell::with_model(1, 2, StateModel::ThreeState, TransitionPolicy::Lenient);
        assert!(!fresh.same_identity(&lenient));
    }

    #[test]
    fn handle_drives_transitions_on_the_borrowed_cell() {
        let mut cell = Cell::new(0, 3);
        {
            let mut handle = CellMut::new(&mut cell);
            handle.revive().unwrap();
            handle.evolve_for(2).unwrap();
            assert_eq!(handle.generation(), 3);
            assert!(handle.revive().is_err());
        }
        assert_eq!(cell.generation(), 3);
        assert_eq!(cell.position(), (0, 3));
    }

    #[test]
    fn display_shows_position_state_and_generation() {
        let mut cell = Cell::new(3, 7);
        assert_eq!(cell.to_string(), "[3,7] - Inactive - 0");
        cell.revive().unwrap();
        cell.evolve_for(2).unwrap();
        assert_eq!(cell.to_string(), "[3,7] - Alive - 3");
    }
}
