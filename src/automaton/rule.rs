//! Transition rules: a condition over the previous generation paired with an
//! action on the next one.

use std::fmt;

use super::cell::Cell;
use super::grid::Grid;
use crate::error::Result;

/// A named condition/action pair evaluated once per cell per cycle.
///
/// `matches` sees the old cell and the old grid; `apply` mutates the cell's
/// copy in the next generation. Rules may run on the grid's worker pool.
pub trait Rule: Send + Sync {
    /// Diagnostic name, reported in rule faults.
    fn name(&self) -> &str;

    fn matches(&self, cell: &Cell, grid: &Grid) -> bool;

    /// Transition the next-generation copy. Replacing the cell with one of
    /// another position or policy is reported as
    /// [`Error::IdentityChanged`](crate::Error::IdentityChanged).
    fn apply(&self, cell: &mut Cell) -> Result<()>;
}

impl fmt::Debug for dyn Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Rule").field(&self.name()).finish()
    }
}

/// Rule built from closures via [`RuleBuilder`].
pub struct FnRule<C, A> {
    name: String,
    condition: C,
    action: A,
}

impl<C, A> Rule for FnRule<C, A>
where
    C: Fn(&Cell, &Grid) -> bool + Send + Sync,
    A: Fn(&mut Cell) -> Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    fn matches(&self, cell: &Cell, grid: &Grid) -> bool {
        (self.condition)(cell, grid)
    }

    #[inline]
    fn apply(&self, cell: &mut Cell) -> Result<()> {
        (self.action)(cell)
    }
}

impl<C, A> fmt::Debug for FnRule<C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRule").field("name", &self.name).finish()
    }
}

/// Fluent construction of closure rules:
///
/// ```
/// use rule_life::{Cell, RuleBuilder};
///
/// let lonely = RuleBuilder::new("lonely dies")
///     .when(|cell, grid| {
///         cell.is_alive()
///             && grid
///                 .count_alive_neighbors(cell.row(), cell.column())
///                 .is_ok_and(|n| n < 2)
///     })
///     .then(Cell::kill);
/// # let _ = lonely;
/// ```
#[derive(Debug)]
pub struct RuleBuilder {
    name: String,
}

impl RuleBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Sets the condition evaluated against the previous generation.
    pub fn when<C>(self, condition: C) -> ConditionedRule<C>
    where
        C: Fn(&Cell, &Grid) -> bool + Send + Sync,
    {
        ConditionedRule {
            name: self.name,
            condition,
        }
    }
}

/// Intermediate builder stage holding a condition but no action yet.
pub struct ConditionedRule<C> {
    name: String,
    condition: C,
}

impl<C> ConditionedRule<C>
where
    C: Fn(&Cell, &Grid) -> bool + Send + Sync,
{
    /// Sets the action applied to matching cells and finishes the rule.
    pub fn then<A>(self, action: A) -> FnRule<C, A>
    where
        A: Fn(&mut Cell) -> Result<()> + Send + Sync,
    {
        FnRule {
            name: self.name,
            condition: self.condition,
            action,
        }
    }
}

impl<C> fmt::Debug for ConditionedRule<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionedRule")
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn builder_rule_evaluates_condition_and_action() {
        let grid = Grid::new(2, 2, None).unwrap();
        let rule = RuleBuilder::new("first column")
            .when(|cell: &Cell, _: &Grid| cell.column() == 0)
            .then(Cell::revive);

        assert_eq!(rule.name(), "first column");
        assert!(rule.matches(grid.get(1, 0).unwrap(), &grid));
        assert!(!rule.matches(grid.get(1, 1).unwrap(), &grid));

        let mut cell = grid.get(1, 0).unwrap().clone();
        rule.apply(&mut cell).unwrap();
        assert!(cell.is_alive());
        assert!(matches!(rule.apply(&mut cell), Err(Error::InvalidState { .. })));
    }

    #[test]
    fn debug_prints_rule_name() {
        let rule: Box<dyn Rule> = Box::new(
            RuleBuilder::new("never")
                .when(|_: &Cell, _: &Grid| false)
                .then(|_: &mut Cell| Ok(())),
        );
        assert_eq!(format!("{rule:?}"), "Rule(\"never\")");
    }
}
