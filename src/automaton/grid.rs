//! Bounded 2D grid: cell ownership, neighborhoods and the synchronous cycle.
//!
//! Every cycle evaluates all rules against the current generation (read-only)
//! and writes into the detached next-generation table, one slot per cell, so
//! per-cell work has no ordering dependency and runs on a rayon pool for
//! large grids.

use std::fmt;
use std::ops::{Deref, Index};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, OnceLock};

use log::{debug, trace, warn};
use rayon::prelude::*;

use super::buffers::GenerationBuffers;
use super::cell::{Cell, CellMut, StateModel, TransitionPolicy};
use super::events::{CellChange, EventSink, GridEvent};
use super::rule::Rule;
use super::stats::{CycleReport, CycleStatistics, CycleTally, RuleFault};
use crate::error::{Error, Result};

/// Grids smaller than this are always stepped on the calling thread.
pub const PARALLEL_MIN_CELLS: usize = 4_096;
const PARALLEL_CELLS_PER_THREAD: usize = 1_024;
const PARALLEL_CHUNK_MIN: usize = 256;
const MAX_LOGGED_FAULTS: usize = 8;

/// Moore neighborhood offsets in row-major order.
const MOORE_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

static PHYSICAL_CORES: OnceLock<usize> = OnceLock::new();

#[inline]
fn physical_core_count() -> usize {
    *PHYSICAL_CORES.get_or_init(|| num_cpus::get_physical().max(1))
}

/// Resolve the thread count from a config, falling back to auto-detect.
fn resolve_thread_count(config: &GridConfig) -> usize {
    let mut threads = config.thread_count.unwrap_or_else(physical_core_count);
    if let Some(cap) = config.max_threads {
        threads = threads.min(cap);
    }
    threads.max(1)
}

/// Worker threads worth spawning for a table of `cell_count` cells.
#[inline]
fn effective_parallel_threads(cell_count: usize, thread_count: usize) -> usize {
    if thread_count <= 1 || cell_count < PARALLEL_MIN_CELLS {
        return 1;
    }
    (cell_count / PARALLEL_CELLS_PER_THREAD)
        .min(thread_count)
        .max(1)
}

#[inline]
fn shift_axis(coord: usize, delta: isize, len: usize, wrap: bool) -> Option<usize> {
    let shifted = coord as isize + delta;
    if (0..len as isize).contains(&shifted) {
        Some(shifted as usize)
    } else if wrap {
        Some(shifted.rem_euclid(len as isize) as usize)
    } else {
        None
    }
}

/// Neighbor coordinates of `(row, column)` in deterministic row-major order.
///
/// Out-of-bounds candidates are dropped or wrapped; a wrapped candidate that
/// lands back on the target itself is dropped.
fn moore_positions(
    row: usize,
    column: usize,
    rows: usize,
    columns: usize,
    wrap: bool,
) -> impl Iterator<Item = (usize, usize)> {
    MOORE_OFFSETS.iter().filter_map(move |&(dr, dc)| {
        let r = shift_axis(row, dr, rows, wrap)?;
        let c = shift_axis(column, dc, columns, wrap)?;
        ((r, c) != (row, column)).then_some((r, c))
    })
}

/// Configuration for a grid instance.
///
/// Use `GridConfig::default()` for auto-sized threading, bounded edges and
/// strict three-state cells, or customise individual knobs via the builder
/// methods.
#[derive(Clone, Debug, Default)]
pub struct GridConfig {
    /// Number of threads for the cycle pool.
    /// `None` means auto-detect (physical cores).
    pub thread_count: Option<usize>,
    /// Hard upper bound on threads regardless of auto-detection.
    pub max_threads: Option<usize>,
    /// Initial toroidal-wrap flag; can be changed later on the grid.
    pub wrap_edges: bool,
    pub transitions: TransitionPolicy,
    pub state_model: StateModel,
}

impl GridConfig {
    /// Set an explicit thread count for the cycle pool.
    pub fn thread_count(mut self, n: usize) -> Self {
        self.thread_count = Some(n.max(1));
        self
    }

    /// Set a hard upper bound on threads.
    pub fn max_threads(mut self, n: usize) -> Self {
        self.max_threads = Some(n.max(1));
        self
    }

    pub fn wrap_edges(mut self, wrap: bool) -> Self {
        self.wrap_edges = wrap;
        self
    }

    /// Policy for reviving alive cells and killing non-alive ones.
    pub fn transitions(mut self, policy: TransitionPolicy) -> Self {
        self.transitions = policy;
        self
    }

    /// Whether fresh cells start inactive or dead.
    pub fn state_model(mut self, model: StateModel) -> Self {
        self.state_model = model;
        self
    }
}

/// Rectangular cellular automaton evolved by an ordered rule list.
pub struct Grid {
    rows: usize,
    columns: usize,
    buffers: GenerationBuffers,
    rules: Vec<Arc<dyn Rule>>,
    age: u64,
    wrap_edges: bool,
    last_report: CycleReport,
    events: EventSink,
    /// Present only when the grid is large enough to step in parallel.
    pool: Option<rayon::ThreadPool>,
    config: GridConfig,
}

impl Grid {
    /// Create a grid with the default configuration.
    ///
    /// `init` is applied once, like a cycle over freshly created cells,
    /// without advancing the age.
    pub fn new(rows: usize, columns: usize, init: Option<&dyn Rule>) -> Result<Self> {
        Self::with_config(rows, columns, init, GridConfig::default())
    }

    /// Create a grid with explicit configuration.
    pub fn with_config(
        rows: usize,
        columns: usize,
        init: Option<&dyn Rule>,
        config: GridConfig,
    ) -> Result<Self> {
        if rows < 1 || columns < 1 {
            return Err(Error::InvalidDimensions { rows, columns });
        }
        let cell_count = rows
            .checked_mul(columns)
            .ok_or(Error::InvalidDimensions { rows, columns })?;

        let threads = effective_parallel_threads(cell_count, resolve_thread_count(&config));
        let pool = (threads > 1).then(|| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .expect("failed to build grid rayon thread pool")
        });
        trace!("creating {rows}x{columns} grid with {threads} cycle thread(s)");

        let mut grid = Self {
            rows,
            columns,
            buffers: GenerationBuffers::new(rows, columns, config.state_model, config.transitions),
            rules: Vec::new(),
            age: 0,
            wrap_edges: config.wrap_edges,
            last_report: CycleReport::default(),
            events: EventSink::default(),
            pool,
            config,
        };
        grid.seed(init);
        Ok(grid)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Number of cells, always `rows * columns`.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows * self.columns
    }

    /// A grid always holds at least one cell.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Cycles completed since construction or the last reset.
    #[inline]
    pub fn age(&self) -> u64 {
        self.age
    }

    #[inline]
    pub fn wrap_edges(&self) -> bool {
        self.wrap_edges
    }

    #[inline]
    pub fn set_wrap_edges(&mut self, wrap: bool) {
        self.wrap_edges = wrap;
    }

    #[inline]
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Threads used to step this grid.
    #[inline]
    pub fn threads(&self) -> usize {
        self.pool
            .as_ref()
            .map_or(1, rayon::ThreadPool::current_num_threads)
    }

    #[inline]
    fn index_of(&self, row: usize, column: usize) -> Result<usize> {
        if row >= self.rows || column >= self.columns {
            return Err(Error::OutOfBounds {
                row,
                column,
                rows: self.rows,
                columns: self.columns,
            });
        }
        Ok(row * self.columns + column)
    }

    /// Cell at `(row, column)` in the current generation.
    #[inline]
    pub fn get(&self, row: usize, column: usize) -> Result<&Cell> {
        let idx = self.index_of(row, column)?;
        Ok(&self.buffers.current()[idx])
    }

    /// Transition handle for edits between cycles. Edits made here publish
    /// no events; use [`Grid::edit`] for that.
    pub fn cell_mut(&mut self, row: usize, column: usize) -> Result<CellMut<'_>> {
        let idx = self.index_of(row, column)?;
        Ok(CellMut::new(&mut self.buffers.current_mut()[idx]))
    }

    /// All cells of the current generation, row-major.
    pub fn cells(&self) -> impl ExactSizeIterator<Item = &Cell> + '_ {
        self.buffers.current().iter()
    }

    /// Cells currently alive, recomputed from the table.
    pub fn population(&self) -> u64 {
        self.cells().filter(|cell| cell.is_alive()).count() as u64
    }

    /// Moore neighbors of `(row, column)`, row-major.
    pub fn neighbors(&self, row: usize, column: usize) -> Result<Vec<&Cell>> {
        self.index_of(row, column)?;
        let current = self.buffers.current();
        Ok(
            moore_positions(row, column, self.rows, self.columns, self.wrap_edges)
                .map(|(r, c)| &current[r * self.columns + c])
                .collect(),
        )
    }

    /// Neighbors of a cell reference, which must belong to this grid's
    /// current generation.
    pub fn neighbors_of(&self, cell: &Cell) -> Result<Vec<&Cell>> {
        let (row, column) = cell.position();
        let foreign = Error::ForeignCell { row, column };
        let idx = self.index_of(row, column).map_err(|_| foreign.clone())?;
        if !std::ptr::eq(cell, &self.buffers.current()[idx]) {
            return Err(foreign);
        }
        self.neighbors(row, column)
    }

    /// Alive Moore neighbors of `(row, column)`, without allocating.
    pub fn count_alive_neighbors(&self, row: usize, column: usize) -> Result<usize> {
        self.index_of(row, column)?;
        let current = self.buffers.current();
        Ok(
            moore_positions(row, column, self.rows, self.columns, self.wrap_edges)
                .filter(|&(r, c)| current[r * self.columns + c].is_alive())
                .count(),
        )
    }

    #[inline]
    pub fn rules(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    /// The rule list; only reachable between cycles.
    #[inline]
    pub fn rules_mut(&mut self) -> &mut Vec<Arc<dyn Rule>> {
        &mut self.rules
    }

    pub fn add_rule<R: Rule + 'static>(&mut self, rule: R) {
        self.rules.push(Arc::new(rule));
    }

    /// Remove the first rule with the given name.
    pub fn remove_rule(&mut self, name: &str) -> Option<Arc<dyn Rule>> {
        let pos = self.rules.iter().position(|rule| rule.name() == name)?;
        Some(self.rules.remove(pos))
    }

    pub fn clear_rules(&mut self) {
        self.rules.clear();
    }

    /// Route events to `sender`, or stop publishing with `None`.
    pub fn set_event_sink(&mut self, sender: Option<Sender<GridEvent>>) {
        self.events.set(sender);
    }

    /// Create a fresh event channel, replacing any previous sink.
    pub fn subscribe(&mut self) -> Receiver<GridEvent> {
        let (tx, rx) = mpsc::channel();
        self.events.set(Some(tx));
        rx
    }

    /// Report of the last completed cycle (or of initialization).
    #[inline]
    pub fn last_report(&self) -> &CycleReport {
        &self.last_report
    }

    #[inline]
    pub fn statistics(&self) -> CycleStatistics {
        self.last_report.statistics
    }

    /// Apply `f` to a cell between cycles and publish the resulting change.
    ///
    /// If `f` replaces the cell with one of another position or policy, the
    /// cell is restored and [`Error::IdentityChanged`] is returned.
    pub fn edit<F>(&mut self, row: usize, column: usize, f: F) -> Result<()>
    where
        F: FnOnce(&mut Cell) -> Result<()>,
    {
        let idx = self.index_of(row, column)?;
        let change = {
            let cell = &mut self.buffers.current_mut()[idx];
            let before = cell.clone();
            let result = f(&mut *cell);
            if !cell.same_identity(&before) {
                *cell = before;
                return Err(Error::IdentityChanged { row, column });
            }
            result?;
            CellChange::between(&before, cell)
        };
        if let Some(change) = change {
            self.events.emit(GridEvent::CellChanged {
                row,
                column,
                change,
            });
        }
        Ok(())
    }

    pub fn revive(&mut self, row: usize, column: usize) -> Result<()> {
        self.edit(row, column, Cell::revive)
    }

    pub fn kill(&mut self, row: usize, column: usize) -> Result<()> {
        self.edit(row, column, Cell::kill)
    }

    pub fn evolve(&mut self, row: usize, column: usize) -> Result<()> {
        self.edit(row, column, Cell::evolve)
    }

    /// Revive a non-alive cell or kill an alive one.
    pub fn toggle(&mut self, row: usize, column: usize) -> Result<()> {
        self.edit(row, column, |cell| {
            if cell.is_alive() {
                cell.kill()
            } else {
                cell.revive()
            }
        })
    }

    /// Rebuild fresh cells, zero the age and apply `init` again.
    /// Rules and the event sink are kept.
    pub fn reset(&mut self, init: Option<&dyn Rule>) {
        self.buffers.reset(
            self.rows,
            self.columns,
            self.config.state_model,
            self.config.transitions,
        );
        self.age = 0;
        self.seed(init);
    }

    fn seed(&mut self, init: Option<&dyn Rule>) {
        self.last_report = match init {
            Some(rule) => {
                let tally = self.step(&[rule]);
                tally.into_report(self.age)
            }
            None => CycleReport::default(),
        };
        log_faults(&self.last_report);
    }

    /// Advance one synchronous cycle with a frozen copy of the rule list.
    pub fn next_cycle(&mut self) -> &CycleReport {
        let rules = self.rules.clone();
        let tally = self.step(&rules);
        self.age += 1;
        self.last_report = tally.into_report(self.age);

        debug!("cycle {}: {}", self.age, self.last_report.statistics);
        log_faults(&self.last_report);
        if self.events.is_attached() {
            self.events
                .emit(GridEvent::CycleCompleted(self.last_report.clone()));
        }
        &self.last_report
    }

    /// Run `n` cycles.
    pub fn step_n(&mut self, n: u64) {
        for _ in 0..n {
            self.next_cycle();
        }
    }

    /// Compute the next generation into the back table and flip.
    fn step<'r, R>(&mut self, rules: &[R]) -> CycleTally
    where
        R: Deref<Target = dyn Rule + 'r> + Sync,
    {
        let mut next = self.buffers.take_next();
        let tally = self.evaluate(&mut next, rules);
        self.buffers.restore_next(next);
        self.buffers.flip();
        tally
    }

    fn evaluate<'r, R>(&self, next: &mut [Cell], rules: &[R]) -> CycleTally
    where
        R: Deref<Target = dyn Rule + 'r> + Sync,
    {
        let current = self.buffers.current();
        match &self.pool {
            Some(pool) => pool.install(|| {
                current
                    .par_iter()
                    .zip(next.par_iter_mut())
                    .with_min_len(PARALLEL_CHUNK_MIN)
                    .fold(CycleTally::default, |tally, (old, slot)| {
                        let (stats, fault) = self.advance_cell(old, slot, rules);
                        tally.record(stats, fault)
                    })
                    .reduce(CycleTally::default, CycleTally::merge)
            }),
            None => current
                .iter()
                .zip(next.iter_mut())
                .fold(CycleTally::default(), |tally, (old, slot)| {
                    let (stats, fault) = self.advance_cell(old, slot, rules);
                    tally.record(stats, fault)
                }),
        }
    }

    /// Seed `slot` from `old`, apply every matching rule in order and
    /// classify the transition. The first failing action ends this cell's
    /// rule pass. An action that replaces the cell instead of transitioning
    /// it also fails, and the slot falls back to `old`.
    #[inline]
    fn advance_cell<'r, R>(
        &self,
        old: &Cell,
        slot: &mut Cell,
        rules: &[R],
    ) -> (CycleStatistics, Option<RuleFault>)
    where
        R: Deref<Target = dyn Rule + 'r>,
    {
        slot.clone_from(old);
        let mut fault = None;
        for rule in rules {
            if !rule.matches(old, self) {
                continue;
            }
            let mut outcome = rule.apply(slot);
            if !slot.same_identity(old) {
                slot.clone_from(old);
                outcome = Err(Error::IdentityChanged {
                    row: old.row(),
                    column: old.column(),
                });
            }
            if let Err(error) = outcome {
                fault = Some(RuleFault {
                    row: old.row(),
                    column: old.column(),
                    rule: rule.name().to_owned(),
                    error,
                });
                break;
            }
        }
        (CycleStatistics::of_transition(old, slot), fault)
    }
}

fn log_faults(report: &CycleReport) {
    for fault in report.faults.iter().take(MAX_LOGGED_FAULTS) {
        warn!("{fault}");
    }
    if report.faults.len() > MAX_LOGGED_FAULTS {
        warn!(
            "{} more rule fault(s) at age {}",
            report.faults.len() - MAX_LOGGED_FAULTS,
            report.age
        );
    }
}

impl Index<(usize, usize)> for Grid {
    type Output = Cell;

    fn index(&self, (row, column): (usize, usize)) -> &Cell {
        match self.get(row, column) {
            Ok(cell) => cell,
            Err(err) => panic!("{err}"),
        }
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Grid with {} rows and {} columns",
            self.rows, self.columns
        )
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("rows", &self.rows)
            .field("columns", &self.columns)
            .field("age", &self.age)
            .field("wrap_edges", &self.wrap_edges)
            .field("rules", &self.rules)
            .field("threads", &self.threads())
            .finish_non_exhaustive()
    }
}
