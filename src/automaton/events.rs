//! Grid notifications delivered over a caller-supplied channel.

use std::sync::mpsc::Sender;

use log::debug;

use super::cell::Cell;
use super::stats::CycleReport;

/// What a manual edit did to a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellChange {
    Revived,
    Killed,
    /// Generation advanced by `by` while staying alive.
    Evolved { by: u64 },
}

impl CellChange {
    /// Derive the change between two snapshots of the same cell, if any.
    ///
    /// The lifetime counters catch round trips such as kill-then-revive that
    /// end in the starting state; the final state decides which one is
    /// reported.
    pub fn between(before: &Cell, after: &Cell) -> Option<Self> {
        let revived = after.times_revived() > before.times_revived();
        let killed = after.times_killed() > before.times_killed();
        match (before.is_alive(), after.is_alive()) {
            (was, true) if revived || !was => Some(CellChange::Revived),
            (was, false) if killed || was => Some(CellChange::Killed),
            (true, true) if after.generation() > before.generation() => {
                Some(CellChange::Evolved {
                    by: after.generation() - before.generation(),
                })
            }
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GridEvent {
    /// A cell was edited through the grid between cycles.
    CellChanged {
        row: usize,
        column: usize,
        change: CellChange,
    },
    /// `next_cycle` finished; carries the statistics and rule faults.
    CycleCompleted(CycleReport),
}

/// Optional sender end of the grid's event channel.
#[derive(Debug, Default)]
pub(crate) struct EventSink {
    sender: Option<Sender<GridEvent>>,
}

impl EventSink {
    #[inline]
    pub fn set(&mut self, sender: Option<Sender<GridEvent>>) {
        self.sender = sender;
    }

    #[inline]
    pub fn is_attached(&self) -> bool {
        self.sender.is_some()
    }

    /// Send an event; a disconnected receiver detaches the sink.
    pub fn emit(&mut self, event: GridEvent) {
        let Some(sender) = &self.sender else {
            return;
        };
        if sender.send(event).is_err() {
            debug!("grid event receiver dropped, detaching sink");
            self.sender = None;
        }
    }
}
