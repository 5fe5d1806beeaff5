//! Rebuild scheduling.
//!
//! [`RebuildCoordinator`] is a synchronous state machine. It never performs
//! I/O; the session feeds it changes and phase completions and carries out
//! the [`Action`] each call returns. At most one phase is in flight at a time
//! and any number of changes arriving during a cycle collapse into a single
//! rerun.

#[cfg(test)]
mod tests;

use std::{collections::BTreeSet, fmt, path::PathBuf};

use tracing::{debug, trace};

/// Observable coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// Nothing in flight
    Idle,
    /// Re-reading changed sources
    Extracting,
    /// Producing a new artifact
    Generating,
    /// A phase is in flight and another cycle is queued behind it
    PendingRerun,
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinatorState::Idle => write!(f, "idle"),
            CoordinatorState::Extracting => write!(f, "extracting"),
            CoordinatorState::Generating => write!(f, "generating"),
            CoordinatorState::PendingRerun => write!(f, "pending-rerun"),
        }
    }
}

/// A classified change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// A file matched by the source registry changed
    Source(PathBuf),
    /// A theme-defining input changed: the root stylesheet, a config file or a preset
    Theme(PathBuf),
}

/// Work for one extraction phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionWork {
    /// Source files to re-extract, sorted and de-duplicated
    pub paths: Vec<PathBuf>,
    /// Whether theme inputs must be reloaded before extracting
    pub reload_theme: bool,
}

/// What the session must do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Run an extraction phase, then report with [`RebuildCoordinator::on_extracted`]
    Extract(ExtractionWork),
    /// Run a generation, then report with [`RebuildCoordinator::on_generated`]
    Generate,
    /// The cycle is over; the latest artifact is current
    Settle,
    /// The change was queued behind the phase in flight
    Wait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Extracting,
    Generating,
}

#[derive(Debug, Default)]
struct Pending {
    paths: BTreeSet<PathBuf>,
    theme: bool,
}

impl Pending {
    fn is_empty(&self) -> bool {
        self.paths.is_empty() && !self.theme
    }
}

/// Serializes rebuilds and coalesces the changes that arrive meanwhile.
#[derive(Debug, Default)]
pub struct RebuildCoordinator {
    phase: Option<Phase>,
    rerun: bool,
    pending: Pending,
    theme_changed: bool,
    cycles: u64,
    generations: u64,
}

impl RebuildCoordinator {
    /// Creates an idle coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> CoordinatorState {
        match (self.phase, self.rerun) {
            (None, _) => CoordinatorState::Idle,
            (Some(_), true) => CoordinatorState::PendingRerun,
            (Some(Phase::Extracting), false) => CoordinatorState::Extracting,
            (Some(Phase::Generating), false) => CoordinatorState::Generating,
        }
    }

    /// Whether no phase is in flight.
    pub fn is_idle(&self) -> bool {
        self.phase.is_none()
    }

    /// Number of completed cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Number of generations started.
    pub fn generations(&self) -> u64 {
        self.generations
    }

    /// Records a change.
    ///
    /// Starts an extraction when idle; otherwise queues the change and flags
    /// a rerun, returning [`Action::Wait`].
    pub fn on_change(&mut self, change: Change) -> Action {
        trace!(?change, state = %self.state(), "Change received");
        match change {
            Change::Source(path) => {
                self.pending.paths.insert(path);
            }
            Change::Theme(_) => self.pending.theme = true,
        }

        if self.phase.is_some() {
            self.rerun = true;
            return Action::Wait;
        }
        self.begin_cycle()
    }

    /// Reports that the extraction phase finished.
    ///
    /// `candidates_changed` tells whether the merge grew the candidate set.
    /// Generation follows when it did or when a theme input changed in this
    /// cycle.
    pub fn on_extracted(&mut self, candidates_changed: bool) -> Action {
        if self.phase != Some(Phase::Extracting) {
            debug!(state = %self.state(), "Ignoring unexpected extraction report");
            return Action::Wait;
        }

        if candidates_changed || self.theme_changed {
            self.phase = Some(Phase::Generating);
            self.generations += 1;
            return Action::Generate;
        }
        self.finish_cycle()
    }

    /// Reports that the generation phase finished, successfully or not.
    pub fn on_generated(&mut self) -> Action {
        if self.phase != Some(Phase::Generating) {
            debug!(state = %self.state(), "Ignoring unexpected generation report");
            return Action::Wait;
        }
        self.finish_cycle()
    }

    fn begin_cycle(&mut self) -> Action {
        let pending = std::mem::take(&mut self.pending);
        self.rerun = false;
        self.theme_changed = pending.theme;
        self.phase = Some(Phase::Extracting);

        Action::Extract(ExtractionWork {
            paths: pending.paths.into_iter().collect(),
            reload_theme: pending.theme,
        })
    }

    fn finish_cycle(&mut self) -> Action {
        self.cycles += 1;
        self.theme_changed = false;

        if self.rerun || !self.pending.is_empty() {
            debug!(cycles = self.cycles, "Starting coalesced rerun");
            return self.begin_cycle();
        }

        self.phase = None;
        Action::Settle
    }
}
