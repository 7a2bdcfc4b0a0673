//! Shared command queue

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
};

use comms_if::cmd::Command;
use log::debug;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Handle to a queue of commands awaiting execution.
///
/// Clones refer to the same queue, so commands can be pushed or cancelled from any thread while an
/// executor is consuming them.
#[derive(Debug, Clone, Default)]
pub struct CmdQueue {
    state: Arc<Mutex<QueueState>>,
}

/// A command which has been activated by the executor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveCmd {
    pub cmd: Command,

    /// Time left to run, the command is finished once this is not positive.
    ///
    /// Units: seconds
    pub remaining_s: f64,

    /// Wheel speeds applied every tick, if the command drives the wheels.
    ///
    /// Units: meters/second
    pub wheel_speeds_ms: Option<(f64, f64)>,
}

#[derive(Debug, Default)]
pub(crate) struct QueueState {
    pub(crate) pending: VecDeque<Command>,
    pub(crate) current: Option<ActiveCmd>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CmdQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, cmd: Command) {
        self.lock().pending.push_back(cmd);
    }

    pub fn extend<I: IntoIterator<Item = Command>>(&self, cmds: I) {
        self.lock().pending.extend(cmds);
    }

    /// Cancel the current command and drop everything pending.
    pub fn clear(&self) {
        let mut state = self.lock();
        debug!(
            "Clearing command queue ({} pending)",
            state.pending.len()
        );
        state.pending.clear();
        state.current = None;
    }

    /// True when nothing is pending and no command is running.
    pub fn is_empty(&self) -> bool {
        let state = self.lock();
        state.pending.is_empty() && !state.current.map_or(false, |a| a.is_running())
    }

    pub fn num_pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// Get a copy of the running command, if there is one.
    pub fn current(&self) -> Option<ActiveCmd> {
        self.lock().current.filter(|a| a.is_running())
    }

    /// Lock the queue state.
    ///
    /// The state is plain data and can't be left inconsistent, so a poisoned lock is recovered.
    pub(crate) fn lock(&self) -> MutexGuard<'_, QueueState> {
        match self.state.lock() {
            Ok(g) => g,
            Err(e) => e.into_inner(),
        }
    }
}

impl ActiveCmd {
    pub fn is_running(&self) -> bool {
        self.remaining_s > 0.0
    }
}
