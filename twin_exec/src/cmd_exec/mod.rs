//! # Command execution module
//!
//! Plays motion commands onto a rover in fixed length ticks.
//!
//! Commands are held in a [`CmdQueue`], a cloneable handle shared between producers and the
//! [`CmdExecutor`]. Each tick the executor activates the next pending command if the current one
//! has finished, applies the current command to the rover for one tick, and decrements its
//! remaining time. Moves and point turns are converted into wheel speed pairs when they are
//! activated, so that applying them every tick for their whole duration covers exactly the
//! requested distance or angle.
//!
//! For real time playback the executor can be run on its own thread with [`CmdExecThread`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod executor;
mod queue;
mod thread;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use executor::*;
pub use queue::*;
pub use thread::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CmdExecError {
    #[error("Tick period must be positive and finite, found {0} s")]
    InvalidTickPeriod(f64),

    #[error("Could not spawn the command execution thread: {0}")]
    ThreadSpawnError(std::io::Error),

    #[error("The command execution thread panicked")]
    ThreadPanicked,
}
