//! # Simulation module
//!
//! Validates a route clearance statistically before it is trusted on hardware.
//!
//! For a given clearance width a route is planned and translated once, then played many times on
//! rovers with noisy motors. A trial fails as soon as the rover's footprint touches an obstacle or
//! leaves the grid. The number of failures is compared to a critical value derived from a normal
//! approximation of the binomial distribution: if fewer trials failed than the critical value, the
//! hypothesis that the true failure probability is at least the tolerable probability is rejected
//! and the width is accepted. Otherwise the width is widened and the process repeated.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod hypothesis;
mod params;
mod robustness;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use hypothesis::*;
pub use params::Params;
pub use robustness::*;

use crate::loco_ctrl::LocoCtrlError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error(
        "No valid critical value for {num_trials} trials, failure probability {failure_prob} and \
        significance {significance}"
    )]
    InvalidCriticalValue {
        num_trials: usize,
        failure_prob: f64,
        significance: f64,
    },

    #[error("Invalid simulation parameters: {0}")]
    InvalidParams(String),

    #[error("Invalid rover: {0}")]
    LocoCtrlError(LocoCtrlError),
}
