//! # Locomotion control module
//!
//! Differential drive kinematics of the rover. Each tick the two wheel linear speeds are turned
//! into a heading change and a forward distance:
//!
//! ```text
//! d_heading = dt * (v_left - v_right) / axle_distance
//! distance  = dt * (v_left + v_right)
//! ```
//!
//! The heading is updated first and the distance is then applied along the new heading.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod calc_wheel_speeds;
mod params;
mod rover;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use calc_wheel_speeds::*;
pub use params::*;
pub use rover::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during LocoCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum LocoCtrlError {
    #[error("Motor noise standard deviation must be non-negative and finite, got {0}")]
    InvalidNoise(f64),

    #[error("Invalid locomotion parameters: {0}")]
    InvalidParams(String),
}
