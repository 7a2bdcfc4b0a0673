//! Trajectory control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for trajectory control
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Duration of every point turn command, regardless of angle.
    ///
    /// Units: seconds
    pub rotate_duration_s: f64,

    /// Duration of a mining command.
    ///
    /// Units: seconds
    pub mine_duration_s: f64,

    /// Angle turned through to face the rock before mining.
    ///
    /// Units: radians
    pub mine_rotation_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            rotate_duration_s: 0.2,
            mine_duration_s: 0.5,
            mine_rotation_rad: std::f64::consts::FRAC_PI_2,
        }
    }
}
