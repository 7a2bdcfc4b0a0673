//! Parameters structure for LocoCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::LocoCtrlError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Locomotion control.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Params {

    // ---- GEOMETRY ----

    /// Distance between the left and right wheels.
    ///
    /// Units: meters
    pub axle_distance_m: f64,

    // ---- CAPABILITIES ----

    /// Maximum linear speed of the rover, used to time straight moves.
    ///
    /// Units: meters/second
    pub max_speed_ms: f64,

    // ---- SIMULATION ----

    /// Length of a single simulation tick.
    ///
    /// Units: seconds
    pub tick_period_s: f64,

    /// Standard deviation of the error added to each wheel speed every tick. Zero disables
    /// noise.
    ///
    /// Units: meters/second
    pub motor_noise_std_ms: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            axle_distance_m: 0.102,
            max_speed_ms: 1.0,
            tick_period_s: 0.001,
            motor_noise_std_ms: 0.8806615716635956 / 50.01724137931034,
        }
    }
}

impl Params {
    /// Check the parameters describe a physical rover.
    pub fn validate(&self) -> Result<(), LocoCtrlError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;

        if !positive(self.axle_distance_m) {
            return Err(LocoCtrlError::InvalidParams(format!(
                "axle distance {} m",
                self.axle_distance_m
            )));
        }
        if !positive(self.max_speed_ms) {
            return Err(LocoCtrlError::InvalidParams(format!(
                "max speed {} m/s",
                self.max_speed_ms
            )));
        }
        if !positive(self.tick_period_s) {
            return Err(LocoCtrlError::InvalidParams(format!(
                "tick period {} s",
                self.tick_period_s
            )));
        }
        if !(self.motor_noise_std_ms.is_finite() && self.motor_noise_std_ms >= 0.0) {
            return Err(LocoCtrlError::InvalidNoise(self.motor_noise_std_ms));
        }

        Ok(())
    }
}
