//! Robustness simulation parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::SimError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the robustness simulation
#[derive(Deserialize, Debug, Clone)]
pub struct Params {

    // ---- HYPOTHESIS TEST ----

    /// Number of noisy trials run for each clearance width.
    pub num_trials: usize,

    /// Highest tolerable probability of a trial failing.
    pub max_failure_prob: f64,

    /// Significance level of the test.
    pub significance: f64,

    // ---- CLEARANCE SEARCH ----

    /// Clearance width of the first route tried.
    ///
    /// Units: meters
    pub min_clearance_width_m: f64,

    /// Amount the clearance is widened by after a rejected width.
    ///
    /// Units: meters
    pub width_increment_m: f64,

    /// Widest clearance tried before giving up.
    ///
    /// Units: meters
    pub max_clearance_width_m: f64,

    // ---- EXECUTION ----

    /// Number of threads trials are spread over.
    pub num_workers: usize,

    /// Base seed of the trial noise, trial `i` is seeded with `seed + i`.
    pub seed: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            num_trials: 100,
            max_failure_prob: 0.05,
            significance: 0.05,
            min_clearance_width_m: 0.102,
            width_increment_m: 0.01,
            max_clearance_width_m: 1.0,
            num_workers: 4,
            seed: 0,
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), SimError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;

        if !positive(self.min_clearance_width_m) {
            return Err(SimError::InvalidParams(format!(
                "minimum clearance width {} m",
                self.min_clearance_width_m
            )));
        }
        if !positive(self.width_increment_m) {
            return Err(SimError::InvalidParams(format!(
                "clearance width increment {} m",
                self.width_increment_m
            )));
        }
        if !(self.max_clearance_width_m.is_finite()
            && self.max_clearance_width_m >= self.min_clearance_width_m)
        {
            return Err(SimError::InvalidParams(format!(
                "maximum clearance width {} m is below the minimum",
                self.max_clearance_width_m
            )));
        }

        Ok(())
    }
}
