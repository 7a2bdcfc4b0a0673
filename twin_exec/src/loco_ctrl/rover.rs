//! Kinematic state of a differential drive rover

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::f64::consts::TAU;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use util::maths::{angle_to_dir, rem_euclid};

use super::{point_turn_speeds, straight_speeds, LocoCtrlError, Params};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Position and heading of the rover in the environment frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RoverPose {
    /// Units: meters
    pub x_m: f64,

    /// Units: meters
    pub y_m: f64,

    /// Angle to the +ve x axis, positive towards +ve y. Kept in `[0, 2pi)` by the rover.
    ///
    /// Units: radians
    pub heading_rad: f64,
}

/// A simulated rover.
///
/// Each rover owns its noise source, so rovers seeded identically and driven identically end up
/// in identical poses.
#[derive(Debug, Clone)]
pub struct Rover {
    params: Params,

    pose: RoverPose,

    /// `None` when noise is disabled.
    noise: Option<Normal<f64>>,

    rng: ChaCha8Rng,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RoverPose {
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self {
            x_m,
            y_m,
            heading_rad,
        }
    }
}

impl Rover {
    /// Create a new rover at the given pose.
    ///
    /// The noise level is taken from `params`. If `seed` is `None` the noise source is seeded
    /// from system entropy.
    pub fn new(params: &Params, pose: RoverPose, seed: Option<u64>) -> Result<Self, LocoCtrlError> {
        params.validate()?;

        let rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };

        let mut rover = Self {
            params: *params,
            pose,
            noise: None,
            rng,
        };
        rover.set_noise_std(params.motor_noise_std_ms)?;

        Ok(rover)
    }

    /// Change the standard deviation of the per-wheel speed noise. Zero disables noise.
    ///
    /// Units: meters/second
    pub fn set_noise_std(&mut self, std_ms: f64) -> Result<(), LocoCtrlError> {
        if !(std_ms.is_finite() && std_ms >= 0.0) {
            return Err(LocoCtrlError::InvalidNoise(std_ms));
        }

        self.params.motor_noise_std_ms = std_ms;
        self.noise = if std_ms > 0.0 {
            Some(Normal::new(0.0, std_ms).map_err(|_| LocoCtrlError::InvalidNoise(std_ms))?)
        } else {
            None
        };

        Ok(())
    }

    pub fn noise_std_ms(&self) -> f64 {
        self.params.motor_noise_std_ms
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn pose(&self) -> RoverPose {
        self.pose
    }

    pub fn position_m(&self) -> (f64, f64) {
        (self.pose.x_m, self.pose.y_m)
    }

    pub fn heading_rad(&self) -> f64 {
        self.pose.heading_rad
    }

    /// Unit vector along the rover's heading.
    pub fn direction(&self) -> (f64, f64) {
        angle_to_dir(self.pose.heading_rad)
    }

    pub fn set_position(&mut self, x_m: f64, y_m: f64) {
        self.pose.x_m = x_m;
        self.pose.y_m = y_m;
    }

    pub fn set_heading(&mut self, heading_rad: f64) {
        self.pose.heading_rad = rem_euclid(heading_rad, TAU);
    }

    /// Drive the wheels at the given linear speeds for one tick.
    ///
    /// Units: meters/second
    pub fn motor_move(&mut self, left_ms: f64, right_ms: f64) {
        self.motor_move_for(left_ms, right_ms, self.params.tick_period_s);
    }

    /// Drive the wheels at the given linear speeds for `dt_s` seconds.
    pub fn motor_move_for(&mut self, left_ms: f64, right_ms: f64, dt_s: f64) {
        let (left_ms, right_ms) = match self.noise {
            Some(ref n) => (
                left_ms + n.sample(&mut self.rng),
                right_ms + n.sample(&mut self.rng),
            ),
            None => (left_ms, right_ms),
        };

        self.pose.heading_rad = rem_euclid(
            self.pose.heading_rad + dt_s * (left_ms - right_ms) / self.params.axle_distance_m,
            TAU,
        );

        let distance_m = (left_ms + right_ms) * dt_s;
        let (dir_x, dir_y) = angle_to_dir(self.pose.heading_rad);
        self.pose.x_m += distance_m * dir_x;
        self.pose.y_m += distance_m * dir_y;
    }

    /// Turn on the spot by `angle_rad` in a single tick.
    pub fn rotate(&mut self, angle_rad: f64) {
        let dt = self.params.tick_period_s;
        let (left, right) = point_turn_speeds(angle_rad, dt, self.params.axle_distance_m);
        self.motor_move_for(left, right, dt);
    }

    /// Drive `distance_m` forwards in a single tick.
    pub fn move_dist(&mut self, distance_m: f64) {
        let dt = self.params.tick_period_s;
        let (left, right) = straight_speeds(distance_m, dt);
        self.motor_move_for(left, right, dt);
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
