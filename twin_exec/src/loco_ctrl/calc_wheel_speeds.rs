//! Wheel speed pairs realising point turns and straight moves

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the `(left, right)` wheel speeds turning the rover on the spot by `angle_rad` over
/// `time_s`.
///
/// Units: meters/second
pub fn point_turn_speeds(angle_rad: f64, time_s: f64, axle_distance_m: f64) -> (f64, f64) {
    let speed = angle_rad * axle_distance_m / (2.0 * time_s);
    (speed, -speed)
}

/// Get the `(left, right)` wheel speeds driving the rover `distance_m` forwards over `time_s`.
///
/// Units: meters/second
pub fn straight_speeds(distance_m: f64, time_s: f64) -> (f64, f64) {
    let speed = distance_m / (2.0 * time_s);
    (speed, speed)
}
