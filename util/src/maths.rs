//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Vector components smaller than this are snapped to zero when converting an
/// angle to a direction vector.
pub const DIR_COMPONENT_EPSILON: f64 = 1e-10;

/// Signed angles with a magnitude at or below this are snapped to zero.
pub const ANGLE_EPSILON_RAD: f64 = 1e-5;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Return the euclidian norm (distance between) of two points.
///
/// If the points do not have the same number of dimentions then `None` is 
/// returned.
pub fn norm<T>(point_0: &[T], point_1: &[T]) -> Option<T> 
where
    T: Float + std::ops::AddAssign
{
    // Check that the dimentions match
    if point_0.len() != point_1.len() {
        return None;
    }

    let mut sum = T::zero();

    for (a, b) in point_0.iter().zip(point_1.iter()) {
        sum += (*a - *b).powi(2);
    }

    Some(sum.sqrt())
}

/// Convert an angle (to the +ve x axis) into a unit direction vector `(x, y)`.
///
/// Components with a magnitude below [`DIR_COMPONENT_EPSILON`] are set to
/// exactly zero.
pub fn angle_to_dir<T>(angle: T) -> (T, T)
where
    T: Float
{
    let eps = T::from(DIR_COMPONENT_EPSILON).unwrap_or_else(T::epsilon);

    let mut x = angle.cos();
    let mut y = angle.sin();

    if x.abs() < eps {
        x = T::zero();
    }
    if y.abs() < eps {
        y = T::zero();
    }

    (x, y)
}

/// Get the signed angle between two direction vectors.
///
/// The result is `-atan2(cross, dot)`, so rotating `vector_1` by the negation
/// of the result aligns it with `vector_2`. Magnitudes at or below
/// [`ANGLE_EPSILON_RAD`] are returned as exactly zero.
pub fn signed_angle_between<T>(vector_1: (T, T), vector_2: (T, T)) -> T
where
    T: Float
{
    let cross = vector_1.0 * vector_2.1 - vector_1.1 * vector_2.0;
    let dot = vector_1.0 * vector_2.0 + vector_1.1 * vector_2.1;

    let theta = -cross.atan2(dot);

    let eps = T::from(ANGLE_EPSILON_RAD).unwrap_or_else(T::epsilon);
    if theta.abs() <= eps {
        T::zero()
    }
    else {
        theta
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
/// 
/// This function is taken from the std library as num is missing it.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Get the signed angular distance between two angles in the range of [0, 2pi].
///
/// This function will return the shortest signed distance between a and b accounting for wrapping
/// between 0 and 2pi.
pub fn get_ang_dist_2pi<T>(a: T, b: T) -> T
where
    T: Float
{
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap_or_else(T::max_value);
    
    let c = rem_euclid(a - b, tau_t);
    let d = rem_euclid(b - a, tau_t);

    if c < d {
        -c
    }
    else {
        d
    }
}
