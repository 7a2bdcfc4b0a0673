//! Clearance aware line of sight between two cells

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use nalgebra::Vector2;

use crate::env::{Cell, Environment};

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Determine whether the band of the given width between the centres of two cells is free of
/// obstacles.
///
/// `num_rays` parallel rays are cast between the cells, evenly spread across the band
/// perpendicular to the line joining the cell centres. With a single ray only the centreline is
/// checked. Any sample falling outside the grid is treated as clear.
///
/// The result does not depend on the order of `a` and `b`.
///
/// Units: `width` in tiles
pub fn line_of_sight(
    env: &Environment,
    a: Cell,
    b: Cell,
    width: f64,
    num_rays: usize,
) -> bool {
    if a == b {
        return true;
    }

    // Always cast from the lower cell so the sampled cells are identical in both directions
    let (a, b) = if a <= b { (a, b) } else { (b, a) };

    let a_m = Vector2::new(a.x as f64 + 0.5, a.y as f64 + 0.5);
    let b_m = Vector2::new(b.x as f64 + 0.5, b.y as f64 + 0.5);

    let dir = (b_m - a_m).normalize();
    let perp = Vector2::new(dir.y, -dir.x);

    for offset in ray_offsets(width, num_rays) {
        let start = a_m + perp * offset;
        let end = b_m + perp * offset;

        for (x, y) in get_intersected_cells(start, end) {
            // Samples off the grid are not obstructions
            if let Ok(true) = env.is_obstacle(x, y) {
                trace!("LOS {} -> {} blocked at ({}, {})", a, b, x, y);
                return false;
            }
        }
    }

    true
}

/// Perpendicular offsets of each ray from the centreline.
fn ray_offsets(width: f64, num_rays: usize) -> Vec<f64> {
    if num_rays <= 1 {
        return vec![0.0];
    }

    let step = width / (num_rays - 1) as f64;

    (0..num_rays)
        .map(|i| -width / 2.0 + i as f64 * step)
        .collect()
}

/// Get the cells a segment passes through.
///
/// For every integer `x` in `[floor(min x), floor(max x))` the segment is sampled at that `x`, and
/// likewise for every integer `y`. The other coordinate of each sample is truncated towards zero.
/// Endpoint cells are not included, they are the segment's own cells.
pub fn get_intersected_cells(p1: Vector2<f64>, p2: Vector2<f64>) -> Vec<(i64, i64)> {
    let mut cells = Vec::new();

    let x_min = p1.x.min(p2.x).floor() as i64;
    let x_max = p1.x.max(p2.x).floor() as i64;
    for x in x_min..x_max {
        let y = (p2.y - p1.y) / (p2.x - p1.x) * (x as f64 - p1.x) + p1.y;
        cells.push((x, y as i64));
    }

    let y_min = p1.y.min(p2.y).floor() as i64;
    let y_max = p1.y.max(p2.y).floor() as i64;
    for y in y_min..y_max {
        let x = (p2.x - p1.x) / (p2.y - p1.y) * (y as f64 - p1.y) + p1.x;
        cells.push((x as i64, y));
    }

    cells
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
