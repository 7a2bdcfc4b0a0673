//! # Navigation
//!
//! Plans any-angle routes through the [`Environment`](crate::env::Environment) grid.
//!
//! Routes are found with a Theta* search, so consecutive waypoints can be any distance apart
//! provided the straight segment between them keeps a clearance band free of obstacles. The
//! clearance band is checked by casting a fan of parallel rays, see [`line_of_sight`].
//!
//! Routes through several goals are stitched together from single goal legs, always heading for
//! the nearest unvisited goal next.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod line_of_sight;
mod path_planner;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::env::Cell;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use line_of_sight::*;
pub use path_planner::*;

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// An ordered list of waypoint cells.
///
/// A non-empty route begins at the start cell and visits every goal. An empty route means no route
/// could be found.
pub type Route = Vec<Cell>;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("No path exists from {from} to {to}")]
    PathNotFound { from: Cell, to: Cell },

    #[error("Cannot plan: {0}")]
    DegenerateInput(String),
}
