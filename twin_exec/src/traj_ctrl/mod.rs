//! # Trajectory control module
//!
//! Trajectory control turns a planned route into the motion commands which drive the rover along
//! it. The rover follows a route as a sequence of point turns and straight moves: at each waypoint
//! it turns on the spot to face the next waypoint, then drives straight to it.
//!
//! When a waypoint is one of the environment's goals the rover turns a quarter turn to face the
//! rock, mines it, and turns back before continuing. Once the last waypoint is reached the rover
//! turns to the requested end heading, if there is one.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod translator;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::Params;
pub use translator::*;
