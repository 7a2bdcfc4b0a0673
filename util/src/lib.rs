//! Utility library for the rover digital twin

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod archive;
pub mod host;
pub mod logger;
pub mod maths;
pub mod params;
pub mod session;
pub mod time;

