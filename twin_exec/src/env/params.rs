//! Parameters structure for the environment

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters of the environment.
///
/// These travel with the map file rather than living in the params directory, since the tile size
/// is a property of the surveyed arena.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnvParams {
    /// Side length of a single square tile.
    ///
    /// Units: meters
    pub tile_size_m: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for EnvParams {
    fn default() -> Self {
        Self { tile_size_m: 0.075 }
    }
}
