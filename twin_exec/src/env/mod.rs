//! # Environment
//!
//! The environment is a rectangular grid of square tiles. Each tile holds a single [`EnvType`]
//! classification. Cells are addressed by integer `(x, y)` coordinates with `0 <= x < width` and
//! `0 <= y < height`. Tile `(x, y)` covers the square from `(x, y) * tile_size_m` to
//! `(x + 1, y + 1) * tile_size_m` in the world frame.
//!
//! Alongside the grid the environment holds the start cell, the goal cells, optional start and end
//! headings, the rover currently bound to it and a cached planned route.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod environment;
mod params;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt;

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use environment::*;
pub use params::*;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Integer coordinates of a single tile in the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Classification of a single tile.
///
/// Only `Obstacle` blocks navigation, every other type is traversable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvType {
    Empty,
    Obstacle,
    Explored,
    Start,
    Goal,
}

#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error("Cell ({x}, {y}) is outside of the environment")]
    OutOfBounds { x: i64, y: i64 },

    #[error("Environment dimensions must be non-zero, got {0}x{1}")]
    InvalidSize(usize, usize),

    #[error("Tile size must be positive and finite, got {0} m")]
    InvalidTileSize(f64),

    #[error("Could not access the map file: {0}")]
    IoError(std::io::Error),

    #[error("Could not (de)serialise the map file: {0}")]
    SerdeError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Cell {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Get the cell offset by the given amount, or `None` if the result would be negative.
    pub fn offset(&self, dx: i64, dy: i64) -> Option<Self> {
        let x = self.x as i64 + dx;
        let y = self.y as i64 + dy;

        if x < 0 || y < 0 {
            None
        } else {
            Some(Self::new(x as usize, y as usize))
        }
    }

    /// The cell as a floating point vector, in tiles.
    pub fn as_f64(&self) -> [f64; 2] {
        [self.x as f64, self.y as f64]
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Default for EnvType {
    fn default() -> Self {
        EnvType::Empty
    }
}

impl EnvType {
    pub fn is_obstacle(&self) -> bool {
        matches!(self, EnvType::Obstacle)
    }
}

impl From<std::io::Error> for EnvError {
    fn from(e: std::io::Error) -> Self {
        EnvError::IoError(e)
    }
}

impl From<serde_json::Error> for EnvError {
    fn from(e: serde_json::Error) -> Self {
        EnvError::SerdeError(e)
    }
}
