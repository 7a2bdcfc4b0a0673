//! # Motion commands
//!
//! A [`Command`] is the unit of work produced by trajectory control and consumed by the command
//! executor (and, through [`to_instructions`], by the hardware protocol translator). All fields
//! are semantic: distances in meters, angles in radians, durations in seconds.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// A single motion command.
///
/// Commands are immutable once issued, the executor tracks remaining time separately.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// What the command does.
    pub kind: CmdKind,

    /// How long the command runs for.
    ///
    /// Units: seconds
    pub duration_s: f64,
}

/// A single instruction as understood by the hardware protocol translator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    #[serde(rename = "type")]
    pub instr_type: InstructionType,

    /// Centimeters for `MOVE`, degrees (clockwise positive) for `ROTATE`, seconds for `MINE`.
    pub value: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The kinds of command the rover can execute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CmdKind {
    /// Drive forwards the given distance.
    Move {
        /// Units: meters
        distance_m: f64,
    },

    /// Turn on the spot by the given relative angle.
    ///
    /// Follows the right hand rule, positive angles rotate towards +ve y.
    Rotate {
        /// Units: radians
        angle_rad: f64,
    },

    /// Drive each wheel at the given linear speed for the command's duration.
    SetWheelSpeeds {
        /// Units: meters/second
        left_ms: f64,
        /// Units: meters/second
        right_ms: f64,
    },

    /// Teleport the rover to the given position.
    SetPosition {
        /// Units: meters
        x_m: f64,
        /// Units: meters
        y_m: f64,
    },

    /// Set the rover's heading directly.
    SetHeading {
        /// Units: radians
        heading_rad: f64,
    },

    /// Mine the rock in front of the rover.
    ///
    /// Has no kinematic effect, the mining mechanism is driven externally.
    Mine,
}

/// The instruction types of the hardware protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InstructionType {
    Move,
    Rotate,
    Mine,
}

#[derive(Debug, Error)]
pub enum CmdError {
    #[error("Command {0:?} has no equivalent hardware instruction")]
    NotExportable(CmdKind),

    #[error("Could not serialize the instructions: {0}")]
    SerializeError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Command {
    pub fn new(kind: CmdKind, duration_s: f64) -> Self {
        Self { kind, duration_s }
    }

    pub fn move_dist(distance_m: f64, duration_s: f64) -> Self {
        Self::new(CmdKind::Move { distance_m }, duration_s)
    }

    pub fn rotate(angle_rad: f64, duration_s: f64) -> Self {
        Self::new(CmdKind::Rotate { angle_rad }, duration_s)
    }

    pub fn wheel_speeds(left_ms: f64, right_ms: f64, duration_s: f64) -> Self {
        Self::new(CmdKind::SetWheelSpeeds { left_ms, right_ms }, duration_s)
    }

    /// Position and heading commands are instantaneous, so carry no duration.
    pub fn set_position(x_m: f64, y_m: f64) -> Self {
        Self::new(CmdKind::SetPosition { x_m, y_m }, 0.0)
    }

    pub fn set_heading(heading_rad: f64) -> Self {
        Self::new(CmdKind::SetHeading { heading_rad }, 0.0)
    }

    pub fn mine(duration_s: f64) -> Self {
        Self::new(CmdKind::Mine, duration_s)
    }

    pub fn is_move(&self) -> bool {
        matches!(self.kind, CmdKind::Move { .. })
    }

    pub fn is_rotate(&self) -> bool {
        matches!(self.kind, CmdKind::Rotate { .. })
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert a command list into hardware instructions.
///
/// The hardware measures distance in centimeters and turns clockwise-positive in degrees, so
/// rotations are negated. Simulation-only commands (wheel speeds, position, heading) cannot be
/// exported.
pub fn to_instructions(cmds: &[Command]) -> Result<Vec<Instruction>, CmdError> {
    cmds.iter()
        .map(|cmd| match cmd.kind {
            CmdKind::Move { distance_m } => Ok(Instruction {
                instr_type: InstructionType::Move,
                value: distance_m * 100.0,
            }),
            CmdKind::Rotate { angle_rad } => Ok(Instruction {
                instr_type: InstructionType::Rotate,
                value: -angle_rad.to_degrees(),
            }),
            CmdKind::Mine => Ok(Instruction {
                instr_type: InstructionType::Mine,
                value: cmd.duration_s,
            }),
            kind => Err(CmdError::NotExportable(kind)),
        })
        .collect()
}

/// Convert a command list into the JSON instruction list sent to the hardware translator.
pub fn to_instructions_json(cmds: &[Command]) -> Result<String, CmdError> {
    serde_json::to_string(&to_instructions(cmds)?).map_err(CmdError::SerializeError)
}
