//! # Rover twin library.
//!
//! The planning, kinematics, execution and validation core of the rover digital twin. Data flows
//! in one direction:
//!
//! ```text
//! env -> nav -> traj_ctrl -> cmd_exec -> loco_ctrl
//! ```
//!
//! with [`sim`] driving the whole pipeline repeatedly under motor noise to find a safe route
//! clearance.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Environment module - the tile grid the rover operates in, with start, goals and route cache
pub mod env;

/// Navigation module - any-angle path planning with clearance aware line of sight
pub mod nav;

/// Locomotion control module - differential drive kinematics of the rover
pub mod loco_ctrl;

/// Trajectory control module - converts routes into motion commands
pub mod traj_ctrl;

/// Command execution module - plays commands onto a rover in fixed ticks
pub mod cmd_exec;

/// Simulation module - statistical validation of route clearance under motor noise
pub mod sim;
