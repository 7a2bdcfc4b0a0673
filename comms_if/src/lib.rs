//! # Communications interface crate.
//!
//! Provides the common interfaces between the rover twin and its external
//! collaborators (hardware protocol translation, visualisation, drivers).

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Motion command definitions and the instruction export format
pub mod cmd;
