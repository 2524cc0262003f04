//! # Drone library.
//!
//! This library allows the executables and benchmarks in this crate to access the drone's control
//! modules.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Per-drone data store
pub mod data_store;

/// Control loop - ties the collaborators and control modules of one drone together
pub mod drone;

/// GPS operations - fix sentence parsing and conversion to the field frame
pub mod gps_ops;

/// Guidance - converts velocity demands into heading and speed demands
pub mod guidance;

/// Locomotion control module - converts turn and speed demands into servo pulses
pub mod loco_ctrl;

/// Executable parameters
pub mod params;

/// Simulated collaborators for running without hardware
pub mod sim;

/// Turn control module - the stepped heading controller
pub mod turn_ctrl;
