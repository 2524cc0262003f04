//! # Communications interface crate.
//!
//! Provides the interfaces between a drone's control loop and its external collaborators:
//! - the GPS fix source on the vehicle,
//! - the transport carrying servo commands to the vehicle,
//! - the coordination service which hands out target velocities.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Coordination service messages and client interface
pub mod coord;

/// Command definitions for equipment on the vehicle (steering servo and ESC)
pub mod eqpt;

/// GPS fix source interface
pub mod gps;
