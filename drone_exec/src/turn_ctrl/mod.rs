//! # Turn Control
//!
//! Stepped heading controller. Given where the drone is pointing, where it should be pointing and
//! how fast it has been asked to go, pick one of a small set of turn tiers, slow down accordingly
//! and advance the drone's position by one time step.
//!
//! | Tier   | Heading error           | Turn angle | Speed coefficient |
//! |--------|-------------------------|------------|-------------------|
//! | Steady | `<= steady_tolerance`   | 0          | 1.00              |
//! | Fine   | `<= fine_tolerance`     | 5          | 0.75              |
//! | Coarse | `<= coarse_tolerance`   | 10         | 0.50              |
//! | Sharp  | otherwise               | 15         | 0.25              |
//!
//! Angles are in degrees, clockwise from north. Positive errors and turns are to the right.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod calc;
mod params;
mod state;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use calc::*;
pub use params::*;
pub use state::*;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur during TurnCtrl processing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TurnCtrlError {
    #[error("Invalid kinematic state: {0}")]
    InvalidKinematicState(String),
}
