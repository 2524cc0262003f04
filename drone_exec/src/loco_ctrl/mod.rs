//! Locomotion control module
//!
//! Maps turn and speed demands onto steering servo and ESC pulse lengths.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
mod state;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use params::*;
pub use state::*;

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// Possible errors that can occur during LocoCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum LocoCtrlError {
    #[error("Invalid LocoCtrl parameters: {0}")]
    InvalidParams(String),

    #[error("Recieved an invalid demand: {0}")]
    InvalidDemand(String),

    #[error("Could not set up LocoCtrl archives: {0}")]
    ArchiveError(#[from] util::archive::ArchiveError),
}
