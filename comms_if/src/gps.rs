//! # GPS Fix Source Interface

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors raised by a [`FixSource`].
#[derive(thiserror::Error, Debug)]
pub enum FixSourceError {
    #[error("No fix sentence is available yet")]
    NoFix,

    #[error("The fix source is disconnected: {0}")]
    Disconnected(String),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Supplies raw fix sentences (GGA or RMC) from a vehicle's GPS receiver.
pub trait FixSource {
    /// Return the most recent fix sentence.
    fn poll_fix(&mut self) -> Result<String, FixSourceError>;
}
