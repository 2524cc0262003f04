//! # GPS Operations
//!
//! Decodes satellite fix sentences and converts between geodetic coordinates and the local field
//! frame.
//!
//! The field frame is obtained by a Mercator projection of the fix, rotated to line up with the
//! field's edges, offset so that the field origin sits at `(0, 0)` and scaled so that the field's
//! far corner sits at `(length_x, length_y)`. All of the session specific values live in a
//! [`CalibrationFrame`], which can only be obtained by calibrating against two reference points.
//!
//! Nothing in this module performs I/O, logs or retries.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod calib;
mod sentence;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use calib::*;
pub use sentence::*;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur during GPS operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GpsOpsError {
    #[error("Malformed fix sentence: {0}")]
    MalformedSentence(String),

    #[error("The projection is singular at ({lat_deg}, {lon_deg})")]
    SingularProjection { lat_deg: f64, lon_deg: f64 },

    #[error("Degenerate calibration: {0}")]
    DegenerateCalibration(String),
}
