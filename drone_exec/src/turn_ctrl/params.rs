//! Parameters structure for TurnCtrl

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters for turn control.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Params {
    /// Largest heading error handled by the fine tier.
    ///
    /// Units: degrees
    pub fine_tolerance_deg: f64,

    /// Largest heading error handled by the coarse tier.
    ///
    /// Units: degrees
    pub coarse_tolerance_deg: f64,

    /// Heading errors up to this size are treated as being on course.
    ///
    /// Units: degrees
    pub steady_tolerance_deg: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            fine_tolerance_deg: 5.0,
            coarse_tolerance_deg: 45.0,
            steady_tolerance_deg: 0.1,
        }
    }
}
