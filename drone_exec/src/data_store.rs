//! # Data Store

use comms_if::{coord::VelocityDemand, eqpt::servo::ServoDems};
use log::{info, warn};

use crate::{
    gps_ops::{FieldPosition, GeodeticFix},
    guidance::GuidanceDems,
    loco_ctrl,
    turn_ctrl::{self, VehicleKinematicState},
};

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Gives the reason the drone has been put into safe mode
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SafeModeCause {
    FixUnavailable,
    CoordServiceUnavailable,
    TransportFailure,
    ControlFailure,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Per-drone data store, owned by the drone's thread.
#[derive(Default, Debug)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u64,

    /// Session elapsed time at the start of the cycle
    pub elapsed_s: f64,

    // Safe mode variables
    /// Determines if the drone is in safe mode.
    pub safe: bool,

    /// Gives the reason for the drone being in safe mode.
    pub safe_cause: Option<SafeModeCause>,

    // Localisation
    pub fix: Option<GeodeticFix>,
    pub position: Option<FieldPosition>,

    /// Heading the drone is believed to be pointing in.
    ///
    /// Units: degrees
    pub heading_deg: f64,

    // Guidance
    pub velocity_dem: Option<VelocityDemand>,
    pub guidance_dems: Option<GuidanceDems>,

    // TurnCtrl
    pub turn_ctrl_output: Option<VehicleKinematicState>,
    pub turn_ctrl_status_rpt: turn_ctrl::StatusReport,

    // LocoCtrl
    pub loco_ctrl_input: loco_ctrl::InputData,
    pub loco_ctrl_output: Option<ServoDems>,
    pub loco_ctrl_status_rpt: loco_ctrl::StatusReport,

    /// Sum of the distance covered on every cycle.
    pub total_distance_travelled: f64,

    /// Time the last cycle's motion takes at its achieved speed.
    ///
    /// Units: seconds
    pub pacing_interval_s: f64,

    // Monitoring Counters
    /// Number of consecutive failed cycles
    pub num_consec_failures: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    pub fn new(initial_heading_deg: f64) -> Self {
        Self {
            heading_deg: initial_heading_deg,
            ..Default::default()
        }
    }

    /// Puts the drone into safe mode with the given cause.
    ///
    /// Returns true if the drone was not already safe.
    pub fn make_safe(&mut self, cause: SafeModeCause) -> bool {
        if self.safe {
            return false;
        }

        warn!("Make safe requested, cause: {:?}", cause);
        self.safe = true;
        self.safe_cause = Some(cause);

        true
    }

    /// Leave safe mode, returning the cause that was cleared.
    pub fn make_unsafe(&mut self) -> Option<SafeModeCause> {
        if !self.safe {
            return None;
        }

        self.safe = false;
        let cause = self.safe_cause.take();
        info!("Safe mode disabled, root cause {:?} cleared", cause);

        cause
    }

    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that are produced fresh on every cycle.
    pub fn cycle_start(&mut self) {
        self.fix = None;
        self.velocity_dem = None;
        self.guidance_dems = None;
        self.turn_ctrl_output = None;
        self.turn_ctrl_status_rpt = turn_ctrl::StatusReport::default();
        self.loco_ctrl_input = loco_ctrl::InputData::default();
        self.loco_ctrl_output = None;
        self.loco_ctrl_status_rpt = loco_ctrl::StatusReport::default();

        self.elapsed_s = util::session::get_elapsed_seconds();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_safe_mode() {
        let mut ds = DataStore::new(90.0);
        assert_eq!(ds.heading_deg, 90.0);
        assert_eq!(ds.make_unsafe(), None);

        assert!(ds.make_safe(SafeModeCause::TransportFailure));
        assert!(!ds.make_safe(SafeModeCause::FixUnavailable));
        assert_eq!(ds.safe_cause, Some(SafeModeCause::TransportFailure));

        assert_eq!(ds.make_unsafe(), Some(SafeModeCause::TransportFailure));
        assert!(!ds.safe);
    }
}
