//! # Drone Executable Parameters
//!
//! This module provides parameters for the drone executable, loaded from `drone_exec.toml`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::servo::ServoCodes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroneExecParams {
    /// Target period of one control cycle, also used as the kinematic time step.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Number of consecutive failed cycles allowed before the drone is made safe
    pub max_consec_failures: u64,

    /// Heading assumed before the first fix with a course is received.
    ///
    /// Units: degrees
    pub initial_heading_deg: f64,

    /// If true the course over ground from RMC fixes replaces the dead-reckoned heading
    pub use_fix_heading: bool,

    /// Prefix codes of the servo commands
    pub servo_codes: ServoCodes,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("The cycle period must be finite and positive, got {0} s")]
    InvalidCyclePeriod(f64),

    #[error("The initial heading must be in [0, 360] degrees, got {0}")]
    InvalidInitialHeading(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DroneExecParams {
    /// Check the values which cannot be expressed by the types alone.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !self.cycle_period_s.is_finite() || self.cycle_period_s <= 0.0 {
            return Err(ParamsError::InvalidCyclePeriod(self.cycle_period_s));
        }

        if !(0.0..=360.0).contains(&self.initial_heading_deg) {
            return Err(ParamsError::InvalidInitialHeading(self.initial_heading_deg));
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{gps_ops, loco_ctrl, sim::SimParams, turn_ctrl};
    use util::params::parse;

    #[test]
    fn test_shipped_params_parse() {
        let exec: DroneExecParams = parse(include_str!("../../params/drone_exec.toml")).unwrap();
        assert_eq!(exec.servo_codes.steering, "S");
        assert!(exec.validate().is_ok());

        let field: gps_ops::FieldParams = parse(include_str!("../../params/field.toml")).unwrap();
        assert!(gps_ops::CalibrationFrame::from_params(&field).is_ok());

        let tc: turn_ctrl::Params = parse(include_str!("../../params/turn_ctrl.toml")).unwrap();
        assert_eq!(tc.fine_tolerance_deg, turn_ctrl::Params::default().fine_tolerance_deg);

        let lc: loco_ctrl::Params = parse(include_str!("../../params/loco_ctrl.toml")).unwrap();
        assert!(lc.validate().is_ok());

        let sim: SimParams = parse(include_str!("../../params/sim.toml")).unwrap();
        assert_eq!(sim.sentence_kind, gps_ops::SentenceKind::Rmc);
    }

    #[test]
    fn test_validate() {
        let good: DroneExecParams = parse(include_str!("../../params/drone_exec.toml")).unwrap();

        for period in [-0.5, 0.0, std::f64::NAN, std::f64::INFINITY].iter() {
            let p = DroneExecParams {
                cycle_period_s: *period,
                ..good.clone()
            };
            assert!(matches!(
                p.validate(),
                Err(ParamsError::InvalidCyclePeriod(_))
            ));
        }

        for heading in [-1.0, 360.5, std::f64::NAN].iter() {
            let p = DroneExecParams {
                initial_heading_deg: *heading,
                ..good.clone()
            };
            assert!(matches!(
                p.validate(),
                Err(ParamsError::InvalidInitialHeading(_))
            ));
        }

        let edge = DroneExecParams {
            initial_heading_deg: 360.0,
            ..good
        };
        assert_eq!(edge.validate(), Ok(()));
    }
}
