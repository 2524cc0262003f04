//! # Coordination Service Interface
//!
//! After every fix the drone reports its field position to the coordination service and asks it
//! for the velocity it should be travelling at. Messages are JSON:
//!
//! - position report: `{"xpos": 12.5, "ypos": 3.0, "id": 1}`
//! - velocity demand: `{"xvel": 0.4, "yvel": -1.2}`

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A drone's position in the field frame, sent to the service.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PositionReport {
    /// Field X position
    pub xpos: f64,

    /// Field Y position
    pub ypos: f64,

    /// ID of the reporting drone
    pub id: u32,
}

/// Target velocity returned by the service, in field units per second.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct VelocityDemand {
    pub xvel: f64,
    pub yvel: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors raised while talking to the coordination service.
#[derive(thiserror::Error, Debug)]
pub enum CoordError {
    #[error("Could not (de)serialise a coordination message: {0}")]
    Serialisation(#[from] serde_json::Error),

    #[error("The coordination service is unavailable: {0}")]
    Unavailable(String),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Client interface to the coordination service.
pub trait CoordService {
    /// Report the drone's current field position.
    fn post_position(&mut self, report: &PositionReport) -> Result<(), CoordError>;

    /// Get the velocity the given drone should currently be travelling at.
    fn get_velocity(&mut self, id: u32) -> Result<VelocityDemand, CoordError>;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PositionReport {
    pub fn to_json(&self) -> Result<String, CoordError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl VelocityDemand {
    pub fn from_json(s: &str) -> Result<Self, CoordError> {
        Ok(serde_json::from_str(s)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_velocity_from_json() {
        let v = VelocityDemand::from_json(r#"{"xvel": 3.0, "yvel": -4.0}"#).unwrap();
        assert_eq!(v, VelocityDemand { xvel: 3.0, yvel: -4.0 });

        assert!(matches!(
            VelocityDemand::from_json(r#"{"xvel": 3.0}"#),
            Err(CoordError::Serialisation(_))
        ));
    }

    #[test]
    fn test_position_to_json() {
        let report = PositionReport {
            xpos: 1.5,
            ypos: 2.0,
            id: 3,
        };
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(value["xpos"], 1.5);
        assert_eq!(value["ypos"], 2.0);
        assert_eq!(value["id"], 3);
    }
}
