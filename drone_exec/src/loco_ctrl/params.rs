//! Parameters structure for LocoCtrl

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use super::LocoCtrlError;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters for Locomotion control.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Params {
    // ---- STEERING ----
    /// Pulse length which points the front wheels straight ahead.
    ///
    /// Units: microseconds
    pub str_neutral_pulse_us: f64,

    /// Pulse length giving a turn of `max_turn_angle_deg` to the right. Left turns are mirrored
    /// about the neutral pulse.
    ///
    /// Units: microseconds
    pub str_full_right_pulse_us: f64,

    /// Largest turn angle the controller will demand.
    ///
    /// Units: degrees
    pub max_turn_angle_deg: f64,

    /// Units: microseconds
    pub str_min_pulse_us: f64,

    /// Units: microseconds
    pub str_max_pulse_us: f64,

    // ---- THROTTLE ----
    /// Pulse length at which the ESC holds the motor stopped.
    ///
    /// Units: microseconds
    pub esc_neutral_pulse_us: f64,

    /// Pulse length giving `max_speed`.
    ///
    /// Units: microseconds
    pub esc_full_pulse_us: f64,

    /// Units: field units/second
    pub max_speed: f64,

    /// Units: microseconds
    pub esc_min_pulse_us: f64,

    /// Units: microseconds
    pub esc_max_pulse_us: f64,
}

impl Params {
    /// Check the parameters describe usable maps.
    pub fn validate(&self) -> Result<(), LocoCtrlError> {
        if !(self.max_turn_angle_deg > 0.0) {
            return Err(LocoCtrlError::InvalidParams(format!(
                "max_turn_angle_deg must be positive, got {}",
                self.max_turn_angle_deg
            )));
        }
        if !(self.max_speed > 0.0) {
            return Err(LocoCtrlError::InvalidParams(format!(
                "max_speed must be positive, got {}",
                self.max_speed
            )));
        }
        if self.str_min_pulse_us > self.str_max_pulse_us
            || self.esc_min_pulse_us > self.esc_max_pulse_us
        {
            return Err(LocoCtrlError::InvalidParams(
                "pulse limits have min greater than max".into(),
            ));
        }

        Ok(())
    }
}
