//! Implementations for the LocoCtrl state structure

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use comms_if::eqpt::servo::{ServoChannel, ServoCmd, ServoDems};
use log::{trace, warn};
use serde::Serialize;

// Internal
use super::{LocoCtrlError, Params};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    maths::{clamp, lin_map},
    module::State,
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Locomotion control module state
pub struct LocoCtrl {
    params: Params,

    report: StatusReport,
    arch_report: Archiver,

    output: ServoDems,
    arch_output: Archiver,
}

/// Input data to Locomotion Control.
#[derive(Clone, Copy, Default, Debug, Serialize)]
pub struct InputData {
    /// Turn angle demand, positive right.
    ///
    /// Units: degrees
    pub turning_angle_deg: f64,

    /// Units: field units/second
    pub speed: f64,
}

/// Status report for LocoCtrl processing.
#[derive(Clone, Copy, Default, Debug, Serialize, PartialEq)]
pub struct StatusReport {
    /// True if the steering pulse was clamped to its limits
    pub str_limited: bool,

    /// True if the ESC pulse was clamped to its limits
    pub esc_limited: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl LocoCtrl {
    /// Demands which centre the steering and stop the motor.
    pub fn neutral_dems(&self) -> ServoDems {
        ServoDems {
            steering: ServoCmd::new(
                ServoChannel::Steering,
                self.params.str_neutral_pulse_us.round() as i32,
            ),
            esc: ServoCmd::new(
                ServoChannel::Esc,
                self.params.esc_neutral_pulse_us.round() as i32,
            ),
        }
    }

    /// Bring the drone to a halt with the wheels straight, returning the demands to send.
    pub fn make_safe(&mut self) -> ServoDems {
        self.output = self.neutral_dems();
        self.report = StatusReport::default();
        self.output
    }

    /// The demands produced on the last cycle.
    pub fn output(&self) -> ServoDems {
        self.output
    }
}

impl State for LocoCtrl {
    type InitData = Params;
    type InitError = LocoCtrlError;

    type InputData = InputData;
    type OutputData = ServoDems;
    type StatusReport = StatusReport;
    type ProcError = LocoCtrlError;

    /// Initialise the LocoCtrl module.
    ///
    /// The output starts at the neutral demands.
    fn init(params: Self::InitData, session: Option<&Session>) -> Result<Self, Self::InitError> {
        params.validate()?;

        let (arch_report, arch_output) = match session {
            Some(s) => (
                Archiver::from_path(s, "loco_ctrl/status_report.csv")?,
                Archiver::from_path(s, "loco_ctrl/output.csv")?,
            ),
            None => (Archiver::default(), Archiver::default()),
        };

        let mut loco_ctrl = Self {
            params,
            report: StatusReport::default(),
            arch_report,
            output: ServoDems {
                steering: ServoCmd::new(ServoChannel::Steering, 0),
                esc: ServoCmd::new(ServoChannel::Esc, 0),
            },
            arch_output,
        };
        loco_ctrl.output = loco_ctrl.neutral_dems();

        Ok(loco_ctrl)
    }

    /// Perform cyclic processing of Locomotion Control.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        if !input_data.turning_angle_deg.is_finite() || !input_data.speed.is_finite() {
            return Err(LocoCtrlError::InvalidDemand(format!("{:?}", input_data)));
        }

        let p = &self.params;

        let str_pulse = lin_map(
            (0.0, p.max_turn_angle_deg),
            (p.str_neutral_pulse_us, p.str_full_right_pulse_us),
            input_data.turning_angle_deg,
        );
        let (str_pulse, str_limited) = clamp(str_pulse, p.str_min_pulse_us, p.str_max_pulse_us);

        let esc_pulse = lin_map(
            (0.0, p.max_speed),
            (p.esc_neutral_pulse_us, p.esc_full_pulse_us),
            input_data.speed,
        );
        let (esc_pulse, esc_limited) = clamp(esc_pulse, p.esc_min_pulse_us, p.esc_max_pulse_us);

        if str_limited || esc_limited {
            warn!(
                "LocoCtrl demand limited (steering: {}, ESC: {})",
                str_limited, esc_limited
            );
        }

        self.report = StatusReport {
            str_limited,
            esc_limited,
        };
        self.output = ServoDems {
            steering: ServoCmd::new(ServoChannel::Steering, str_pulse.round() as i32),
            esc: ServoCmd::new(ServoChannel::Esc, esc_pulse.round() as i32),
        };

        trace!(
            "LocoCtrl output: str {} us, esc {} us",
            self.output.steering.pulse_us,
            self.output.esc.pulse_us
        );

        Ok((self.output, self.report))
    }
}

impl Archived for LocoCtrl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        self.arch_report.serialise(self.report)?;
        self.arch_output.serialise(LocoCtrlRecord {
            str_pulse_us: self.output.steering.pulse_us,
            esc_pulse_us: self.output.esc.pulse_us,
        })?;

        Ok(())
    }
}

/// Flat record of the output for the CSV archive.
#[derive(Serialize)]
struct LocoCtrlRecord {
    str_pulse_us: i32,
    esc_pulse_us: i32,
}
