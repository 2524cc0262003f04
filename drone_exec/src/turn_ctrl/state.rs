//! Implementations for the TurnCtrl state structure

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::{heading_error_deg, step, Params, Tier, TurnCtrlError, VehicleKinematicState};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    module::State,
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Turn control module state.
#[derive(Default)]
pub struct TurnCtrl {
    params: Params,

    output: Option<VehicleKinematicState>,
    arch_output: Archiver,

    report: StatusReport,
    arch_report: Archiver,
}

/// Status report for TurnCtrl processing.
#[derive(Clone, Copy, Default, Debug, Serialize)]
pub struct StatusReport {
    /// Tier chosen on this cycle
    pub tier: Tier,

    /// Normalised heading error at the start of the cycle.
    ///
    /// Units: degrees
    pub heading_error_deg: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl TurnCtrl {
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The state produced on the last successful cycle, if any.
    pub fn last_output(&self) -> Option<&VehicleKinematicState> {
        self.output.as_ref()
    }
}

impl State for TurnCtrl {
    type InitData = Params;
    type InitError = ArchiveError;

    type InputData = VehicleKinematicState;
    type OutputData = VehicleKinematicState;
    type StatusReport = StatusReport;
    type ProcError = TurnCtrlError;

    /// Initialise the TurnCtrl module.
    ///
    /// Archives are written under `turn_ctrl/` in the session when one is given.
    fn init(params: Self::InitData, session: Option<&Session>) -> Result<Self, Self::InitError> {
        let mut turn_ctrl = Self {
            params,
            ..Default::default()
        };

        if let Some(session) = session {
            turn_ctrl.arch_output = Archiver::from_path(session, "turn_ctrl/output.csv")?;
            turn_ctrl.arch_report = Archiver::from_path(session, "turn_ctrl/status_report.csv")?;
        }

        Ok(turn_ctrl)
    }

    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let output = step(*input_data, &self.params)?;

        let error = heading_error_deg(
            input_data.current_heading_deg,
            input_data.desired_heading_deg,
        );
        self.report = StatusReport {
            tier: Tier::classify(error, &self.params),
            heading_error_deg: error,
        };

        trace!(
            "TurnCtrl {:?}: heading {:.1} -> {:.1}, speed {:.3}",
            self.report.tier,
            output.current_heading_deg,
            output.final_heading_deg,
            output.speed
        );

        self.output = Some(output);

        Ok((output, self.report))
    }
}

impl Archived for TurnCtrl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        if let Some(output) = self.output {
            self.arch_output.serialise(output)?;
        }
        self.arch_report.serialise(self.report)?;

        Ok(())
    }
}
