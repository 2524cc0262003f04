//! Cyclic module interface
//!
//! Turn control and locomotion control in `drone_exec` both implement [`State`], so a drone
//! can build them from their parameters and then drive them once per control cycle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::session::Session;

// ---------------------------------------------------------------------------
// MODULE STATE
// ---------------------------------------------------------------------------

/// A module which is constructed once and then processed every cycle.
///
/// Construction takes an optional [`Session`]. With a session the module archives its outputs
/// under the session's archive root, without one (unit tests, one-shot tools) it only computes.
pub trait State: Sized {
    /// Parameters used to build the module
    type InitData;
    /// Construction failure, usually an archive that could not be opened
    type InitError;

    /// Per-cycle input
    type InputData;
    /// Per-cycle output
    type OutputData;
    /// Flags describing how the output was produced (limits hit, tier chosen, ...)
    type StatusReport;
    /// Per-cycle failure
    type ProcError;

    /// Build the module from its parameters, opening archives in `session` if one is given.
    fn init(init_data: Self::InitData, session: Option<&Session>)
        -> Result<Self, Self::InitError>;

    /// Process one cycle's input, returning the output and its status report.
    ///
    /// A failed cycle must leave the module usable for the next one.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
