//! # Drone Control Loop
//!
//! A [`Drone`] owns everything needed to steer one vehicle: its collaborators (fix source,
//! coordination service and transport), its data store and its control modules. Each call to
//! [`Drone::cycle`] performs one pass of the control loop:
//!
//! 1. Request and poll a fix, parse it and convert it into the field frame.
//! 2. Report the position to the coordination service and fetch the demanded velocity.
//! 3. Compute the heading and speed demands (guidance).
//! 4. Step turn control.
//! 5. Map the turn and speed onto servo pulses (locomotion control).
//! 6. Send the steering and ESC commands.
//!
//! A failed cycle is skipped, leaving the vehicle on its previous commands. Too many consecutive
//! failures put the drone into safe mode, which stops the motor until a cycle succeeds again.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    coord::{CoordError, CoordService, PositionReport},
    eqpt::servo::{Transport, TransportError, DISCONNECT, GPS_REQUEST},
    gps::{FixSource, FixSourceError},
};
use log::{debug, error, info, warn};
use std::{
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::{Duration, Instant},
};
use util::{
    archive::{ArchiveError, Archived},
    module::State,
    session::Session,
};

use crate::{
    data_store::{DataStore, SafeModeCause},
    gps_ops::{parse_fix, CalibrationFrame, GpsOpsError},
    guidance::{self, FieldBounds},
    loco_ctrl::{self, LocoCtrl, LocoCtrlError},
    params::DroneExecParams,
    turn_ctrl::{self, TurnCtrl, TurnCtrlError, VehicleKinematicState},
};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Everything needed to set up a [`Drone`] apart from its collaborators.
#[derive(Debug, Clone)]
pub struct DroneConfig {
    pub id: u32,
    pub frame: CalibrationFrame,
    pub bounds: FieldBounds,
    pub exec: DroneExecParams,
    pub turn_ctrl: turn_ctrl::Params,
    pub loco_ctrl: loco_ctrl::Params,
}

/// A single steered vehicle.
pub struct Drone<F, C, T> {
    id: u32,
    frame: CalibrationFrame,
    bounds: FieldBounds,
    exec: DroneExecParams,

    fix_source: F,
    coord: C,
    transport: T,

    turn_ctrl: TurnCtrl,
    loco_ctrl: LocoCtrl,

    ds: DataStore,

    /// True while guidance is bringing the drone back into the field
    returning: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Why [`Drone::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    /// The stop flag was raised, usually by Ctrl-C
    Stopped,

    /// The requested number of cycles was run
    CycleLimit,

    /// The transport closed
    Disconnected,
}

#[derive(Debug, thiserror::Error)]
pub enum DroneError {
    #[error("Could not get a fix: {0}")]
    FixSource(#[from] FixSourceError),

    #[error("Could not use the fix: {0}")]
    GpsOps(#[from] GpsOpsError),

    #[error("Coordination service error: {0}")]
    Coord(#[from] CoordError),

    #[error("TurnCtrl error: {0}")]
    TurnCtrl(#[from] TurnCtrlError),

    #[error("LocoCtrl error: {0}")]
    LocoCtrl(#[from] LocoCtrlError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DroneError {
    /// The safe mode cause this error is reported under.
    pub fn safe_mode_cause(&self) -> SafeModeCause {
        match self {
            DroneError::FixSource(_) | DroneError::GpsOps(_) => SafeModeCause::FixUnavailable,
            DroneError::Coord(_) => SafeModeCause::CoordServiceUnavailable,
            DroneError::Transport(_) => SafeModeCause::TransportFailure,
            DroneError::TurnCtrl(_) | DroneError::LocoCtrl(_) | DroneError::Archive(_) => {
                SafeModeCause::ControlFailure
            }
        }
    }
}

impl<F, C, T> Drone<F, C, T>
where
    F: FixSource,
    C: CoordService,
    T: Transport,
{
    /// Create a new drone.
    ///
    /// If a session is given the control modules archive under `drone_{id}/` in it.
    pub fn new(
        config: DroneConfig,
        fix_source: F,
        coord: C,
        transport: T,
        session: Option<&Session>,
    ) -> Result<Self, DroneError> {
        let session = session.map(|s| s.with_arch_subdir(&format!("drone_{}", config.id)));

        let turn_ctrl = TurnCtrl::init(config.turn_ctrl, session.as_ref())?;
        let loco_ctrl = LocoCtrl::init(config.loco_ctrl, session.as_ref())?;

        Ok(Self {
            id: config.id,
            frame: config.frame,
            bounds: config.bounds,
            ds: DataStore::new(config.exec.initial_heading_deg),
            exec: config.exec,
            fix_source,
            coord,
            transport,
            turn_ctrl,
            loco_ctrl,
            returning: false,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn data_store(&self) -> &DataStore {
        &self.ds
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run one control cycle.
    ///
    /// Errors are returned after the failure counter and safe mode have been updated, so the
    /// caller only needs to report them.
    pub fn cycle(&mut self) -> Result<(), DroneError> {
        let result = self.try_cycle();

        match result {
            Ok(()) => {
                self.ds.num_consec_failures = 0;
                self.ds.make_unsafe();

                if let Err(e) = self.write_archives() {
                    warn!("[drone {}] Could not write archives: {}", self.id, e);
                }
            }
            Err(ref e) => {
                self.ds.num_consec_failures += 1;

                if self.ds.num_consec_failures > self.exec.max_consec_failures
                    && self.ds.make_safe(e.safe_mode_cause())
                {
                    error!(
                        "[drone {}] {} consecutive cycles failed, making safe",
                        self.id, self.ds.num_consec_failures
                    );

                    let dems = self.loco_ctrl.make_safe();
                    self.ds.loco_ctrl_output = Some(dems);
                    if let Err(e) = self.transport.send_dems(&dems, &self.exec.servo_codes) {
                        warn!("[drone {}] Could not send safe demands: {}", self.id, e);
                    }
                }
            }
        }

        self.ds.num_cycles += 1;

        result
    }

    /// Run cycles every `cycle_period` until `stop` is raised, `max_cycles` have run in total
    /// or the transport disconnects.
    ///
    /// Cycle errors are logged and do not end the run. The drone is not shut down on return.
    pub fn run(
        &mut self,
        cycle_period: Duration,
        max_cycles: Option<u64>,
        stop: &AtomicBool,
    ) -> RunEnd {
        loop {
            if stop.load(Ordering::SeqCst) {
                info!("[drone {}] Stop requested", self.id);
                return RunEnd::Stopped;
            }

            if let Some(max) = max_cycles {
                if self.ds.num_cycles >= max {
                    info!("[drone {}] Reached the cycle limit ({})", self.id, max);
                    return RunEnd::CycleLimit;
                }
            }

            let cycle_start_instant = Instant::now();

            if let Err(e) = self.cycle() {
                warn!("[drone {}] Cycle failed: {}", self.id, e);

                if !self.transport.is_connected() {
                    return RunEnd::Disconnected;
                }
            }

            if let (Some(pos), Some(state)) = (self.ds.position, self.ds.turn_ctrl_output) {
                debug!(
                    "[drone {}] at ({:.2}, {:.2}) heading {:.1}, turn {:+.0}, speed {:.2}, \
                     pacing {:.3} s",
                    self.id,
                    pos.x,
                    pos.y,
                    state.final_heading_deg,
                    state.turning_angle_deg,
                    state.speed,
                    self.ds.pacing_interval_s
                );
            }

            // ---- CYCLE MANAGEMENT ----

            let cycle_dur = Instant::now() - cycle_start_instant;

            match cycle_period.checked_sub(cycle_dur) {
                Some(d) => thread::sleep(d),
                None => warn!(
                    "[drone {}] Cycle overran by {:.06} s",
                    self.id,
                    cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
                ),
            }
        }
    }

    /// Stop the vehicle and tell it the controller is going away.
    pub fn shutdown(&mut self) -> Result<(), DroneError> {
        info!("[drone {}] Shutting down", self.id);

        let dems = self.loco_ctrl.make_safe();
        self.transport.send_dems(&dems, &self.exec.servo_codes)?;
        self.transport.send(DISCONNECT)?;

        Ok(())
    }

    fn try_cycle(&mut self) -> Result<(), DroneError> {
        self.ds.cycle_start();

        // ---- LOCALISATION ----

        self.transport.send(GPS_REQUEST)?;
        let sentence = self.fix_source.poll_fix()?;
        let fix = parse_fix(&sentence)?;
        let position = self.frame.geodetic_to_field(fix.lat_deg, fix.lon_deg)?;

        self.ds.fix = Some(fix);
        self.ds.position = Some(position);

        if self.exec.use_fix_heading && fix.has_heading() {
            if (0.0..=360.0).contains(&fix.heading_deg) {
                self.ds.heading_deg = fix.heading_deg;
            } else {
                warn!(
                    "[drone {}] Ignoring fix course of {} deg",
                    self.id, fix.heading_deg
                );
            }
        }

        // ---- COORDINATION ----

        self.coord.post_position(&PositionReport {
            xpos: position.x,
            ypos: position.y,
            id: self.id,
        })?;
        let demand = self.coord.get_velocity(self.id)?;
        self.ds.velocity_dem = Some(demand);

        // ---- GUIDANCE ----

        let dems = guidance::guide(&position, self.ds.heading_deg, &demand, &self.bounds);
        if dems.returning && !self.returning {
            warn!(
                "[drone {}] Outside the field at ({:.2}, {:.2}), returning to the centre",
                self.id, position.x, position.y
            );
        }
        self.returning = dems.returning;
        self.ds.guidance_dems = Some(dems);

        // ---- TURN CONTROL ----

        let (state, rpt) = self.turn_ctrl.proc(&VehicleKinematicState::new(
            self.ds.heading_deg,
            dems.desired_heading_deg,
            dems.speed,
            position.x,
            position.y,
            self.exec.cycle_period_s,
        ))?;

        self.ds.turn_ctrl_output = Some(state);
        self.ds.turn_ctrl_status_rpt = rpt;
        self.ds.heading_deg = state.final_heading_deg;
        self.ds.total_distance_travelled += state.distance_travelled;
        self.ds.pacing_interval_s =
            guidance::pacing_interval_s(state.distance_travelled, state.speed);

        // ---- LOCOMOTION CONTROL ----

        self.ds.loco_ctrl_input = loco_ctrl::InputData {
            turning_angle_deg: state.turning_angle_deg,
            speed: state.speed,
        };
        let (servo_dems, rpt) = self.loco_ctrl.proc(&self.ds.loco_ctrl_input)?;
        self.ds.loco_ctrl_status_rpt = rpt;

        self.transport
            .send_dems(&servo_dems, &self.exec.servo_codes)?;
        self.ds.loco_ctrl_output = Some(servo_dems);

        Ok(())
    }

    fn write_archives(&mut self) -> Result<(), ArchiveError> {
        self.turn_ctrl.write()?;
        self.loco_ctrl.write()
    }
}
