//! Main drone executable entry point.
//!
//! # Architecture
//!
//! The executable calibrates the field frame once and then runs one thread per drone. Each
//! thread owns a [`Drone`] and its collaborators and executes:
//!
//!     - Main loop:
//!         - Fix acquisition and conversion to the field frame
//!         - Position report and velocity request
//!         - Guidance
//!         - Turn control processing
//!         - Locomotion control processing
//!         - Servo command output
//!
//! The collaborators used here are the simulated ones from `drone_lib::sim`. Ctrl-C stops every
//! drone, which then sends neutral commands and `disconnect` before the executable exits.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use comms_if::eqpt::servo::Transport;
use log::{debug, info, warn};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};
use structopt::StructOpt;

// Internal
use drone_lib::{
    drone::{Drone, DroneConfig, RunEnd},
    gps_ops::{CalibrationFrame, FieldParams},
    guidance::FieldBounds,
    loco_ctrl,
    params::DroneExecParams,
    sim::{SimCoordService, SimFixSource, SimParams, SimTransport, SimVehicle},
    turn_ctrl,
};
use util::{
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "drone_exec", about = "Steers simulated drones towards their targets")]
struct Opt {
    /// Number of drones to run
    #[structopt(short, long, default_value = "1")]
    num_vehicles: u32,

    /// Stop after this many cycles, runs forever if not given
    #[structopt(short, long)]
    max_cycles: Option<u64>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    let session = Session::new("drone_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    info!("RC Drone Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI arguments: {:?}", opt);

    if opt.num_vehicles == 0 {
        return Err(eyre!("At least one vehicle must be run"));
    }

    // ---- LOAD PARAMETERS ----

    let exec_params: DroneExecParams =
        util::params::load("drone_exec.toml").wrap_err("Could not load exec params")?;
    let field_params: FieldParams =
        util::params::load("field.toml").wrap_err("Could not load field params")?;
    let turn_ctrl_params: turn_ctrl::Params =
        util::params::load("turn_ctrl.toml").wrap_err("Could not load TurnCtrl params")?;
    let loco_ctrl_params: loco_ctrl::Params =
        util::params::load("loco_ctrl.toml").wrap_err("Could not load LocoCtrl params")?;
    let sim_params: SimParams =
        util::params::load("sim.toml").wrap_err("Could not load sim params")?;

    exec_params
        .validate()
        .wrap_err("Invalid exec params")?;

    info!("Exec parameters loaded");

    // ---- CALIBRATION ----

    let frame =
        CalibrationFrame::from_params(&field_params).wrap_err("Failed to calibrate the field")?;
    let bounds = FieldBounds::from_params(&field_params);

    info!(
        "Field calibrated: offset {:?}, scale {:?}",
        frame.base_offset(),
        frame.scale()
    );

    // ---- START DRONES ----

    let stop = setup_stop_handler().wrap_err("Failed to set the Ctrl-C handler")?;

    let mut handles = Vec::new();

    for id in 0..opt.num_vehicles {
        let config = DroneConfig {
            id,
            frame,
            bounds,
            exec: exec_params.clone(),
            turn_ctrl: turn_ctrl_params,
            loco_ctrl: loco_ctrl_params,
        };
        let sim_params = sim_params.clone();
        let session = session.clone();
        let max_cycles = opt.max_cycles;
        let stop = stop.clone();

        let handle = thread::Builder::new()
            .name(format!("drone_{}", id))
            .spawn(move || run_drone(config, sim_params, session, max_cycles, stop))
            .wrap_err_with(|| format!("Failed to start the thread for drone {}", id))?;

        handles.push(handle);
    }

    info!("{} drone(s) started\n", handles.len());

    // ---- SHUTDOWN ----

    for handle in handles {
        match handle.join() {
            Ok(result) => result?,
            Err(_) => return Err(eyre!("A drone thread panicked")),
        }
    }

    info!("End of execution");

    Ok(())
}

/// Install a Ctrl-C handler which raises the returned flag, telling every drone to shut down.
fn setup_stop_handler() -> Result<Arc<AtomicBool>, ctrlc::Error> {
    let stop = Arc::new(AtomicBool::new(false));
    let s = stop.clone();

    ctrlc::set_handler(move || {
        s.store(true, Ordering::SeqCst);
    })?;

    Ok(stop)
}

/// Run a single drone until it is stopped, the cycle limit is reached or its transport
/// disconnects, then shut it down.
fn run_drone(
    config: DroneConfig,
    sim_params: SimParams,
    session: Session,
    max_cycles: Option<u64>,
    stop: Arc<AtomicBool>,
) -> Result<(), Report> {
    let id = config.id;
    let cycle_period = Duration::from_secs_f64(config.exec.cycle_period_s);

    let vehicle = SimVehicle::new(
        sim_params.start_position(id),
        sim_params.start_heading_deg,
        config.loco_ctrl,
        config.exec.cycle_period_s,
    )
    .shared();

    let fix_source = SimFixSource::new(vehicle.clone(), config.frame, &sim_params);
    let transport = SimTransport::new(id, vehicle, config.exec.servo_codes.clone());
    let coord = SimCoordService::new(&sim_params);

    let mut drone = Drone::new(config, fix_source, coord, transport, Some(&session))
        .wrap_err_with(|| format!("Failed to initialise drone {}", id))?;

    info!("Drone {} initialised", id);

    match drone.run(cycle_period, max_cycles, &stop) {
        RunEnd::Disconnected => warn!("Drone {} transport disconnected", id),
        RunEnd::Stopped | RunEnd::CycleLimit => (),
    }

    info!(
        "Drone {} travelled {:.2} field units in {} cycles",
        id,
        drone.data_store().total_distance_travelled,
        drone.data_store().num_cycles
    );

    if drone.transport().is_connected() {
        drone
            .shutdown()
            .wrap_err_with(|| format!("Failed to shut down drone {}", id))?;
    }

    Ok(())
}
