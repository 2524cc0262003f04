//! # Simulation Collaborators
//!
//! Stand-ins for the drone hardware and the coordination service so the control loop can be run
//! without either. A [`SimVehicle`] holds the true state of one simulated drone. Its
//! [`SimTransport`] decodes the servo commands it is sent and drives the vehicle with the same
//! constant speed kinematics used by turn control, and its [`SimFixSource`] reports the vehicle's
//! position as fix sentences, optionally with noise.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use comms_if::{
    coord::{CoordError, CoordService, PositionReport, VelocityDemand},
    eqpt::servo::{
        ServoChannel, ServoCmd, ServoCodes, Transport, TransportError, DISCONNECT, GPS_REQUEST,
    },
    gps::{FixSource, FixSourceError},
};
use chrono::{Timelike, Utc};
use log::{debug, trace};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::Deserialize;
use util::maths::lin_map;

use crate::{
    gps_ops::{format_fix, CalibrationFrame, FieldPosition, SentenceKind},
    loco_ctrl,
    turn_ctrl::wrap_heading,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of sent messages kept by a [`SimTransport`].
const SENT_HISTORY_LEN: usize = 64;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Simulation parameters, loaded from `sim.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct SimParams {
    /// Layout of the fix sentences produced
    pub sentence_kind: SentenceKind,

    /// Half width of the uniform noise added to latitude and longitude. Zero disables noise.
    ///
    /// Units: degrees
    pub noise_deg: f64,

    /// Seed for the noise generator, zero seeds from entropy
    pub seed: u64,

    /// Start position of the first drone
    pub start: FieldPosition,

    /// X spacing between the start positions of consecutive drones
    pub start_spacing_x: f64,

    /// Units: degrees
    pub start_heading_deg: f64,

    /// Point the coordination service sends every drone to
    pub target: FieldPosition,

    /// Units: field units/second
    pub max_speed: f64,

    /// Drones closer than this to the target are told to stop
    pub arrival_radius: f64,
}

/// True state of a simulated drone.
#[derive(Debug, Clone)]
pub struct SimVehicle {
    pub position: FieldPosition,

    /// Units: degrees
    pub heading_deg: f64,

    /// Units: field units/second
    pub speed: f64,

    /// Last steering pulse received, applied when the next ESC pulse arrives.
    str_pulse_us: Option<i32>,

    loco_params: loco_ctrl::Params,

    /// Units: seconds
    time_step_s: f64,
}

/// A [`FixSource`] reporting a [`SimVehicle`]'s position.
pub struct SimFixSource {
    vehicle: Arc<Mutex<SimVehicle>>,
    frame: CalibrationFrame,
    kind: SentenceKind,
    noise_deg: f64,
    rng: SmallRng,
}

/// A [`Transport`] driving a [`SimVehicle`].
pub struct SimTransport {
    id: u32,
    vehicle: Arc<Mutex<SimVehicle>>,
    codes: ServoCodes,
    connected: bool,
    sent: VecDeque<String>,
}

/// A [`CoordService`] sending every drone towards a single target.
pub struct SimCoordService {
    target: FieldPosition,
    max_speed: f64,
    arrival_radius: f64,
    positions: HashMap<u32, FieldPosition>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimParams {
    /// Start position of the drone with the given ID.
    pub fn start_position(&self, id: u32) -> FieldPosition {
        FieldPosition::new(
            self.start.x + id as f64 * self.start_spacing_x,
            self.start.y,
        )
    }
}

impl SimVehicle {
    pub fn new(
        position: FieldPosition,
        heading_deg: f64,
        loco_params: loco_ctrl::Params,
        time_step_s: f64,
    ) -> Self {
        Self {
            position,
            heading_deg,
            speed: 0.0,
            str_pulse_us: None,
            loco_params,
            time_step_s,
        }
    }

    /// Wrap the vehicle for sharing between its fix source and transport.
    pub fn shared(self) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(self))
    }

    /// Apply a servo command. The vehicle moves once per ESC command, using the most recent
    /// steering command.
    fn apply(&mut self, cmd: ServoCmd) {
        match cmd.channel {
            ServoChannel::Steering => self.str_pulse_us = Some(cmd.pulse_us),
            ServoChannel::Esc => {
                let p = &self.loco_params;

                let turn_deg = match self.str_pulse_us.take() {
                    Some(s) => lin_map(
                        (p.str_neutral_pulse_us, p.str_full_right_pulse_us),
                        (0.0, p.max_turn_angle_deg),
                        s as f64,
                    ),
                    None => 0.0,
                };
                let speed = lin_map(
                    (p.esc_neutral_pulse_us, p.esc_full_pulse_us),
                    (0.0, p.max_speed),
                    cmd.pulse_us as f64,
                )
                .max(0.0);

                self.heading_deg = wrap_heading(self.heading_deg + turn_deg);
                self.speed = speed;

                let (sin, cos) = self.heading_deg.to_radians().sin_cos();
                self.position.x += self.time_step_s * speed * sin;
                self.position.y += self.time_step_s * speed * cos;
            }
        }
    }
}

impl SimFixSource {
    pub fn new(
        vehicle: Arc<Mutex<SimVehicle>>,
        frame: CalibrationFrame,
        params: &SimParams,
    ) -> Self {
        let rng = if params.seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(params.seed)
        };

        Self {
            vehicle,
            frame,
            kind: params.sentence_kind,
            noise_deg: params.noise_deg,
            rng,
        }
    }

    fn noise(&mut self) -> f64 {
        if self.noise_deg > 0.0 {
            self.rng.gen_range(-self.noise_deg..=self.noise_deg)
        } else {
            0.0
        }
    }
}

impl FixSource for SimFixSource {
    fn poll_fix(&mut self) -> Result<String, FixSourceError> {
        let (position, heading_deg) = {
            let v = self
                .vehicle
                .lock()
                .map_err(|_| FixSourceError::Disconnected("vehicle state poisoned".into()))?;
            (v.position, v.heading_deg)
        };

        let (lat, lon) = self.frame.field_to_geodetic(&position);
        let lat = lat + self.noise();
        let lon = lon + self.noise();

        let now = Utc::now();
        let time_of_day_s =
            now.num_seconds_from_midnight() as f64 + now.nanosecond() as f64 * 1e-9;

        Ok(format_fix(self.kind, lat, lon, Some(heading_deg), time_of_day_s))
    }
}

impl SimTransport {
    pub fn new(id: u32, vehicle: Arc<Mutex<SimVehicle>>, codes: ServoCodes) -> Self {
        Self {
            id,
            vehicle,
            codes,
            connected: true,
            sent: VecDeque::with_capacity(SENT_HISTORY_LEN),
        }
    }

    /// Most recently sent messages, oldest first.
    pub fn sent(&self) -> impl Iterator<Item = &String> {
        self.sent.iter()
    }
}

impl Transport for SimTransport {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn send(&mut self, msg: &str) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }

        debug!("[drone {}] <- {}", self.id, msg);

        if self.sent.len() == SENT_HISTORY_LEN {
            self.sent.pop_front();
        }
        self.sent.push_back(msg.to_string());

        match msg {
            GPS_REQUEST => Ok(()),
            DISCONNECT => {
                self.connected = false;
                Ok(())
            }
            _ => {
                let cmd = ServoCmd::decode(msg, &self.codes)?;
                self.vehicle
                    .lock()
                    .map_err(|_| {
                        TransportError::SendFailed(msg.to_string(), "vehicle state poisoned".into())
                    })?
                    .apply(cmd);
                Ok(())
            }
        }
    }
}

impl SimCoordService {
    pub fn new(params: &SimParams) -> Self {
        Self {
            target: params.target,
            max_speed: params.max_speed,
            arrival_radius: params.arrival_radius,
            positions: HashMap::new(),
        }
    }
}

impl CoordService for SimCoordService {
    fn post_position(&mut self, report: &PositionReport) -> Result<(), CoordError> {
        // Go through the wire format so malformed reports are caught here too
        let json = report.to_json()?;
        trace!("Coord <- {}", json);

        let report: PositionReport = serde_json::from_str(&json)?;
        self.positions
            .insert(report.id, FieldPosition::new(report.xpos, report.ypos));

        Ok(())
    }

    fn get_velocity(&mut self, id: u32) -> Result<VelocityDemand, CoordError> {
        let position = self.positions.get(&id).ok_or_else(|| {
            CoordError::Unavailable(format!("no position has been reported by drone {}", id))
        })?;

        let dx = self.target.x - position.x;
        let dy = self.target.y - position.y;
        let dist = dx.hypot(dy);

        let demand = if dist <= self.arrival_radius {
            VelocityDemand::default()
        } else {
            let speed = self.max_speed.min(dist);
            VelocityDemand {
                xvel: dx / dist * speed,
                yvel: dy / dist * speed,
            }
        };

        let json = serde_json::to_string(&demand)?;
        trace!("Coord -> {}", json);

        VelocityDemand::from_json(&json)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::gps_ops::parse_fix;

    fn loco_params() -> loco_ctrl::Params {
        loco_ctrl::Params {
            str_neutral_pulse_us: 1500.0,
            str_full_right_pulse_us: 1800.0,
            max_turn_angle_deg: 15.0,
            str_min_pulse_us: 1200.0,
            str_max_pulse_us: 1800.0,
            esc_neutral_pulse_us: 1500.0,
            esc_full_pulse_us: 1700.0,
            max_speed: 4.0,
            esc_min_pulse_us: 1500.0,
            esc_max_pulse_us: 1700.0,
        }
    }

    fn sim_params(noise_deg: f64) -> SimParams {
        SimParams {
            sentence_kind: SentenceKind::Gga,
            noise_deg,
            seed: 42,
            start: FieldPosition::new(10.0, 10.0),
            start_spacing_x: 5.0,
            start_heading_deg: 0.0,
            target: FieldPosition::new(10.0, 30.0),
            max_speed: 2.0,
            arrival_radius: 1.0,
        }
    }

    fn frame() -> CalibrationFrame {
        CalibrationFrame::calibrate(29.1899, -81.0465, 29.1904, -81.0459, 60.0, 40.0, 0.0)
            .unwrap()
    }

    fn codes() -> ServoCodes {
        ServoCodes {
            steering: "S".into(),
            esc: "E".into(),
        }
    }

    #[test]
    fn test_start_position() {
        let p = sim_params(0.0);
        assert_eq!(p.start_position(0), FieldPosition::new(10.0, 10.0));
        assert_eq!(p.start_position(2), FieldPosition::new(20.0, 10.0));
    }

    #[test]
    fn test_transport_drives_vehicle() {
        let vehicle = SimVehicle::new(FieldPosition::new(0.0, 0.0), 0.0, loco_params(), 1.0).shared();
        let mut t = SimTransport::new(0, vehicle.clone(), codes());

        // 5 deg right at 2 units/s
        t.send("S1600").unwrap();
        t.send("E1600").unwrap();

        {
            let v = vehicle.lock().unwrap();
            assert!((v.heading_deg - 5.0).abs() < 1e-9);
            assert!((v.speed - 2.0).abs() < 1e-9);
            assert!((v.position.x - 2.0 * 5f64.to_radians().sin()).abs() < 1e-9);
            assert!((v.position.y - 2.0 * 5f64.to_radians().cos()).abs() < 1e-9);
        }

        assert!(matches!(
            t.send("X1500"),
            Err(TransportError::MalformedCommand(_))
        ));

        t.send(GPS_REQUEST).unwrap();
        t.send(DISCONNECT).unwrap();
        assert!(!t.is_connected());
        assert!(matches!(t.send("E1500"), Err(TransportError::NotConnected)));

        assert_eq!(t.sent().count(), 5);
    }

    #[test]
    fn test_fix_source_reports_truth() {
        let vehicle =
            SimVehicle::new(FieldPosition::new(30.0, 20.0), 0.0, loco_params(), 1.0).shared();
        let mut fs = SimFixSource::new(vehicle, frame(), &sim_params(0.0));

        let fix = parse_fix(&fs.poll_fix().unwrap()).unwrap();
        let p = frame().geodetic_to_field(fix.lat_deg, fix.lon_deg).unwrap();

        // Sentences carry 1e-4 minute resolution
        assert!((p.x - 30.0).abs() < 0.5, "x = {}", p.x);
        assert!((p.y - 20.0).abs() < 0.5, "y = {}", p.y);
    }

    #[test]
    fn test_fix_source_noise() {
        let vehicle =
            SimVehicle::new(FieldPosition::new(30.0, 20.0), 0.0, loco_params(), 1.0).shared();
        let (lat, lon) = frame().field_to_geodetic(&FieldPosition::new(30.0, 20.0));
        let mut fs = SimFixSource::new(vehicle, frame(), &sim_params(1e-4));

        let mut moved = false;
        for _ in 0..10 {
            let fix = parse_fix(&fs.poll_fix().unwrap()).unwrap();

            assert!((fix.lat_deg - lat).abs() < 1e-4 + 1e-5);
            assert!((fix.lon_deg - lon).abs() < 1e-4 + 1e-5);
            moved |= (fix.lat_deg - lat).abs() > 1e-5;
        }

        assert!(moved);
    }

    #[test]
    fn test_coord_service() {
        let mut c = SimCoordService::new(&sim_params(0.0));

        assert!(matches!(
            c.get_velocity(3),
            Err(CoordError::Unavailable(_))
        ));

        c.post_position(&PositionReport {
            xpos: 10.0,
            ypos: 10.0,
            id: 3,
        })
        .unwrap();
        let v = c.get_velocity(3).unwrap();
        assert_eq!(v, VelocityDemand { xvel: 0.0, yvel: 2.0 });

        // Speed drops off near the target and stops inside the arrival radius
        c.post_position(&PositionReport {
            xpos: 10.0,
            ypos: 28.5,
            id: 3,
        })
        .unwrap();
        assert!((c.get_velocity(3).unwrap().yvel - 1.5).abs() < 1e-12);

        c.post_position(&PositionReport {
            xpos: 10.5,
            ypos: 29.5,
            id: 3,
        })
        .unwrap();
        assert_eq!(c.get_velocity(3).unwrap(), VelocityDemand::default());
    }
}
