//! Heading error classification and kinematic stepping

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;
use util::maths::norm;

use super::{Params, TurnCtrlError};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Kinematic snapshot of a drone for one control tick.
///
/// The first block of fields are inputs, the second block is filled in by [`step`]. Only the
/// advanced position and final heading of one tick seed the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct VehicleKinematicState {
    // ---- INPUTS ----
    /// Units: degrees
    pub current_heading_deg: f64,

    /// Units: degrees
    pub desired_heading_deg: f64,

    /// Commanded speed on input, achieved speed after stepping.
    ///
    /// Units: field units/second
    pub speed: f64,

    pub initial_x: f64,
    pub initial_y: f64,

    /// Units: seconds
    pub time_step_s: f64,

    // ---- OUTPUTS ----
    /// Units: degrees
    pub turning_angle_deg: f64,

    /// Units: degrees
    pub final_heading_deg: f64,

    pub x_speed: f64,
    pub y_speed: f64,
    pub advanced_x: f64,
    pub advanced_y: f64,
    pub distance_travelled: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Turn tier chosen for a heading error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tier {
    Steady,
    Fine,
    Coarse,
    Sharp,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Tier {
    fn default() -> Self {
        Tier::Steady
    }
}

impl Tier {
    /// Classify an (already normalised) heading error.
    pub fn classify(heading_error_deg: f64, params: &Params) -> Self {
        let err = heading_error_deg.abs();

        if err <= params.steady_tolerance_deg {
            Tier::Steady
        } else if err <= params.fine_tolerance_deg {
            Tier::Fine
        } else if err <= params.coarse_tolerance_deg {
            Tier::Coarse
        } else {
            Tier::Sharp
        }
    }

    /// Magnitude of the turn made in this tier.
    ///
    /// Units: degrees
    pub fn turn_magnitude_deg(self) -> f64 {
        match self {
            Tier::Steady => 0.0,
            Tier::Fine => 5.0,
            Tier::Coarse => 10.0,
            Tier::Sharp => 15.0,
        }
    }

    /// Multiplier applied to the commanded speed in this tier.
    pub fn speed_coefficient(self) -> f64 {
        match self {
            Tier::Steady => 1.0,
            Tier::Fine => 0.75,
            Tier::Coarse => 0.5,
            Tier::Sharp => 0.25,
        }
    }
}

impl VehicleKinematicState {
    /// Create a new input state with zeroed outputs.
    pub fn new(
        current_heading_deg: f64,
        desired_heading_deg: f64,
        speed: f64,
        initial_x: f64,
        initial_y: f64,
        time_step_s: f64,
    ) -> Self {
        Self {
            current_heading_deg,
            desired_heading_deg,
            speed,
            initial_x,
            initial_y,
            time_step_s,
            ..Default::default()
        }
    }

    /// Build the input state for the following tick from this tick's outputs.
    pub fn next(&self, desired_heading_deg: f64, speed: f64, time_step_s: f64) -> Self {
        Self::new(
            self.final_heading_deg,
            desired_heading_deg,
            speed,
            self.advanced_x,
            self.advanced_y,
            time_step_s,
        )
    }

    fn validate(&self) -> Result<(), TurnCtrlError> {
        let invalid = |msg: String| Err(TurnCtrlError::InvalidKinematicState(msg));

        for &(name, heading) in [
            ("current heading", self.current_heading_deg),
            ("desired heading", self.desired_heading_deg),
        ]
        .iter()
        {
            if !(0.0..=360.0).contains(&heading) {
                return invalid(format!("{} {} is outside [0, 360]", name, heading));
            }
        }

        if !(self.speed >= 0.0) || !self.speed.is_finite() {
            return invalid(format!("speed {} must be finite and non-negative", self.speed));
        }

        if !(self.time_step_s >= 0.0) || !self.time_step_s.is_finite() {
            return invalid(format!(
                "time step {} must be finite and non-negative",
                self.time_step_s
            ));
        }

        if !self.initial_x.is_finite() || !self.initial_y.is_finite() {
            return invalid(format!(
                "position ({}, {}) must be finite",
                self.initial_x, self.initial_y
            ));
        }

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Bring a heading difference into `[-180, 180]`. `180` maps to `-180` and `-180` to `180`.
///
/// Only one correction is applied, so inputs should already lie within `(-360, 360)`.
pub fn normalize_angle_diff(diff_deg: f64) -> f64 {
    if diff_deg >= 180.0 {
        diff_deg - 360.0
    } else if diff_deg <= -180.0 {
        diff_deg + 360.0
    } else {
        diff_deg
    }
}

/// Wrap a heading in `(-360, 720)` into `[0, 360)`.
pub fn wrap_heading(heading_deg: f64) -> f64 {
    if heading_deg >= 360.0 {
        heading_deg - 360.0
    } else if heading_deg < 0.0 {
        heading_deg + 360.0
    } else {
        heading_deg
    }
}

/// Signed heading error from current to desired, positive to the right.
pub fn heading_error_deg(current_heading_deg: f64, desired_heading_deg: f64) -> f64 {
    normalize_angle_diff(desired_heading_deg - current_heading_deg)
}

/// Advance the kinematic state by one tick.
pub fn step(
    state: VehicleKinematicState,
    params: &Params,
) -> Result<VehicleKinematicState, TurnCtrlError> {
    state.validate()?;

    let error = heading_error_deg(state.current_heading_deg, state.desired_heading_deg);
    let tier = Tier::classify(error, params);

    let turning_angle_deg = if error >= 0.0 {
        tier.turn_magnitude_deg()
    } else {
        -tier.turn_magnitude_deg()
    };

    let speed = state.speed * tier.speed_coefficient();
    let final_heading_deg = wrap_heading(state.current_heading_deg + turning_angle_deg);

    let (sin, cos) = final_heading_deg.to_radians().sin_cos();
    let x_speed = speed * sin;
    let y_speed = speed * cos;

    let advanced_x = state.initial_x + state.time_step_s * x_speed;
    let advanced_y = state.initial_y + state.time_step_s * y_speed;

    let distance_travelled = norm(
        &[state.initial_x, state.initial_y],
        &[advanced_x, advanced_y],
    )
    .unwrap_or(0.0);

    Ok(VehicleKinematicState {
        speed,
        turning_angle_deg,
        final_heading_deg,
        x_speed,
        y_speed,
        advanced_x,
        advanced_y,
        distance_travelled,
        ..state
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_normalize_angle_diff() {
        assert_eq!(normalize_angle_diff(190.0), -170.0);
        assert_eq!(normalize_angle_diff(-190.0), 170.0);
        assert_eq!(normalize_angle_diff(180.0), -180.0);
        assert_eq!(normalize_angle_diff(-180.0), 180.0);
        assert_eq!(normalize_angle_diff(179.9), 179.9);
        assert_eq!(normalize_angle_diff(0.0), 0.0);
    }

    #[test]
    fn test_wrap_heading() {
        assert_eq!(wrap_heading(365.0), 5.0);
        assert_eq!(wrap_heading(360.0), 0.0);
        assert_eq!(wrap_heading(-15.0), 345.0);
        assert_eq!(wrap_heading(120.0), 120.0);
    }

    #[test]
    fn test_tier_boundaries() {
        let p = Params::default();

        assert_eq!(Tier::classify(0.1, &p), Tier::Steady);
        assert_eq!(Tier::classify(-0.1001, &p), Tier::Fine);
        assert_eq!(Tier::classify(5.0, &p), Tier::Fine);
        assert_eq!(Tier::classify(-5.0, &p), Tier::Fine);
        assert_eq!(Tier::classify(5.0001, &p), Tier::Coarse);
        assert_eq!(Tier::classify(45.0, &p), Tier::Coarse);
        assert_eq!(Tier::classify(-45.0001, &p), Tier::Sharp);
        assert_eq!(Tier::classify(180.0, &p), Tier::Sharp);
    }

    #[test]
    fn test_step_coarse_right() {
        let s = step(
            VehicleKinematicState::new(0.0, 40.0, 10.0, 0.0, 0.0, 1.0),
            &Params::default(),
        )
        .unwrap();

        assert_eq!(s.turning_angle_deg, 10.0);
        assert_eq!(s.speed, 5.0);
        assert_eq!(s.final_heading_deg, 10.0);
        assert!((s.advanced_x - 0.868).abs() < 1e-3, "x = {}", s.advanced_x);
        assert!((s.advanced_y - 4.924).abs() < 1e-3, "y = {}", s.advanced_y);
        assert!((s.distance_travelled - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_step_steady() {
        let s = step(
            VehicleKinematicState::new(90.0, 90.0, 2.0, 1.0, 1.0, 0.5),
            &Params::default(),
        )
        .unwrap();

        assert_eq!(s.turning_angle_deg, 0.0);
        assert_eq!(s.speed, 2.0);
        assert_eq!(s.final_heading_deg, 90.0);
        assert!((s.advanced_x - 2.0).abs() < 1e-12);
        assert!((s.advanced_y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_step_wraps_through_north() {
        // Shortest way from 355 to 10 is to the right, through north
        let s = step(
            VehicleKinematicState::new(355.0, 10.0, 4.0, 0.0, 0.0, 1.0),
            &Params::default(),
        )
        .unwrap();

        assert_eq!(s.turning_angle_deg, 10.0);
        assert_eq!(s.final_heading_deg, 5.0);
        assert_eq!(s.speed, 2.0);

        // And from 10 to 300 is a sharp left, through north
        let s = step(
            VehicleKinematicState::new(10.0, 300.0, 4.0, 0.0, 0.0, 1.0),
            &Params::default(),
        )
        .unwrap();

        assert_eq!(s.turning_angle_deg, -15.0);
        assert_eq!(s.final_heading_deg, 355.0);
        assert_eq!(s.speed, 1.0);
    }

    #[test]
    fn test_step_opposite_heading() {
        let p = Params::default();

        // An error of exactly 180 normalises to -180, so the turn is a sharp left
        let s = step(VehicleKinematicState::new(0.0, 180.0, 4.0, 0.0, 0.0, 1.0), &p).unwrap();
        assert_eq!(s.turning_angle_deg, -15.0);
        assert_eq!(s.final_heading_deg, 345.0);
        assert_eq!(s.speed, 1.0);

        let s = step(VehicleKinematicState::new(90.0, 270.0, 4.0, 0.0, 0.0, 1.0), &p).unwrap();
        assert_eq!(s.turning_angle_deg, -15.0);
        assert_eq!(s.final_heading_deg, 75.0);

        // While -180 normalises to 180, a sharp right
        let s = step(VehicleKinematicState::new(180.0, 0.0, 4.0, 0.0, 0.0, 1.0), &p).unwrap();
        assert_eq!(s.turning_angle_deg, 15.0);
        assert_eq!(s.final_heading_deg, 195.0);
    }

    #[test]
    fn test_step_chained() {
        let p = Params::default();
        let mut s = step(VehicleKinematicState::new(0.0, 90.0, 1.0, 0.0, 0.0, 1.0), &p).unwrap();

        // Keep asking for east until the drone is pointing there
        for _ in 0..20 {
            s = step(s.next(90.0, 1.0, 1.0), &p).unwrap();
        }

        assert_eq!(s.final_heading_deg, 90.0);
        assert_eq!(s.turning_angle_deg, 0.0);
        assert!(s.advanced_x > 0.0);
    }

    #[test]
    fn test_step_invalid() {
        let p = Params::default();
        let bad = [
            VehicleKinematicState::new(0.0, 10.0, -1.0, 0.0, 0.0, 1.0),
            VehicleKinematicState::new(0.0, 10.0, f64::NAN, 0.0, 0.0, 1.0),
            VehicleKinematicState::new(f64::INFINITY, 10.0, 1.0, 0.0, 0.0, 1.0),
            VehicleKinematicState::new(0.0, 400.0, 1.0, 0.0, 0.0, 1.0),
            VehicleKinematicState::new(-1.0, 10.0, 1.0, 0.0, 0.0, 1.0),
            VehicleKinematicState::new(0.0, 10.0, 1.0, 0.0, 0.0, -0.1),
            VehicleKinematicState::new(0.0, 10.0, 1.0, f64::NAN, 0.0, 1.0),
        ];

        for s in bad.iter() {
            assert!(
                matches!(step(*s, &p), Err(TurnCtrlError::InvalidKinematicState(_))),
                "{:?} should be invalid",
                s
            );
        }
    }
}
