//! # Guidance
//!
//! Turns the velocity demanded by the coordination service into the heading and speed demands fed
//! to turn control, keeping the drone inside the field.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::coord::VelocityDemand;
use nalgebra::Vector2;
use serde::Serialize;
use util::maths::rem_euclid;

use crate::gps_ops::{FieldParams, FieldPosition};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Pacing interval used when the drone is stationary.
///
/// Units: seconds
pub const MIN_PACING_INTERVAL_S: f64 = 1e-6;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Rectangular extent of the field, `[0, length_x] x [0, length_y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldBounds {
    pub length_x: f64,
    pub length_y: f64,
}

/// Demands produced by guidance for a single cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GuidanceDems {
    /// Units: degrees
    pub desired_heading_deg: f64,

    /// Units: field units/second
    pub speed: f64,

    /// True if the drone was outside the field and is being sent back to its centre.
    pub returning: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FieldBounds {
    pub fn new(length_x: f64, length_y: f64) -> Self {
        Self { length_x, length_y }
    }

    pub fn from_params(params: &FieldParams) -> Self {
        Self::new(params.length_x, params.length_y)
    }

    pub fn contains(&self, position: &FieldPosition) -> bool {
        (0.0..=self.length_x).contains(&position.x) && (0.0..=self.length_y).contains(&position.y)
    }

    pub fn centre(&self) -> FieldPosition {
        FieldPosition::new(self.length_x / 2.0, self.length_y / 2.0)
    }

    /// Heading from the given position to the centre of the field, `None` if already there.
    pub fn heading_to_centre(&self, position: &FieldPosition) -> Option<f64> {
        let centre = self.centre();

        desired_heading_deg(&Vector2::new(centre.x - position.x, centre.y - position.y))
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Compass heading of a field velocity, clockwise from the field's Y axis, in `[0, 360)`.
///
/// Returns `None` for a zero velocity, in which case the current heading should be held.
pub fn desired_heading_deg(velocity: &Vector2<f64>) -> Option<f64> {
    if velocity.norm() == 0.0 {
        return None;
    }

    let heading = rem_euclid(velocity.x.atan2(velocity.y).to_degrees(), 360.0);

    // Round off can leave a tiny negative angle at exactly 360
    Some(if heading >= 360.0 { 0.0 } else { heading })
}

/// Speed demanded by a velocity.
pub fn commanded_speed(velocity: &Vector2<f64>) -> f64 {
    velocity.norm()
}

/// Time taken to cover `distance` at `speed`, or [`MIN_PACING_INTERVAL_S`] when stationary.
///
/// Units: seconds
pub fn pacing_interval_s(distance: f64, speed: f64) -> f64 {
    if speed > 0.0 {
        (distance / speed).max(MIN_PACING_INTERVAL_S)
    } else {
        MIN_PACING_INTERVAL_S
    }
}

/// Compute the heading and speed demands for this cycle.
///
/// Outside the field the demanded velocity's direction is ignored and the drone is turned back
/// towards the field centre at the demanded speed. A zero demand holds the current heading.
pub fn guide(
    position: &FieldPosition,
    current_heading_deg: f64,
    demand: &VelocityDemand,
    bounds: &FieldBounds,
) -> GuidanceDems {
    let velocity = Vector2::new(demand.xvel, demand.yvel);
    let speed = commanded_speed(&velocity);

    if !bounds.contains(position) {
        return GuidanceDems {
            desired_heading_deg: bounds
                .heading_to_centre(position)
                .unwrap_or(current_heading_deg),
            speed,
            returning: true,
        };
    }

    GuidanceDems {
        desired_heading_deg: desired_heading_deg(&velocity).unwrap_or(current_heading_deg),
        speed,
        returning: false,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_desired_heading() {
        let h = |x, y| desired_heading_deg(&Vector2::new(x, y));

        assert_eq!(h(0.0, 1.0), Some(0.0));
        assert_eq!(h(1.0, 0.0), Some(90.0));
        assert_eq!(h(0.0, -2.0), Some(180.0));
        assert_eq!(h(-3.0, 0.0), Some(270.0));
        assert!((h(1.0, 1.0).unwrap() - 45.0).abs() < 1e-12);
        assert!((h(-1.0, 1.0).unwrap() - 315.0).abs() < 1e-12);
        assert_eq!(h(0.0, 0.0), None);
    }

    #[test]
    fn test_bounds() {
        let b = FieldBounds::new(60.0, 40.0);

        assert!(b.contains(&FieldPosition::new(0.0, 0.0)));
        assert!(b.contains(&FieldPosition::new(60.0, 40.0)));
        assert!(!b.contains(&FieldPosition::new(-0.1, 10.0)));
        assert!(!b.contains(&FieldPosition::new(10.0, 40.1)));

        assert_eq!(b.heading_to_centre(&FieldPosition::new(30.0, 50.0)), Some(180.0));
        assert_eq!(b.heading_to_centre(&FieldPosition::new(30.0, 20.0)), None);
    }

    #[test]
    fn test_guide() {
        let b = FieldBounds::new(60.0, 40.0);
        let demand = VelocityDemand { xvel: 3.0, yvel: 4.0 };

        // Inside the field the demand is followed
        let g = guide(&FieldPosition::new(10.0, 10.0), 0.0, &demand, &b);
        assert!(!g.returning);
        assert_eq!(g.speed, 5.0);
        assert!((g.desired_heading_deg - 36.869_897_645).abs() < 1e-6);

        // Outside the field the drone heads back to the centre
        let g = guide(&FieldPosition::new(-10.0, 20.0), 0.0, &demand, &b);
        assert!(g.returning);
        assert_eq!(g.desired_heading_deg, 90.0);
        assert_eq!(g.speed, 5.0);

        // A zero demand holds the current heading
        let g = guide(&FieldPosition::new(10.0, 10.0), 123.0, &VelocityDemand::default(), &b);
        assert_eq!(g.desired_heading_deg, 123.0);
        assert_eq!(g.speed, 0.0);
    }

    #[test]
    fn test_pacing_interval() {
        assert_eq!(pacing_interval_s(5.0, 2.0), 2.5);
        assert_eq!(pacing_interval_s(5.0, 0.0), MIN_PACING_INTERVAL_S);
        assert_eq!(pacing_interval_s(0.0, 2.0), MIN_PACING_INTERVAL_S);
    }
}
