//! Field calibration and coordinate conversion

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::GpsOpsError;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Field survey parameters, loaded from `field.toml`.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct FieldParams {
    /// Latitude of the point mapped to the field origin.
    ///
    /// Units: degrees
    pub origin_lat_deg: f64,

    /// Longitude of the point mapped to the field origin.
    ///
    /// Units: degrees
    pub origin_lon_deg: f64,

    /// Latitude of the field corner opposite the origin.
    ///
    /// Units: degrees
    pub corner_lat_deg: f64,

    /// Longitude of the field corner opposite the origin.
    ///
    /// Units: degrees
    pub corner_lon_deg: f64,

    /// Length of the field along its X axis, in field units.
    pub length_x: f64,

    /// Length of the field along its Y axis, in field units.
    pub length_y: f64,

    /// Rotation aligning the projected axes with the field's edges.
    ///
    /// Units: degrees
    pub rotation_deg: f64,
}

/// Session calibration mapping geodetic coordinates onto the field frame.
///
/// A frame can only be created through [`CalibrationFrame::calibrate`], so every conversion
/// method can rely on the offset and scale being valid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationFrame {
    origin_lat_deg: f64,
    origin_lon_deg: f64,
    rotation_deg: f64,
    base_offset_x: f64,
    base_offset_y: f64,
    scale_x: f64,
    scale_y: f64,
}

/// A position in the field frame.
///
/// Positions inside the field lie in `[0, length_x] x [0, length_y]`, however nothing clamps them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldPosition {
    pub x: f64,
    pub y: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FieldPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl CalibrationFrame {
    /// Calibrate the field frame from the origin and the opposite corner of the field.
    ///
    /// The origin is projected to find the base offset, then the corner's offset projection is
    /// divided by the field lengths to find the scale of each axis.
    pub fn calibrate(
        origin_lat_deg: f64,
        origin_lon_deg: f64,
        corner_lat_deg: f64,
        corner_lon_deg: f64,
        length_x: f64,
        length_y: f64,
        rotation_deg: f64,
    ) -> Result<Self, GpsOpsError> {
        if !(length_x > 0.0 && length_y > 0.0) || !length_x.is_finite() || !length_y.is_finite() {
            return Err(GpsOpsError::DegenerateCalibration(format!(
                "field lengths must be positive, got ({}, {})",
                length_x, length_y
            )));
        }

        if !rotation_deg.is_finite() {
            return Err(GpsOpsError::DegenerateCalibration(format!(
                "rotation must be finite, got {}",
                rotation_deg
            )));
        }

        let (base_offset_x, base_offset_y) = project(
            origin_lat_deg,
            origin_lon_deg,
            origin_lon_deg,
            rotation_deg,
        )?;
        let (corner_x, corner_y) = project(
            corner_lat_deg,
            corner_lon_deg,
            origin_lon_deg,
            rotation_deg,
        )?;

        let scale_x = (corner_x - base_offset_x) / length_x;
        let scale_y = (corner_y - base_offset_y) / length_y;

        if scale_x == 0.0 || scale_y == 0.0 || !scale_x.is_finite() || !scale_y.is_finite() {
            return Err(GpsOpsError::DegenerateCalibration(format!(
                "corner does not span both field axes, scale is ({}, {})",
                scale_x, scale_y
            )));
        }

        Ok(Self {
            origin_lat_deg,
            origin_lon_deg,
            rotation_deg,
            base_offset_x,
            base_offset_y,
            scale_x,
            scale_y,
        })
    }

    /// Calibrate from the field survey parameters.
    pub fn from_params(params: &FieldParams) -> Result<Self, GpsOpsError> {
        Self::calibrate(
            params.origin_lat_deg,
            params.origin_lon_deg,
            params.corner_lat_deg,
            params.corner_lon_deg,
            params.length_x,
            params.length_y,
            params.rotation_deg,
        )
    }

    /// Project a geodetic position into the rotated, but not yet offset or scaled, plane.
    pub fn project(&self, lat_deg: f64, lon_deg: f64) -> Result<(f64, f64), GpsOpsError> {
        project(lat_deg, lon_deg, self.origin_lon_deg, self.rotation_deg)
    }

    /// Convert a geodetic position into the field frame.
    pub fn geodetic_to_field(
        &self,
        lat_deg: f64,
        lon_deg: f64,
    ) -> Result<FieldPosition, GpsOpsError> {
        let (rot_x, rot_y) = self.project(lat_deg, lon_deg)?;

        Ok(FieldPosition {
            x: (rot_x - self.base_offset_x) / self.scale_x,
            y: (rot_y - self.base_offset_y) / self.scale_y,
        })
    }

    /// Convert a field position back into `(latitude, longitude)` in degrees.
    pub fn field_to_geodetic(&self, position: &FieldPosition) -> (f64, f64) {
        let rot_x = position.x * self.scale_x + self.base_offset_x;
        let rot_y = position.y * self.scale_y + self.base_offset_y;

        let (sin, cos) = self.rotation_deg.to_radians().sin_cos();
        let x = rot_x * cos - rot_y * sin;
        let y = rot_x * sin + rot_y * cos;

        (
            y.sinh().atan().to_degrees(),
            x.to_degrees() + self.origin_lon_deg,
        )
    }

    pub fn origin_deg(&self) -> (f64, f64) {
        (self.origin_lat_deg, self.origin_lon_deg)
    }

    pub fn rotation_deg(&self) -> f64 {
        self.rotation_deg
    }

    /// Projected coordinates of the origin.
    pub fn base_offset(&self) -> (f64, f64) {
        (self.base_offset_x, self.base_offset_y)
    }

    /// Projected distance per field unit along each axis.
    pub fn scale(&self) -> (f64, f64) {
        (self.scale_x, self.scale_y)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Mercator projection relative to the reference longitude, then rotation.
fn project(
    lat_deg: f64,
    lon_deg: f64,
    ref_lon_deg: f64,
    rotation_deg: f64,
) -> Result<(f64, f64), GpsOpsError> {
    if !lat_deg.is_finite() || !lon_deg.is_finite() || lat_deg.abs() >= 90.0 {
        return Err(GpsOpsError::SingularProjection { lat_deg, lon_deg });
    }

    let lat = lat_deg.to_radians();

    let x = lon_deg.to_radians() - ref_lon_deg.to_radians();
    let y = (lat.tan() + 1.0 / lat.cos()).ln();

    let (sin, cos) = rotation_deg.to_radians().sin_cos();

    Ok((x * cos + y * sin, y * cos - x * sin))
}

#[cfg(test)]
mod test {
    use super::*;

    fn frame(rotation_deg: f64) -> CalibrationFrame {
        CalibrationFrame::calibrate(29.1899, -81.0465, 29.1904, -81.0459, 60.0, 40.0, rotation_deg)
            .unwrap()
    }

    #[test]
    fn test_origin_maps_to_zero() {
        for &rot in [0.0, 12.5, -30.0, 90.0].iter() {
            let f = frame(rot);
            let p = f.geodetic_to_field(29.1899, -81.0465).unwrap();
            assert_eq!(p.x, 0.0);
            assert_eq!(p.y, 0.0);
        }
    }

    #[test]
    fn test_corner_maps_to_lengths() {
        let f = frame(12.5);
        let p = f.geodetic_to_field(29.1904, -81.0459).unwrap();

        assert!((p.x - 60.0).abs() < 1e-9, "x = {}", p.x);
        assert!((p.y - 40.0).abs() < 1e-9, "y = {}", p.y);
    }

    #[test]
    fn test_round_trip() {
        let frames = [
            frame(0.0),
            frame(33.0),
            CalibrationFrame::calibrate(-45.0, 170.0, -44.0, 172.0, 1.0, 2.0, -120.0).unwrap(),
        ];
        let points = [
            (29.190119, -81.046239),
            (0.0, 0.0),
            (-60.0, 170.0),
            (75.5, -179.9),
            (-89.0, 45.0),
        ];

        for f in frames.iter() {
            for &(lat, lon) in points.iter() {
                let p = f.geodetic_to_field(lat, lon).unwrap();
                let (lat_rt, lon_rt) = f.field_to_geodetic(&p);

                assert!((lat - lat_rt).abs() < 1e-6, "{} vs {}", lat, lat_rt);
                assert!((lon - lon_rt).abs() < 1e-6, "{} vs {}", lon, lon_rt);
            }
        }
    }

    #[test]
    fn test_singular_projection() {
        let f = frame(0.0);

        assert!(matches!(
            f.geodetic_to_field(90.0, 0.0),
            Err(GpsOpsError::SingularProjection { .. })
        ));
        assert!(matches!(
            f.geodetic_to_field(-90.0, 0.0),
            Err(GpsOpsError::SingularProjection { .. })
        ));
        assert!(matches!(
            f.geodetic_to_field(f64::NAN, 0.0),
            Err(GpsOpsError::SingularProjection { .. })
        ));
        assert!(matches!(
            CalibrationFrame::calibrate(90.0, 0.0, 10.0, 10.0, 1.0, 1.0, 0.0),
            Err(GpsOpsError::SingularProjection { .. })
        ));
    }

    #[test]
    fn test_degenerate_calibration() {
        // Zero length field
        assert!(matches!(
            CalibrationFrame::calibrate(29.0, -81.0, 29.1, -80.9, 0.0, 10.0, 0.0),
            Err(GpsOpsError::DegenerateCalibration(_))
        ));

        // Corner on the same meridian as the origin gives no X extent without rotation
        assert!(matches!(
            CalibrationFrame::calibrate(29.0, -81.0, 29.1, -81.0, 10.0, 10.0, 0.0),
            Err(GpsOpsError::DegenerateCalibration(_))
        ));
    }

    #[test]
    fn test_recalibration_is_independent() {
        let a = frame(0.0);
        let b = frame(45.0);

        assert_ne!(a, b);
        assert_eq!(a, frame(0.0));
    }
}
