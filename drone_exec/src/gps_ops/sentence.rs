//! Fix sentence decoding and encoding

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::GpsOpsError;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Heading reported when the sentence carries no course over ground.
pub const NO_COURSE_DEG: f64 = 999.0;

/// Number of fields in a GGA sentence.
const GGA_NUM_FIELDS: usize = 15;

/// Number of fields in an NMEA 2.2 RMC sentence. NMEA 2.3 adds a mode indicator field.
const RMC_NUM_FIELDS: usize = 12;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A decoded fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeodeticFix {
    /// Layout of the sentence the fix came from
    pub kind: SentenceKind,

    /// Latitude, positive north.
    ///
    /// Units: degrees
    pub lat_deg: f64,

    /// Longitude, positive east.
    ///
    /// Units: degrees
    pub lon_deg: f64,

    /// Course over ground, clockwise from north, or [`NO_COURSE_DEG`] if there is none.
    ///
    /// Units: degrees
    pub heading_deg: f64,

    /// GGA fix quality indicator. RMC sentences give 1 for an active fix and 0 for a void one.
    pub fix_quality: u8,

    /// Horizontal dilution of precision, GGA only.
    pub hdop: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Supported sentence layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentenceKind {
    /// Global positioning system fix data
    Gga,

    /// Recommended minimum specific data
    Rmc,
}

/// Which hemisphere letters a coordinate field may be followed by.
#[derive(Clone, Copy)]
enum Axis {
    Lat,
    Lon,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl GeodeticFix {
    /// True if the sentence carried a course over ground.
    pub fn has_heading(&self) -> bool {
        self.heading_deg != NO_COURSE_DEG
    }
}

impl Axis {
    /// Number of leading digits holding whole degrees.
    fn deg_digits(self) -> usize {
        match self {
            Axis::Lat => 2,
            Axis::Lon => 3,
        }
    }

    /// Hemisphere letters for (positive, negative).
    fn hemispheres(self) -> (&'static str, &'static str) {
        match self {
            Axis::Lat => ("N", "S"),
            Axis::Lon => ("E", "W"),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Decode a GGA or RMC fix sentence.
///
/// The checksum is stripped but not verified, and the talker ID is ignored.
pub fn parse_fix(sentence: &str) -> Result<GeodeticFix, GpsOpsError> {
    let sentence = sentence.trim_end_matches(|c| c == '\r' || c == '\n');

    // Drop the checksum from the last field
    let body = match sentence.find('*') {
        Some(i) => &sentence[..i],
        None => sentence,
    };

    let fields: Vec<&str> = body.split(',').collect();

    let kind = match sentence_type(fields[0]) {
        Some("GGA") => SentenceKind::Gga,
        Some("RMC") => SentenceKind::Rmc,
        _ => {
            return Err(malformed(format!(
                "unsupported sentence type in {:?}",
                fields[0]
            )))
        }
    };

    match kind {
        SentenceKind::Gga => {
            if fields.len() != GGA_NUM_FIELDS {
                return Err(malformed(format!(
                    "GGA sentence has {} fields, expected {}",
                    fields.len(),
                    GGA_NUM_FIELDS
                )));
            }

            let fix_quality = match fields[6] {
                "" => 0,
                q => q
                    .parse::<u8>()
                    .map_err(|_| malformed(format!("bad fix quality {:?}", q)))?,
            };

            let hdop = match fields[8] {
                "" => None,
                h => Some(
                    parse_decimal(h).ok_or_else(|| malformed(format!("bad HDOP {:?}", h)))?,
                ),
            };

            Ok(GeodeticFix {
                kind,
                lat_deg: parse_coord(fields[2], fields[3], Axis::Lat)?,
                lon_deg: parse_coord(fields[4], fields[5], Axis::Lon)?,
                heading_deg: NO_COURSE_DEG,
                fix_quality,
                hdop,
            })
        }
        SentenceKind::Rmc => {
            if fields.len() != RMC_NUM_FIELDS && fields.len() != RMC_NUM_FIELDS + 1 {
                return Err(malformed(format!(
                    "RMC sentence has {} fields, expected {} or {}",
                    fields.len(),
                    RMC_NUM_FIELDS,
                    RMC_NUM_FIELDS + 1
                )));
            }

            let fix_quality = match fields[2] {
                "A" => 1,
                "V" => 0,
                s => return Err(malformed(format!("bad RMC status {:?}", s))),
            };

            let heading_deg = match fields[8] {
                "" => NO_COURSE_DEG,
                c => parse_decimal(c)
                    .ok_or_else(|| malformed(format!("bad course over ground {:?}", c)))?,
            };

            Ok(GeodeticFix {
                kind,
                lat_deg: parse_coord(fields[3], fields[4], Axis::Lat)?,
                lon_deg: parse_coord(fields[5], fields[6], Axis::Lon)?,
                heading_deg,
                fix_quality,
                hdop: None,
            })
        }
    }
}

/// Encode a fix as a sentence of the given kind, including a valid checksum.
///
/// `time_of_day_s` is the UTC time of the fix in seconds since midnight. The heading is only
/// encoded in RMC sentences, pass `None` to leave the course empty.
pub fn format_fix(
    kind: SentenceKind,
    lat_deg: f64,
    lon_deg: f64,
    heading_deg: Option<f64>,
    time_of_day_s: f64,
) -> String {
    let time = format_time(time_of_day_s);
    let lat = format_coord(lat_deg, Axis::Lat);
    let lon = format_coord(lon_deg, Axis::Lon);

    let body = match kind {
        SentenceKind::Gga => format!("GPGGA,{},{},{},1,08,0.9,0.0,M,0.0,M,,", time, lat, lon),
        SentenceKind::Rmc => {
            let course = match heading_deg {
                Some(h) => format!("{:.1}", h),
                None => String::new(),
            };
            format!("GPRMC,{},A,{},{},000.0,{},010121,,", time, lat, lon, course)
        }
    };

    let checksum = body.bytes().fold(0u8, |acc, b| acc ^ b);

    format!("${}*{:02X}", body, checksum)
}

/// Get the three letter sentence type from the address field.
fn sentence_type(address: &str) -> Option<&str> {
    if !address.starts_with('$') || address.len() < 4 {
        return None;
    }

    address.get(address.len() - 3..)
}

/// Parse a `(D)DDMM.MMMM` coordinate and its hemisphere letter into signed decimal degrees.
fn parse_coord(value: &str, hemisphere: &str, axis: Axis) -> Result<f64, GpsOpsError> {
    let n = axis.deg_digits();

    let (deg_str, min_str) = match (value.get(..n), value.get(n..)) {
        (Some(d), Some(m)) if !m.is_empty() => (d, m),
        _ => return Err(malformed(format!("bad coordinate {:?}", value))),
    };

    if !deg_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed(format!("bad coordinate degrees {:?}", value)));
    }
    let deg = deg_str
        .parse::<u32>()
        .map_err(|_| malformed(format!("bad coordinate degrees {:?}", value)))?;
    let min = parse_decimal(min_str)
        .filter(|m| *m < 60.0)
        .ok_or_else(|| malformed(format!("bad coordinate minutes {:?}", value)))?;

    let magnitude = deg as f64 + min / 60.0;

    let (pos, neg) = axis.hemispheres();
    if hemisphere == pos {
        Ok(magnitude)
    } else if hemisphere == neg {
        Ok(-magnitude)
    } else {
        Err(malformed(format!("bad hemisphere {:?}", hemisphere)))
    }
}

/// Parse an unsigned decimal such as `07.038`: ASCII digits with at most one point.
///
/// Rejects signs, exponents, `inf` and `NaN`, all of which `f64::from_str` would accept.
fn parse_decimal(value: &str) -> Option<f64> {
    let mut points = 0;
    let mut digits = 0;

    for c in value.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => points += 1,
            _ => return None,
        }
    }

    if digits == 0 || points > 1 {
        return None;
    }

    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn format_coord(value_deg: f64, axis: Axis) -> String {
    let (pos, neg) = axis.hemispheres();
    let hemisphere = if value_deg < 0.0 { neg } else { pos };

    // Work in ten-thousandths of a minute so rounding can carry into the degrees
    let units = (value_deg.abs() * 600_000.0).round() as u64;
    let deg = units / 600_000;
    let min = (units % 600_000) as f64 / 10_000.0;

    match axis {
        Axis::Lat => format!("{:02}{:07.4},{}", deg, min, hemisphere),
        Axis::Lon => format!("{:03}{:07.4},{}", deg, min, hemisphere),
    }
}

fn format_time(time_of_day_s: f64) -> String {
    let centis = (time_of_day_s.max(0.0) * 100.0).round() as u64 % (86_400 * 100);
    let secs = centis / 100;

    format!(
        "{:02}{:02}{:02}.{:02}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        centis % 100
    )
}

fn malformed(reason: String) -> GpsOpsError {
    GpsOpsError::MalformedSentence(reason)
}

#[cfg(test)]
mod test {
    use super::*;

    const GGA: &str = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.5,M,46.9,M,,*47";
    const RMC: &str = "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,,230394,003.1,W*6A";

    #[test]
    fn test_parse_gga() {
        let fix = parse_fix(GGA).unwrap();

        assert_eq!(fix.kind, SentenceKind::Gga);
        assert!((fix.lat_deg - 48.1173).abs() < 1e-9);
        assert!((fix.lon_deg - (11.0 + 31.0 / 60.0)).abs() < 1e-9);
        assert_eq!(fix.heading_deg, NO_COURSE_DEG);
        assert!(!fix.has_heading());
        assert_eq!(fix.fix_quality, 1);
        assert_eq!(fix.hdop, Some(0.9));
    }

    #[test]
    fn test_parse_rmc() {
        let fix = parse_fix(RMC).unwrap();

        assert_eq!(fix.kind, SentenceKind::Rmc);
        assert!((fix.lat_deg - 48.1173).abs() < 1e-9);
        assert!((fix.lon_deg - 11.516_666_666).abs() < 1e-6);
        assert_eq!(fix.heading_deg, NO_COURSE_DEG);
        assert_eq!(fix.fix_quality, 1);
        assert_eq!(fix.hdop, None);

        // Course present, other talker, mode indicator and line terminator
        let fix = parse_fix(
            "$GNRMC,123519,V,4807.038,S,01131.000,W,022.4,084.4,230394,003.1,W,A*00\r\n",
        )
        .unwrap();
        assert!((fix.lat_deg + 48.1173).abs() < 1e-9);
        assert!(fix.lon_deg < 0.0);
        assert_eq!(fix.heading_deg, 84.4);
        assert_eq!(fix.fix_quality, 0);
    }

    #[test]
    fn test_parse_malformed() {
        let bad = [
            "",
            "$GPGSV,3,1,11,03,03,111,00*74",
            "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.5,M,46.9,M*47",
            "$GPGGA,123519,4807.038,X,01131.000,E,1,08,0.9,545.5,M,46.9,M,,*47",
            "$GPGGA,123519,,N,01131.000,E,1,08,0.9,545.5,M,46.9,M,,*47",
            "$GPGGA,123519,4807.038,N,0113x.000,E,1,08,0.9,545.5,M,46.9,M,,*47",
            "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,,230394*6A",
            "$GPRMC,123519,A,4807.038,N,01131.000,N,022.4,,230394,003.1,W*6A",
            "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,abc,230394,003.1,W*6A",
            // Minutes must be plain digits below 60
            "$GPGGA,123519,48inf,N,01131.000,E,1,08,0.9,545.5,M,46.9,M,,*47",
            "$GPGGA,123519,48NaN,N,01131.000,E,1,08,0.9,545.5,M,46.9,M,,*47",
            "$GPGGA,123519,48-7.038,N,01131.000,E,1,08,0.9,545.5,M,46.9,M,,*47",
            "$GPGGA,123519,4899.0,N,01131.000,E,1,08,0.9,545.5,M,46.9,M,,*47",
            "$GPGGA,123519,4807.0.38,N,01131.000,E,1,08,0.9,545.5,M,46.9,M,,*47",
            "$GPGGA,123519,4807.038,N,011+1.000,E,1,08,0.9,545.5,M,46.9,M,,*47",
            "$GPGGA,123519,+807.038,N,01131.000,E,1,08,0.9,545.5,M,46.9,M,,*47",
            // HDOP and course must be unsigned and finite
            "$GPGGA,123519,4807.038,N,01131.000,E,1,08,inf,545.5,M,46.9,M,,*47",
            "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,-84.4,230394,003.1,W*6A",
            "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,NaN,230394,003.1,W*6A",
            "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,1e2,230394,003.1,W*6A",
        ];

        for s in bad.iter() {
            assert!(
                matches!(parse_fix(s), Err(GpsOpsError::MalformedSentence(_))),
                "{:?} should be malformed",
                s
            );
        }
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("07.038"), Some(7.038));
        assert_eq!(parse_decimal("59"), Some(59.0));
        assert_eq!(parse_decimal(".5"), Some(0.5));
        assert_eq!(parse_decimal("."), None);
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("+1"), None);
        assert_eq!(parse_decimal("inf"), None);
    }

    #[test]
    fn test_format_fix() {
        let s = format_fix(SentenceKind::Rmc, -29.19, -81.05, Some(123.4), 45_296.5);
        assert!(s.starts_with("$GPRMC,123456.50,A,2911.4000,S,08103.0000,W,000.0,123.4,"));

        // Checksum covers everything between the '$' and the '*'
        let (body, checksum) = s[1..].split_at(s.len() - 4);
        let expected = body.bytes().fold(0u8, |acc, b| acc ^ b);
        assert_eq!(checksum, format!("*{:02X}", expected));

        let fix = parse_fix(&s).unwrap();
        assert!((fix.lat_deg + 29.19).abs() < 1e-6);
        assert!((fix.lon_deg + 81.05).abs() < 1e-6);
        assert_eq!(fix.heading_deg, 123.4);

        let fix = parse_fix(&format_fix(SentenceKind::Gga, 48.1173, 11.5, Some(10.0), 0.0))
            .unwrap();
        assert_eq!(fix.heading_deg, NO_COURSE_DEG);
    }

    #[test]
    fn test_format_coord_carry() {
        // 59.99999 minutes rounds up into the next degree
        assert_eq!(format_coord(10.999_999_9, Axis::Lat), "1100.0000,N");
        assert_eq!(format_coord(0.0, Axis::Lon), "00000.0000,E");
    }
}
