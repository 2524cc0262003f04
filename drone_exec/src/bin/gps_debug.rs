//! # GPS Debug
//!
//! Calibrates the field from `field.toml` and prints where the reference points land, which is
//! the quickest way to check a new field survey.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use color_eyre::{eyre::WrapErr, Result};
use structopt::StructOpt;

use drone_lib::gps_ops::{parse_fix, CalibrationFrame, FieldParams, FieldPosition};

// ------------------------------------------------------------------------------------------------
// CLI
// ------------------------------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "gps_debug", about = "Print the field calibration and test conversions")]
struct Opt {
    /// Latitude of an extra point to convert, in degrees
    #[structopt(long, allow_hyphen_values = true, requires = "lon")]
    lat: Option<f64>,

    /// Longitude of an extra point to convert, in degrees
    #[structopt(long, allow_hyphen_values = true, requires = "lat")]
    lon: Option<f64>,

    /// A raw GGA or RMC sentence to decode and convert
    #[structopt(long)]
    sentence: Option<String>,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    let params: FieldParams =
        util::params::load("field.toml").wrap_err("Could not load field params")?;
    let frame = CalibrationFrame::from_params(&params).wrap_err("Calibration failed")?;

    println!("Origin:      {:?}", frame.origin_deg());
    println!("Rotation:    {} deg", frame.rotation_deg());
    println!("Base offset: {:?}", frame.base_offset());
    println!("Scale:       {:?}\n", frame.scale());

    let centre_lat = (params.origin_lat_deg + params.corner_lat_deg) / 2.0;
    let centre_lon = (params.origin_lon_deg + params.corner_lon_deg) / 2.0;

    print_point(&frame, "Corner", params.corner_lat_deg, params.corner_lon_deg)?;
    print_point(&frame, "Centre", centre_lat, centre_lon)?;
    print_point(&frame, "Origin", params.origin_lat_deg, params.origin_lon_deg)?;

    if let (Some(lat), Some(lon)) = (opt.lat, opt.lon) {
        print_point(&frame, "Test point", lat, lon)?;
    }

    if let Some(sentence) = opt.sentence {
        let fix = parse_fix(&sentence)?;
        println!("Decoded fix: {:?}", fix);
        print_point(&frame, "Fix", fix.lat_deg, fix.lon_deg)?;
    }

    // Far corner back to geodetic
    let (lat, lon) = frame.field_to_geodetic(&FieldPosition::new(params.length_x, params.length_y));
    println!(
        "Corner round trip error: ({:.3e}, {:.3e}) deg",
        lat - params.corner_lat_deg,
        lon - params.corner_lon_deg
    );

    Ok(())
}

fn print_point(frame: &CalibrationFrame, name: &str, lat: f64, lon: f64) -> Result<()> {
    let projected = frame.project(lat, lon)?;
    let field = frame.geodetic_to_field(lat, lon)?;

    println!("{} ({:.6}, {:.6}):", name, lat, lon);
    println!("    projected: ({:.9}, {:.9})", projected.0, projected.1);
    println!("    field:     ({:.3}, {:.3})", field.x, field.y);

    Ok(())
}
