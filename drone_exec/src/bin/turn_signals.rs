//! # Turn Signals
//!
//! Runs a single turn control step and prints the resulting kinematic state.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use color_eyre::{eyre::WrapErr, Result};
use structopt::StructOpt;

use drone_lib::turn_ctrl::{self, step, Tier, VehicleKinematicState};

// ------------------------------------------------------------------------------------------------
// CLI
// ------------------------------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "turn_signals", about = "Run one step of the stepped heading controller")]
struct Opt {
    /// Current heading in degrees, clockwise from north
    current_heading: f64,

    /// Desired heading in degrees, clockwise from north
    desired_heading: f64,

    /// Commanded speed
    speed: f64,

    /// Current X position
    #[structopt(allow_hyphen_values = true)]
    x: f64,

    /// Current Y position
    #[structopt(allow_hyphen_values = true)]
    y: f64,

    /// Time step in seconds
    time_step: f64,

    /// Load the tier tolerances from turn_ctrl.toml instead of using the defaults
    #[structopt(long)]
    load_params: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    let params = if opt.load_params {
        util::params::load("turn_ctrl.toml").wrap_err("Could not load TurnCtrl params")?
    } else {
        turn_ctrl::Params::default()
    };

    let input = VehicleKinematicState::new(
        opt.current_heading,
        opt.desired_heading,
        opt.speed,
        opt.x,
        opt.y,
        opt.time_step,
    );
    let output = step(input, &params)?;

    let error = turn_ctrl::heading_error_deg(opt.current_heading, opt.desired_heading);
    let tier: Tier = Tier::classify(error, &params);

    println!("Heading error:      {:+.3} deg ({:?})", error, tier);
    println!("Turning angle:      {:+.1} deg", output.turning_angle_deg);
    println!("Final heading:      {:.3} deg", output.final_heading_deg);
    println!("Speed:              {:.3}", output.speed);
    println!(
        "Speed components:   ({:.3}, {:.3})",
        output.x_speed, output.y_speed
    );
    println!(
        "Advanced position:  ({:.3}, {:.3})",
        output.advanced_x, output.advanced_y
    );
    println!("Distance travelled: {:.3}", output.distance_travelled);

    Ok(())
}
