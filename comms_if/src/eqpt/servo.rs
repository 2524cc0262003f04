//! # Servo Equipment Commands
//!
//! The vehicle accepts short ASCII commands over its transport. A servo command is the channel's
//! prefix code immediately followed by a signed integer pulse length in microseconds, e.g.
//! `S1540` for the steering servo or `E1620` for the electronic speed controller (ESC). Two
//! further plain messages are understood: [`GPS_REQUEST`] asks the vehicle for a fresh fix and
//! [`DISCONNECT`] ends the session.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Message asking the vehicle to publish a fix sentence.
pub const GPS_REQUEST: &str = "gps";

/// Message telling the vehicle the controller is going away.
pub const DISCONNECT: &str = "disconnect";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Prefix codes for each servo channel, as configured on the vehicle.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServoCodes {
    /// Prefix of steering servo commands
    pub steering: String,

    /// Prefix of ESC (throttle) commands
    pub esc: String,
}

/// A single servo demand.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoCmd {
    /// The channel the demand is for
    pub channel: ServoChannel,

    /// Pulse length demand.
    ///
    /// Units: microseconds
    pub pulse_us: i32,
}

/// The pair of demands sent to the vehicle on every control cycle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoDems {
    pub steering: ServoCmd,
    pub esc: ServoCmd,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Servo channels on the vehicle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServoChannel {
    Steering,
    Esc,
}

/// Errors raised by a [`Transport`].
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("The transport to the vehicle is not connected")]
    NotConnected,

    #[error("Could not send {0:?} to the vehicle: {1}")]
    SendFailed(String, String),

    #[error("Malformed servo command: {0:?}")]
    MalformedCommand(String),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Byte transport to a single vehicle.
pub trait Transport {
    /// Send a single message to the vehicle.
    fn send(&mut self, msg: &str) -> Result<(), TransportError>;

    /// False once the link has been closed, either by a `disconnect` or from the far end.
    fn is_connected(&self) -> bool {
        true
    }

    /// Send a pair of servo demands, steering first.
    fn send_dems(&mut self, dems: &ServoDems, codes: &ServoCodes) -> Result<(), TransportError> {
        self.send(&dems.steering.encode(codes))?;
        self.send(&dems.esc.encode(codes))
    }
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ServoCodes {
    /// Get the prefix code for the given channel.
    pub fn code(&self, channel: ServoChannel) -> &str {
        match channel {
            ServoChannel::Steering => &self.steering,
            ServoChannel::Esc => &self.esc,
        }
    }
}

impl ServoCmd {
    pub fn new(channel: ServoChannel, pulse_us: i32) -> Self {
        Self { channel, pulse_us }
    }

    /// Encode the command into the string sent to the vehicle.
    pub fn encode(&self, codes: &ServoCodes) -> String {
        format!("{}{}", codes.code(self.channel), self.pulse_us)
    }

    /// Decode a command string.
    ///
    /// The steering code is tried first, so the codes should not be prefixes of one another.
    pub fn decode(msg: &str, codes: &ServoCodes) -> Result<Self, TransportError> {
        for &channel in [ServoChannel::Steering, ServoChannel::Esc].iter() {
            if let Some(value) = msg.strip_prefix(codes.code(channel)) {
                return value
                    .parse::<i32>()
                    .map(|pulse_us| Self { channel, pulse_us })
                    .map_err(|_| TransportError::MalformedCommand(msg.to_string()));
            }
        }

        Err(TransportError::MalformedCommand(msg.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn codes() -> ServoCodes {
        ServoCodes {
            steering: "S".into(),
            esc: "E".into(),
        }
    }

    #[test]
    fn test_encode() {
        let cmd = ServoCmd::new(ServoChannel::Steering, 1540);
        assert_eq!(cmd.encode(&codes()), "S1540");

        let cmd = ServoCmd::new(ServoChannel::Esc, -20);
        assert_eq!(cmd.encode(&codes()), "E-20");
    }

    #[test]
    fn test_decode() {
        assert_eq!(
            ServoCmd::decode("E1620", &codes()).unwrap(),
            ServoCmd::new(ServoChannel::Esc, 1620)
        );
        assert!(matches!(
            ServoCmd::decode("S15x0", &codes()),
            Err(TransportError::MalformedCommand(_))
        ));
        assert!(matches!(
            ServoCmd::decode(GPS_REQUEST, &codes()),
            Err(TransportError::MalformedCommand(_))
        ));
    }

    struct Recorder(Vec<String>);

    impl Transport for Recorder {
        fn send(&mut self, msg: &str) -> Result<(), TransportError> {
            self.0.push(msg.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_send_dems_order() {
        let mut t = Recorder(vec![]);
        let dems = ServoDems {
            steering: ServoCmd::new(ServoChannel::Steering, 1400),
            esc: ServoCmd::new(ServoChannel::Esc, 1600),
        };

        t.send_dems(&dems, &codes()).unwrap();

        assert_eq!(t.0, vec!["S1400".to_string(), "E1600".to_string()]);
        assert!(t.is_connected());
    }
}
