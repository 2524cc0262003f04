//! # Equipment Interface
//!
//! This module defines the interface structures which will be sent to equipment on the vehicle.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod servo;
