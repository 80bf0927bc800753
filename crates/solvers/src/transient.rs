//! Drivers for transient simulations.
//!
//! # Drivers
//!
//! - [`driver`]: advances a stiff integrator through evenly spaced output
//!   times and records the state reached at each one

pub mod driver;
