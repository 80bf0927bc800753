//! Equations of motion for a small library of mechanical systems.
//!
//! Each model implements [`ModelEquations`] with hand-derived mass matrices
//! and forcing terms in generalized coordinates:
//!
//! - [`FallingMass`]: a point mass under constant gravity
//! - [`DrivenOscillator`]: a mass-spring-damper with a sinusoidal drive input
//! - [`Pendulum`]: a point pendulum in Cartesian coordinates, held at its
//!   length by one holonomic constraint
//! - [`Crane`]: a gantry crane: a driven trolley carrying a swinging load
//!
//! Parameters are `serde`-deserializable, and [`ModelConfig`] selects a model
//! by its `kind` tag so a run can pick one at startup.
//!
//! [`ModelEquations`]: cds_core::ModelEquations

mod crane;
mod error;
mod falling_mass;
mod oscillator;
mod pendulum;
mod select;

pub use crane::{Crane, CraneParams};
pub use error::ParamError;
pub use falling_mass::{FallingMass, FallingMassParams};
pub use oscillator::{DrivenOscillator, DrivenOscillatorParams};
pub use pendulum::{Pendulum, PendulumParams};
pub use select::{AnyModel, ModelConfig};

/// Standard gravity, m/s².
pub const STANDARD_GRAVITY: f64 = 9.806_65;
