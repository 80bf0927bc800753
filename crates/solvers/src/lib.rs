//! Numerical machinery for constrained-dynamics simulation.
//!
//! - [`dynamics`]: turns model equations into generalized accelerations,
//!   eliminating a holonomic constraint through its Lagrange multiplier
//! - [`integrator`]: stiff integrators behind the [`Integrator`] trait
//! - [`transient`]: drivers that step an integrator at a fixed output cadence
//! - [`linalg`]: the dense LU factorization shared by the above
//!
//! [`Integrator`]: integrator::Integrator

pub mod dynamics;
pub mod integrator;
pub mod linalg;
pub mod transient;
