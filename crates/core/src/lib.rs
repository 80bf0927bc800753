//! Core traits and types for simulating constrained mechanical systems.
//!
//! This crate defines the shared abstractions that the evaluator, integrator,
//! driver, and models build on:
//!
//! - [`ModelEquations`]: the equations of one mechanical system: mass matrix,
//!   forcing terms, dimensions, initial state, labels
//! - [`GeneralizedState`]: velocities followed by positions
//! - [`RowMajorMatrix`]: the row-major buffer models fill, with the explicit
//!   transpose into column-major linear algebra storage
//! - [`OdeSystem`]: a first-order right-hand side consumed by integrators
//! - [`Observer`]: receives solver events and optionally returns control actions

mod dimensions;
mod layout;
mod model;
mod observer;
mod system;

pub mod state;

pub use dimensions::{DimensionError, Dimensions};
pub use layout::RowMajorMatrix;
pub use model::{Forcing, ModelEquations};
pub use observer::Observer;
pub use state::{GeneralizedState, LayoutError};
pub use system::OdeSystem;
