//! CSV trajectory output and solver diagnostics.
//!
//! # Modules
//!
//! - [`csv`]: header and row formatting, with every number written the way
//!   C's `%.6e` writes it
//! - [`traits`]: capability traits that let [`CsvObserver`] work with any
//!   event carrying a `(time, state)` sample
//! - [`diagnostics`]: the labelled block of integrator counters printed at
//!   the end of a run
//!
//! [`CsvObserver`] streams rows while the driver runs; [`write_trajectory`]
//! writes a finished [`Trajectory`] in one go. Both produce identical bytes.
//!
//! [`Trajectory`]: cds_solvers::transient::driver::Trajectory

pub mod csv;
pub mod diagnostics;
pub mod traits;

mod writer;

pub use diagnostics::Diagnostics;
pub use writer::{CsvObserver, write_trajectory};
