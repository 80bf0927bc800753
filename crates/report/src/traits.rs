//! Capability traits for reporting observers.
//!
//! These traits abstract over driver-specific event and action types, so
//! reporting observers only need to know that an event carries a sample and
//! that an action can stop the run.
//!
//! # Example
//!
//! ```rust
//! use cds_core::Observer;
//! use cds_report::traits::{CanStopEarly, HasSample};
//!
//! struct StopAfter {
//!     t_stop: f64,
//! }
//!
//! impl<E: HasSample, A: CanStopEarly> Observer<E, A> for StopAfter {
//!     fn observe(&mut self, event: &E) -> Option<A> {
//!         (event.time() >= self.t_stop).then(A::stop_early)
//!     }
//! }
//! ```

use cds_solvers::transient::driver;

/// An event that carries a `(time, state)` sample.
pub trait HasSample {
    /// The sample time.
    fn time(&self) -> f64;

    /// The state at [`time`](Self::time).
    fn state(&self) -> &[f64];
}

/// An action type that can signal early termination.
pub trait CanStopEarly {
    /// Returns the action that stops the driver early.
    fn stop_early() -> Self;
}

impl HasSample for driver::Event {
    fn time(&self) -> f64 {
        self.time
    }

    fn state(&self) -> &[f64] {
        &self.state
    }
}

impl CanStopEarly for driver::Action {
    fn stop_early() -> Self {
        Self::StopEarly
    }
}
