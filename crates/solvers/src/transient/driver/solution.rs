use crate::integrator::{StatusCode, Stats};

use super::Trajectory;

/// Indicates how the driver terminated.
#[derive(Debug)]
pub enum Status<E> {
    /// Recorded every output sample.
    Complete,

    /// Stopped early due to an observer action.
    StoppedByObserver,

    /// The integrator failed; no further samples can be taken.
    Failed(E),
}

impl<E> Status<E> {
    /// Returns `true` if the run ended in an integrator failure.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// The result of a driver run that got past setup.
#[derive(Debug)]
pub struct Solution<E> {
    /// How the driver terminated.
    pub status: Status<E>,

    /// Samples recorded before termination, in output order.
    pub trajectory: Trajectory,

    /// Integrator counters at termination.
    pub stats: Stats,

    /// Status code of the last successful advance, or [`SUCCESS`] if none ran.
    ///
    /// [`SUCCESS`]: crate::integrator::SUCCESS
    pub last_code: i32,
}

impl<E: StatusCode> Solution<E> {
    /// The final integrator status code.
    ///
    /// This is the failure's code if the run failed, and the code of the
    /// last advance otherwise.
    pub fn code(&self) -> i32 {
        match &self.status {
            Status::Failed(err) => err.code(),
            Status::Complete | Status::StoppedByObserver => self.last_code,
        }
    }
}
