//! Stiff integrators that advance an [`OdeSystem`] to requested output times.
//!
//! The driver talks to integrators through the [`Integrator`] trait: it asks
//! for the state at `t_out` and gets back the time actually reached. That
//! time is authoritative; callers must not assume it equals `t_out`.
//!
//! # Integrators
//!
//! - [`bdf`]: variable-step, variable-order backward differentiation with a
//!   Newton corrector and dense LU
//!
//! [`OdeSystem`]: cds_core::OdeSystem

mod stats;

pub mod bdf;

pub use stats::Stats;

use cds_core::OdeSystem;

/// Status code reported for a successful advance.
pub const SUCCESS: i32 = 0;

/// Status code reported for an advance that succeeded with a warning.
pub const WARNING: i32 = 99;

/// A recoverable condition: the step was accepted and integration continues.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Warning {
    /// The error test failed at the minimum step size, by no more than a
    /// factor of two, and the step was accepted anyway.
    ToleranceMissed { t: f64, error_norm: f64 },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ToleranceMissed { t, error_norm } => write!(
                f,
                "local error test missed at minimum step (t = {t}, weighted error = {error_norm:.3})"
            ),
        }
    }
}

/// How an advance request finished.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdvanceStatus {
    Success,

    /// At least one accepted step raised a warning; the last one is kept.
    Warning(Warning),
}

impl AdvanceStatus {
    /// The status code for this outcome: [`SUCCESS`] or [`WARNING`].
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::Warning(_) => WARNING,
        }
    }
}

/// The result of a successful advance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Advance {
    /// The time the state actually corresponds to.
    pub time: f64,

    pub status: AdvanceStatus,
}

/// Errors that map to a numeric integrator status code.
///
/// Codes are negative for fatal failures.
pub trait StatusCode {
    fn code(&self) -> i32;
}

/// A stiff integrator holding its own step history and counters.
pub trait Integrator<S: OdeSystem> {
    type Error: std::error::Error + StatusCode + Send + Sync + 'static;

    /// Advances the internal solution to `t_out` and writes the state there into `x`.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] on a fatal failure. The integrator cannot
    /// continue after an error; `x` is left unchanged.
    fn advance(&mut self, system: &mut S, t_out: f64, x: &mut [f64]) -> Result<Advance, Self::Error>;

    /// The current internal time.
    fn time(&self) -> f64;

    /// Cumulative solver counters.
    fn stats(&self) -> Stats;
}
