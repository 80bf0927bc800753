use std::error::Error as StdError;

use crate::integrator::StatusCode;

/// Fatal failures of the BDF integrator.
///
/// Each variant carries the CVODE-convention status code returned by
/// [`StatusCode::code`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("took {max_steps} internal steps before reaching t = {t_out} (stopped at t = {t})")]
    TooMuchWork { t: f64, t_out: f64, max_steps: usize },

    #[error("local error test failed repeatedly at t = {t} with h = {h}")]
    ErrorTestFailures { t: f64, h: f64 },

    #[error("step size underflow at t = {t} (h = {h})")]
    StepUnderflow { t: f64, h: f64 },

    #[error("corrector failed to converge repeatedly at t = {t} with h = {h}")]
    ConvergenceFailures { t: f64, h: f64 },

    #[error("right-hand side failed at t = {t}: {source}")]
    RhsFailed {
        t: f64,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("output time {t_out} is behind the current time {t}")]
    BadOutputTime { t: f64, t_out: f64 },
}

impl Error {
    pub(crate) fn rhs<E: StdError + Send + Sync + 'static>(t: f64, err: E) -> Self {
        Self::RhsFailed {
            t,
            source: Box::new(err),
        }
    }
}

impl StatusCode for Error {
    fn code(&self) -> i32 {
        match self {
            Self::TooMuchWork { .. } => -1,
            Self::ErrorTestFailures { .. } | Self::StepUnderflow { .. } => -3,
            Self::ConvergenceFailures { .. } => -4,
            Self::RhsFailed { .. } => -8,
            Self::BadOutputTime { .. } => -22,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::error::Error as _;

    #[test]
    fn codes_follow_cvode_convention() {
        let too_much = Error::TooMuchWork {
            t: 0.5,
            t_out: 1.0,
            max_steps: 10,
        };
        assert_eq!(too_much.code(), -1);
        assert_eq!(Error::StepUnderflow { t: 1.0, h: 0.0 }.code(), -3);
        assert_eq!(Error::ConvergenceFailures { t: 1.0, h: 1e-3 }.code(), -4);

        let rhs = Error::rhs(0.25, std::fmt::Error);
        assert_eq!(rhs.code(), -8);
        assert!(rhs.source().is_some());
    }
}
