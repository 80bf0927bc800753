use thiserror::Error;

use crate::integrator::bdf;

/// Relative tolerance used when none is configured.
pub const DEFAULT_REL_TOL: f64 = 1e-7;

/// Absolute tolerance, per component, used when none is configured.
pub const DEFAULT_ABS_TOL: f64 = 1e-7;

/// Internal-step budget per output interval used when none is configured.
pub const DEFAULT_MAX_INTERNAL_STEPS: usize = 10_000;

/// Slack, in units of `dt`, allowed when counting output samples so that a
/// span that is an exact multiple of `dt` is not cut short by rounding.
const SAMPLE_GUARD: f64 = 1e-9;

/// Run configuration for the driver.
///
/// Output times are `t_initial + k · dt` for `k = 1..=num_samples()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    t_initial: f64,
    t_final: f64,
    dt: f64,
    integrator: bdf::Config,
}

/// Errors that can occur when validating a driver config.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("t_initial and t_final must be finite, got {t_initial} and {t_final}")]
    NonFiniteTime { t_initial: f64, t_final: f64 },

    #[error("t_final ({t_final}) is before t_initial ({t_initial})")]
    ReversedSpan { t_initial: f64, t_final: f64 },

    #[error("dt must be finite and positive, got {0}")]
    Dt(f64),

    #[error("integrator: {0}")]
    Integrator(#[from] bdf::ConfigError),
}

impl Config {
    /// Creates a config with the default integrator settings.
    ///
    /// # Errors
    ///
    /// Returns an error if a time is non-finite, `t_final < t_initial`, or
    /// `dt` is not finite and positive.
    pub fn new(t_initial: f64, t_final: f64, dt: f64) -> Result<Self, ConfigError> {
        if !t_initial.is_finite() || !t_final.is_finite() {
            return Err(ConfigError::NonFiniteTime { t_initial, t_final });
        }
        if t_final < t_initial {
            return Err(ConfigError::ReversedSpan { t_initial, t_final });
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ConfigError::Dt(dt));
        }

        let integrator = bdf::Config::new(
            DEFAULT_REL_TOL,
            vec![DEFAULT_ABS_TOL],
            DEFAULT_MAX_INTERNAL_STEPS,
        )?;

        Ok(Self {
            t_initial,
            t_final,
            dt,
            integrator,
        })
    }

    /// Replaces the integrator settings.
    #[must_use]
    pub fn with_integrator(mut self, integrator: bdf::Config) -> Self {
        self.integrator = integrator;
        self
    }

    #[must_use]
    pub fn t_initial(&self) -> f64 {
        self.t_initial
    }

    #[must_use]
    pub fn t_final(&self) -> f64 {
        self.t_final
    }

    /// The output interval.
    #[must_use]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    #[must_use]
    pub fn integrator(&self) -> &bdf::Config {
        &self.integrator
    }

    /// Number of output samples, `⌊(t_final - t_initial) / dt⌋`.
    #[must_use]
    pub fn num_samples(&self) -> usize {
        let ratio = (self.t_final - self.t_initial) / self.dt;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let samples = (ratio + SAMPLE_GUARD).floor() as usize;
        samples
    }

    /// The `k`-th output time, `t_initial + k · dt`.
    ///
    /// Computed from `k` directly so rounding does not accumulate.
    #[must_use]
    pub fn output_time(&self, k: usize) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let k = k as f64;
        self.t_initial + k * self.dt
    }
}
