use thiserror::Error;

/// Highest BDF order supported; orders above 5 are not zero-stable.
pub const MAX_ORDER: usize = 5;

/// Configuration for the BDF integrator.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    rel_tol: f64,
    abs_tol: Vec<f64>,
    max_steps: usize,
    max_order: usize,
    min_step: f64,
    max_step: f64,
    initial_step: Option<f64>,
}

/// Errors that can occur when validating a BDF config.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("rel_tol must be finite and non-negative, got {0}")]
    RelTol(f64),

    #[error("abs_tol[{index}] must be finite and positive, got {value}")]
    AbsTol { index: usize, value: f64 },

    #[error("abs_tol has {actual} components but the state has {expected}")]
    AbsTolLength { expected: usize, actual: usize },

    #[error("max_steps must be at least 1")]
    MaxSteps,

    #[error("max_order must be between 1 and {MAX_ORDER}, got {0}")]
    MaxOrder(usize),

    #[error("min_step must be finite and non-negative, got {0}")]
    MinStep(f64),

    #[error("max_step must be positive and not below min_step, got {0}")]
    MaxStep(f64),

    #[error("initial_step must be finite and positive, got {0}")]
    InitialStep(f64),
}

impl Config {
    /// Creates a config with validated tolerances and an internal-step budget.
    ///
    /// `max_steps` bounds the internal steps taken per advance request.
    ///
    /// # Errors
    ///
    /// Returns an error if `rel_tol` is negative or non-finite, any `abs_tol`
    /// component is non-positive or non-finite, `abs_tol` is empty, or
    /// `max_steps` is zero.
    pub fn new(rel_tol: f64, abs_tol: Vec<f64>, max_steps: usize) -> Result<Self, ConfigError> {
        if !rel_tol.is_finite() || rel_tol < 0.0 {
            return Err(ConfigError::RelTol(rel_tol));
        }
        if abs_tol.is_empty() {
            return Err(ConfigError::AbsTolLength {
                expected: 1,
                actual: 0,
            });
        }
        if let Some((index, &value)) = abs_tol
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v <= 0.0)
        {
            return Err(ConfigError::AbsTol { index, value });
        }
        if max_steps == 0 {
            return Err(ConfigError::MaxSteps);
        }

        Ok(Self {
            rel_tol,
            abs_tol,
            max_steps,
            max_order: MAX_ORDER,
            min_step: 0.0,
            max_step: f64::INFINITY,
            initial_step: None,
        })
    }

    /// Limits the method order.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_order` is outside `1..=MAX_ORDER`.
    pub fn with_max_order(mut self, max_order: usize) -> Result<Self, ConfigError> {
        if !(1..=MAX_ORDER).contains(&max_order) {
            return Err(ConfigError::MaxOrder(max_order));
        }
        self.max_order = max_order;
        Ok(self)
    }

    /// Sets a lower bound on the internal step size.
    ///
    /// At this bound a step that narrowly misses the error test is accepted
    /// with a warning instead of failing.
    ///
    /// # Errors
    ///
    /// Returns an error if `min_step` is negative, non-finite, or above `max_step`.
    pub fn with_min_step(mut self, min_step: f64) -> Result<Self, ConfigError> {
        if !min_step.is_finite() || min_step < 0.0 {
            return Err(ConfigError::MinStep(min_step));
        }
        if min_step > self.max_step {
            return Err(ConfigError::MaxStep(self.max_step));
        }
        self.min_step = min_step;
        Ok(self)
    }

    /// Sets an upper bound on the internal step size.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_step` is not positive or is below `min_step`.
    pub fn with_max_step(mut self, max_step: f64) -> Result<Self, ConfigError> {
        if max_step.is_nan() || max_step <= 0.0 || max_step < self.min_step {
            return Err(ConfigError::MaxStep(max_step));
        }
        self.max_step = max_step;
        Ok(self)
    }

    /// Uses a fixed first step instead of estimating one.
    ///
    /// # Errors
    ///
    /// Returns an error if `initial_step` is not finite and positive.
    pub fn with_initial_step(mut self, initial_step: f64) -> Result<Self, ConfigError> {
        if !initial_step.is_finite() || initial_step <= 0.0 {
            return Err(ConfigError::InitialStep(initial_step));
        }
        self.initial_step = Some(initial_step);
        Ok(self)
    }

    /// Broadcasts a single `abs_tol` component across `n` state entries.
    pub(super) fn expand_abs_tol(mut self, n: usize) -> Result<Self, ConfigError> {
        match self.abs_tol.len() {
            len if len == n => Ok(self),
            1 => {
                self.abs_tol = vec![self.abs_tol[0]; n];
                Ok(self)
            }
            len => Err(ConfigError::AbsTolLength {
                expected: n,
                actual: len,
            }),
        }
    }

    #[must_use]
    pub fn rel_tol(&self) -> f64 {
        self.rel_tol
    }

    /// Per-component absolute tolerances.
    #[must_use]
    pub fn abs_tol(&self) -> &[f64] {
        &self.abs_tol
    }

    /// Internal-step budget per advance request.
    #[must_use]
    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    #[must_use]
    pub fn max_order(&self) -> usize {
        self.max_order
    }

    #[must_use]
    pub fn min_step(&self) -> f64 {
        self.min_step
    }

    #[must_use]
    pub fn max_step(&self) -> f64 {
        self.max_step
    }

    #[must_use]
    pub fn initial_step(&self) -> Option<f64> {
        self.initial_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_vector_tolerances() {
        let config = Config::new(1e-7, vec![1e-7, 1e-6], 500).unwrap();
        assert_eq!(config.abs_tol(), &[1e-7, 1e-6]);
        assert_eq!(config.max_order(), MAX_ORDER);
        assert_eq!(config.min_step(), 0.0);
        assert!(config.max_step().is_infinite());
    }

    #[test]
    fn rejects_bad_tolerances() {
        assert_eq!(
            Config::new(-1.0, vec![1e-6], 10),
            Err(ConfigError::RelTol(-1.0))
        );
        assert_eq!(
            Config::new(1e-6, vec![1e-6, 0.0], 10),
            Err(ConfigError::AbsTol {
                index: 1,
                value: 0.0
            })
        );
        assert!(matches!(
            Config::new(1e-6, vec![f64::NAN], 10),
            Err(ConfigError::AbsTol { index: 0, .. })
        ));
        assert!(matches!(
            Config::new(1e-6, vec![], 10),
            Err(ConfigError::AbsTolLength { .. })
        ));
    }

    #[test]
    fn broadcasts_scalar_abs_tol() {
        let config = Config::new(1e-6, vec![1e-8], 10).unwrap();
        let expanded = config.clone().expand_abs_tol(3).unwrap();
        assert_eq!(expanded.abs_tol(), &[1e-8, 1e-8, 1e-8]);

        let vector = Config::new(1e-6, vec![1e-8, 1e-7], 10).unwrap();
        assert_eq!(
            vector.expand_abs_tol(3),
            Err(ConfigError::AbsTolLength {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn rejects_zero_step_budget() {
        assert_eq!(Config::new(1e-6, vec![1e-6], 0), Err(ConfigError::MaxSteps));
    }

    #[test]
    fn validates_step_bounds_and_order() {
        let config = Config::new(1e-6, vec![1e-6], 10).unwrap();

        assert_eq!(
            config.clone().with_max_order(6),
            Err(ConfigError::MaxOrder(6))
        );
        assert_eq!(
            config.clone().with_max_order(0),
            Err(ConfigError::MaxOrder(0))
        );
        assert_eq!(config.clone().with_max_order(2).unwrap().max_order(), 2);

        assert_eq!(
            config.clone().with_min_step(-1.0),
            Err(ConfigError::MinStep(-1.0))
        );
        let bounded = config
            .clone()
            .with_max_step(0.1)
            .and_then(|c| c.with_min_step(1e-6))
            .unwrap();
        assert_eq!(bounded.max_step(), 0.1);
        assert_eq!(bounded.min_step(), 1e-6);
        assert!(bounded.with_max_step(1e-9).is_err());

        assert!(config.clone().with_initial_step(0.0).is_err());
        assert_eq!(config.with_initial_step(1e-3).unwrap().initial_step(), Some(1e-3));
    }
}
