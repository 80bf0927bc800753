//! Variable-step, variable-order BDF integrator for stiff systems.
//!
//! # Algorithm
//!
//! Each internal step solves the BDF-k equation for the new state
//!
//! ```text
//! x_{n+1} - γ f(t_{n+1}, x_{n+1}) - ψ = 0,   γ = h / α_0
//! ```
//!
//! where `α_j` are recomputed from the actual step history (so step sizes can
//! vary freely) and `ψ` collects the history terms. The equation is solved by
//! a modified Newton iteration on `I - γ J`, with `J` a difference-quotient
//! Jacobian that is reused across steps until it goes stale.
//!
//! The local error is estimated from the difference between the corrected
//! state and a predictor interpolating one more history point than the
//! corrector uses. With `σ_k` the oldest predictor node and
//! `S = α_0 / h`, the estimate is
//!
//! ```text
//! lte ≈ (x_{n+1} - x_pred) / (1 + S · (t_{n+1} - σ_k))
//! ```
//!
//! which follows the actual node spacing and reduces to the usual constants
//! for equal steps. It is measured in a weighted RMS norm with weights
//! `1 / (rel_tol · |x_i| + abs_tol_i)`. A norm at or below one passes.
//!
//! # Step and order control
//!
//! - Step size follows `0.9 · err^(-1/(k+1))`, bounded per step.
//! - Order rises by one after `k + 1` consecutive successes, up to the
//!   configured maximum.
//! - Repeated error-test failures within one step discard the history and
//!   restart at order 1 from the current state, as if the run began there.
//! - Internal steps are clipped so that the last step of an advance lands on
//!   the requested output time.
//!
//! # Failures
//!
//! Right-hand-side errors are fatal. Repeated error-test or convergence
//! failures, step-size underflow, and exhausting the per-advance step budget
//! are fatal as well; see [`Error`] for status codes.

mod coefficients;
mod config;
mod error;

#[cfg(test)]
mod tests;

pub use config::{Config, ConfigError, MAX_ORDER};
pub use error::Error;

use cds_core::OdeSystem;
use nalgebra::{DMatrix, DVector};
use tracing::{debug, trace};

use crate::linalg::{lu_factor_in_place, lu_solve_in_place};

use self::coefficients::{bdf_coefficients, interpolation_weights};

use super::{Advance, AdvanceStatus, Integrator, Stats, Warning};

/// Newton iterations allowed per step attempt.
const MAX_NEWTON_ITERS: usize = 4;

/// Weighted norm of a Newton correction that counts as converged.
const NEWTON_TOL: f64 = 0.1;

/// Convergence rate above which the Newton iteration is abandoned.
const MAX_NEWTON_RATE: f64 = 0.9;

/// Error-test failures allowed within one step.
const MAX_ERR_FAILS: usize = 10;

/// Error-test failures within one step after which the history is restarted.
const ERR_FAILS_RESTART: usize = 3;

/// Convergence failures allowed within one step.
const MAX_CONV_FAILS: usize = 10;

/// Accepted steps after which the Jacobian is refreshed.
const MAX_JAC_AGE: usize = 20;

/// Relative change in `γ` that forces a new iteration matrix.
const GAMMA_CHANGE: f64 = 0.3;

/// The variable-step, variable-order BDF integrator.
///
/// All workspace is allocated in [`new`](Self::new) from the state length
/// and reused for every step.
#[derive(Debug)]
pub struct Bdf {
    config: Config,
    t: f64,
    h: f64,
    order: usize,
    successes: usize,
    started: bool,

    // Accepted history, newest first.
    times: [f64; MAX_ORDER + 1],
    states: Vec<DVector<f64>>,
    hist_len: usize,
    f_start: DVector<f64>,

    // Step workspace.
    weights: DVector<f64>,
    pred: DVector<f64>,
    psi: DVector<f64>,
    x_new: DVector<f64>,
    f: DVector<f64>,
    delta: DVector<f64>,
    x_pert: DVector<f64>,
    f_pert: DVector<f64>,

    // Linear-solver workspace.
    jac: DMatrix<f64>,
    iter: DMatrix<f64>,
    piv: Vec<usize>,
    has_jac: bool,
    jac_stale: bool,
    jac_age: usize,
    has_factors: bool,
    gamma_setup: f64,

    stats: Stats,
}

/// Outcome of one Newton solve.
enum Correction {
    Converged,
    Failed,
}

impl Bdf {
    /// Creates an integrator starting from `x0` at `t0`.
    ///
    /// A single `abs_tol` component is broadcast across the state.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AbsTolLength`] if `config.abs_tol()` has neither
    /// one component nor one per state entry.
    pub fn new(config: Config, t0: f64, x0: &[f64]) -> Result<Self, ConfigError> {
        let n = x0.len();
        let config = config.expand_abs_tol(n)?;

        let cap = config.max_order() + 1;
        let mut states = vec![DVector::zeros(n); cap];
        states[0].copy_from_slice(x0);

        let mut times = [0.0; MAX_ORDER + 1];
        times[0] = t0;

        Ok(Self {
            config,
            t: t0,
            h: 0.0,
            order: 1,
            successes: 0,
            started: false,
            times,
            states,
            hist_len: 1,
            f_start: DVector::zeros(n),
            weights: DVector::zeros(n),
            pred: DVector::zeros(n),
            psi: DVector::zeros(n),
            x_new: DVector::zeros(n),
            f: DVector::zeros(n),
            delta: DVector::zeros(n),
            x_pert: DVector::zeros(n),
            f_pert: DVector::zeros(n),
            jac: DMatrix::zeros(n, n),
            iter: DMatrix::zeros(n, n),
            piv: vec![0; n],
            has_jac: false,
            jac_stale: false,
            jac_age: 0,
            has_factors: false,
            gamma_setup: 0.0,
            stats: Stats::default(),
        })
    }

    /// The config in use, with `abs_tol` expanded to one entry per component.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The order the next step will try.
    #[must_use]
    pub fn order(&self) -> usize {
        self.order
    }

    /// The step size the next step will try.
    #[must_use]
    pub fn step_size(&self) -> f64 {
        self.h
    }

    fn n(&self) -> usize {
        self.f.len()
    }

    /// Evaluates `f(t0, x0)` and picks the first step size.
    fn start<S: OdeSystem>(&mut self, system: &mut S, t_out: f64) -> Result<(), Error> {
        system
            .rhs(self.t, self.states[0].as_slice(), self.f_start.as_mut_slice())
            .map_err(|e| Error::rhs(self.t, e))?;
        self.stats.rhs_evals += 1;

        self.update_weights();
        let h0 = match self.config.initial_step() {
            Some(h0) => h0,
            None => {
                let d0 = self.wrms(&self.states[0]);
                let d1 = self.wrms(&self.f_start);
                let mut h0 = if d0 < 1e-5 || d1 < 1e-5 {
                    1e-6
                } else {
                    0.01 * d0 / d1
                };
                let span = (t_out - self.t).abs();
                if span > 0.0 {
                    h0 = h0.min(span);
                }
                h0
            }
        };
        self.h = h0.clamp(self.config.min_step(), self.config.max_step());
        self.started = true;
        debug!(t0 = self.t, h0 = self.h, "bdf started");
        Ok(())
    }

    /// Drops all history but the current point and re-evaluates its slope.
    fn restart<S: OdeSystem>(&mut self, system: &mut S) -> Result<(), Error> {
        system
            .rhs(self.t, self.states[0].as_slice(), self.f_start.as_mut_slice())
            .map_err(|e| Error::rhs(self.t, e))?;
        self.stats.rhs_evals += 1;

        self.hist_len = 1;
        self.order = 1;
        self.successes = 0;
        debug!(t = self.t, "bdf history restarted");
        Ok(())
    }

    fn update_weights(&mut self) {
        let rel_tol = self.config.rel_tol();
        for (i, w) in self.weights.iter_mut().enumerate() {
            *w = 1.0 / (rel_tol * self.states[0][i].abs() + self.config.abs_tol()[i]);
        }
    }

    /// Weighted root-mean-square norm.
    fn wrms(&self, v: &DVector<f64>) -> f64 {
        let sum: f64 = v
            .iter()
            .zip(self.weights.iter())
            .map(|(vi, wi)| (vi * wi).powi(2))
            .sum();
        #[allow(clippy::cast_precision_loss)]
        let n = self.n() as f64;
        (sum / n).sqrt()
    }

    /// Takes one accepted internal step of at most `h` toward `t_end`.
    ///
    /// Returns a warning if the step was accepted despite a missed error test.
    fn step<S: OdeSystem>(
        &mut self,
        system: &mut S,
        mut h: f64,
        t_end: f64,
    ) -> Result<Option<Warning>, Error> {
        let clipped = h < self.h;
        let mut err_fails = 0;
        let mut conv_fails = 0;
        self.update_weights();

        loop {
            let t_new = if h >= t_end - self.t {
                t_end
            } else {
                self.t + h
            };
            if t_new <= self.t {
                return Err(Error::StepUnderflow { t: self.t, h });
            }
            let h_eff = t_new - self.t;

            // The predictor needs one history point beyond the corrector's.
            let k = if self.hist_len == 1 {
                1
            } else {
                self.order.min(self.hist_len - 1)
            };
            let mut nodes = [0.0; MAX_ORDER + 2];
            nodes[0] = t_new;
            nodes[1..=k].copy_from_slice(&self.times[..k]);
            let mut alpha = [0.0; MAX_ORDER + 2];
            bdf_coefficients(&nodes[..=k], h_eff, &mut alpha);

            self.predict(t_new, h_eff, k);

            let gamma = h_eff / alpha[0];
            self.psi.fill(0.0);
            for j in 1..=k {
                self.psi.axpy(-alpha[j] / alpha[0], &self.states[j - 1], 1.0);
            }

            match self.correct(system, t_new, gamma)? {
                Correction::Converged => {}
                Correction::Failed => {
                    conv_fails += 1;
                    self.stats.nonlin_conv_fails += 1;
                    if conv_fails >= MAX_CONV_FAILS {
                        return Err(Error::ConvergenceFailures { t: self.t, h: h_eff });
                    }
                    if self.jac_age > 0 || !self.has_jac {
                        // Retry the same step with a fresh Jacobian.
                        self.jac_stale = true;
                    } else {
                        h = h_eff * 0.25;
                        if h < self.config.min_step() {
                            return Err(Error::ConvergenceFailures { t: self.t, h });
                        }
                    }
                    trace!(t = self.t, h, conv_fails, "bdf corrector failed");
                    continue;
                }
            }

            self.delta.copy_from(&self.x_new);
            self.delta -= &self.pred;
            let error_constant = if self.hist_len == 1 {
                0.5
            } else {
                let spread = alpha[0] / h_eff * (t_new - self.times[k]);
                1.0 / (1.0 + spread)
            };
            let err = error_constant * self.wrms(&self.delta);

            let mut warning = None;
            if err > 1.0 || err.is_nan() {
                let at_min_step = self.config.min_step() > 0.0
                    && h_eff <= self.config.min_step() * (1.0 + 1e-10);
                if at_min_step && err <= 2.0 {
                    warning = Some(Warning::ToleranceMissed {
                        t: t_new,
                        error_norm: err,
                    });
                } else {
                    self.stats.err_test_fails += 1;
                    err_fails += 1;
                    if err_fails >= MAX_ERR_FAILS {
                        return Err(Error::ErrorTestFailures { t: self.t, h: h_eff });
                    }
                    let floor = if err_fails >= ERR_FAILS_RESTART {
                        if self.hist_len > 1 || self.order > 1 {
                            self.restart(system)?;
                        }
                        0.1
                    } else {
                        0.2
                    };
                    #[allow(clippy::cast_precision_loss)]
                    let factor = if err.is_finite() {
                        (0.9 * err.powf(-1.0 / (k as f64 + 1.0))).clamp(floor, 0.9)
                    } else {
                        floor
                    };
                    h = (h_eff * factor).max(self.config.min_step());
                    trace!(t = self.t, err, h, "bdf error test failed");
                    continue;
                }
            }

            self.accept(t_new);

            #[allow(clippy::cast_precision_loss)]
            let mut factor = if err > 0.0 {
                0.9 * err.powf(-1.0 / (k as f64 + 1.0))
            } else {
                f64::INFINITY
            };
            let max_growth = if k == 1 { 5.0 } else { 2.0 };
            factor = factor.clamp(0.2, max_growth);
            if err_fails > 0 || conv_fails > 0 {
                factor = factor.min(1.0);
            }
            if (1.0..1.2).contains(&factor) {
                factor = 1.0;
            }
            let h_next =
                (h_eff * factor).clamp(self.config.min_step(), self.config.max_step());
            self.h = if clipped && err_fails == 0 && conv_fails == 0 {
                self.h.max(h_next)
            } else {
                h_next
            };

            self.successes += 1;
            if self.successes > k
                && self.order < self.config.max_order()
                && self.hist_len > self.order + 1
            {
                self.order += 1;
                self.successes = 0;
                trace!(t = self.t, order = self.order, "bdf order raised");
            }

            return Ok(warning);
        }
    }

    /// Fills `pred` with the extrapolated state at `t_new`.
    fn predict(&mut self, t_new: f64, h: f64, k: usize) {
        if self.hist_len == 1 {
            self.pred.copy_from(&self.states[0]);
            self.pred.axpy(h, &self.f_start, 1.0);
            return;
        }

        let mut weights = [0.0; MAX_ORDER + 1];
        interpolation_weights(t_new, &self.times[..=k], &mut weights);
        self.pred.fill(0.0);
        for (j, &w) in weights[..=k].iter().enumerate() {
            self.pred.axpy(w, &self.states[j], 1.0);
        }
    }

    /// Solves the corrector equation starting from `pred`.
    fn correct<S: OdeSystem>(
        &mut self,
        system: &mut S,
        t_new: f64,
        gamma: f64,
    ) -> Result<Correction, Error> {
        let refresh_jac = !self.has_jac || self.jac_stale || self.jac_age >= MAX_JAC_AGE;
        let gamma_moved =
            self.gamma_setup == 0.0 || (gamma / self.gamma_setup - 1.0).abs() > GAMMA_CHANGE;

        if refresh_jac {
            self.evaluate_jacobian(system, t_new)?;
        }
        if refresh_jac || gamma_moved || !self.has_factors {
            self.iter.copy_from(&self.jac);
            self.iter *= -gamma;
            for i in 0..self.n() {
                self.iter[(i, i)] += 1.0;
            }
            self.stats.lin_setups += 1;
            self.gamma_setup = gamma;
            if lu_factor_in_place(&mut self.iter, &mut self.piv).is_err() {
                self.has_factors = false;
                return Ok(Correction::Failed);
            }
            self.has_factors = true;
        }

        // Stale γ in the iteration matrix slows convergence; this rescaling
        // restores the step length of the correction.
        let scale = 2.0 / (1.0 + gamma / self.gamma_setup);

        self.x_new.copy_from(&self.pred);
        let mut previous = f64::INFINITY;
        for iteration in 0..MAX_NEWTON_ITERS {
            system
                .rhs(t_new, self.x_new.as_slice(), self.f.as_mut_slice())
                .map_err(|e| Error::rhs(t_new, e))?;
            self.stats.rhs_evals += 1;
            self.stats.nonlin_iters += 1;

            // δ = ψ + γ f - x
            self.delta.copy_from(&self.psi);
            self.delta.axpy(gamma, &self.f, 1.0);
            self.delta -= &self.x_new;
            lu_solve_in_place(&self.iter, &self.piv, &mut self.delta);
            if (scale - 1.0).abs() > f64::EPSILON {
                self.delta *= scale;
            }
            self.x_new += &self.delta;

            let norm = self.wrms(&self.delta);
            if !norm.is_finite() {
                return Ok(Correction::Failed);
            }
            if norm <= NEWTON_TOL {
                return Ok(Correction::Converged);
            }
            if iteration > 0 && norm > MAX_NEWTON_RATE * previous {
                return Ok(Correction::Failed);
            }
            previous = norm;
        }
        Ok(Correction::Failed)
    }

    /// Builds `J ≈ ∂f/∂x` at `(t, pred)` by forward differences.
    fn evaluate_jacobian<S: OdeSystem>(&mut self, system: &mut S, t: f64) -> Result<(), Error> {
        system
            .rhs(t, self.pred.as_slice(), self.f.as_mut_slice())
            .map_err(|e| Error::rhs(t, e))?;
        self.stats.rhs_evals += 1;

        let sqrt_eps = f64::EPSILON.sqrt();
        self.x_pert.copy_from(&self.pred);
        for j in 0..self.n() {
            let xj = self.pred[j];
            let mut inc = sqrt_eps * xj.abs().max(1.0 / self.weights[j]);
            if inc == 0.0 {
                inc = sqrt_eps;
            }
            self.x_pert[j] = xj + inc;
            let inc = self.x_pert[j] - xj;

            system
                .rhs(t, self.x_pert.as_slice(), self.f_pert.as_mut_slice())
                .map_err(|e| Error::rhs(t, e))?;
            self.stats.lin_rhs_evals += 1;

            for i in 0..self.n() {
                self.jac[(i, j)] = (self.f_pert[i] - self.f[i]) / inc;
            }
            self.x_pert[j] = xj;
        }

        self.stats.jac_evals += 1;
        self.has_jac = true;
        self.jac_stale = false;
        self.jac_age = 0;
        Ok(())
    }

    /// Pushes `x_new` at `t_new` onto the history.
    fn accept(&mut self, t_new: f64) {
        let cap = self.states.len();
        self.states.rotate_right(1);
        self.times[..cap].rotate_right(1);
        self.states[0].copy_from(&self.x_new);
        self.times[0] = t_new;
        self.hist_len = (self.hist_len + 1).min(cap);

        self.t = t_new;
        self.stats.steps += 1;
        self.jac_age += 1;
    }
}

impl<S: OdeSystem> Integrator<S> for Bdf {
    type Error = Error;

    fn advance(&mut self, system: &mut S, t_out: f64, x: &mut [f64]) -> Result<Advance, Error> {
        let roundoff = 100.0 * f64::EPSILON * self.t.abs().max(t_out.abs());
        if t_out < self.t - roundoff {
            return Err(Error::BadOutputTime { t: self.t, t_out });
        }
        if !self.started {
            self.start(system, t_out)?;
        }

        let mut status = AdvanceStatus::Success;
        let mut steps = 0;
        while self.t < t_out - roundoff {
            if steps >= self.config.max_steps() {
                return Err(Error::TooMuchWork {
                    t: self.t,
                    t_out,
                    max_steps: self.config.max_steps(),
                });
            }

            let remaining = t_out - self.t;
            let h = if self.h * 1.001 >= remaining {
                remaining
            } else if self.h * 2.0 > remaining {
                // Split what is left instead of leaving a sliver.
                0.5 * remaining
            } else {
                self.h
            };

            if let Some(warning) = self.step(system, h, t_out)? {
                status = AdvanceStatus::Warning(warning);
            }
            steps += 1;
        }

        x.copy_from_slice(self.states[0].as_slice());
        Ok(Advance {
            time: self.t,
            status,
        })
    }

    fn time(&self) -> f64 {
        self.t
    }

    fn stats(&self) -> Stats {
        self.stats
    }
}
