use std::convert::Infallible;

use approx::assert_relative_eq;
use thiserror::Error;

use cds_core::OdeSystem;

use super::{Bdf, Config, Error};
use crate::integrator::{AdvanceStatus, Integrator, StatusCode};

/// x' = -k x
struct Decay {
    k: f64,
}

impl OdeSystem for Decay {
    type Error = Infallible;

    fn dimension(&self) -> usize {
        1
    }

    fn rhs(&mut self, _t: f64, x: &[f64], xd: &mut [f64]) -> Result<(), Self::Error> {
        xd[0] = -self.k * x[0];
        Ok(())
    }
}

/// x' = -λ (x - cos t) - sin t, with exact solution x = cos t from x(0) = 1.
struct StiffTracker {
    lambda: f64,
}

impl OdeSystem for StiffTracker {
    type Error = Infallible;

    fn dimension(&self) -> usize {
        1
    }

    fn rhs(&mut self, t: f64, x: &[f64], xd: &mut [f64]) -> Result<(), Self::Error> {
        xd[0] = -self.lambda * (x[0] - t.cos()) - t.sin();
        Ok(())
    }
}

/// Harmonic oscillator in velocity/position order: v' = -q, q' = v.
struct Oscillator;

impl OdeSystem for Oscillator {
    type Error = Infallible;

    fn dimension(&self) -> usize {
        2
    }

    fn rhs(&mut self, _t: f64, x: &[f64], xd: &mut [f64]) -> Result<(), Self::Error> {
        xd[0] = -x[1];
        xd[1] = x[0];
        Ok(())
    }
}

#[derive(Debug, Error)]
#[error("no derivative beyond t = {0}")]
struct Boundary(f64);

/// Fails once time passes a boundary.
struct FailsAfter {
    boundary: f64,
}

impl OdeSystem for FailsAfter {
    type Error = Boundary;

    fn dimension(&self) -> usize {
        1
    }

    fn rhs(&mut self, t: f64, _x: &[f64], xd: &mut [f64]) -> Result<(), Self::Error> {
        if t > self.boundary {
            return Err(Boundary(self.boundary));
        }
        xd[0] = 1.0;
        Ok(())
    }
}

fn config(rel_tol: f64, abs_tol: f64) -> Config {
    Config::new(rel_tol, vec![abs_tol], 10_000).unwrap()
}

#[test]
fn exponential_decay_matches_closed_form() {
    let mut system = Decay { k: 1.0 };
    let mut bdf = Bdf::new(config(1e-8, 1e-10), 0.0, &[1.0]).unwrap();
    let mut x = [1.0];

    for k in 1..=10 {
        let t_out = 0.5 * f64::from(k);
        let advance = bdf.advance(&mut system, t_out, &mut x).unwrap();
        assert_eq!(advance.status, AdvanceStatus::Success);
        assert_relative_eq!(advance.time, t_out, epsilon = 1e-12);
        assert_relative_eq!(x[0], (-t_out).exp(), max_relative = 1e-5);
    }

    let stats = Integrator::<Decay>::stats(&bdf);
    assert!(stats.steps > 10);
    assert!(stats.rhs_evals >= stats.nonlin_iters);
    assert!(stats.jac_evals >= 1);
    assert_eq!(stats.lin_rhs_evals, stats.jac_evals);
    assert!(bdf.order() > 1, "order should rise on a smooth problem");
}

#[test]
fn stiff_problem_takes_large_steps() {
    let mut system = StiffTracker { lambda: 1e5 };
    let mut bdf = Bdf::new(config(1e-6, 1e-8), 0.0, &[1.0]).unwrap();
    let mut x = [1.0];

    for k in 1..=20 {
        let t_out = 0.25 * f64::from(k);
        bdf.advance(&mut system, t_out, &mut x).unwrap();
        assert_relative_eq!(x[0], t_out.cos(), epsilon = 1e-4);
    }

    // An explicit method would need on the order of 1e5 · 5 steps.
    let steps = Integrator::<StiffTracker>::stats(&bdf).steps;
    assert!(steps < 5_000, "took {steps} steps");
}

#[test]
fn oscillator_stays_on_the_circle() {
    let mut system = Oscillator;
    let x0 = [0.0, 1.0];
    let mut bdf = Bdf::new(config(1e-9, 1e-11), 0.0, &x0).unwrap();
    let mut x = x0;

    let t_out = 2.0 * std::f64::consts::PI;
    bdf.advance(&mut system, t_out, &mut x).unwrap();

    // v = -sin t, q = cos t
    assert_relative_eq!(x[0], 0.0, epsilon = 1e-5);
    assert_relative_eq!(x[1], 1.0, epsilon = 1e-5);
}

#[test]
fn budget_exhaustion_is_too_much_work() {
    let mut system = Decay { k: 1.0 };
    let config = Config::new(1e-10, vec![1e-12], 3).unwrap();
    let mut bdf = Bdf::new(config, 0.0, &[1.0]).unwrap();
    let mut x = [1.0];

    let err = bdf.advance(&mut system, 100.0, &mut x).unwrap_err();
    assert!(matches!(err, Error::TooMuchWork { max_steps: 3, .. }));
    assert_eq!(err.code(), -1);
    assert_eq!(x, [1.0], "state must be untouched on failure");
}

#[test]
fn rhs_failure_is_fatal_and_keeps_state() {
    let mut system = FailsAfter { boundary: 0.3 };
    let mut bdf = Bdf::new(config(1e-6, 1e-8), 0.0, &[0.0]).unwrap();
    let mut x = [0.0];

    bdf.advance(&mut system, 0.2, &mut x).unwrap();
    assert_relative_eq!(x[0], 0.2, epsilon = 1e-8);

    let err = bdf.advance(&mut system, 0.4, &mut x).unwrap_err();
    assert!(matches!(err, Error::RhsFailed { .. }));
    assert_eq!(err.code(), -8);
    assert!(err.to_string().contains("no derivative beyond t = 0.3"));
    assert_relative_eq!(x[0], 0.2, epsilon = 1e-8);
}

#[test]
fn rejects_output_time_in_the_past() {
    let mut system = Decay { k: 1.0 };
    let mut bdf = Bdf::new(config(1e-6, 1e-8), 0.0, &[1.0]).unwrap();
    let mut x = [1.0];

    bdf.advance(&mut system, 1.0, &mut x).unwrap();
    let err = bdf.advance(&mut system, 0.5, &mut x).unwrap_err();
    assert!(matches!(err, Error::BadOutputTime { .. }));
}

#[test]
fn advancing_to_current_time_is_a_no_op() {
    let mut system = Decay { k: 1.0 };
    let mut bdf = Bdf::new(config(1e-6, 1e-8), 0.0, &[1.0]).unwrap();
    let mut x = [0.0];

    let advance = bdf.advance(&mut system, 0.0, &mut x).unwrap();
    assert_eq!(advance.time, 0.0);
    assert_eq!(x, [1.0]);
    assert_eq!(Integrator::<Decay>::stats(&bdf).steps, 0);
}

#[test]
fn mismatched_abs_tol_is_rejected() {
    let config = Config::new(1e-6, vec![1e-8, 1e-8, 1e-8], 100).unwrap();
    assert!(Bdf::new(config, 0.0, &[1.0, 2.0]).is_err());
}

#[test]
fn order_is_capped_by_config() {
    let mut system = Decay { k: 1.0 };
    let config = config(1e-8, 1e-10).with_max_order(2).unwrap();
    let mut bdf = Bdf::new(config, 0.0, &[1.0]).unwrap();
    let mut x = [1.0];

    bdf.advance(&mut system, 5.0, &mut x).unwrap();
    assert!(bdf.order() <= 2);
    assert_relative_eq!(x[0], (-5.0_f64).exp(), max_relative = 1e-4);
}

#[test]
fn counters_only_increase() {
    let mut system = StiffTracker { lambda: 50.0 };
    let mut bdf = Bdf::new(config(1e-6, 1e-8), 0.0, &[1.0]).unwrap();
    let mut x = [1.0];

    let mut previous = Integrator::<StiffTracker>::stats(&bdf);
    for k in 1..=5 {
        bdf.advance(&mut system, f64::from(k), &mut x).unwrap();
        let stats = Integrator::<StiffTracker>::stats(&bdf);
        assert!(stats.steps >= previous.steps);
        assert!(stats.rhs_evals > previous.rhs_evals);
        assert!(stats.nonlin_iters >= previous.nonlin_iters);
        assert!(stats.lin_setups >= previous.lin_setups);
        previous = stats;
    }
}

#[test]
fn loose_tolerances_track_a_mildly_stiff_solution() {
    let mut system = StiffTracker { lambda: 5.0 };
    let mut bdf = Bdf::new(config(1e-4, 1e-6), 0.0, &[1.0]).unwrap();
    let mut x = [1.0];

    for k in 1..=10 {
        let t_out = f64::from(k);
        let advance = bdf.advance(&mut system, t_out, &mut x).unwrap();
        assert_relative_eq!(advance.time, t_out, epsilon = 1e-12);
        assert_relative_eq!(x[0], t_out.cos(), epsilon = 1e-3);
    }
}
