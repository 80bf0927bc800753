//! Fixed-cadence driver for stiff integrators.
//!
//! The driver asks the integrator for the state at each output time
//! `t_k = t_initial + k · dt` and records the time the integrator actually
//! reached, which need not equal `t_k`.
//!
//! ```text
//! Initializing ──► Stepping ──► Complete
//!                     │    └──► StoppedByObserver
//!                     └───────► Failed (samples so far are kept)
//! ```
//!
//! Integrator warnings are logged and stepping continues. A fatal integrator
//! error ends the run; it is reported in [`Status::Failed`] together with the
//! samples and counters gathered up to that point.
//!
//! # Example
//!
//! ```ignore
//! use cds_solvers::transient::driver::{self, Config};
//!
//! let config = Config::new(0.0, 10.0, 0.02)?;
//! let solution = driver::solve_unobserved(model, &config)?;
//!
//! for (t, x) in solution.trajectory.iter() {
//!     println!("t={t}: {x:?}");
//! }
//! ```

mod action;
mod config;
mod error;
mod event;
mod solution;
mod trajectory;


pub use action::Action;
pub use config::{
    Config, ConfigError, DEFAULT_ABS_TOL, DEFAULT_MAX_INTERNAL_STEPS, DEFAULT_REL_TOL,
};
pub use error::Error;
pub use event::Event;
pub use solution::{Solution, Status};
pub use trajectory::Trajectory;

use cds_core::{GeneralizedState, ModelEquations, Observer, OdeSystem};
use tracing::{debug, error, warn};

use crate::dynamics::DynamicsEvaluator;
use crate::integrator::{
    AdvanceStatus, Integrator, SUCCESS, StatusCode,
    bdf::{self, Bdf},
};

/// Simulates `model` with the BDF integrator.
///
/// Builds a [`DynamicsEvaluator`] for the model and a [`Bdf`] integrator
/// from `config`, then runs them with [`run`].
///
/// # Errors
///
/// Returns an error if setup fails: the model's initial state does not match
/// its dimensions, the integrator settings do not fit the state, or the run
/// buffers cannot be allocated. Stepping failures are reported in the
/// returned [`Solution`].
pub fn solve<M, Obs>(
    model: M,
    config: &Config,
    observer: Obs,
) -> Result<Solution<bdf::Error>, Error>
where
    M: ModelEquations,
    Obs: Observer<Event, Action>,
{
    let x0 = GeneralizedState::new(model.initial_state(), model.dimensions().num_qf())?;

    let mut integrator =
        Bdf::new(config.integrator().clone(), config.t_initial(), x0.as_slice())
            .map_err(ConfigError::from)?;
    let mut evaluator = DynamicsEvaluator::new(model);

    run(&mut evaluator, &mut integrator, x0.as_slice(), config, observer)
}

/// Simulates `model` with the BDF integrator without observation.
///
/// This is a convenience wrapper around [`solve`] that discards events.
///
/// # Errors
///
/// Returns an error if setup fails; see [`solve`].
pub fn solve_unobserved<M>(
    model: M,
    config: &Config,
) -> Result<Solution<bdf::Error>, Error>
where
    M: ModelEquations,
{
    solve(model, config, ())
}

/// Steps `integrator` over `system` through every output time in `config`.
///
/// `x0` is the state at `config.t_initial()`; the integrator must already be
/// positioned there.
///
/// # Algorithm
///
/// For each `k` in `1..=config.num_samples()`:
///
/// 1. Advance the integrator to `t_k`.
/// 2. On failure, log the status code and return [`Status::Failed`].
/// 3. On a warning, log it and carry on.
/// 4. Record the reached time and state, then emit an [`Event`].
/// 5. If the observer returns [`Action::StopEarly`], return.
///
/// # Errors
///
/// Returns an error if `x0` has the wrong length or the run buffers cannot
/// be allocated.
pub fn run<S, I, Obs>(
    system: &mut S,
    integrator: &mut I,
    x0: &[f64],
    config: &Config,
    mut observer: Obs,
) -> Result<Solution<I::Error>, Error>
where
    S: OdeSystem,
    I: Integrator<S>,
    Obs: Observer<Event, Action>,
{
    let num_x = system.dimension();
    if x0.len() != num_x {
        return Err(Error::StateLength {
            expected: num_x,
            actual: x0.len(),
        });
    }

    let samples = config.num_samples();
    let mut trajectory = Trajectory::try_with_capacity(num_x, samples)?;
    let mut x = Vec::new();
    x.try_reserve_exact(num_x)?;
    x.extend_from_slice(x0);

    debug!(
        t_initial = config.t_initial(),
        t_final = config.t_final(),
        dt = config.dt(),
        samples,
        num_x,
        "driver stepping"
    );

    let mut last_code = SUCCESS;
    for sample in 1..=samples {
        let t_out = config.output_time(sample);

        let advance = match integrator.advance(system, t_out, &mut x) {
            Ok(advance) => advance,
            Err(err) => {
                error!(
                    operation = "advance",
                    t_out,
                    code = err.code(),
                    error = %err,
                    "integration failed"
                );
                return Ok(Solution {
                    status: Status::Failed(err),
                    trajectory,
                    stats: integrator.stats(),
                    last_code,
                });
            }
        };

        if let AdvanceStatus::Warning(warning) = advance.status {
            warn!(t = advance.time, code = advance.status.code(), "{warning}");
        }
        last_code = advance.status.code();
        trajectory.push(advance.time, &x);

        let event = Event {
            sample,
            time: advance.time,
            state: x.clone(),
            status: advance.status,
        };
        if let Some(Action::StopEarly) = observer.observe(&event) {
            debug!(sample, t = advance.time, "driver stopped by observer");
            return Ok(Solution {
                status: Status::StoppedByObserver,
                trajectory,
                stats: integrator.stats(),
                last_code,
            });
        }
    }

    Ok(Solution {
        status: Status::Complete,
        trajectory,
        stats: integrator.stats(),
        last_code,
    })
}
