use std::io::Write;

use anyhow::{Context, Result, ensure};
use cds_core::ModelEquations;
use cds_report::{CsvObserver, Diagnostics};
use cds_solvers::transient::driver::{self, Status};
use tracing::{info, warn};

use crate::config::RunConfig;

/// What a finished run reports back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub diagnostics: Diagnostics,
    pub rows: usize,
    pub failed: bool,
}

impl Outcome {
    /// The process exit status: zero unless stepping failed, in which case
    /// the low byte of the integrator status code.
    #[must_use]
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub fn exit_status(&self) -> u8 {
        if self.failed { self.diagnostics.code as u8 } else { 0 }
    }
}

/// Builds the model, integrates it, and streams CSV rows to `out`.
///
/// A stepping failure is not an error here; it is reported in the
/// [`Outcome`] after the rows written so far.
///
/// # Errors
///
/// Returns an error if the model or solver settings are invalid, the driver
/// cannot be set up, or the output cannot be written.
pub fn execute<W: Write>(config: &RunConfig, out: W) -> Result<(Outcome, W)> {
    let kind = config.model.kind();
    let model = config
        .model
        .build()
        .with_context(|| format!("invalid {kind} parameters"))?;
    let driver_config = config
        .solver
        .to_driver()
        .context("invalid solver settings")?;

    let labels = model.state_labels();
    let num_x = model.dimensions().num_x();
    ensure!(
        labels.len() == num_x,
        "{kind} declares {} state labels for {num_x} state entries",
        labels.len()
    );

    info!(
        model = kind,
        num_x,
        t_final = driver_config.t_final(),
        dt = driver_config.dt(),
        samples = driver_config.num_samples(),
        "starting run"
    );

    let mut observer = CsvObserver::new(out, &labels).context("failed to write CSV header")?;
    let solution = driver::solve(model, &driver_config, &mut observer)?;
    let rows = observer.rows();
    let out = observer.finish().context("failed to write CSV rows")?;

    let diagnostics = Diagnostics::new(solution.stats, solution.code());
    let failed = match &solution.status {
        Status::Complete => false,
        Status::StoppedByObserver => {
            warn!(rows, "run stopped before the final time");
            false
        }
        Status::Failed(_) => true,
    };
    info!(rows, code = diagnostics.code, steps = diagnostics.stats.steps, "run finished");

    Ok((
        Outcome {
            diagnostics,
            rows,
            failed,
        },
        out,
    ))
}
