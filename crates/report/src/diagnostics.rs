//! The end-of-run diagnostics block.
//!
//! ```text
//! Solver statistics
//!     Steps                      = 412
//!     RHS evals                  = 590
//!     Jacobian evals             = 21
//!     Jacobian RHS evals         = 84
//!     Linear solver setups       = 67
//!     Error test failures        = 9
//!     Nonlinear iterations       = 588
//!     Nonlinear conv failures    = 0
//!
//! Final integrator status = 0
//! ```

use std::fmt;

use cds_solvers::integrator::Stats;

/// Integrator counters and the final status code, ready to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostics {
    pub stats: Stats,
    pub code: i32,
}

impl Diagnostics {
    #[must_use]
    pub fn new(stats: Stats, code: i32) -> Self {
        Self { stats, code }
    }

    /// Labelled counters in print order.
    #[must_use]
    pub fn counters(&self) -> [(&'static str, u64); 8] {
        let s = &self.stats;
        [
            ("Steps", s.steps),
            ("RHS evals", s.rhs_evals),
            ("Jacobian evals", s.jac_evals),
            ("Jacobian RHS evals", s.lin_rhs_evals),
            ("Linear solver setups", s.lin_setups),
            ("Error test failures", s.err_test_fails),
            ("Nonlinear iterations", s.nonlin_iters),
            ("Nonlinear conv failures", s.nonlin_conv_fails),
        ]
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Solver statistics")?;
        for (label, value) in self.counters() {
            writeln!(f, "    {label:<26} = {value}")?;
        }
        writeln!(f)?;
        writeln!(f, "Final integrator status = {}", self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stats() -> Stats {
        Stats {
            steps: 412,
            rhs_evals: 590,
            jac_evals: 21,
            lin_rhs_evals: 84,
            lin_setups: 67,
            err_test_fails: 9,
            nonlin_iters: 588,
            nonlin_conv_fails: 0,
        }
    }

    #[test]
    fn lists_every_counter_and_the_code() {
        let text = Diagnostics::new(sample_stats(), -8).to_string();

        for line in [
            "    Steps                      = 412",
            "    RHS evals                  = 590",
            "    Jacobian evals             = 21",
            "    Jacobian RHS evals         = 84",
            "    Linear solver setups       = 67",
            "    Error test failures        = 9",
            "    Nonlinear iterations       = 588",
            "    Nonlinear conv failures    = 0",
        ] {
            assert!(text.contains(line), "missing {line:?} in\n{text}");
        }
        assert!(text.starts_with("Solver statistics\n"));
        assert!(text.ends_with("\nFinal integrator status = -8\n"));
    }

    #[test]
    fn counters_follow_print_order() {
        let labels: Vec<_> = Diagnostics::new(Stats::default(), 0)
            .counters()
            .iter()
            .map(|(label, _)| *label)
            .collect();
        assert_eq!(labels.first(), Some(&"Steps"));
        assert_eq!(labels.last(), Some(&"Nonlinear conv failures"));
        assert_eq!(labels.len(), 8);
    }
}
