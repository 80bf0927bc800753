/// Cumulative integrator counters.
///
/// Every counter only ever increases over the life of an integrator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Accepted internal steps.
    pub steps: u64,

    /// Right-hand-side evaluations made by the corrector and step-size logic.
    pub rhs_evals: u64,

    /// Difference-quotient Jacobian evaluations.
    pub jac_evals: u64,

    /// Right-hand-side evaluations spent building Jacobians.
    pub lin_rhs_evals: u64,

    /// Factorizations of the Newton iteration matrix.
    pub lin_setups: u64,

    /// Steps rejected by the local error test.
    pub err_test_fails: u64,

    /// Newton iterations.
    pub nonlin_iters: u64,

    /// Newton convergence failures.
    pub nonlin_conv_fails: u64,
}
