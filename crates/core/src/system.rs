/// A first-order ODE system `x' = f(t, x)` as seen by an integrator.
///
/// Integrators call [`rhs`](Self::rhs) many times per step: once per Newton
/// iteration and once per column of a difference-quotient Jacobian.
/// Implementations may keep scratch buffers in `self`, which is why the
/// method takes `&mut self`, but the result must depend only on `(t, x)`.
pub trait OdeSystem {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Length of the state vector.
    fn dimension(&self) -> usize;

    /// Writes `f(t, x)` into `xd`.
    ///
    /// Both slices have length [`dimension`](Self::dimension).
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the derivative cannot be evaluated at `(t, x)`.
    /// Integrators treat this as unrecoverable.
    fn rhs(&mut self, t: f64, x: &[f64], xd: &mut [f64]) -> Result<(), Self::Error>;
}
