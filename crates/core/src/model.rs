use crate::{Dimensions, RowMajorMatrix};

/// Forcing terms of a mechanical system in generalized coordinates.
///
/// The equations of motion take the form
///
/// ```text
/// M(t, q) q'' = -c - λ b
/// dT q'' = -e
/// ```
///
/// where `c` collects the unconstrained generalized forces (gravity, springs,
/// velocity-product terms, inputs) and `b`, `dT`, `e` couple the single
/// holonomic constraint. For unconstrained models only `c` is read.
#[derive(Debug, Clone, PartialEq)]
pub struct Forcing {
    pub b: Vec<f64>,
    pub c: Vec<f64>,
    pub d_t: Vec<f64>,
    pub e: f64,
}

impl Forcing {
    /// Creates zeroed forcing terms for `num_qf` coordinates.
    #[must_use]
    pub fn zeros(num_qf: usize) -> Self {
        Self {
            b: vec![0.0; num_qf],
            c: vec![0.0; num_qf],
            d_t: vec![0.0; num_qf],
            e: 0.0,
        }
    }

    /// Resets every term to zero, keeping the allocations.
    pub fn clear(&mut self) {
        self.b.fill(0.0);
        self.c.fill(0.0);
        self.d_t.fill(0.0);
        self.e = 0.0;
    }
}

/// The equations of one mechanical system.
///
/// Implementations write into caller-owned buffers so that the dynamics
/// evaluator can reuse them across calls. The evaluator calls, in order,
/// [`inputs`](Self::inputs), [`mass_matrix`](Self::mass_matrix), and
/// [`forcing`](Self::forcing) with the same `(t, x)`.
///
/// `x` follows the [`GeneralizedState`](crate::GeneralizedState) layout:
/// velocities first, then positions.
pub trait ModelEquations {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Declared sizes of the model.
    fn dimensions(&self) -> Dimensions;

    /// Initial state, of length `dimensions().num_x()`.
    fn initial_state(&self) -> Vec<f64>;

    /// Column labels for each state entry, of length `dimensions().num_x()`.
    fn state_labels(&self) -> Vec<String>;

    /// Computes the system inputs `u` at `(t, x)`.
    ///
    /// The default does nothing, for models without inputs.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the inputs cannot be computed.
    fn inputs(&self, _t: f64, _x: &[f64], _u: &mut [f64]) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Writes the mass matrix at `(t, x, u)` in row-major order.
    ///
    /// The buffer is not cleared between calls; implementations set every
    /// element they rely on.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the mass matrix cannot be computed.
    fn mass_matrix(
        &self,
        t: f64,
        x: &[f64],
        u: &[f64],
        m: &mut RowMajorMatrix,
    ) -> Result<(), Self::Error>;

    /// Writes the forcing terms at `(t, x, u)`.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the forcing terms cannot be computed.
    fn forcing(&self, t: f64, x: &[f64], u: &[f64], f: &mut Forcing) -> Result<(), Self::Error>;
}

impl<M: ModelEquations + ?Sized> ModelEquations for &M {
    type Error = M::Error;

    fn dimensions(&self) -> Dimensions {
        (**self).dimensions()
    }

    fn initial_state(&self) -> Vec<f64> {
        (**self).initial_state()
    }

    fn state_labels(&self) -> Vec<String> {
        (**self).state_labels()
    }

    fn inputs(&self, t: f64, x: &[f64], u: &mut [f64]) -> Result<(), Self::Error> {
        (**self).inputs(t, x, u)
    }

    fn mass_matrix(
        &self,
        t: f64,
        x: &[f64],
        u: &[f64],
        m: &mut RowMajorMatrix,
    ) -> Result<(), Self::Error> {
        (**self).mass_matrix(t, x, u, m)
    }

    fn forcing(&self, t: f64, x: &[f64], u: &[f64], f: &mut Forcing) -> Result<(), Self::Error> {
        (**self).forcing(t, x, u, f)
    }
}
