//! Constrained dynamics: generalized accelerations from model equations.
//!
//! # Algorithm
//!
//! For a model with mass matrix `M` and forcing terms `b, c, dT, e`:
//!
//! - **No constraint**: solve `M · q'' = -c`.
//! - **One holonomic constraint**: factor `M` once and solve `M · mb = b`
//!   and `M · mc = c` against the same factors, then
//!
//!   ```text
//!   λ   = (e - dT·mc) / (dT·mb)
//!   q'' = -mc - λ·mb
//!   ```
//!
//! The first-order derivative is `xd = [q''; v]`: the position derivative is
//! the current velocity, copied exactly.
//!
//! Models write `M` row-major; the evaluator transposes it into column-major
//! storage through [`RowMajorMatrix::write_column_major`] before factoring.
//!
//! [`RowMajorMatrix::write_column_major`]: cds_core::RowMajorMatrix::write_column_major

mod error;

pub use error::DynamicsError;

use cds_core::{Dimensions, Forcing, ModelEquations, OdeSystem, RowMajorMatrix};
use nalgebra::{DMatrix, DVector};

use crate::linalg::{lu_factor_in_place, lu_solve_in_place};

/// Turns model equations into generalized accelerations.
///
/// All scratch storage is sized from the model's [`Dimensions`] once, in
/// [`new`](Self::new), and reused by every [`evaluate`](Self::evaluate) call.
#[derive(Debug)]
pub struct DynamicsEvaluator<M> {
    model: M,
    dims: Dimensions,
    u: Vec<f64>,
    row_major: RowMajorMatrix,
    forcing: Forcing,
    mass: DMatrix<f64>,
    piv: Vec<usize>,
    mb: DVector<f64>,
    mc: DVector<f64>,
    q_free_dd: DVector<f64>,
    multiplier: Option<f64>,
}

impl<M: ModelEquations> DynamicsEvaluator<M> {
    /// Creates an evaluator with scratch buffers sized for `model`.
    pub fn new(model: M) -> Self {
        let dims = model.dimensions();
        let n = dims.num_qf();
        Self {
            model,
            dims,
            u: vec![0.0; dims.num_inputs()],
            row_major: RowMajorMatrix::zeros(n),
            forcing: Forcing::zeros(n),
            mass: DMatrix::zeros(n, n),
            piv: vec![0; n],
            mb: DVector::zeros(n),
            mc: DVector::zeros(n),
            q_free_dd: DVector::zeros(n),
            multiplier: None,
        }
    }

    /// Computes `xd = f(t, x)`.
    ///
    /// On error `xd` may be partially written and must not be used.
    ///
    /// # Errors
    ///
    /// - [`DynamicsError::Model`] if the model equations fail.
    /// - [`DynamicsError::SingularSystem`] if `M` cannot be factored or the
    ///   accelerations are not finite.
    /// - [`DynamicsError::SingularConstraint`] if the constraint does not
    ///   couple to the dynamics.
    pub fn evaluate(&mut self, t: f64, x: &[f64], xd: &mut [f64]) -> Result<(), DynamicsError> {
        let n = self.dims.num_qf();
        debug_assert_eq!(x.len(), 2 * n);
        debug_assert_eq!(xd.len(), 2 * n);

        self.model
            .inputs(t, x, &mut self.u)
            .map_err(|e| DynamicsError::model(t, e))?;
        self.model
            .mass_matrix(t, x, &self.u, &mut self.row_major)
            .map_err(|e| DynamicsError::model(t, e))?;
        self.model
            .forcing(t, x, &self.u, &mut self.forcing)
            .map_err(|e| DynamicsError::model(t, e))?;

        self.row_major.write_column_major(&mut self.mass);
        lu_factor_in_place(&mut self.mass, &mut self.piv)
            .map_err(|_| DynamicsError::SingularSystem { t })?;

        self.mc.copy_from_slice(&self.forcing.c);
        lu_solve_in_place(&self.mass, &self.piv, &mut self.mc);

        if self.dims.is_constrained() {
            self.mb.copy_from_slice(&self.forcing.b);
            lu_solve_in_place(&self.mass, &self.piv, &mut self.mb);

            let d_t = &self.forcing.d_t;
            let coupling = dot(d_t, self.mb.as_slice());
            let scale = norm(d_t) * self.mb.norm();
            if !coupling.is_finite() || coupling.abs() <= f64::EPSILON * scale {
                return Err(DynamicsError::SingularConstraint { t, coupling });
            }

            let lambda = (self.forcing.e - dot(d_t, self.mc.as_slice())) / coupling;
            for i in 0..n {
                self.q_free_dd[i] = -self.mc[i] - lambda * self.mb[i];
            }
            self.multiplier = Some(lambda);
        } else {
            for i in 0..n {
                self.q_free_dd[i] = -self.mc[i];
            }
            self.multiplier = None;
        }

        if self.q_free_dd.iter().any(|v| !v.is_finite()) {
            return Err(DynamicsError::SingularSystem { t });
        }

        xd[..n].copy_from_slice(self.q_free_dd.as_slice());
        xd[n..].copy_from_slice(&x[..n]);
        Ok(())
    }

    /// The wrapped model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// The model's declared dimensions.
    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    /// Generalized accelerations from the most recent successful evaluation.
    pub fn accelerations(&self) -> &[f64] {
        self.q_free_dd.as_slice()
    }

    /// Constraint multiplier from the most recent successful evaluation,
    /// or `None` for unconstrained models.
    pub fn multiplier(&self) -> Option<f64> {
        self.multiplier
    }

    /// Consumes the evaluator and returns the model.
    pub fn into_model(self) -> M {
        self.model
    }
}

impl<M: ModelEquations> OdeSystem for DynamicsEvaluator<M> {
    type Error = DynamicsError;

    fn dimension(&self) -> usize {
        self.dims.num_x()
    }

    fn rhs(&mut self, t: f64, x: &[f64], xd: &mut [f64]) -> Result<(), Self::Error> {
        self.evaluate(t, x, xd)
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("equations blew up")]
    struct Blowup;

    /// Constant equations, useful for checking the algebra in isolation.
    #[derive(Debug, Clone)]
    struct Fixed {
        dims: Dimensions,
        mass_row_major: Vec<f64>,
        b: Vec<f64>,
        c: Vec<f64>,
        d_t: Vec<f64>,
        e: f64,
        fail: bool,
    }

    impl Fixed {
        fn unconstrained(mass_row_major: Vec<f64>, c: Vec<f64>) -> Self {
            let n = c.len();
            Self {
                dims: Dimensions::new(n, 0).unwrap(),
                mass_row_major,
                b: vec![0.0; n],
                c,
                d_t: vec![0.0; n],
                e: 0.0,
                fail: false,
            }
        }

        fn constrained(
            mass_row_major: Vec<f64>,
            b: Vec<f64>,
            c: Vec<f64>,
            d_t: Vec<f64>,
            e: f64,
        ) -> Self {
            Self {
                dims: Dimensions::new(c.len(), 1).unwrap(),
                mass_row_major,
                b,
                c,
                d_t,
                e,
                fail: false,
            }
        }
    }

    impl ModelEquations for Fixed {
        type Error = Blowup;

        fn dimensions(&self) -> Dimensions {
            self.dims
        }

        fn initial_state(&self) -> Vec<f64> {
            vec![0.0; self.dims.num_x()]
        }

        fn state_labels(&self) -> Vec<String> {
            (0..self.dims.num_x()).map(|i| format!("x{i}")).collect()
        }

        fn mass_matrix(
            &self,
            _t: f64,
            _x: &[f64],
            _u: &[f64],
            m: &mut RowMajorMatrix,
        ) -> Result<(), Self::Error> {
            if self.fail {
                return Err(Blowup);
            }
            m.as_mut_slice().copy_from_slice(&self.mass_row_major);
            Ok(())
        }

        fn forcing(
            &self,
            _t: f64,
            _x: &[f64],
            _u: &[f64],
            f: &mut Forcing,
        ) -> Result<(), Self::Error> {
            f.b.copy_from_slice(&self.b);
            f.c.copy_from_slice(&self.c);
            f.d_t.copy_from_slice(&self.d_t);
            f.e = self.e;
            Ok(())
        }
    }

    fn identity(n: usize) -> Vec<f64> {
        let mut m = vec![0.0; n * n];
        for i in 0..n {
            m[i * n + i] = 1.0;
        }
        m
    }

    #[test]
    fn unconstrained_identity_gives_negated_forcing() {
        let g = [9.81, -1.5, 0.25];
        let mut evaluator = DynamicsEvaluator::new(Fixed::unconstrained(identity(3), g.to_vec()));

        for (t, x) in [
            (0.0, [0.0; 6]),
            (3.7, [1.0, -2.0, 0.5, 8.0, -9.0, 1e3]),
            (-1.0, [1e-9; 6]),
        ] {
            let mut xd = [0.0; 6];
            evaluator.evaluate(t, &x, &mut xd).unwrap();
            for i in 0..3 {
                assert_relative_eq!(xd[i], -g[i], epsilon = 1e-14);
            }
        }
        assert_eq!(evaluator.multiplier(), None);
    }

    #[test]
    fn constrained_multiplier_matches_closed_form() {
        let b = [2.0, -1.0];
        let c = [0.5, 3.0];
        let e = 4.0;
        let model = Fixed::constrained(identity(2), b.to_vec(), c.to_vec(), vec![1.0, 0.0], e);
        let mut evaluator = DynamicsEvaluator::new(model);

        let mut xd = [0.0; 4];
        evaluator.evaluate(0.0, &[0.0; 4], &mut xd).unwrap();

        // M = I so mb = b, mc = c, and dT picks the first component.
        let lambda = evaluator.multiplier().unwrap();
        assert_relative_eq!(lambda, (e - c[0]) / b[0], epsilon = 1e-14);

        // λ·(dT·mb) reconstructs e - dT·mc.
        assert_relative_eq!(lambda * b[0], e - c[0], epsilon = 1e-14);

        // q'' = -c - λ b, and the constraint row reads dT·q'' = -e.
        assert_relative_eq!(xd[0], -c[0] - lambda * b[0], epsilon = 1e-14);
        assert_relative_eq!(xd[1], -c[1] - lambda * b[1], epsilon = 1e-14);
        assert_relative_eq!(xd[0], -e, epsilon = 1e-14);
    }

    #[test]
    fn constrained_with_full_mass_matrix_satisfies_both_equations() {
        let mass = vec![4.0, 1.0, 0.0, 1.0, 3.0, 0.5, 0.0, 0.5, 2.0];
        let b = vec![0.3, -0.7, 1.1];
        let c = vec![1.0, 2.0, -0.5];
        let d_t = vec![0.2, 0.9, -0.4];
        let e = 0.75;
        let model = Fixed::constrained(mass.clone(), b.clone(), c.clone(), d_t.clone(), e);
        let mut evaluator = DynamicsEvaluator::new(model);

        let mut xd = [0.0; 6];
        evaluator.evaluate(1.0, &[0.0; 6], &mut xd).unwrap();
        let lambda = evaluator.multiplier().unwrap();

        // M q'' + c + λ b = 0
        for i in 0..3 {
            let mq: f64 = (0..3).map(|j| mass[i * 3 + j] * xd[j]).sum();
            assert_relative_eq!(mq + c[i] + lambda * b[i], 0.0, epsilon = 1e-12);
        }
        // dT q'' + e = 0
        let dq: f64 = (0..3).map(|j| d_t[j] * xd[j]).sum();
        assert_relative_eq!(dq, -e, epsilon = 1e-12);
    }

    #[test]
    fn position_derivative_is_velocity_bit_for_bit() {
        let mass = vec![2.0, 0.3, 0.3, 1.0];
        let model = Fixed::constrained(mass, vec![1.0, 1.0], vec![0.1, 0.2], vec![1.0, -1.0], 0.3);
        let mut evaluator = DynamicsEvaluator::new(model);

        let states = [
            [0.1, 0.2, 0.3, 0.4],
            [1.0 / 3.0, std::f64::consts::PI, -0.0, 5.0],
            [1e-300, -7.123_456_789_012_345, 1e10, -1e-10],
        ];
        for x in states {
            let mut xd = [f64::NAN; 4];
            evaluator.evaluate(0.5, &x, &mut xd).unwrap();
            assert_eq!(xd[2].to_bits(), x[0].to_bits());
            assert_eq!(xd[3].to_bits(), x[1].to_bits());
        }
    }

    #[test]
    fn row_major_mass_matrix_is_transposed_before_solving() {
        // Row-major [[2, 1], [0, 1]]: the solution of M q'' = -c differs from
        // that of Mᵀ q'' = -c, so a missing transpose is detected.
        let model = Fixed::unconstrained(vec![2.0, 1.0, 0.0, 1.0], vec![-3.0, -1.0]);
        let mut evaluator = DynamicsEvaluator::new(model);

        let mut xd = [0.0; 4];
        evaluator.evaluate(0.0, &[0.0; 4], &mut xd).unwrap();

        // 2a + b = 3, b = 1 → a = 1
        assert_relative_eq!(xd[0], 1.0, epsilon = 1e-14);
        assert_relative_eq!(xd[1], 1.0, epsilon = 1e-14);
    }

    #[test]
    fn zero_mass_matrix_is_singular() {
        let model = Fixed::unconstrained(vec![0.0], vec![-9.81]);
        let mut evaluator = DynamicsEvaluator::new(model);

        let mut xd = [0.0; 2];
        let err = evaluator.evaluate(0.25, &[0.0; 2], &mut xd).unwrap_err();
        assert!(matches!(err, DynamicsError::SingularSystem { t } if t == 0.25));
    }

    #[test]
    fn decoupled_constraint_is_singular() {
        // dT ⟂ M⁻¹b: the multiplier has no effect on the constrained direction.
        let model = Fixed::constrained(identity(2), vec![0.0, 1.0], vec![1.0, 1.0], vec![1.0, 0.0], 0.0);
        let mut evaluator = DynamicsEvaluator::new(model);

        let mut xd = [0.0; 4];
        let err = evaluator.evaluate(0.0, &[0.0; 4], &mut xd).unwrap_err();
        assert!(matches!(err, DynamicsError::SingularConstraint { .. }));
    }

    #[test]
    fn vanishing_constraint_gradient_is_singular() {
        let model = Fixed::constrained(identity(2), vec![0.0, 1.0], vec![1.0, 1.0], vec![0.0, 0.0], 0.0);
        let mut evaluator = DynamicsEvaluator::new(model);

        let mut xd = [0.0; 4];
        let err = evaluator.evaluate(0.0, &[0.0; 4], &mut xd).unwrap_err();
        assert!(matches!(err, DynamicsError::SingularConstraint { coupling, .. } if coupling == 0.0));
    }

    #[test]
    fn model_errors_are_wrapped_with_time() {
        let mut model = Fixed::unconstrained(vec![1.0], vec![0.0]);
        model.fail = true;
        let mut evaluator = DynamicsEvaluator::new(model);

        let mut xd = [0.0; 2];
        let err = evaluator.evaluate(2.0, &[0.0; 2], &mut xd).unwrap_err();
        assert!(matches!(err, DynamicsError::Model { t, .. } if t == 2.0));
        assert!(err.to_string().contains("equations blew up"));
    }

    #[test]
    fn acts_as_an_ode_system() {
        let model = Fixed::unconstrained(vec![1.0], vec![-2.0]);
        let mut evaluator = DynamicsEvaluator::new(model);
        assert_eq!(evaluator.dimension(), 2);

        let mut xd = [0.0; 2];
        evaluator.rhs(0.0, &[4.0, 1.0], &mut xd).unwrap();
        assert_eq!(xd, [2.0, 4.0]);
        assert_eq!(evaluator.accelerations(), &[2.0]);
    }
}
