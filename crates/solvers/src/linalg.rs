//! Dense LU factorization with partial pivoting, in place.
//!
//! Both the dynamics evaluator (mass matrix) and the BDF Newton corrector
//! (iteration matrix) factor once and solve several right-hand sides against
//! the same factors. Neither allocates: factors overwrite the matrix and the
//! permutation goes into a caller-owned pivot buffer.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// The matrix has no usable pivot in some column.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("matrix is singular at column {column}")]
pub struct Singular {
    pub column: usize,
}

/// Relative pivot threshold, scaled by the largest magnitude in the matrix.
const PIVOT_RTOL: f64 = 1e3 * f64::EPSILON;

/// Factors `a` into `P·L·U` in place.
///
/// On success the strict lower triangle of `a` holds `L` (unit diagonal
/// implied), the upper triangle holds `U`, and `piv[k]` is the row swapped
/// with row `k` at step `k`.
///
/// A column whose best pivot is below `PIVOT_RTOL` times the largest
/// magnitude in the original matrix counts as singular, as does any
/// non-finite entry or an all-zero matrix.
///
/// # Errors
///
/// Returns [`Singular`] naming the first column without a usable pivot.
pub fn lu_factor_in_place(a: &mut DMatrix<f64>, piv: &mut [usize]) -> Result<(), Singular> {
    let n = a.nrows();
    debug_assert_eq!(a.ncols(), n);
    debug_assert_eq!(piv.len(), n);

    let mut scale = 0.0_f64;
    for &v in a.iter() {
        if !v.is_finite() {
            return Err(Singular { column: 0 });
        }
        scale = scale.max(v.abs());
    }
    if scale == 0.0 {
        return Err(Singular { column: 0 });
    }
    let threshold = PIVOT_RTOL * scale;

    for k in 0..n {
        // Partial pivot: largest |a[i,k]| for i in k..n
        let mut max_val = a[(k, k)].abs();
        let mut max_row = k;
        for i in (k + 1)..n {
            let v = a[(i, k)].abs();
            if v > max_val {
                max_val = v;
                max_row = i;
            }
        }
        if max_val <= threshold {
            return Err(Singular { column: k });
        }
        piv[k] = max_row;

        if max_row != k {
            a.swap_rows(k, max_row);
        }

        let pivot = a[(k, k)];
        for i in (k + 1)..n {
            a[(i, k)] /= pivot;
            let l = a[(i, k)];
            for j in (k + 1)..n {
                a[(i, j)] -= l * a[(k, j)];
            }
        }
    }
    Ok(())
}

/// Solves `P·L·U·x = b` using factors from [`lu_factor_in_place`].
///
/// On entry `x` holds `b`; on exit it holds the solution. The factors are
/// left untouched, so this can be called repeatedly for several right-hand sides.
#[allow(clippy::needless_range_loop)]
pub fn lu_solve_in_place(a: &DMatrix<f64>, piv: &[usize], x: &mut DVector<f64>) {
    let n = a.nrows();

    for k in 0..n {
        if piv[k] != k {
            x.swap_rows(k, piv[k]);
        }
    }

    // Forward substitution (L·y = Pb)
    for i in 1..n {
        for k in 0..i {
            x[i] -= a[(i, k)] * x[k];
        }
    }

    // Back substitution (U·x = y)
    for i in (0..n).rev() {
        for k in (i + 1)..n {
            x[i] -= a[(i, k)] * x[k];
        }
        x[i] /= a[(i, i)];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn matches_nalgebra_reference() {
        let m = DMatrix::from_row_slice(3, 3, &[2.0, 1.0, -1.0, -3.0, -1.0, 2.0, -2.0, 1.0, 2.0]);
        let b = DVector::from_vec(vec![8.0, -11.0, -3.0]);

        let mut factors = m.clone();
        let mut piv = [0; 3];
        lu_factor_in_place(&mut factors, &mut piv).unwrap();

        let mut x = b.clone();
        lu_solve_in_place(&factors, &piv, &mut x);

        let reference = m.lu().solve(&b).unwrap();
        for i in 0..3 {
            assert_relative_eq!(x[i], reference[i], epsilon = 1e-12);
        }
        assert_relative_eq!(x[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 3.0, epsilon = 1e-12);
        assert_relative_eq!(x[2], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn factors_are_reusable_across_right_hand_sides() {
        let m = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 2.0, 3.0]);
        let mut factors = m.clone();
        let mut piv = [0; 2];
        lu_factor_in_place(&mut factors, &mut piv).unwrap();

        for b in [[1.0, 0.0], [0.0, 1.0], [5.0, -7.0]] {
            let mut x = DVector::from_row_slice(&b);
            lu_solve_in_place(&factors, &piv, &mut x);
            let residual = &m * &x - DVector::from_row_slice(&b);
            assert!(residual.norm() < 1e-12);
        }
    }

    #[test]
    fn needs_pivoting_on_zero_diagonal() {
        let m = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 1.0, 0.0]);
        let mut factors = m;
        let mut piv = [0; 2];
        lu_factor_in_place(&mut factors, &mut piv).unwrap();
        assert_eq!(piv[0], 1);

        let mut x = DVector::from_vec(vec![3.0, 5.0]);
        lu_solve_in_place(&factors, &piv, &mut x);
        assert_relative_eq!(x[0], 5.0);
        assert_relative_eq!(x[1], 3.0);
    }

    #[test]
    fn zero_matrix_is_singular() {
        let mut m = DMatrix::zeros(2, 2);
        let mut piv = [0; 2];
        assert_eq!(
            lu_factor_in_place(&mut m, &mut piv),
            Err(Singular { column: 0 })
        );
    }

    #[test]
    fn rank_deficient_matrix_is_singular() {
        let mut m = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        let mut piv = [0; 2];
        assert_eq!(
            lu_factor_in_place(&mut m, &mut piv),
            Err(Singular { column: 1 })
        );
    }

    #[test]
    fn non_finite_entries_are_singular() {
        let mut m = DMatrix::from_row_slice(2, 2, &[1.0, f64::NAN, 0.0, 1.0]);
        let mut piv = [0; 2];
        assert!(lu_factor_in_place(&mut m, &mut piv).is_err());
    }
}
