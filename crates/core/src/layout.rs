//! Data-layout contract between model equations and the linear algebra layer.
//!
//! Model equations are written the way they are printed: row by row. The
//! linear algebra layer ([`nalgebra::DMatrix`]) stores matrices column by
//! column. [`RowMajorMatrix`] is the buffer a model fills, and
//! [`RowMajorMatrix::write_column_major`] is the single place where the
//! transpose between the two conventions happens.

use nalgebra::DMatrix;

/// A dense square matrix stored in row-major order.
///
/// Element `(i, j)` lives at index `i * n + j`.
#[derive(Debug, Clone, PartialEq)]
pub struct RowMajorMatrix {
    n: usize,
    data: Vec<f64>,
}

impl RowMajorMatrix {
    /// Creates an `n × n` zero matrix.
    #[must_use]
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    /// Number of rows (and columns).
    #[must_use]
    pub fn size(&self) -> usize {
        self.n
    }

    /// Returns element `(row, col)`.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n + col]
    }

    /// Sets element `(row, col)`.
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.n + col] = value;
    }

    /// Sets every element to zero.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// The raw row-major storage.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable raw row-major storage, for models that emit a flat array.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Copies this matrix into a column-major `DMatrix` without allocating.
    ///
    /// After the call `dst[(i, j)] == self.get(i, j)` for every element.
    ///
    /// # Panics
    ///
    /// Panics if `dst` is not `n × n`.
    pub fn write_column_major(&self, dst: &mut DMatrix<f64>) {
        assert_eq!(dst.shape(), (self.n, self.n), "destination shape mismatch");

        // dst's storage is column-major: index j * n + i holds (i, j).
        let out = dst.as_mut_slice();
        for i in 0..self.n {
            let row = &self.data[i * self.n..(i + 1) * self.n];
            for (j, &value) in row.iter().enumerate() {
                out[j * self.n + i] = value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transposes_storage_into_column_major() {
        // Non-symmetric so a missing transpose would show.
        let mut m = RowMajorMatrix::zeros(2);
        m.as_mut_slice().copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);

        let mut dst = DMatrix::zeros(2, 2);
        m.write_column_major(&mut dst);

        assert_eq!(dst[(0, 0)], 1.0);
        assert_eq!(dst[(0, 1)], 2.0);
        assert_eq!(dst[(1, 0)], 3.0);
        assert_eq!(dst[(1, 1)], 4.0);
        assert_eq!(dst.as_slice(), &[1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn element_access_is_row_major() {
        let mut m = RowMajorMatrix::zeros(3);
        m.set(0, 2, 7.0);
        assert_eq!(m.as_slice()[2], 7.0);
        assert_eq!(m.get(0, 2), 7.0);

        m.clear();
        assert!(m.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    #[should_panic(expected = "destination shape mismatch")]
    fn rejects_wrong_destination_shape() {
        let m = RowMajorMatrix::zeros(2);
        let mut dst = DMatrix::zeros(3, 3);
        m.write_column_major(&mut dst);
    }
}
