use thiserror::Error;

/// The full state of a mechanical system in generalized coordinates.
///
/// Layout: entries `[0, num_qf)` are generalized velocities and entries
/// `[num_qf, 2 * num_qf)` are generalized positions. Integrators see the
/// state as a flat slice; this type is the checked view over that slice.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneralizedState {
    values: Vec<f64>,
}

/// Error returned when a state vector does not match the velocity/position layout.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("state length {len} is not twice the {num_qf} generalized coordinates")]
pub struct LayoutError {
    pub len: usize,
    pub num_qf: usize,
}

impl GeneralizedState {
    /// Wraps a state vector after checking its length.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] if `values.len() != 2 * num_qf` or `num_qf` is zero.
    pub fn new(values: Vec<f64>, num_qf: usize) -> Result<Self, LayoutError> {
        if num_qf == 0 || values.len() != 2 * num_qf {
            return Err(LayoutError {
                len: values.len(),
                num_qf,
            });
        }
        Ok(Self { values })
    }

    /// Number of generalized coordinates.
    #[must_use]
    pub fn num_qf(&self) -> usize {
        self.values.len() / 2
    }

    /// The generalized velocities.
    #[must_use]
    pub fn velocities(&self) -> &[f64] {
        &self.values[..self.num_qf()]
    }

    /// The generalized positions.
    #[must_use]
    pub fn positions(&self) -> &[f64] {
        &self.values[self.num_qf()..]
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<f64> {
        self.values
    }
}

/// Splits a raw state slice into `(velocities, positions)`.
///
/// Model implementations use this to read `x` without repeating the layout.
///
/// # Panics
///
/// Panics if `x` has odd length.
#[must_use]
pub fn split(x: &[f64]) -> (&[f64], &[f64]) {
    assert!(x.len() % 2 == 0, "state length must be even");
    x.split_at(x.len() / 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn velocities_come_before_positions() {
        let state = GeneralizedState::new(vec![1.0, 2.0, 10.0, 20.0], 2).unwrap();
        assert_eq!(state.velocities(), &[1.0, 2.0]);
        assert_eq!(state.positions(), &[10.0, 20.0]);
        assert_eq!(state.num_qf(), 2);
    }

    #[test]
    fn rejects_mismatched_length() {
        let err = GeneralizedState::new(vec![0.0; 3], 2).unwrap_err();
        assert_eq!(err, LayoutError { len: 3, num_qf: 2 });
    }

    #[test]
    fn split_matches_accessors() {
        let x = [0.5, -0.5, 3.0, 4.0];
        let (v, q) = split(&x);
        assert_eq!(v, &[0.5, -0.5]);
        assert_eq!(q, &[3.0, 4.0]);
    }
}
