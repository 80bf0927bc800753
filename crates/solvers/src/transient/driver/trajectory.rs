use std::collections::TryReserveError;

/// An append-only record of `(time, state)` samples.
///
/// States are stored back to back in one buffer with a stride of `num_x`.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    num_x: usize,
    times: Vec<f64>,
    values: Vec<f64>,
}

impl Trajectory {
    /// Creates an empty trajectory with room for `samples` states of length `num_x`.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffers cannot be allocated.
    pub fn try_with_capacity(num_x: usize, samples: usize) -> Result<Self, TryReserveError> {
        let mut times = Vec::new();
        times.try_reserve_exact(samples)?;

        let mut values = Vec::new();
        values.try_reserve_exact(samples.saturating_mul(num_x))?;

        Ok(Self {
            num_x,
            times,
            values,
        })
    }

    /// Appends a sample.
    ///
    /// # Panics
    ///
    /// Panics if `state.len() != self.num_x()`.
    pub fn push(&mut self, time: f64, state: &[f64]) {
        assert_eq!(state.len(), self.num_x, "state length mismatch");
        self.times.push(time);
        self.values.extend_from_slice(state);
    }

    /// Length of each recorded state.
    #[must_use]
    pub fn num_x(&self) -> usize {
        self.num_x
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Sample times, in recording order.
    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// The state of sample `i`, or `None` if out of range.
    #[must_use]
    pub fn state(&self, i: usize) -> Option<&[f64]> {
        (i < self.len()).then(|| &self.values[i * self.num_x..(i + 1) * self.num_x])
    }

    /// The most recent sample.
    #[must_use]
    pub fn last(&self) -> Option<(f64, &[f64])> {
        let i = self.len().checked_sub(1)?;
        Some((self.times[i], self.state(i)?))
    }

    /// Iterates over `(time, state)` pairs in recording order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &[f64])> {
        let n = self.num_x;
        self.times
            .iter()
            .enumerate()
            .map(move |(i, &t)| (t, &self.values[i * n..(i + 1) * n]))
    }
}
