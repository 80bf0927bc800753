use thiserror::Error;

/// The sizes a model declares for its generalized state.
///
/// The state vector holds `num_qf` generalized velocities followed by
/// `num_qf` generalized positions, so `num_x` is always `2 * num_qf`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    num_qf: usize,
    num_constraints: usize,
    num_inputs: usize,
}

/// Errors that can occur when declaring model dimensions.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DimensionError {
    #[error("a model must have at least one generalized coordinate")]
    NoCoordinates,

    /// The constraint elimination handles a scalar multiplier only.
    ///
    /// Models with several holonomic constraints need a matrix-valued
    /// multiplier solve, which is not provided. The model author has to
    /// reduce the system instead.
    #[error(
        "model declares {0} holonomic constraints, only 0 or 1 are supported; \
         reduce the coordinate set or split the constraint"
    )]
    UnsupportedConstraintCount(usize),
}

impl Dimensions {
    /// Creates validated dimensions for a model without inputs.
    ///
    /// # Errors
    ///
    /// Returns an error if `num_qf` is zero or `num_constraints` exceeds one.
    pub fn new(num_qf: usize, num_constraints: usize) -> Result<Self, DimensionError> {
        Self::with_inputs(num_qf, num_constraints, 0)
    }

    /// Creates validated dimensions for a model that computes `num_inputs`
    /// system inputs on each evaluation.
    ///
    /// # Errors
    ///
    /// Returns an error if `num_qf` is zero or `num_constraints` exceeds one.
    pub fn with_inputs(
        num_qf: usize,
        num_constraints: usize,
        num_inputs: usize,
    ) -> Result<Self, DimensionError> {
        if num_qf == 0 {
            return Err(DimensionError::NoCoordinates);
        }
        if num_constraints > 1 {
            return Err(DimensionError::UnsupportedConstraintCount(num_constraints));
        }
        Ok(Self {
            num_qf,
            num_constraints,
            num_inputs,
        })
    }

    /// Number of generalized coordinates.
    #[must_use]
    pub fn num_qf(&self) -> usize {
        self.num_qf
    }

    /// Length of the full state vector.
    #[must_use]
    pub fn num_x(&self) -> usize {
        2 * self.num_qf
    }

    /// Number of holonomic constraints, either 0 or 1.
    #[must_use]
    pub fn num_constraints(&self) -> usize {
        self.num_constraints
    }

    /// Returns `true` if the model has a holonomic constraint.
    #[must_use]
    pub fn is_constrained(&self) -> bool {
        self.num_constraints == 1
    }

    /// Number of system inputs the model computes per evaluation.
    #[must_use]
    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }
}
