use std::convert::Infallible;

use cds_core::{Dimensions, Forcing, ModelEquations, RowMajorMatrix};
use serde::{Deserialize, Serialize};

use crate::STANDARD_GRAVITY;
use crate::error::{ParamError, finite, non_negative, positive};

/// Parameters of a [`FallingMass`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FallingMassParams {
    pub mass: f64,
    pub gravity: f64,
    pub initial_velocity: f64,
    pub initial_position: f64,
}

impl Default for FallingMassParams {
    fn default() -> Self {
        Self {
            mass: 1.0,
            gravity: STANDARD_GRAVITY,
            initial_velocity: 0.0,
            initial_position: 0.0,
        }
    }
}

/// A point mass falling under constant gravity.
///
/// One coordinate `y`, measured downward: `M = [m]`, `c = [-m·g]`, so
/// `y'' = g`. State is `[y', y]`.
#[derive(Debug, Clone)]
pub struct FallingMass {
    params: FallingMassParams,
    dims: Dimensions,
}

impl FallingMass {
    /// Creates the model after validating its parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if `mass` is not positive, `gravity` is negative, or
    /// an initial condition is not finite.
    pub fn new(params: FallingMassParams) -> Result<Self, ParamError> {
        positive("mass", params.mass)?;
        non_negative("gravity", params.gravity)?;
        finite("initial_velocity", params.initial_velocity)?;
        finite("initial_position", params.initial_position)?;

        Ok(Self {
            params,
            dims: Dimensions::new(1, 0)?,
        })
    }

    #[must_use]
    pub fn params(&self) -> &FallingMassParams {
        &self.params
    }
}

impl ModelEquations for FallingMass {
    type Error = Infallible;

    fn dimensions(&self) -> Dimensions {
        self.dims
    }

    fn initial_state(&self) -> Vec<f64> {
        vec![self.params.initial_velocity, self.params.initial_position]
    }

    fn state_labels(&self) -> Vec<String> {
        vec!["dy".into(), "y".into()]
    }

    fn mass_matrix(
        &self,
        _t: f64,
        _x: &[f64],
        _u: &[f64],
        m: &mut RowMajorMatrix,
    ) -> Result<(), Self::Error> {
        m.set(0, 0, self.params.mass);
        Ok(())
    }

    fn forcing(&self, _t: f64, _x: &[f64], _u: &[f64], f: &mut Forcing) -> Result<(), Self::Error> {
        f.c[0] = -self.params.mass * self.params.gravity;
        Ok(())
    }
}
