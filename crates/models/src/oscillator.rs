use std::convert::Infallible;

use cds_core::state::split;
use cds_core::{Dimensions, Forcing, ModelEquations, RowMajorMatrix};
use serde::{Deserialize, Serialize};

use crate::error::{ParamError, finite, non_negative, positive};

/// Parameters of a [`DrivenOscillator`].
///
/// `drive_frequency` is an angular frequency in rad/s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DrivenOscillatorParams {
    pub mass: f64,
    pub stiffness: f64,
    pub damping: f64,
    pub drive_amplitude: f64,
    pub drive_frequency: f64,
    pub initial_displacement: f64,
    pub initial_velocity: f64,
}

impl Default for DrivenOscillatorParams {
    fn default() -> Self {
        Self {
            mass: 1.0,
            stiffness: 4.0,
            damping: 0.0,
            drive_amplitude: 0.0,
            drive_frequency: 1.0,
            initial_displacement: 1.0,
            initial_velocity: 0.0,
        }
    }
}

/// A mass-spring-damper driven by a sinusoidal force.
///
/// ```text
/// m x'' + d x' + k x = u(t),   u(t) = F sin(ω t)
/// ```
///
/// The drive `u` is computed as the model's single system input. State is
/// `[x', x]`.
#[derive(Debug, Clone)]
pub struct DrivenOscillator {
    params: DrivenOscillatorParams,
    dims: Dimensions,
}

impl DrivenOscillator {
    /// Creates the model after validating its parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if `mass` or `stiffness` is not positive, `damping`
    /// is negative, or any other parameter is not finite.
    pub fn new(params: DrivenOscillatorParams) -> Result<Self, ParamError> {
        positive("mass", params.mass)?;
        positive("stiffness", params.stiffness)?;
        non_negative("damping", params.damping)?;
        finite("drive_amplitude", params.drive_amplitude)?;
        finite("drive_frequency", params.drive_frequency)?;
        finite("initial_displacement", params.initial_displacement)?;
        finite("initial_velocity", params.initial_velocity)?;

        Ok(Self {
            params,
            dims: Dimensions::with_inputs(1, 0, 1)?,
        })
    }

    #[must_use]
    pub fn params(&self) -> &DrivenOscillatorParams {
        &self.params
    }

    /// Undamped natural frequency `√(k/m)`, rad/s.
    #[must_use]
    pub fn natural_frequency(&self) -> f64 {
        (self.params.stiffness / self.params.mass).sqrt()
    }
}

impl ModelEquations for DrivenOscillator {
    type Error = Infallible;

    fn dimensions(&self) -> Dimensions {
        self.dims
    }

    fn initial_state(&self) -> Vec<f64> {
        vec![self.params.initial_velocity, self.params.initial_displacement]
    }

    fn state_labels(&self) -> Vec<String> {
        vec!["dx".into(), "x".into()]
    }

    fn inputs(&self, t: f64, _x: &[f64], u: &mut [f64]) -> Result<(), Self::Error> {
        u[0] = self.params.drive_amplitude * (self.params.drive_frequency * t).sin();
        Ok(())
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

    fn forcing(&self, _t: f64, x: &[f64], u: &[f64], f: &mut Forcing) -> Result<(), Self::Error> {
        let (v, q) = split(x);
        let (v, q) = (v[0], q[0]);
        f.c[0] = self.params.damping * v + self.params.stiffness * q - u[0];
        Ok(())
    }
}
