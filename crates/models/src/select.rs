use std::convert::Infallible;

use cds_core::{Dimensions, Forcing, ModelEquations, RowMajorMatrix};
use serde::{Deserialize, Serialize};

use crate::{
    Crane, CraneParams, DrivenOscillator, DrivenOscillatorParams, FallingMass,
    FallingMassParams, ParamError, Pendulum, PendulumParams,
};

/// Selects a model and its parameters by a `kind` tag.
///
/// ```toml
/// kind = "pendulum"
/// length = 2.0
/// initial_angle = 0.3
/// ```
///
/// Omitted parameters take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelConfig {
    FallingMass(FallingMassParams),
    DrivenOscillator(DrivenOscillatorParams),
    Pendulum(PendulumParams),
    Crane(CraneParams),
}

impl ModelConfig {
    /// The `kind` tag of this config.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FallingMass(_) => "falling_mass",
            Self::DrivenOscillator(_) => "driven_oscillator",
            Self::Pendulum(_) => "pendulum",
            Self::Crane(_) => "crane",
        }
    }

    /// Validates the parameters and builds the model.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters are invalid for the selected model.
    pub fn build(self) -> Result<AnyModel, ParamError> {
        Ok(match self {
            Self::FallingMass(p) => AnyModel::FallingMass(FallingMass::new(p)?),
            Self::DrivenOscillator(p) => AnyModel::DrivenOscillator(DrivenOscillator::new(p)?),
            Self::Pendulum(p) => AnyModel::Pendulum(Pendulum::new(p)?),
            Self::Crane(p) => AnyModel::Crane(Crane::new(p)?),
        })
    }
}

/// Any of the models in this crate, chosen at runtime.
#[derive(Debug, Clone)]
pub enum AnyModel {
    FallingMass(FallingMass),
    DrivenOscillator(DrivenOscillator),
    Pendulum(Pendulum),
    Crane(Crane),
}

macro_rules! dispatch {
    ($self:ident, $model:ident => $body:expr) => {
        match $self {
            AnyModel::FallingMass($model) => $body,
            AnyModel::DrivenOscillator($model) => $body,
            AnyModel::Pendulum($model) => $body,
            AnyModel::Crane($model) => $body,
        }
    };
}

impl ModelEquations for AnyModel {
    type Error = Infallible;

    fn dimensions(&self) -> Dimensions {
        dispatch!(self, m => m.dimensions())
    }

    fn initial_state(&self) -> Vec<f64> {
        dispatch!(self, m => m.initial_state())
    }

    fn state_labels(&self) -> Vec<String> {
        dispatch!(self, m => m.state_labels())
    }

    fn inputs(&self, t: f64, x: &[f64], u: &mut [f64]) -> Result<(), Self::Error> {
        dispatch!(self, m => m.inputs(t, x, u))
    }

    fn mass_matrix(
        &self,
        t: f64,
        x: &[f64],
        u: &[f64],
        mass: &mut RowMajorMatrix,
    ) -> Result<(), Self::Error> {
        dispatch!(self, m => m.mass_matrix(t, x, u, mass))
    }

    fn forcing(&self, t: f64, x: &[f64], u: &[f64], f: &mut Forcing) -> Result<(), Self::Error> {
        dispatch!(self, m => m.forcing(t, x, u, f))
    }
}
