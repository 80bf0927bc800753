use std::convert::Infallible;

use cds_core::state::split;
use cds_core::{Dimensions, Forcing, ModelEquations, RowMajorMatrix};
use serde::{Deserialize, Serialize};

use crate::STANDARD_GRAVITY;
use crate::error::{ParamError, finite, non_negative, positive};

/// Parameters of a [`Pendulum`].
///
/// Angles are measured from the downward vertical, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PendulumParams {
    pub mass: f64,
    pub length: f64,
    pub gravity: f64,
    pub initial_angle: f64,
    pub initial_angular_velocity: f64,
}

impl Default for PendulumParams {
    fn default() -> Self {
        Self {
            mass: 1.0,
            length: 1.0,
            gravity: STANDARD_GRAVITY,
            initial_angle: 0.5,
            initial_angular_velocity: 0.0,
        }
    }
}

/// A point pendulum in Cartesian coordinates.
///
/// The bob moves freely in the plane (`q = [x, y]`, `y` up, pivot at the
/// origin) and is held at distance `L` by the holonomic constraint
/// `x² + y² = L²`. Differentiating the constraint twice gives the
/// acceleration-level row used by the multiplier solve:
///
/// ```text
/// M  = m I        c = [0, m g]
/// b  = [x, y]     dT = [x, y]     e = x'² + y'²
/// ```
///
/// The multiplier is the rod tension divided by `L`. State is
/// `[x', y', x, y]`.
#[derive(Debug, Clone)]
pub struct Pendulum {
    params: PendulumParams,
    dims: Dimensions,
}

impl Pendulum {
    /// Creates the model after validating its parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if `mass` or `length` is not positive, `gravity` is
    /// negative, or an initial condition is not finite.
    pub fn new(params: PendulumParams) -> Result<Self, ParamError> {
        positive("mass", params.mass)?;
        positive("length", params.length)?;
        non_negative("gravity", params.gravity)?;
        finite("initial_angle", params.initial_angle)?;
        finite("initial_angular_velocity", params.initial_angular_velocity)?;

        Ok(Self {
            params,
            dims: Dimensions::new(2, 1)?,
        })
    }

    #[must_use]
    pub fn params(&self) -> &PendulumParams {
        &self.params
    }

    /// Kinetic plus potential energy of state `x`.
    #[must_use]
    pub fn energy(&self, x: &[f64]) -> f64 {
        let PendulumParams { mass, gravity, .. } = self.params;
        let (v, p) = split(x);
        0.5 * mass * (v[0] * v[0] + v[1] * v[1]) + mass * gravity * p[1]
    }

    /// Distance of the bob from the pivot minus the rod length.
    #[must_use]
    pub fn length_error(&self, x: &[f64]) -> f64 {
        let (_, p) = split(x);
        p[0].hypot(p[1]) - self.params.length
    }
}

impl ModelEquations for Pendulum {
    type Error = Infallible;

    fn dimensions(&self) -> Dimensions {
        self.dims
    }

    fn initial_state(&self) -> Vec<f64> {
        let PendulumParams {
            length,
            initial_angle: theta,
            initial_angular_velocity: omega,
            ..
        } = self.params;
        let (sin, cos) = theta.sin_cos();
        vec![
            length * cos * omega,
            length * sin * omega,
            length * sin,
            -length * cos,
        ]
    }

    fn state_labels(&self) -> Vec<String> {
        ["dx", "dy", "x", "y"].map(String::from).to_vec()
    }

    fn mass_matrix(
        &self,
        _t: f64,
        _x: &[f64],
        _u: &[f64],
        m: &mut RowMajorMatrix,
    ) -> Result<(), Self::Error> {
        let mass = self.params.mass;
        m.as_mut_slice().copy_from_slice(&[mass, 0.0, 0.0, mass]);
        Ok(())
    }

    fn forcing(&self, _t: f64, x: &[f64], _u: &[f64], f: &mut Forcing) -> Result<(), Self::Error> {
        let (v, p) = split(x);
        let (vx, vy, px, py) = (v[0], v[1], p[0], p[1]);

        f.c[0] = 0.0;
        f.c[1] = self.params.mass * self.params.gravity;

        f.b[0] = px;
        f.b[1] = py;
        f.d_t[0] = px;
        f.d_t[1] = py;
        f.e = vx * vx + vy * vy;
        Ok(())
    }
}
