use std::convert::Infallible;

use cds_core::state::split;
use cds_core::{Dimensions, Forcing, ModelEquations, RowMajorMatrix};
use serde::{Deserialize, Serialize};

use crate::STANDARD_GRAVITY;
use crate::error::{ParamError, finite, non_negative, positive};

/// Parameters of a [`Crane`].
///
/// The trolley is pushed by `drive_force` from `t = 0` until
/// `drive_duration`, then coasts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CraneParams {
    pub trolley_mass: f64,
    pub load_mass: f64,
    pub rope_length: f64,
    pub gravity: f64,
    pub trolley_damping: f64,
    pub drive_force: f64,
    pub drive_duration: f64,
    pub initial_angle: f64,
}

impl Default for CraneParams {
    fn default() -> Self {
        Self {
            trolley_mass: 10.0,
            load_mass: 2.0,
            rope_length: 1.5,
            gravity: STANDARD_GRAVITY,
            trolley_damping: 0.0,
            drive_force: 20.0,
            drive_duration: 1.0,
            initial_angle: 0.0,
        }
    }
}

/// A gantry crane: a trolley on a horizontal rail with a load hanging from
/// a rope of fixed length.
///
/// Coordinates are the trolley position `s` and the rope angle `φ` from the
/// downward vertical. The mass matrix couples the two through the load:
///
/// ```text
/// M = | M_t + m     m L cos φ |
///     | m L cos φ   m L²      |
///
/// c = [ d s' - m L φ'² sin φ - u,  m g L sin φ ]
/// ```
///
/// where `u` is the drive force, the model's single system input. State is
/// `[s', φ', s, φ]`.
#[derive(Debug, Clone)]
pub struct Crane {
    params: CraneParams,
    dims: Dimensions,
}

impl Crane {
    /// Creates the model after validating its parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if a mass or the rope length is not positive,
    /// `gravity`, `trolley_damping`, or `drive_duration` is negative, or
    /// another parameter is not finite.
    pub fn new(params: CraneParams) -> Result<Self, ParamError> {
        positive("trolley_mass", params.trolley_mass)?;
        positive("load_mass", params.load_mass)?;
        positive("rope_length", params.rope_length)?;
        non_negative("gravity", params.gravity)?;
        non_negative("trolley_damping", params.trolley_damping)?;
        finite("drive_force", params.drive_force)?;
        non_negative("drive_duration", params.drive_duration)?;
        finite("initial_angle", params.initial_angle)?;

        Ok(Self {
            params,
            dims: Dimensions::with_inputs(2, 0, 1)?,
        })
    }

    #[must_use]
    pub fn params(&self) -> &CraneParams {
        &self.params
    }

    /// Kinetic plus potential energy of state `x`.
    #[must_use]
    pub fn energy(&self, x: &[f64]) -> f64 {
        let CraneParams {
            trolley_mass,
            load_mass: m,
            rope_length: l,
            gravity: g,
            ..
        } = self.params;
        let (v, q) = split(x);
        let (ds, dphi, phi) = (v[0], v[1], q[1]);
        0.5 * (trolley_mass + m) * ds * ds
            + m * l * phi.cos() * ds * dphi
            + 0.5 * m * l * l * dphi * dphi
            - m * g * l * phi.cos()
    }

    /// Horizontal momentum of trolley and load together.
    #[must_use]
    pub fn momentum(&self, x: &[f64]) -> f64 {
        let CraneParams {
            trolley_mass,
            load_mass: m,
            rope_length: l,
            ..
        } = self.params;
        let (v, q) = split(x);
        (trolley_mass + m) * v[0] + m * l * q[1].cos() * v[1]
    }
}

impl ModelEquations for Crane {
    type Error = Infallible;

    fn dimensions(&self) -> Dimensions {
        self.dims
    }

    fn initial_state(&self) -> Vec<f64> {
        vec![0.0, 0.0, 0.0, self.params.initial_angle]
    }

    fn state_labels(&self) -> Vec<String> {
        ["ds", "dphi", "s", "phi"].map(String::from).to_vec()
    }

    fn inputs(&self, t: f64, _x: &[f64], u: &mut [f64]) -> Result<(), Self::Error> {
        u[0] = if t < self.params.drive_duration {
            self.params.drive_force
        } else {
            0.0
        };
        Ok(())
    }

    fn mass_matrix(
        &self,
        _t: f64,
        x: &[f64],
        _u: &[f64],
        m: &mut RowMajorMatrix,
    ) -> Result<(), Self::Error> {
        let CraneParams {
            trolley_mass,
            load_mass,
            rope_length: l,
            ..
        } = self.params;
        let (_, q) = split(x);
        let coupling = load_mass * l * q[1].cos();

        m.set(0, 0, trolley_mass + load_mass);
        m.set(0, 1, coupling);
        m.set(1, 0, coupling);
        m.set(1, 1, load_mass * l * l);
        Ok(())
    }

    fn forcing(&self, _t: f64, x: &[f64], u: &[f64], f: &mut Forcing) -> Result<(), Self::Error> {
        let CraneParams {
            load_mass: m,
            rope_length: l,
            gravity: g,
            trolley_damping: d,
            ..
        } = self.params;
        let (v, q) = split(x);
        let (ds, dphi, phi) = (v[0], v[1], q[1]);
        let (sin, _) = phi.sin_cos();

        f.c[0] = d * ds - m * l * dphi * dphi * sin - u[0];
        f.c[1] = m * g * l * sin;
        Ok(())
    }
}
