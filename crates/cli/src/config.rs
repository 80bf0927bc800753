//! Run configuration loaded from TOML.
//!
//! ```toml
//! [solver]
//! rel_tol = 1e-7
//! abs_tol = 1e-7            # or one value per state entry
//! dt = 0.02
//! t_initial = 0.0
//! t_final = 10.0
//! max_internal_steps = 10000
//! max_order = 5
//! min_step = 0.0
//!
//! [model]
//! kind = "pendulum"
//! length = 2.0
//! ```
//!
//! Every `[solver]` field is optional and falls back to the values above.

use std::{fs, io, path::Path, path::PathBuf};

use cds_models::ModelConfig;
use cds_solvers::integrator::bdf::{self, MAX_ORDER};
use cds_solvers::transient::driver::{
    self, DEFAULT_ABS_TOL, DEFAULT_MAX_INTERNAL_STEPS, DEFAULT_REL_TOL,
};
use serde::Deserialize;
use thiserror::Error;

/// Output interval used when none is configured.
pub const DEFAULT_DT: f64 = 0.02;

/// Simulated span used when none is configured.
pub const DEFAULT_T_FINAL: f64 = 10.0;

/// A complete run: solver settings and the model to simulate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default)]
    pub solver: SolverConfig,
    pub model: ModelConfig,
}

/// Absolute tolerance: one value for every state entry, or one each.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AbsTol {
    Scalar(f64),
    PerComponent(Vec<f64>),
}

impl AbsTol {
    fn into_vec(self) -> Vec<f64> {
        match self {
            Self::Scalar(value) => vec![value],
            Self::PerComponent(values) => values,
        }
    }
}

/// The `[solver]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    pub rel_tol: f64,
    pub abs_tol: AbsTol,
    pub dt: f64,
    pub t_initial: f64,
    pub t_final: f64,
    pub max_internal_steps: usize,
    pub max_order: usize,
    pub min_step: f64,
    pub max_step: Option<f64>,
    pub initial_step: Option<f64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            rel_tol: DEFAULT_REL_TOL,
            abs_tol: AbsTol::Scalar(DEFAULT_ABS_TOL),
            dt: DEFAULT_DT,
            t_initial: 0.0,
            t_final: DEFAULT_T_FINAL,
            max_internal_steps: DEFAULT_MAX_INTERNAL_STEPS,
            max_order: MAX_ORDER,
            min_step: 0.0,
            max_step: None,
            initial_step: None,
        }
    }
}

impl SolverConfig {
    /// Validates the settings and builds the driver config.
    ///
    /// # Errors
    ///
    /// Returns an error if any setting is out of range.
    pub fn to_driver(&self) -> Result<driver::Config, driver::ConfigError> {
        let mut integrator = bdf::Config::new(
            self.rel_tol,
            self.abs_tol.clone().into_vec(),
            self.max_internal_steps,
        )?
        .with_max_order(self.max_order)?;
        if let Some(max_step) = self.max_step {
            integrator = integrator.with_max_step(max_step)?;
        }
        integrator = integrator.with_min_step(self.min_step)?;
        if let Some(initial_step) = self.initial_step {
            integrator = integrator.with_initial_step(initial_step)?;
        }

        Ok(driver::Config::new(self.t_initial, self.t_final, self.dt)?.with_integrator(integrator))
    }
}

/// Errors that can occur while loading a run configuration.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid run configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

impl RunConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid run configuration.
    pub fn from_toml(text: &str) -> Result<Self, LoadError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }
}
