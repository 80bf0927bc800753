use std::error::Error as StdError;

/// Errors that can occur while evaluating constrained dynamics.
#[derive(Debug, thiserror::Error)]
pub enum DynamicsError {
    /// The mass matrix could not be factored, or the solve produced a
    /// non-finite acceleration.
    #[error("singular mass matrix at t = {t}")]
    SingularSystem { t: f64 },

    /// The constraint is not coupled to the dynamics: `dT · M⁻¹ b` vanishes.
    #[error("singular constraint coupling at t = {t} (dT·M⁻¹b = {coupling})")]
    SingularConstraint { t: f64, coupling: f64 },

    /// The model equations failed.
    #[error("model error at t = {t}: {source}")]
    Model {
        t: f64,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl DynamicsError {
    pub(crate) fn model<E: StdError + Send + Sync + 'static>(t: f64, err: E) -> Self {
        Self::Model {
            t,
            source: Box::new(err),
        }
    }
}
