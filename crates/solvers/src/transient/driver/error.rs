use std::collections::TryReserveError;

use cds_core::LayoutError;

use super::ConfigError;

/// Errors that stop a run before any sample is taken.
///
/// Failures while stepping are not errors; they are reported through
/// [`Status::Failed`](super::Status::Failed) alongside the samples taken.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("initial state has {actual} entries but the system has {expected}")]
    StateLength { expected: usize, actual: usize },

    #[error("model initial state does not fit its dimensions: {0}")]
    InitialState(#[from] LayoutError),

    #[error("could not allocate run buffers: {0}")]
    Allocation(#[from] TryReserveError),
}
