use crate::integrator::AdvanceStatus;

/// Event emitted by the driver after each recorded sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// The sample number, starting at 1 for the first output time.
    pub sample: usize,

    /// The time the integrator actually reached.
    pub time: f64,

    /// The state at `time`.
    pub state: Vec<f64>,

    /// How the advance to this sample finished.
    pub status: AdvanceStatus,
}
