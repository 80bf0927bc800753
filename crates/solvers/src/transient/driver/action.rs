/// Control actions supported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop stepping and return the samples recorded so far.
    StopEarly,
}
