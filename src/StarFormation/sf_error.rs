use thiserror::Error;

/// error types of the star formation toolkit
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StarFormationError {
    /// malformed parameter set, non-positive step or horizon, inconsistent sequences
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// first non-finite sample of a trajectory
    #[error("Numeric divergence: {variable} is not finite at t = {time} (sample {index})")]
    NumericDivergence {
        variable: String,
        index: usize,
        time: f64,
    },
    #[error("Insufficient peaks to estimate period: found {found}, at least 2 required")]
    InsufficientPeaks { found: usize },
    /// the adaptive backend could not deliver the requested samples
    #[error("Solver failure: {0}")]
    SolverFailure(String),
}

impl From<serde_json::Error> for StarFormationError {
    fn from(err: serde_json::Error) -> Self {
        StarFormationError::InvalidInput(format!("malformed parameter set: {}", err))
    }
}
