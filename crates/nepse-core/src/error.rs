use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Empty series")]
    EmptySeries,

    #[error("Insufficient data: need at least {required} bars, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Non-monotonic timestamps at index {index}")]
    NonMonotonicTimestamps { index: usize },

    #[error("Invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: String },

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}
