//! Error types for the purchase prediction core

use thiserror::Error;

/// Errors that can occur in any stage of the pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A raw event carried an unusable numeric field
    #[error("Malformed input: field `{field}` {reason}")]
    MalformedInput { field: &'static str, reason: String },

    /// Fit or evaluate was called on a dataset with no examples
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    /// Split fraction outside the open interval (0, 1)
    #[error("Invalid test fraction {0}: must lie strictly between 0 and 1")]
    InvalidFraction(f64),

    /// Training set is empty or holds a single class
    #[error("Insufficient training data: {0}")]
    InsufficientData(String),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Training was cancelled between boosting iterations
    #[error("Training cancelled after {completed} of {requested} iterations")]
    Cancelled { completed: usize, requested: usize },

    /// A training run was driven from a state that does not allow it
    #[error("Invalid training state: {0}")]
    InvalidState(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
