use purchase_core::PipelineError;
use thiserror::Error;

/// Errors returned by ingestion and model persistence.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("row {row}: {reason}")]
    Ingest { row: usize, reason: String },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("no events found in {0}")]
    NoEvents(String),

    #[error("model hash mismatch: expected {expected}, computed {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("model format error: {0}")]
    Format(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
