//! Error types for vmplan

use thiserror::Error;

/// Main error type for vmplan operations.
///
/// An infeasible or timed-out search is not an error: it is reported
/// through the solving status and statistics instead.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The model or its parameters cannot be turned into a problem
    /// (missing duration evaluator, negative duration, illegal state
    /// change, unknown constraint kind, ...).
    #[error("Model inconsistency: {0}")]
    ModelInconsistency(String),

    /// A constraint spans several partitions and no splitter accepted it,
    /// or the partitions themselves are malformed.
    #[error("Unable to split the instance: {0}")]
    SplitRejected(String),

    /// A partition worker returned an error or panicked.
    #[error("Partition {partition} failed: {message}")]
    WorkerFailure { partition: usize, message: String },

    /// Error in scheduler configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not occur in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SchedulerError {
    /// Shorthand for [`SchedulerError::ModelInconsistency`].
    pub fn inconsistency(msg: impl Into<String>) -> Self {
        SchedulerError::ModelInconsistency(msg.into())
    }
}

/// Result type alias for vmplan operations
pub type Result<T> = std::result::Result<T, SchedulerError>;
