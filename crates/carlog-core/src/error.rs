//! Analysis errors

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur while analyzing a datalog
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Operation needs columns the dataset does not have
    #[error("Missing required columns for {operation}: {}", .missing.join(", "))]
    MissingColumns {
        /// Operation that was attempted
        operation: String,
        /// Absent column names, in the order required
        missing: Vec<String>,
    },

    /// Operation was requested before the step it depends on
    #[error("{operation} needs {prerequisite} to run first")]
    PrerequisiteNotMet {
        /// Operation that was attempted
        operation: String,
        /// Step that has to run first
        prerequisite: String,
    },

    /// Parameter or setting outside its valid range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Channel length differs from the rest of the dataset
    #[error("Channel '{channel}' has {actual} rows, expected {expected}")]
    RaggedChannel {
        /// Offending channel
        channel: String,
        /// Row count of the dataset
        expected: usize,
        /// Row count of the channel
        actual: usize,
    },

    /// Numeric operation on a text channel
    #[error("Channel '{0}' is not numeric")]
    NonNumericChannel(String),

    /// Channel has no finite samples
    #[error("No usable samples in '{0}'")]
    NoUsableSamples(String),

    /// Malformed log file
    #[error("Parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// What was wrong with the line
        message: String,
    },

    /// CSV reader/writer failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// Names of the missing columns, if this is a missing-columns error
    pub fn missing_columns(&self) -> Option<&[String]> {
        match self {
            AnalysisError::MissingColumns { missing, .. } => Some(missing),
            _ => None,
        }
    }

    /// Whether this error asks the caller to run a prerequisite step first
    pub fn is_prerequisite(&self) -> bool {
        matches!(self, AnalysisError::PrerequisiteNotMet { .. })
    }
}
