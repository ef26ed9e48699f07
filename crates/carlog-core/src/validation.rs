//! Column validation
//!
//! Every operation that reads named channels checks for them here first, so
//! a missing column is reported by name instead of failing mid-computation.

use crate::datalog::Dataset;
use crate::error::{AnalysisError, Result};

/// Outcome of checking a dataset for a set of required columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnCheck {
    missing: Vec<String>,
}

impl ColumnCheck {
    /// True when every required column is present
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Required columns that were not found, in the order requested
    pub fn missing(&self) -> &[String] {
        &self.missing
    }
}

/// Check which of `required` are absent from `dataset`
pub fn check_columns(dataset: &Dataset, required: &[&str]) -> ColumnCheck {
    ColumnCheck {
        missing: required
            .iter()
            .filter(|name| !dataset.has_channel(name))
            .map(|name| name.to_string())
            .collect(),
    }
}

/// Like [`check_columns`], but turns missing columns into an error that names
/// the operation being attempted
pub fn require_columns(dataset: &Dataset, operation: &str, required: &[&str]) -> Result<()> {
    let check = check_columns(dataset, required);
    if check.is_complete() {
        Ok(())
    } else {
        Err(AnalysisError::MissingColumns {
            operation: operation.to_string(),
            missing: check.missing,
        })
    }
}
