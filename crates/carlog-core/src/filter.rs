//! Range Filter
//!
//! Narrows a datalog to the rows of interest (e.g. a wide-open-throttle
//! pull): RPM bounds always, throttle and load bounds when the log has
//! those channels, and an optional custom expression.

use evalexpr::{build_operator_tree, ContextWithMutableVariables, HashMapContext, Node, Value};
use serde::{Deserialize, Serialize};

use crate::datalog::{CanonicalChannel, Dataset};
use crate::error::{AnalysisError, Result};
use crate::validation::require_columns;

/// Inclusive numeric bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
}

impl ValueRange {
    /// Create a range from inclusive bounds
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies within `[min, max]`. NaN is never contained.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Overlap of two ranges; may be empty (`min > max`)
    pub fn intersect(&self, other: &ValueRange) -> ValueRange {
        ValueRange {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        }
    }

    /// True when no value can satisfy the range
    pub fn is_empty(&self) -> bool {
        !(self.min <= self.max)
    }
}

/// Row filter over RPM, throttle, load and an optional custom expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeFilter {
    /// Engine speed bounds; always applied
    pub rpm: ValueRange,
    /// Throttle position bounds (%)
    pub throttle: Option<ValueRange>,
    /// Calculated load bounds
    pub load: Option<ValueRange>,
    /// Boolean expression over channel short names, e.g. `boost > 5 && afr < 12.5`
    pub custom_filter: Option<String>,
}

impl Default for RangeFilter {
    fn default() -> Self {
        Self {
            rpm: ValueRange::new(0.0, 10_000.0),
            throttle: None,
            load: None,
            custom_filter: None,
        }
    }
}

impl RangeFilter {
    /// Filter on RPM only
    pub fn rpm(min: f64, max: f64) -> Self {
        Self {
            rpm: ValueRange::new(min, max),
            ..Self::default()
        }
    }

    /// Also require throttle position within `min..=max`
    pub fn with_throttle(mut self, min: f64, max: f64) -> Self {
        self.throttle = Some(ValueRange::new(min, max));
        self
    }

    /// Also require calculated load within `min..=max`
    pub fn with_load(mut self, min: f64, max: f64) -> Self {
        self.load = Some(ValueRange::new(min, max));
        self
    }

    /// Also require `expression` to hold
    pub fn with_custom_filter(mut self, expression: impl Into<String>) -> Self {
        self.custom_filter = Some(expression.into());
        self
    }

    /// Row indices that pass every active constraint, in ascending order
    pub fn matching_rows(&self, dataset: &Dataset) -> Result<Vec<usize>> {
        let rpm_col = CanonicalChannel::Rpm.column();
        require_columns(dataset, "range filter", &[rpm_col])?;

        let mut constraints: Vec<(&[f64], ValueRange)> = vec![(dataset.numeric(rpm_col)?, self.rpm)];
        for (channel, range) in [
            (CanonicalChannel::Throttle, self.throttle),
            (CanonicalChannel::CalculatedLoad, self.load),
        ] {
            let Some(range) = range else {
                continue;
            };
            match dataset.numeric(channel.column()) {
                Ok(values) => constraints.push((values, range)),
                Err(AnalysisError::MissingColumns { .. }) => {
                    tracing::debug!(
                        "Skipping {} constraint: channel not in log",
                        channel.column()
                    );
                }
                Err(e) => {
                    tracing::debug!("Skipping {} constraint: {e}", channel.column());
                }
            }
        }

        let custom = match self.custom_filter.as_deref().map(str::trim) {
            Some(expr) if !expr.is_empty() => Some(CustomFilter::compile(expr, dataset)?),
            _ => None,
        };

        let mut rejected = 0usize;
        let mut first_error = None;
        let mut rows = Vec::new();
        for row in 0..dataset.len() {
            if !constraints
                .iter()
                .all(|(values, range)| range.contains(values[row]))
            {
                continue;
            }
            let keep = match &custom {
                Some(filter) => filter.evaluate(row).unwrap_or_else(|e| {
                    rejected += 1;
                    first_error.get_or_insert(e);
                    false
                }),
                None => true,
            };
            if keep {
                rows.push(row);
            }
        }

        if let (Some(filter), Some(e)) = (&custom, first_error) {
            tracing::warn!(
                "Custom filter '{}' rejected {rejected} rows it could not evaluate: {e}",
                filter.expression
            );
        }

        Ok(rows)
    }

    /// New dataset containing only the matching rows; `dataset` is unchanged
    pub fn apply(&self, dataset: &Dataset) -> Result<Dataset> {
        let rows = self.matching_rows(dataset)?;
        tracing::debug!("Range filter kept {} of {} rows", rows.len(), dataset.len());
        Ok(dataset.select_rows(&rows))
    }
}

/// A parsed custom expression bound to a dataset's canonical channels.
///
/// Every canonical short name is a variable; channels the log does not have
/// read as `NaN`, so comparisons against them are simply false.
struct CustomFilter<'a> {
    expression: String,
    tree: Node,
    variables: Vec<(&'static str, Option<&'a [f64]>)>,
}

impl<'a> CustomFilter<'a> {
    /// Parse `expression` and check it evaluates to a boolean or number.
    ///
    /// The expression is tried once against the first row (or all zeros for
    /// an empty log), so malformed input fails here instead of on every row.
    fn compile(expression: &str, dataset: &'a Dataset) -> Result<Self> {
        let invalid =
            |e: String| AnalysisError::InvalidParameter(format!("custom filter '{expression}': {e}"));
        let tree = build_operator_tree(expression).map_err(|e| invalid(e.to_string()))?;

        let variables = CanonicalChannel::ALL
            .iter()
            .map(|channel| (channel.short_name(), dataset.numeric(channel.column()).ok()))
            .collect();

        let filter = Self {
            expression: expression.to_string(),
            tree,
            variables,
        };

        let trial = if dataset.is_empty() {
            filter.evaluate_with(|_| 0.0)
        } else {
            filter.evaluate(0)
        };
        trial.map_err(invalid)?;

        Ok(filter)
    }

    fn evaluate(&self, row: usize) -> std::result::Result<bool, String> {
        self.evaluate_with(|values| values.map_or(f64::NAN, |v| v[row]))
    }

    fn evaluate_with<F>(&self, sample: F) -> std::result::Result<bool, String>
    where
        F: Fn(Option<&[f64]>) -> f64,
    {
        let mut ctx = HashMapContext::new();
        for (name, values) in &self.variables {
            ctx.set_value(name.to_string(), Value::Float(sample(*values)))
                .map_err(|e| format!("Failed to set {name}: {e}"))?;
        }

        match self.tree.eval_with_context(&ctx) {
            Ok(Value::Boolean(val)) => Ok(val),
            Ok(Value::Int(val)) => Ok(val != 0),
            Ok(Value::Float(val)) => Ok(val != 0.0),
            Ok(other) => Err(format!(
                "Custom filter must return boolean or number, got {other:?}"
            )),
            Err(e) => Err(format!("Custom filter eval error: {e}")),
        }
    }
}
