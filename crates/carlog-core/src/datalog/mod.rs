//! Datalog
//!
//! In-memory representation of a loaded engine datalog, plus CSV
//! ingestion/export and canonical channel naming.

mod format;
pub mod schema;

pub use format::{read_csv, read_csv_file, read_log_file, write_csv, LogFormat};
pub use schema::{CanonicalChannel, SchemaMap, SchemaResolution};

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Values held by a single channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChannelData {
    /// Numeric samples; missing cells are `NaN`
    Numeric(Vec<f64>),
    /// Free-form text (gear labels, status flags, ...)
    Text(Vec<String>),
}

impl ChannelData {
    /// Number of rows in this channel
    pub fn len(&self) -> usize {
        match self {
            ChannelData::Numeric(v) => v.len(),
            ChannelData::Text(v) => v.len(),
        }
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn select(&self, rows: &[usize]) -> ChannelData {
        match self {
            ChannelData::Numeric(v) => {
                ChannelData::Numeric(rows.iter().filter_map(|&r| v.get(r).copied()).collect())
            }
            ChannelData::Text(v) => {
                ChannelData::Text(rows.iter().filter_map(|&r| v.get(r).cloned()).collect())
            }
        }
    }
}

/// A named column in the datalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Column name, including embedded units (e.g. `"Boost (psi)"`)
    pub name: String,
    /// Sample values
    pub data: ChannelData,
}

impl Channel {
    /// Create a numeric channel
    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            data: ChannelData::Numeric(values),
        }
    }

    /// Create a text channel
    pub fn text(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            data: ChannelData::Text(values),
        }
    }

    /// Numeric values, if this is a numeric channel
    pub fn values(&self) -> Option<&[f64]> {
        match &self.data {
            ChannelData::Numeric(v) => Some(v),
            ChannelData::Text(_) => None,
        }
    }
}

/// An ordered table of time-stamped sensor snapshots, stored column-wise.
///
/// All channels have the same row count. Transforms never mutate in place;
/// they return a new `Dataset`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    channels: Vec<Channel>,
    rows: usize,
}

impl Dataset {
    /// Build a dataset from channels of equal length
    pub fn new(channels: Vec<Channel>) -> Result<Self> {
        let rows = channels.first().map(|c| c.data.len()).unwrap_or(0);
        if let Some(bad) = channels.iter().find(|c| c.data.len() != rows) {
            return Err(AnalysisError::RaggedChannel {
                channel: bad.name.clone(),
                expected: rows,
                actual: bad.data.len(),
            });
        }
        Ok(Self { channels, rows })
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// All channels, in column order
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Channel names, in column order
    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name.as_str()).collect()
    }

    /// Check whether a channel exists
    pub fn has_channel(&self, name: &str) -> bool {
        self.channel_index(name).is_some()
    }

    /// Find the index of a channel by name
    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channels.iter().position(|c| c.name == name)
    }

    /// Get a channel by name
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name == name)
    }

    /// Numeric values of a channel.
    ///
    /// Callers are expected to have validated presence already; this still
    /// reports a missing channel as an error rather than panicking.
    pub fn numeric(&self, name: &str) -> Result<&[f64]> {
        let channel = self
            .channel(name)
            .ok_or_else(|| AnalysisError::MissingColumns {
                operation: "channel lookup".to_string(),
                missing: vec![name.to_string()],
            })?;
        channel
            .values()
            .ok_or_else(|| AnalysisError::NonNumericChannel(name.to_string()))
    }

    /// Return a copy of this dataset with `channel` added, or replacing an
    /// existing channel of the same name in place.
    pub fn with_channel(&self, channel: Channel) -> Result<Dataset> {
        if !self.channels.is_empty() && channel.data.len() != self.rows {
            return Err(AnalysisError::RaggedChannel {
                channel: channel.name,
                expected: self.rows,
                actual: channel.data.len(),
            });
        }

        let mut channels = self.channels.clone();
        match channels.iter_mut().find(|c| c.name == channel.name) {
            Some(existing) => *existing = channel,
            None => channels.push(channel),
        }
        Dataset::new(channels)
    }

    /// Rename a channel in place
    pub(crate) fn rename_channel(&mut self, from: &str, to: &str) {
        if let Some(channel) = self.channels.iter_mut().find(|c| c.name == from) {
            channel.name = to.to_string();
        }
    }

    /// Apply `f` to every sample of a numeric channel in place
    pub(crate) fn map_numeric(&mut self, name: &str, f: impl Fn(f64) -> f64) {
        if let Some(Channel {
            data: ChannelData::Numeric(values),
            ..
        }) = self.channels.iter_mut().find(|c| c.name == name)
        {
            values.iter_mut().for_each(|v| *v = f(*v));
        }
    }

    /// New dataset holding only the given rows, in the given order
    pub fn select_rows(&self, rows: &[usize]) -> Dataset {
        let rows: Vec<usize> = rows.iter().copied().filter(|&r| r < self.rows).collect();
        Dataset {
            channels: self
                .channels
                .iter()
                .map(|c| Channel {
                    name: c.name.clone(),
                    data: c.data.select(&rows),
                })
                .collect(),
            rows: rows.len(),
        }
    }

    /// First and last finite timestamp of the `Time (sec)` channel
    pub fn time_span(&self) -> Option<(f64, f64)> {
        let time = self.numeric(CanonicalChannel::Time.column()).ok()?;
        let first = time.iter().copied().find(|t| t.is_finite())?;
        let last = time.iter().rev().copied().find(|t| t.is_finite())?;
        Some((first, last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_dataset() -> Dataset {
        Dataset::new(vec![
            Channel::numeric("Time (sec)", vec![0.0, 0.1, 0.2]),
            Channel::numeric("RPM (RPM)", vec![1000.0, 2000.0, 3000.0]),
            Channel::text("Gear", vec!["1".into(), "1".into(), "2".into()]),
        ])
        .unwrap()
    }

    #[test]
    fn test_ragged_channels_rejected() {
        let result = Dataset::new(vec![
            Channel::numeric("a", vec![1.0, 2.0]),
            Channel::numeric("b", vec![1.0]),
        ]);
        assert!(matches!(
            result,
            Err(AnalysisError::RaggedChannel { expected: 2, actual: 1, .. })
        ));
    }

    #[test]
    fn test_with_channel_overwrites() {
        let data = make_test_dataset();
        let updated = data
            .with_channel(Channel::numeric("RPM (RPM)", vec![1.0, 2.0, 3.0]))
            .unwrap();

        assert_eq!(updated.channels().len(), 3);
        assert_eq!(updated.numeric("RPM (RPM)").unwrap(), &[1.0, 2.0, 3.0]);
        // Source untouched
        assert_eq!(data.numeric("RPM (RPM)").unwrap()[0], 1000.0);
    }

    #[test]
    fn test_select_rows() {
        let data = make_test_dataset();
        let subset = data.select_rows(&[0, 2, 7]);
        assert_eq!(subset.len(), 2);
        assert_eq!(subset.numeric("RPM (RPM)").unwrap(), &[1000.0, 3000.0]);
        assert_eq!(
            subset.channel("Gear").map(|c| c.data.clone()),
            Some(ChannelData::Text(vec!["1".into(), "2".into()]))
        );
    }

    #[test]
    fn test_numeric_lookup_errors() {
        let data = make_test_dataset();
        assert!(matches!(
            data.numeric("Gear"),
            Err(AnalysisError::NonNumericChannel(_))
        ));
        assert!(data.numeric("Boost (psi)").is_err());
        assert_eq!(data.time_span(), Some((0.0, 0.2)));
    }
}
