//! Plot-ready series and summaries
//!
//! Everything here returns plain numbers; rendering is the caller's job.

use serde::{Deserialize, Serialize};

use crate::datalog::{CanonicalChannel, Dataset};
use crate::error::{AnalysisError, Result};
use crate::smoothing::{smooth, SmoothingConfig};
use crate::validation::require_columns;

/// (time, value) pairs for one channel, skipping rows where either is missing
pub fn sensor_series(dataset: &Dataset, channel: &str) -> Result<Vec<(f64, f64)>> {
    let time_col = CanonicalChannel::Time.column();
    require_columns(dataset, "sensor over time", &[time_col, channel])?;
    Ok(paired(dataset.numeric(time_col)?, dataset.numeric(channel)?))
}

/// (RPM, smoothed boost) pairs
pub fn boost_vs_rpm(dataset: &Dataset, config: &SmoothingConfig) -> Result<Vec<(f64, f64)>> {
    let rpm_col = CanonicalChannel::Rpm.column();
    let boost_col = CanonicalChannel::Boost.column();
    require_columns(dataset, "boost vs rpm", &[rpm_col, boost_col])?;

    let rpm = dataset.numeric(rpm_col)?;
    let boost = smooth(
        dataset.numeric(boost_col)?,
        config.window_length,
        config.poly_order,
    );
    Ok(paired(rpm, &boost))
}

fn paired(xs: &[f64], ys: &[f64]) -> Vec<(f64, f64)> {
    xs.iter()
        .zip(ys)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(&x, &y)| (x, y))
        .collect()
}

/// Summary statistics over the finite samples of a channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    /// Smallest finite sample
    pub min: f64,
    /// Largest finite sample
    pub max: f64,
    /// Arithmetic mean
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Finite samples counted
    pub count: usize,
}

/// Min/max/mean/standard deviation of one channel, ignoring missing samples
pub fn channel_stats(dataset: &Dataset, channel: &str) -> Result<ChannelStats> {
    require_columns(dataset, "channel statistics", &[channel])?;
    let values: Vec<f64> = dataset
        .numeric(channel)?
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .collect();

    if values.is_empty() {
        return Err(AnalysisError::NoUsableSamples(channel.to_string()));
    }

    let count = values.len();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / count as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

    Ok(ChannelStats {
        min,
        max,
        mean,
        std_dev: variance.sqrt(),
        count,
    })
}

/// A run of consecutive rows where knock retard exceeded the threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KnockEvent {
    /// First row of the run
    pub start_row: usize,
    /// Last row of the run (inclusive)
    pub end_row: usize,
    /// Largest knock value within the run
    pub peak: f64,
    /// RPM at the peak, when the log has RPM
    pub rpm_at_peak: Option<f64>,
}

/// Contiguous runs of knock above `threshold`
pub fn knock_events(dataset: &Dataset, threshold: f64) -> Result<Vec<KnockEvent>> {
    let knock_col = CanonicalChannel::Knock.column();
    require_columns(dataset, "knock detection", &[knock_col])?;
    let knock = dataset.numeric(knock_col)?;
    let rpm = dataset.numeric(CanonicalChannel::Rpm.column()).ok();

    let mut events = Vec::new();
    let mut current: Option<(usize, usize)> = None; // (start, peak row)

    for (row, &value) in knock.iter().enumerate() {
        if value > threshold {
            current = match current {
                Some((start, peak)) if knock[peak] >= value => Some((start, peak)),
                Some((start, _)) => Some((start, row)),
                None => Some((row, row)),
            };
        } else if let Some((start, peak)) = current.take() {
            events.push(knock_event(start, row - 1, peak, knock, rpm));
        }
    }
    if let Some((start, peak)) = current {
        events.push(knock_event(start, knock.len() - 1, peak, knock, rpm));
    }

    Ok(events)
}

fn knock_event(start: usize, end: usize, peak: usize, knock: &[f64], rpm: Option<&[f64]>) -> KnockEvent {
    KnockEvent {
        start_row: start,
        end_row: end,
        peak: knock[peak],
        rpm_at_peak: rpm.map(|r| r[peak]),
    }
}
