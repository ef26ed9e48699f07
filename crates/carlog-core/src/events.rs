//! Event markers
//!
//! User-supplied timestamps, such as a launch or a shift point,
//! pinned to rows of the log. Markers outside the log's time span are left
//! out and reported as warnings; they never fail the whole placement.

use serde::{Deserialize, Serialize};

use crate::datalog::{CanonicalChannel, Dataset};
use crate::error::Result;
use crate::validation::require_columns;

/// A labelled point in time, in seconds from the start of the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMarker {
    /// Display label, e.g. `2-3 shift`
    pub label: String,
    /// Seconds from the start of the log
    pub time_secs: f64,
}

impl EventMarker {
    /// Create a marker
    pub fn new(label: impl Into<String>, time_secs: f64) -> Self {
        Self {
            label: label.into(),
            time_secs,
        }
    }
}

/// A marker resolved to a row of the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedEvent {
    /// The marker as supplied
    pub marker: EventMarker,
    /// First row at or after the marker time
    pub row: usize,
    /// Timestamp of that row
    pub row_time_secs: f64,
}

/// A marker that could not be placed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventWarning {
    /// The marker as supplied
    pub marker: EventMarker,
    /// Why it was not placed
    pub message: String,
}

/// Outcome of [`place_events`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPlacement {
    /// Markers inside the log's time span
    pub placed: Vec<PlacedEvent>,
    /// Markers that could not be placed
    pub warnings: Vec<EventWarning>,
}

/// Resolve markers against the `Time (sec)` channel
pub fn place_events(dataset: &Dataset, markers: &[EventMarker]) -> Result<EventPlacement> {
    let time_col = CanonicalChannel::Time.column();
    require_columns(dataset, "event placement", &[time_col])?;
    let time = dataset.numeric(time_col)?;

    let mut placement = EventPlacement::default();
    let span = dataset.time_span();

    for marker in markers {
        let in_span = span.is_some_and(|(start, end)| {
            marker.time_secs >= start && marker.time_secs <= end
        });
        let row = in_span
            .then(|| time.iter().position(|&t| t >= marker.time_secs))
            .flatten();

        match row {
            Some(row) => placement.placed.push(PlacedEvent {
                marker: marker.clone(),
                row,
                row_time_secs: time[row],
            }),
            None => {
                let message = match span {
                    Some((start, end)) => format!(
                        "'{}' at {:.2}s is outside the log ({start:.2}s - {end:.2}s)",
                        marker.label, marker.time_secs
                    ),
                    None => format!("'{}' cannot be placed: log has no timestamps", marker.label),
                };
                tracing::warn!("{message}");
                placement.warnings.push(EventWarning {
                    marker: marker.clone(),
                    message,
                });
            }
        }
    }

    Ok(placement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datalog::Channel;

    #[test]
    fn test_out_of_range_marker_is_a_warning() {
        let data = Dataset::new(vec![Channel::numeric(
            "Time (sec)",
            vec![0.0, 0.5, 1.0, 1.5],
        )])
        .unwrap();

        let placement = place_events(
            &data,
            &[
                EventMarker::new("launch", 0.2),
                EventMarker::new("shift", 9.0),
                EventMarker::new("end", 1.5),
            ],
        )
        .unwrap();

        assert_eq!(placement.placed.len(), 2);
        assert_eq!(placement.placed[0].row, 1);
        assert_eq!(placement.placed[1].row, 3);
        assert_eq!(placement.warnings.len(), 1);
        assert_eq!(placement.warnings[0].marker.label, "shift");
    }
}
