//! Analysis session
//!
//! Runs the pipeline for one loaded log: schema resolution, optional range
//! filtering, per-channel smoothing, horsepower derivation and performance
//! estimates. Each session owns its dataset; concurrent requests use
//! separate sessions.

use crate::analysis::{self, ChannelStats, KnockEvent};
use crate::datalog::{Dataset, SchemaMap};
use crate::error::Result;
use crate::events::{place_events, EventMarker, EventPlacement};
use crate::filter::RangeFilter;
use crate::horsepower::{estimate_horsepower, PeakHorsepower};
use crate::performance::{PerformanceEstimator, PerformanceReport, VehicleProfile};
use crate::smoothing::{smooth_channel, SmoothingConfig};

/// Pipeline state for a single datalog
#[derive(Debug, Clone)]
pub struct AnalysisSession {
    dataset: Dataset,
    peak: Option<PeakHorsepower>,
}

impl AnalysisSession {
    /// Start a session, resolving channel aliases with the default schema
    pub fn new(dataset: Dataset) -> Self {
        Self::with_schema(dataset, &SchemaMap::default())
    }

    /// Start a session, resolving channel aliases with `schema`
    pub fn with_schema(dataset: Dataset, schema: &SchemaMap) -> Self {
        let resolution = schema.resolve(&dataset);
        if !resolution.renamed.is_empty() {
            tracing::debug!("Resolved {} channel aliases", resolution.renamed.len());
        }
        Self {
            dataset: resolution.dataset,
            peak: None,
        }
    }

    /// The current dataset, including any derived channels
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Consume the session, keeping the dataset
    pub fn into_dataset(self) -> Dataset {
        self.dataset
    }

    /// A new session over the rows that pass `filter`.
    ///
    /// A computed horsepower peak does not carry over; the narrowed log has
    /// to be estimated again.
    pub fn filtered(&self, filter: &RangeFilter) -> Result<AnalysisSession> {
        Ok(AnalysisSession {
            dataset: filter.apply(&self.dataset)?,
            peak: None,
        })
    }

    /// Smoothed copy of one channel
    pub fn smoothed(&self, channel: &str, config: &SmoothingConfig) -> Result<Vec<f64>> {
        smooth_channel(&self.dataset, channel, config)
    }

    /// Derive `Estimated Horsepower` and remember its peak
    pub fn compute_horsepower(&mut self) -> Result<PeakHorsepower> {
        let estimate = estimate_horsepower(&self.dataset)?;
        self.dataset = estimate.dataset;
        self.peak = Some(estimate.peak);
        Ok(estimate.peak)
    }

    /// Peak horsepower, once [`compute_horsepower`](Self::compute_horsepower) has run
    pub fn peak_horsepower(&self) -> Option<&PeakHorsepower> {
        self.peak.as_ref()
    }

    /// 0-60 and quarter-mile estimates; requires a computed horsepower peak
    pub fn performance(
        &self,
        estimator: &PerformanceEstimator,
        profile: &VehicleProfile,
    ) -> Result<PerformanceReport> {
        estimator.estimate(self.peak.as_ref(), profile)
    }

    /// (time, value) pairs for one channel
    pub fn sensor_series(&self, channel: &str) -> Result<Vec<(f64, f64)>> {
        analysis::sensor_series(&self.dataset, channel)
    }

    /// (RPM, smoothed boost) pairs
    pub fn boost_vs_rpm(&self, config: &SmoothingConfig) -> Result<Vec<(f64, f64)>> {
        analysis::boost_vs_rpm(&self.dataset, config)
    }

    /// Summary statistics for one channel
    pub fn channel_stats(&self, channel: &str) -> Result<ChannelStats> {
        analysis::channel_stats(&self.dataset, channel)
    }

    /// Runs of knock retard above `threshold`
    pub fn knock_events(&self, threshold: f64) -> Result<Vec<KnockEvent>> {
        analysis::knock_events(&self.dataset, threshold)
    }

    /// Pin time markers to rows of the log
    pub fn place_events(&self, markers: &[EventMarker]) -> Result<EventPlacement> {
        place_events(&self.dataset, markers)
    }
}
