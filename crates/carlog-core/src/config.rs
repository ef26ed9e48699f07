//! Analysis configuration
//!
//! Caller-chosen settings for one analysis, persisted as `analysis.json`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{AnalysisError, Result};
use crate::filter::RangeFilter;
use crate::performance::{
    AltitudeCorrection, PerformanceEstimator, QuarterMileMode, VehicleProfile, ZeroToSixtyMode,
};
use crate::smoothing::SmoothingConfig;

/// Settings for smoothing, filtering and performance estimates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Smoothing applied to plotted channels
    pub smoothing: SmoothingConfig,
    /// 0-60 mph calibration
    pub zero_to_sixty: ZeroToSixtyMode,
    /// Quarter-mile calibration
    pub quarter_mile: QuarterMileMode,
    /// Power loss with elevation
    pub altitude: AltitudeCorrection,
    /// Vehicle used for performance estimates
    pub vehicle: VehicleProfile,
    /// Rows kept for analysis (e.g. wide open throttle only)
    pub filter: RangeFilter,
    /// Knock retard (degrees) above which a row counts as a knock event
    pub knock_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            smoothing: SmoothingConfig::default(),
            zero_to_sixty: ZeroToSixtyMode::default(),
            quarter_mile: QuarterMileMode::default(),
            altitude: AltitudeCorrection::default(),
            vehicle: VehicleProfile::default(),
            filter: RangeFilter::default(),
            knock_threshold: 0.5,
        }
    }
}

impl AnalysisConfig {
    /// Default config location (`<config dir>/CarLog/analysis.json`)
    pub fn default_path() -> io::Result<PathBuf> {
        let base = dirs::config_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "Could not find config directory")
            })?;
        Ok(base.join("CarLog").join("analysis.json"))
    }

    /// Load a config, falling back to defaults when the file does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Save the config as pretty-printed JSON, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, content)
    }

    /// Check value ranges before running an analysis
    pub fn validate(&self) -> Result<()> {
        if self.smoothing.poly_order < 1 {
            return Err(AnalysisError::InvalidParameter(
                "polynomial order must be at least 1".to_string(),
            ));
        }
        if self.filter.rpm.is_empty() {
            return Err(AnalysisError::InvalidParameter(format!(
                "RPM range {}..{} is empty",
                self.filter.rpm.min, self.filter.rpm.max
            )));
        }
        if let Some(floor) = self.altitude.floor {
            if !(0.0..=1.0).contains(&floor) {
                return Err(AnalysisError::InvalidParameter(format!(
                    "altitude floor must be within 0-1, got {floor}"
                )));
            }
        }
        self.vehicle.validate()
    }

    /// Estimator with the configured modes and altitude correction
    pub fn estimator(&self) -> PerformanceEstimator {
        PerformanceEstimator {
            altitude: self.altitude,
            zero_to_sixty: self.zero_to_sixty,
            quarter_mile: self.quarter_mile,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"vehicle": {"weight_lbs": 2800.0, "drivetrain": "AWD"}}"#)
                .unwrap();
        assert_eq!(config.vehicle.weight_lbs, 2800.0);
        assert_eq!(config.vehicle.altitude_ft, 0.0);
        assert_eq!(config.smoothing, SmoothingConfig::default());
        assert_eq!(config.knock_threshold, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AnalysisConfig::default();
        config.smoothing.poly_order = 0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.vehicle.drivetrain_loss_pct = Some(140.0);
        assert!(config.validate().is_err());
    }
}
