//! Performance Estimates
//!
//! Converts peak horsepower and a vehicle profile into 0-60 mph and
//! quarter-mile elapsed-time estimates.
//!
//! These are empirically calibrated curves, not a physics simulation. Several
//! calibrations are in use and they disagree for the same inputs, so each one
//! is a named mode and the caller chooses:
//!
//! | Estimate     | Mode                 | Formula                                       |
//! |--------------|----------------------|-----------------------------------------------|
//! | 0-60 mph     | `Simple` (default)   | `0.023 * (lbs / hp)^1.12`, floored            |
//! | 0-60 mph     | `PhysicsStyle`       | `5.825 * lbs / wheel_hp`                      |
//! | 0-60 mph     | `DrivetrainAdjusted` | simple base x drivetrain x cylinder factors   |
//! | quarter mile | `Simple` (default)   | `5.9 * (lbs / hp)^0.36`, floored at 9.5 s     |
//! | quarter mile | `CubeRoot`           | `6.29 * (lbs / hp)^(1/3)`                     |
//!
//! `hp` is always the altitude-corrected peak, never allowed below 1.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::horsepower::PeakHorsepower;
use crate::unit_conversion::{kg_to_lbs, meters_to_feet};

/// Fractional power loss per 1000 ft of elevation
pub const ALTITUDE_LOSS_PER_1000_FT: f64 = 0.03;

/// Default lower bound on the altitude correction factor
pub const DEFAULT_ALTITUDE_FLOOR: f64 = 0.5;

/// Drivetrain loss used by the physics-style estimate when the profile has none
pub const DEFAULT_DRIVETRAIN_LOSS_PCT: f64 = 15.0;

/// Cylinder count the cylinder factor is calibrated around
const REFERENCE_CYLINDERS: u32 = 8;

/// Smallest horsepower the ratio-based formulas will divide by
const MIN_HP: f64 = 1.0;

/// Which wheels are driven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Drivetrain {
    /// Front-wheel drive
    Fwd,
    /// Rear-wheel drive
    Rwd,
    /// All-wheel drive
    Awd,
}

impl Drivetrain {
    /// Launch multiplier applied to the base 0-60 time
    pub fn launch_factor(&self) -> f64 {
        match self {
            Drivetrain::Fwd => 1.10,
            Drivetrain::Rwd => 1.00,
            Drivetrain::Awd => 0.88,
        }
    }

    /// Quickest 0-60 time the drivetrain-adjusted estimate will report
    pub fn zero_to_sixty_floor(&self) -> f64 {
        match self {
            Drivetrain::Awd => 2.7,
            Drivetrain::Fwd | Drivetrain::Rwd => 3.3,
        }
    }
}

impl FromStr for Drivetrain {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "FWD" => Ok(Drivetrain::Fwd),
            "RWD" => Ok(Drivetrain::Rwd),
            "AWD" | "4WD" => Ok(Drivetrain::Awd),
            other => Err(AnalysisError::InvalidParameter(format!(
                "unknown drivetrain '{other}' (expected FWD, RWD or AWD)"
            ))),
        }
    }
}

impl fmt::Display for Drivetrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Drivetrain::Fwd => "FWD",
            Drivetrain::Rwd => "RWD",
            Drivetrain::Awd => "AWD",
        };
        f.write_str(name)
    }
}

/// Vehicle data supplied per request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleProfile {
    /// Curb weight with driver (lbs)
    pub weight_lbs: f64,
    /// Elevation of the run (ft)
    pub altitude_ft: f64,
    /// Driven wheels; rear-wheel drive when unset
    pub drivetrain: Option<Drivetrain>,
    /// Cylinder count; eight when unset
    pub cylinders: Option<u32>,
    /// Percent of engine power lost before the wheels, 0-100
    pub drivetrain_loss_pct: Option<f64>,
}

impl Default for VehicleProfile {
    fn default() -> Self {
        Self {
            weight_lbs: 3200.0,
            altitude_ft: 0.0,
            drivetrain: None,
            cylinders: None,
            drivetrain_loss_pct: None,
        }
    }
}

impl VehicleProfile {
    /// Create a profile from weight and altitude
    pub fn new(weight_lbs: f64, altitude_ft: f64) -> Self {
        Self {
            weight_lbs,
            altitude_ft,
            ..Self::default()
        }
    }

    /// Create a profile from weight in kg and altitude in meters
    pub fn from_metric(weight_kg: f64, altitude_m: f64) -> Self {
        Self::new(kg_to_lbs(weight_kg), meters_to_feet(altitude_m))
    }

    /// Set the drivetrain
    pub fn with_drivetrain(mut self, drivetrain: Drivetrain) -> Self {
        self.drivetrain = Some(drivetrain);
        self
    }

    /// Set the cylinder count
    pub fn with_cylinders(mut self, cylinders: u32) -> Self {
        self.cylinders = Some(cylinders);
        self
    }

    /// Set drivetrain loss (percent)
    pub fn with_drivetrain_loss(mut self, loss_pct: f64) -> Self {
        self.drivetrain_loss_pct = Some(loss_pct);
        self
    }

    /// Reject values the estimators cannot use
    pub fn validate(&self) -> Result<()> {
        if !(self.weight_lbs.is_finite() && self.weight_lbs > 0.0) {
            return Err(AnalysisError::InvalidParameter(format!(
                "weight must be positive, got {}",
                self.weight_lbs
            )));
        }
        if !(self.altitude_ft.is_finite() && self.altitude_ft >= 0.0) {
            return Err(AnalysisError::InvalidParameter(format!(
                "altitude must be zero or more, got {}",
                self.altitude_ft
            )));
        }
        if self.cylinders == Some(0) {
            return Err(AnalysisError::InvalidParameter(
                "cylinder count must be at least 1".to_string(),
            ));
        }
        if let Some(loss) = self.drivetrain_loss_pct {
            if !(0.0..=100.0).contains(&loss) {
                return Err(AnalysisError::InvalidParameter(format!(
                    "drivetrain loss must be within 0-100%, got {loss}"
                )));
            }
        }
        Ok(())
    }
}

/// Power loss with elevation: `1 - 0.03 * altitude_ft / 1000`, optionally
/// clamped from below
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AltitudeCorrection {
    /// Smallest allowed factor; `None` leaves the factor unclamped
    pub floor: Option<f64>,
}

impl Default for AltitudeCorrection {
    fn default() -> Self {
        Self {
            floor: Some(DEFAULT_ALTITUDE_FLOOR),
        }
    }
}

impl AltitudeCorrection {
    /// Fraction of sea-level power available at `altitude_ft`
    pub fn factor(&self, altitude_ft: f64) -> f64 {
        let raw = 1.0 - ALTITUDE_LOSS_PER_1000_FT * (altitude_ft / 1000.0);
        match self.floor {
            Some(floor) => raw.max(floor),
            None => raw,
        }
    }

    /// Horsepower available at `altitude_ft`
    pub fn apply(&self, max_hp: f64, altitude_ft: f64) -> f64 {
        max_hp * self.factor(altitude_ft)
    }
}

/// 0-60 mph calibration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ZeroToSixtyMode {
    /// Power-to-weight curve with a fixed floor
    Simple {
        /// Quickest time reported (seconds)
        floor_secs: f64,
    },
    /// Weight over wheel horsepower after drivetrain losses
    PhysicsStyle,
    /// Simple base time scaled for drivetrain and cylinder count
    DrivetrainAdjusted,
}

impl Default for ZeroToSixtyMode {
    fn default() -> Self {
        ZeroToSixtyMode::Simple { floor_secs: 2.5 }
    }
}

impl ZeroToSixtyMode {
    /// Mode name as used in config files
    pub fn name(&self) -> &'static str {
        match self {
            ZeroToSixtyMode::Simple { .. } => "simple",
            ZeroToSixtyMode::PhysicsStyle => "physics_style",
            ZeroToSixtyMode::DrivetrainAdjusted => "drivetrain_adjusted",
        }
    }
}

/// Quarter-mile calibration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum QuarterMileMode {
    /// Power-to-weight curve with a fixed floor
    Simple {
        /// Quickest time reported (seconds)
        floor_secs: f64,
    },
    /// Classic cube-root ET rule
    CubeRoot,
}

impl Default for QuarterMileMode {
    fn default() -> Self {
        QuarterMileMode::Simple { floor_secs: 9.5 }
    }
}

impl QuarterMileMode {
    /// Mode name as used in config files
    pub fn name(&self) -> &'static str {
        match self {
            QuarterMileMode::Simple { .. } => "simple",
            QuarterMileMode::CubeRoot => "cube_root",
        }
    }
}

/// An elapsed-time estimate, before and after any floor is applied
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElapsedTime {
    /// Reported estimate (seconds)
    pub seconds: f64,
    /// Formula output before clamping to the mode's floor
    pub raw_seconds: f64,
}

impl ElapsedTime {
    fn floored(raw_seconds: f64, floor: f64) -> Self {
        Self {
            seconds: raw_seconds.max(floor),
            raw_seconds,
        }
    }

    fn unclamped(seconds: f64) -> Self {
        Self {
            seconds,
            raw_seconds: seconds,
        }
    }

    /// True when the floor replaced the formula output
    pub fn is_floored(&self) -> bool {
        self.seconds > self.raw_seconds
    }
}

/// Elapsed-time estimates for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// Peak estimated horsepower from the log
    pub peak_hp: f64,
    /// Peak after altitude correction
    pub corrected_hp: f64,
    /// 0-60 mph time
    pub zero_to_sixty: ElapsedTime,
    /// Quarter-mile elapsed time
    pub quarter_mile: ElapsedTime,
    /// Calibration used for `zero_to_sixty`
    pub zero_to_sixty_mode: ZeroToSixtyMode,
    /// Calibration used for `quarter_mile`
    pub quarter_mile_mode: QuarterMileMode,
}

impl fmt::Display for PerformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Peak HP: {:.2} ({:.2} altitude corrected)",
            self.peak_hp, self.corrected_hp
        )?;
        writeln!(
            f,
            "0-60 mph: {:.2} s [{}]",
            self.zero_to_sixty.seconds,
            self.zero_to_sixty_mode.name()
        )?;
        write!(
            f,
            "1/4 mile: {:.2} s [{}]",
            self.quarter_mile.seconds,
            self.quarter_mile_mode.name()
        )
    }
}

/// Selected calibrations plus the shared altitude correction
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceEstimator {
    /// Power loss with elevation
    pub altitude: AltitudeCorrection,
    /// 0-60 mph calibration
    pub zero_to_sixty: ZeroToSixtyMode,
    /// Quarter-mile calibration
    pub quarter_mile: QuarterMileMode,
}

impl PerformanceEstimator {
    /// Estimator with the default altitude correction
    pub fn new(zero_to_sixty: ZeroToSixtyMode, quarter_mile: QuarterMileMode) -> Self {
        Self {
            altitude: AltitudeCorrection::default(),
            zero_to_sixty,
            quarter_mile,
        }
    }

    /// Horsepower after altitude correction
    pub fn corrected_hp(&self, max_hp: f64, profile: &VehicleProfile) -> f64 {
        self.altitude.apply(max_hp, profile.altitude_ft)
    }

    /// Weight per corrected horsepower, with horsepower held at >= 1
    fn weight_power_ratio(&self, max_hp: f64, profile: &VehicleProfile) -> f64 {
        profile.weight_lbs / self.corrected_hp(max_hp, profile).max(MIN_HP)
    }

    /// 0-60 mph estimate using the selected mode
    pub fn zero_to_sixty(&self, max_hp: f64, profile: &VehicleProfile) -> Result<ElapsedTime> {
        check_inputs(max_hp, profile)?;

        let simple_base = || 0.023 * self.weight_power_ratio(max_hp, profile).powf(1.12);

        let estimate = match self.zero_to_sixty {
            ZeroToSixtyMode::Simple { floor_secs } => ElapsedTime::floored(simple_base(), floor_secs),
            ZeroToSixtyMode::PhysicsStyle => {
                let loss = profile
                    .drivetrain_loss_pct
                    .unwrap_or(DEFAULT_DRIVETRAIN_LOSS_PCT);
                let wheel_hp = self.corrected_hp(max_hp, profile) * (1.0 - loss / 100.0);
                ElapsedTime::unclamped(5.825 * profile.weight_lbs / wheel_hp.max(MIN_HP))
            }
            ZeroToSixtyMode::DrivetrainAdjusted => {
                let drivetrain = profile.drivetrain.unwrap_or(Drivetrain::Rwd);
                let cylinders = profile.cylinders.unwrap_or(REFERENCE_CYLINDERS);
                let cylinder_factor =
                    1.0 + (REFERENCE_CYLINDERS as f64 - cylinders as f64) * 0.03;
                let raw = simple_base() * drivetrain.launch_factor() * cylinder_factor;
                ElapsedTime::floored(raw, drivetrain.zero_to_sixty_floor())
            }
        };

        Ok(estimate)
    }

    /// Quarter-mile elapsed time using the selected mode
    pub fn quarter_mile(&self, max_hp: f64, profile: &VehicleProfile) -> Result<ElapsedTime> {
        check_inputs(max_hp, profile)?;
        let ratio = self.weight_power_ratio(max_hp, profile);

        let estimate = match self.quarter_mile {
            QuarterMileMode::Simple { floor_secs } => {
                ElapsedTime::floored(5.9 * ratio.powf(0.36), floor_secs)
            }
            QuarterMileMode::CubeRoot => ElapsedTime::unclamped(6.29 * ratio.cbrt()),
        };

        Ok(estimate)
    }

    /// Both estimates from a computed horsepower peak.
    ///
    /// `peak` is `None` until horsepower has been estimated for the log; that
    /// is reported as an unmet prerequisite rather than computed.
    pub fn estimate(
        &self,
        peak: Option<&PeakHorsepower>,
        profile: &VehicleProfile,
    ) -> Result<PerformanceReport> {
        let peak = peak.ok_or_else(|| AnalysisError::PrerequisiteNotMet {
            operation: "performance estimate".to_string(),
            prerequisite: "horsepower estimate".to_string(),
        })?;

        let report = PerformanceReport {
            peak_hp: peak.hp,
            corrected_hp: self.corrected_hp(peak.hp, profile),
            zero_to_sixty: self.zero_to_sixty(peak.hp, profile)?,
            quarter_mile: self.quarter_mile(peak.hp, profile)?,
            zero_to_sixty_mode: self.zero_to_sixty,
            quarter_mile_mode: self.quarter_mile,
        };

        tracing::debug!(
            "Estimated 0-60 {:.2}s, 1/4 mile {:.2}s from {:.1} hp",
            report.zero_to_sixty.seconds,
            report.quarter_mile.seconds,
            report.corrected_hp
        );

        Ok(report)
    }
}

fn check_inputs(max_hp: f64, profile: &VehicleProfile) -> Result<()> {
    if !(max_hp.is_finite() && max_hp > 0.0) {
        return Err(AnalysisError::InvalidParameter(format!(
            "peak horsepower must be positive, got {max_hp}"
        )));
    }
    profile.validate()
}
