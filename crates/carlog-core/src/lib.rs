//! # CarLog Core Library
//!
//! Core functionality for analyzing engine datalogs.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - CSV datalog loading with canonical channel naming
//! - Column validation for every channel-based operation
//! - Savitzky-Golay smoothing with automatic parameter repair
//! - Estimated horsepower from requested torque and RPM
//! - 0-60 mph and quarter-mile estimates with selectable calibrations
//! - RPM / throttle / load range filtering
//!
//! ## Example
//!
//! ```rust,ignore
//! use carlog_core::prelude::*;
//!
//! let log = read_log_file("pull.csv")?;
//! let mut session = AnalysisSession::new(log);
//!
//! let peak = session.compute_horsepower()?;
//! println!("Peak: {:.1} hp at {:.0} RPM", peak.hp, peak.rpm);
//!
//! let profile = VehicleProfile::new(3200.0, 7300.0);
//! let report = session.performance(&PerformanceEstimator::default(), &profile)?;
//! println!("{report}");
//! ```

pub mod analysis;
pub mod config;
pub mod datalog;
pub mod demo;
pub mod error;
pub mod events;
pub mod filter;
pub mod horsepower;
pub mod performance;
pub mod session;
pub mod smoothing;
pub mod unit_conversion;
pub mod validation;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::AnalysisConfig;
    pub use crate::datalog::{
        read_csv, read_csv_file, read_log_file, write_csv, CanonicalChannel, Channel, ChannelData,
        Dataset, SchemaMap,
    };
    pub use crate::error::{AnalysisError, Result};
    pub use crate::filter::{RangeFilter, ValueRange};
    pub use crate::horsepower::{estimate_horsepower, HorsepowerEstimate, PeakHorsepower};
    pub use crate::performance::{
        Drivetrain, PerformanceEstimator, PerformanceReport, QuarterMileMode, VehicleProfile,
        ZeroToSixtyMode,
    };
    pub use crate::session::AnalysisSession;
    pub use crate::smoothing::{smooth, SmoothingConfig, SmoothingPreset};
    pub use crate::validation::{check_columns, require_columns};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
