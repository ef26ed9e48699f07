//! Channel schema
//!
//! Maps the many spellings loggers use for the same sensor onto one
//! canonical column name, once, when a log is loaded. Everything downstream
//! looks channels up by their canonical name only.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::Dataset;
use crate::unit_conversion::{kpa_to_psi, lbft_to_nm};

/// Channels the analysis pipeline knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalChannel {
    /// Seconds since the start of the log
    Time,
    /// Engine speed
    Rpm,
    /// Boost pressure above atmospheric
    Boost,
    /// Torque requested by the ECU
    RequestedTorque,
    /// Calculated engine load
    CalculatedLoad,
    /// Ignition timing advance
    IgnitionTiming,
    /// Knock retard
    Knock,
    /// Wideband air-fuel ratio
    AirFuelRatio,
    /// Throttle opening
    Throttle,
    /// Derived by the horsepower calculator, never read from a log
    EstimatedHorsepower,
}

impl CanonicalChannel {
    /// Every canonical channel, in display order
    pub const ALL: [CanonicalChannel; 10] = [
        CanonicalChannel::Time,
        CanonicalChannel::Rpm,
        CanonicalChannel::Boost,
        CanonicalChannel::RequestedTorque,
        CanonicalChannel::CalculatedLoad,
        CanonicalChannel::IgnitionTiming,
        CanonicalChannel::Knock,
        CanonicalChannel::AirFuelRatio,
        CanonicalChannel::Throttle,
        CanonicalChannel::EstimatedHorsepower,
    ];

    /// Column name used in datasets, units included
    pub fn column(&self) -> &'static str {
        match self {
            CanonicalChannel::Time => "Time (sec)",
            CanonicalChannel::Rpm => "RPM (RPM)",
            CanonicalChannel::Boost => "Boost (psi)",
            CanonicalChannel::RequestedTorque => "Req Torque (Nm)",
            CanonicalChannel::CalculatedLoad => "Calculated Load (g/rev)",
            CanonicalChannel::IgnitionTiming => "Ignition Timing (°)",
            CanonicalChannel::Knock => "Knock Retard (°)",
            CanonicalChannel::AirFuelRatio => "Air-Fuel Ratio (AFR)",
            CanonicalChannel::Throttle => "Throttle Position (%)",
            CanonicalChannel::EstimatedHorsepower => "Estimated Horsepower",
        }
    }

    /// Short identifier, used as a variable name in custom filter expressions
    pub fn short_name(&self) -> &'static str {
        match self {
            CanonicalChannel::Time => "time",
            CanonicalChannel::Rpm => "rpm",
            CanonicalChannel::Boost => "boost",
            CanonicalChannel::RequestedTorque => "torque",
            CanonicalChannel::CalculatedLoad => "load",
            CanonicalChannel::IgnitionTiming => "timing",
            CanonicalChannel::Knock => "knock",
            CanonicalChannel::AirFuelRatio => "afr",
            CanonicalChannel::Throttle => "throttle",
            CanonicalChannel::EstimatedHorsepower => "hp",
        }
    }

    /// Unit embedded in the canonical column name, if it has one
    pub fn unit(&self) -> Option<&'static str> {
        column_unit(self.column())
    }

    /// How a column logged in `unit` maps onto this channel
    fn unit_fit(&self, unit: Option<&str>) -> UnitFit {
        let Some(unit) = unit else {
            return UnitFit::Same;
        };
        if self.unit().is_some_and(|u| u.eq_ignore_ascii_case(unit)) {
            return UnitFit::Same;
        }

        let unit = unit.to_ascii_lowercase();
        match (self, unit.as_str()) {
            (CanonicalChannel::Time, "s" | "secs" | "seconds") => UnitFit::Same,
            (CanonicalChannel::Time, "ms") => UnitFit::Convert(ms_to_secs),
            (CanonicalChannel::RequestedTorque, "n·m" | "n-m" | "n.m") => UnitFit::Same,
            (CanonicalChannel::RequestedTorque, "lb-ft" | "lbft" | "lb ft" | "ft-lb" | "ft-lbs") => {
                UnitFit::Convert(lbft_to_nm)
            }
            // A column labelled boost is gauge pressure
            (CanonicalChannel::Boost, "kpa") => UnitFit::Convert(kpa_to_psi),
            (CanonicalChannel::IgnitionTiming | CanonicalChannel::Knock, "deg" | "degrees") => {
                UnitFit::Same
            }
            (CanonicalChannel::EstimatedHorsepower, "hp" | "bhp") => UnitFit::Same,
            _ => UnitFit::Incompatible,
        }
    }

    /// Look up a canonical channel by its exact column name
    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.column() == name)
    }
}

/// Trailing parenthesised unit of a column name, e.g. `psi` in `Boost (psi)`
fn column_unit(name: &str) -> Option<&str> {
    let inner = name.trim_end().strip_suffix(')')?;
    let open = inner.rfind('(')?;
    Some(inner[open + 1..].trim())
}

fn ms_to_secs(ms: f64) -> f64 {
    ms / 1000.0
}

enum UnitFit {
    Same,
    Convert(fn(f64) -> f64),
    Incompatible,
}

/// One rename applied during resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRename {
    /// Column name as it appeared in the log
    pub original: String,
    /// Channel it was renamed to
    pub canonical: CanonicalChannel,
    /// Logged unit the values were converted from, if they were converted
    pub converted_from: Option<String>,
}

/// Output of [`SchemaMap::resolve`]
#[derive(Debug, Clone)]
pub struct SchemaResolution {
    /// Dataset with matched columns renamed to their canonical names
    pub dataset: Dataset,
    /// Columns that were renamed
    pub renamed: Vec<ChannelRename>,
}

/// Alias rules mapping raw column names to canonical channels
#[derive(Debug, Clone)]
pub struct SchemaMap {
    rules: Vec<(Regex, CanonicalChannel)>,
}

impl SchemaMap {
    /// Create an empty map (only exact canonical names are recognized)
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add an alias rule. Patterns are matched case-insensitively against the
    /// whole column name.
    pub fn with_alias(mut self, pattern: &str, channel: CanonicalChannel) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("(?i){pattern}"))?;
        self.rules.push((regex, channel));
        Ok(self)
    }

    /// Canonical channel for a raw column name, if any rule matches
    pub fn classify(&self, column: &str) -> Option<CanonicalChannel> {
        CanonicalChannel::from_column(column).or_else(|| {
            self.rules
                .iter()
                .find(|(regex, _)| regex.is_match(column))
                .map(|(_, channel)| *channel)
        })
    }

    /// Rename aliased columns to their canonical names.
    ///
    /// A canonical name already present in the log is never overwritten, and
    /// only the first column matching a given channel is renamed. A column
    /// whose unit differs from the canonical one is converted when a
    /// conversion is known (ms, lb-ft, kPa boost) and left alone otherwise.
    pub fn resolve(&self, dataset: &Dataset) -> SchemaResolution {
        let mut resolved = dataset.clone();
        let mut renamed = Vec::new();

        for name in dataset.channel_names() {
            if CanonicalChannel::from_column(name).is_some() {
                continue;
            }
            let Some(canonical) = self.classify(name) else {
                continue;
            };
            let unit = column_unit(name);
            let convert = match canonical.unit_fit(unit) {
                UnitFit::Same => None,
                UnitFit::Convert(f) => Some(f),
                UnitFit::Incompatible => {
                    tracing::debug!(
                        "Column '{name}' looks like {} but is not in a convertible unit",
                        canonical.column()
                    );
                    continue;
                }
            };
            if resolved.has_channel(canonical.column()) {
                tracing::debug!(
                    "Column '{name}' matches {} but it is already present",
                    canonical.column()
                );
                continue;
            }

            tracing::debug!("Resolved column '{name}' as {}", canonical.column());
            resolved.rename_channel(name, canonical.column());
            if let Some(f) = convert {
                resolved.map_numeric(canonical.column(), f);
            }
            renamed.push(ChannelRename {
                original: name.to_string(),
                canonical,
                converted_from: convert.and(unit).map(str::to_string),
            });
        }

        SchemaResolution {
            dataset: resolved,
            renamed,
        }
    }
}

impl Default for SchemaMap {
    fn default() -> Self {
        let rules: [(&str, CanonicalChannel); 10] = [
            (r"^(time|timestamp|elapsed)\b", CanonicalChannel::Time),
            (r"^(engine\s*speed|rpm)\b", CanonicalChannel::Rpm),
            (r"boost", CanonicalChannel::Boost),
            (r"torque", CanonicalChannel::RequestedTorque),
            (r"load", CanonicalChannel::CalculatedLoad),
            (r"knock", CanonicalChannel::Knock),
            (r"(ignition|spark)\s*(timing|advance)|^timing\b", CanonicalChannel::IgnitionTiming),
            (r"\bafr\b|air[\s-]*fuel|wideband", CanonicalChannel::AirFuelRatio),
            (r"throttle|\btps\b|pedal", CanonicalChannel::Throttle),
            (r"^(est(imated)?\.?\s*)?(hp|horsepower)\b", CanonicalChannel::EstimatedHorsepower),
        ];

        let rules = rules
            .into_iter()
            .filter_map(|(pattern, channel)| {
                Regex::new(&format!("(?i){pattern}"))
                    .map(|regex| (regex, channel))
                    .ok()
            })
            .collect();

        Self { rules }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datalog::Channel;

    #[test]
    fn test_classify_common_aliases() {
        let schema = SchemaMap::default();
        assert_eq!(schema.classify("Engine Speed (rpm)"), Some(CanonicalChannel::Rpm));
        assert_eq!(schema.classify("Knock Count"), Some(CanonicalChannel::Knock));
        assert_eq!(schema.classify("Wideband AFR"), Some(CanonicalChannel::AirFuelRatio));
        assert_eq!(schema.classify("TPS (%)"), Some(CanonicalChannel::Throttle));
        assert_eq!(schema.classify("Coolant Temp (C)"), None);
    }

    #[test]
    fn test_canonical_name_not_overwritten() {
        let data = Dataset::new(vec![
            Channel::numeric("RPM (RPM)", vec![1000.0]),
            Channel::numeric("Engine Speed", vec![999.0]),
        ])
        .unwrap();

        let resolution = SchemaMap::default().resolve(&data);
        assert!(resolution.renamed.is_empty());
        assert_eq!(resolution.dataset.numeric("RPM (RPM)").unwrap(), &[1000.0]);
        assert!(resolution.dataset.has_channel("Engine Speed"));
    }

    #[test]
    fn test_units_converted_or_skipped() {
        let data = Dataset::new(vec![
            Channel::numeric("Time (ms)", vec![0.0, 50.0]),
            Channel::numeric("Engine Speed", vec![5252.0, 5252.0]),
            Channel::numeric("Torque (lb-ft)", vec![100.0, 100.0]),
            Channel::numeric("Boost (kPa)", vec![0.0, 100.0]),
            Channel::numeric("Engine Load (%)", vec![80.0, 90.0]),
        ])
        .unwrap();

        let resolution = SchemaMap::default().resolve(&data);
        let out = &resolution.dataset;

        assert_eq!(out.numeric("Time (sec)").unwrap(), &[0.0, 0.05]);
        let torque = out.numeric("Req Torque (Nm)").unwrap();
        assert!((torque[0] - 135.58).abs() < 0.01);
        let boost = out.numeric("Boost (psi)").unwrap();
        assert!((boost[1] - 14.504).abs() < 0.01);

        // No known conversion from percent to g/rev
        assert!(out.has_channel("Engine Load (%)"));
        assert!(!out.has_channel("Calculated Load (g/rev)"));

        let time = resolution
            .renamed
            .iter()
            .find(|r| r.canonical == CanonicalChannel::Time)
            .unwrap();
        assert_eq!(time.converted_from.as_deref(), Some("ms"));
        let rpm = resolution
            .renamed
            .iter()
            .find(|r| r.canonical == CanonicalChannel::Rpm)
            .unwrap();
        assert_eq!(rpm.converted_from, None);
    }

    #[test]
    fn test_matching_unit_is_kept() {
        let schema = SchemaMap::default();
        let data = Dataset::new(vec![
            Channel::numeric("Engine Speed (rpm)", vec![3000.0]),
            Channel::numeric("Spark Advance (deg)", vec![14.0]),
        ])
        .unwrap();

        let out = schema.resolve(&data).dataset;
        assert_eq!(out.numeric("RPM (RPM)").unwrap(), &[3000.0]);
        assert_eq!(out.numeric("Ignition Timing (°)").unwrap(), &[14.0]);
    }
}
