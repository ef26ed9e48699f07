//! Derived horsepower
//!
//! Estimates engine horsepower from the ECU's requested torque and RPM,
//! using the SAE relation `hp = lb-ft * rpm / 5252`.

use serde::{Deserialize, Serialize};

use crate::datalog::{CanonicalChannel, Channel, Dataset};
use crate::error::{AnalysisError, Result};
use crate::unit_conversion::nm_to_lbft;
use crate::validation::require_columns;

/// RPM at which torque (lb-ft) and horsepower are numerically equal
pub const HP_TORQUE_CONSTANT: f64 = 5252.0;

/// Horsepower from torque in newton-meters at a given RPM
pub fn horsepower_from_torque(torque_nm: f64, rpm: f64) -> f64 {
    nm_to_lbft(torque_nm) * rpm / HP_TORQUE_CONSTANT
}

/// Peak of the estimated horsepower channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakHorsepower {
    /// Peak estimated horsepower
    pub hp: f64,
    /// Engine speed at the peak
    pub rpm: f64,
    /// Row index of the peak
    pub row: usize,
}

/// Result of [`estimate_horsepower`]
#[derive(Debug, Clone)]
pub struct HorsepowerEstimate {
    /// Input dataset plus the `Estimated Horsepower` channel
    pub dataset: Dataset,
    /// Maximum finite estimate
    pub peak: PeakHorsepower,
}

/// Add an `Estimated Horsepower` channel computed row by row from
/// `Req Torque (Nm)` and `RPM (RPM)`.
///
/// The input is left untouched. Running this again on its own output
/// overwrites the channel with identical values.
pub fn estimate_horsepower(dataset: &Dataset) -> Result<HorsepowerEstimate> {
    let rpm_col = CanonicalChannel::Rpm.column();
    let torque_col = CanonicalChannel::RequestedTorque.column();
    require_columns(dataset, "horsepower estimate", &[rpm_col, torque_col])?;

    let rpm = dataset.numeric(rpm_col)?;
    let torque = dataset.numeric(torque_col)?;

    let hp: Vec<f64> = torque
        .iter()
        .zip(rpm)
        .map(|(&t, &r)| horsepower_from_torque(t, r))
        .collect();

    let peak = hp
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(row, &hp)| PeakHorsepower {
            hp,
            rpm: rpm[row],
            row,
        })
        .ok_or_else(|| {
            AnalysisError::NoUsableSamples(CanonicalChannel::EstimatedHorsepower.column().to_string())
        })?;

    tracing::debug!(
        "Peak estimated horsepower {:.1} at {:.0} RPM (row {})",
        peak.hp,
        peak.rpm,
        peak.row
    );

    let dataset = dataset.with_channel(Channel::numeric(
        CanonicalChannel::EstimatedHorsepower.column(),
        hp,
    ))?;

    Ok(HorsepowerEstimate { dataset, peak })
}

impl HorsepowerEstimate {
    /// (RPM, horsepower) pairs for plotting, skipping rows with missing data
    pub fn curve(&self) -> Vec<(f64, f64)> {
        let rpm = self.dataset.numeric(CanonicalChannel::Rpm.column());
        let hp = self
            .dataset
            .numeric(CanonicalChannel::EstimatedHorsepower.column());
        match (rpm, hp) {
            (Ok(rpm), Ok(hp)) => rpm
                .iter()
                .zip(hp)
                .filter(|(r, h)| r.is_finite() && h.is_finite())
                .map(|(&r, &h)| (r, h))
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_torque_equals_hp_at_5252() {
        let hp = horsepower_from_torque(135.64, 5252.0);
        assert!((hp - 100.0).abs() < 0.05, "{hp}");
    }

    #[test]
    fn test_peak_skips_missing_rows() {
        let data = Dataset::new(vec![
            Channel::numeric("RPM (RPM)", vec![3000.0, f64::NAN, 6000.0, 5000.0]),
            Channel::numeric("Req Torque (Nm)", vec![300.0, 400.0, 250.0, 200.0]),
        ])
        .unwrap();

        let estimate = estimate_horsepower(&data).unwrap();
        let expected = horsepower_from_torque(250.0, 6000.0);
        assert_eq!(estimate.peak.row, 2);
        assert!((estimate.peak.hp - expected).abs() < 1e-9);
        assert_eq!(estimate.curve().len(), 3);
    }

    #[test]
    fn test_all_missing_is_an_error() {
        let data = Dataset::new(vec![
            Channel::numeric("RPM (RPM)", vec![f64::NAN]),
            Channel::numeric("Req Torque (Nm)", vec![f64::NAN]),
        ])
        .unwrap();

        assert!(matches!(
            estimate_horsepower(&data),
            Err(AnalysisError::NoUsableSamples(_))
        ));
    }
}
