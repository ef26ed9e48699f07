//! Adaptive Smoothing
//!
//! Savitzky-Golay smoothing for noisy sensor channels: each output sample is
//! the value of a least-squares polynomial fitted over a symmetric window of
//! neighbouring input samples.
//!
//! Requested parameters are repaired rather than rejected, and any failure
//! falls back to the unsmoothed input, so smoothing never aborts an analysis.

use serde::{Deserialize, Serialize};

use crate::datalog::Dataset;
use crate::error::{AnalysisError, Result};
use crate::validation::require_columns;

/// Series shorter than this are returned unchanged
pub const MIN_SAMPLES: usize = 5;

/// Pivots smaller than this are treated as a singular fit
const SINGULAR_EPSILON: f64 = 1e-12;

/// Named smoothing strengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmoothingPreset {
    /// 21-sample window, quadratic
    Light,
    /// 51-sample window, cubic
    Medium,
    /// 101-sample window, quadratic
    Heavy,
}

impl SmoothingPreset {
    /// Window/order pair for this preset
    pub fn config(&self) -> SmoothingConfig {
        match self {
            SmoothingPreset::Light => SmoothingConfig::new(21, 2),
            SmoothingPreset::Medium => SmoothingConfig::new(51, 3),
            SmoothingPreset::Heavy => SmoothingConfig::new(101, 2),
        }
    }
}

/// Smoothing window and polynomial order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Samples per local fit (odd, >= 5 in normal use)
    pub window_length: usize,
    /// Polynomial order of each local fit
    pub poly_order: usize,
}

impl SmoothingConfig {
    /// Create a config; invalid values are repaired when smoothing
    pub fn new(window_length: usize, poly_order: usize) -> Self {
        Self {
            window_length,
            poly_order,
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        SmoothingPreset::Medium.config()
    }
}

impl From<SmoothingPreset> for SmoothingConfig {
    fn from(preset: SmoothingPreset) -> Self {
        preset.config()
    }
}

/// Window actually used for a series of `len` samples.
///
/// Even windows round down to odd and windows longer than the series clamp
/// to it. A window too short for the polynomial (`<= poly_order + 1`) is
/// bumped to `poly_order + 2`, rounded up to odd. Returns `None` when the
/// series is too short or no valid window fits.
pub fn effective_window(len: usize, window_length: usize, poly_order: usize) -> Option<usize> {
    if len < MIN_SAMPLES {
        return None;
    }

    let mut window = window_length.min(len);
    if window % 2 == 0 {
        window = window.saturating_sub(1);
    }

    if window <= poly_order + 1 {
        window = poly_order + 2;
        if window % 2 == 0 {
            window += 1;
        }
    }

    (window <= len).then_some(window)
}

/// Smooth `series`, returning a point-aligned series of the same length.
///
/// Inputs shorter than [`MIN_SAMPLES`] and inputs that cannot be smoothed
/// (no valid window, non-finite samples, singular fit) come back unchanged.
pub fn smooth(series: &[f64], window_length: usize, poly_order: usize) -> Vec<f64> {
    if series.len() < MIN_SAMPLES {
        tracing::debug!(
            "Skipping smoothing: {} samples is below the minimum of {MIN_SAMPLES}",
            series.len()
        );
        return series.to_vec();
    }

    match try_smooth(series, window_length, poly_order) {
        Ok(smoothed) => smoothed,
        Err(e) => {
            tracing::warn!("Smoothing failed, returning raw series: {e}");
            series.to_vec()
        }
    }
}

fn try_smooth(series: &[f64], window_length: usize, poly_order: usize) -> Result<Vec<f64>> {
    let n = series.len();
    let window = effective_window(n, window_length, poly_order).ok_or_else(|| {
        AnalysisError::InvalidParameter(format!(
            "no odd window > {} fits {n} samples",
            poly_order + 1
        ))
    })?;

    if window != window_length {
        tracing::debug!(
            "Smoothing window repaired from {window_length} to {window} (order {poly_order}, {n} samples)"
        );
    }

    if series.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::InvalidParameter(
            "series contains non-finite samples".to_string(),
        ));
    }

    let weights = fit_weights(window, poly_order)?;
    let half = window / 2;
    let mut out = vec![0.0; n];

    let center = &weights[half];
    for i in half..n - half {
        out[i] = dot(center, &series[i - half..=i + half]);
    }

    // Edges: evaluate the polynomial fitted to the first/last full window
    let head = &series[..window];
    for (k, slot) in out.iter_mut().enumerate().take(half) {
        *slot = dot(&weights[k], head);
    }
    let tail_start = n - window;
    let tail = &series[tail_start..];
    for k in (window - half)..window {
        out[tail_start + k] = dot(&weights[k], tail);
    }

    if out.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::InvalidParameter(
            "fit produced non-finite output".to_string(),
        ));
    }

    Ok(out)
}

/// Smooth a numeric channel of a dataset
pub fn smooth_channel(dataset: &Dataset, channel: &str, config: &SmoothingConfig) -> Result<Vec<f64>> {
    require_columns(dataset, "smoothing", &[channel])?;
    let values = dataset.numeric(channel)?;
    Ok(smooth(values, config.window_length, config.poly_order))
}

/// Centred convolution coefficients for a window and polynomial order.
///
/// The window must be odd and larger than `poly_order + 1`.
pub fn savgol_coefficients(window: usize, poly_order: usize) -> Result<Vec<f64>> {
    if window % 2 == 0 || window <= poly_order + 1 {
        return Err(AnalysisError::InvalidParameter(format!(
            "window {window} must be odd and greater than {}",
            poly_order + 1
        )));
    }
    let mut weights = fit_weights(window, poly_order)?;
    Ok(weights.swap_remove(window / 2))
}

/// Row `k` holds the weights that evaluate, at window position `k`, the
/// least-squares polynomial fitted over the whole window.
fn fit_weights(window: usize, poly_order: usize) -> Result<Vec<Vec<f64>>> {
    let terms = poly_order + 1;
    let half = (window / 2) as f64;
    let scale = half.max(1.0);
    // Positions scaled into [-1, 1] to keep the normal equations well conditioned
    let xs: Vec<f64> = (0..window).map(|i| (i as f64 - half) / scale).collect();
    let powers: Vec<Vec<f64>> = xs
        .iter()
        .map(|&x| (0..terms).map(|p| x.powi(p as i32)).collect())
        .collect();

    let mut normal = vec![vec![0.0; terms]; terms];
    let mut design_t = vec![vec![0.0; window]; terms];
    for (i, row) in powers.iter().enumerate() {
        for a in 0..terms {
            design_t[a][i] = row[a];
            for b in 0..terms {
                normal[a][b] += row[a] * row[b];
            }
        }
    }

    // (AᵀA)⁻¹Aᵀ: polynomial coefficients as linear functions of the samples
    let projection = solve(normal, design_t)?;

    Ok(powers
        .iter()
        .map(|row| {
            (0..window)
                .map(|i| (0..terms).map(|j| row[j] * projection[j][i]).sum::<f64>())
                .collect()
        })
        .collect())
}

/// Solve `a * x = b` for `x` by Gaussian elimination with partial pivoting
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<Vec<f64>>) -> Result<Vec<Vec<f64>>> {
    let n = a.len();

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| {
                a[i][col]
                    .abs()
                    .partial_cmp(&a[j][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);

        if a[pivot][col].abs() < SINGULAR_EPSILON {
            return Err(AnalysisError::InvalidParameter(
                "singular polynomial fit".to_string(),
            ));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        let pivot_row = a[col].clone();
        let pivot_rhs = b[col].clone();
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = a[row][col] / pivot_row[col];
            if factor == 0.0 {
                continue;
            }
            for (v, p) in a[row].iter_mut().zip(&pivot_row).skip(col) {
                *v -= factor * p;
            }
            for (v, p) in b[row].iter_mut().zip(&pivot_rhs) {
                *v -= factor * p;
            }
        }
    }

    for (row, rhs) in b.iter_mut().enumerate() {
        let diag = a[row][row];
        for v in rhs.iter_mut() {
            *v /= diag;
        }
    }

    Ok(b)
}

fn dot(weights: &[f64], samples: &[f64]) -> f64 {
    weights.iter().zip(samples).map(|(w, y)| w * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_coefficients() {
        // Classic 5-point quadratic kernel: [-3, 12, 17, 12, -3] / 35
        let coeffs = savgol_coefficients(5, 2).unwrap();
        let expected = [-3.0, 12.0, 17.0, 12.0, -3.0].map(|c| c / 35.0);
        for (c, e) in coeffs.iter().zip(expected) {
            assert!((c - e).abs() < 1e-10, "{c} vs {e}");
        }
    }

    #[test]
    fn test_coefficients_reject_bad_window() {
        assert!(savgol_coefficients(6, 2).is_err());
        assert!(savgol_coefficients(3, 2).is_err());
    }

    #[test]
    fn test_effective_window_repair() {
        assert_eq!(effective_window(100, 51, 3), Some(51));
        // Even rounds down
        assert_eq!(effective_window(100, 50, 3), Some(49));
        // Clamped to series length, then to odd
        assert_eq!(effective_window(20, 51, 3), Some(19));
        assert_eq!(effective_window(21, 51, 3), Some(21));
        // Bumped above poly_order + 1
        assert_eq!(effective_window(100, 3, 3), Some(5));
        assert_eq!(effective_window(100, 5, 4), Some(7));
        // Too short for the polynomial
        assert_eq!(effective_window(6, 5, 5), None);
        assert_eq!(effective_window(4, 5, 2), None);
    }

    #[test]
    fn test_polynomial_preserved_including_edges() {
        let series: Vec<f64> = (0..30)
            .map(|i| {
                let x = i as f64;
                0.5 * x * x - 3.0 * x + 7.0
            })
            .collect();

        let smoothed = smooth(&series, 9, 2);
        assert_eq!(smoothed.len(), series.len());
        for (s, r) in smoothed.iter().zip(&series) {
            assert!((s - r).abs() < 1e-6, "{s} vs {r}");
        }
    }

    #[test]
    fn test_non_finite_passthrough() {
        let series = vec![1.0, 2.0, f64::NAN, 4.0, 5.0, 6.0, 7.0];
        let smoothed = smooth(&series, 5, 2);
        assert_eq!(smoothed.len(), series.len());
        assert!(smoothed[2].is_nan());
        assert_eq!(smoothed[6], 7.0);
    }

    #[test]
    fn test_preset_configs() {
        assert_eq!(SmoothingPreset::Light.config(), SmoothingConfig::new(21, 2));
        assert_eq!(SmoothingPreset::Heavy.config(), SmoothingConfig::new(101, 2));
        assert_eq!(SmoothingConfig::default(), SmoothingConfig::new(51, 3));
    }
}
