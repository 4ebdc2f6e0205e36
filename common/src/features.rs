//! Derivation of the model input features from the raw daily series.
//!
//! The pipeline feeds the reservoirs two features per day: a trailing mean
//! of raw precipitation and a cosine of the day-of-year. Both are plain
//! daily-indexed sequences; [`feature_matrix`] assembles them into the
//! `days x num_features` matrix the rest of the pipeline consumes.

use nalgebra::DMatrix;

use crate::{Error, Result};

/// Trailing mean over the current and previous `window - 1` samples.
///
/// Output index `i` corresponds to raw index `i + window - 1`; the caller
/// must drop the same leading offset from any series it aligns with.
pub fn trailing_mean(series: &[f64], window: usize) -> Vec<f64> {
    assert!(window > 0, "trailing mean window must be positive");
    if series.len() < window {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(series.len() - window + 1);
    let mut sum: f64 = series[..window].iter().sum();
    out.push(sum / window as f64);
    for i in window..series.len() {
        sum += series[i] - series[i - window];
        out.push(sum / window as f64);
    }
    out
}

/// Cosine of the annual cycle, one value per day-of-year (1-based)
pub fn seasonal_cosine(day_of_year: &[u32]) -> Vec<f64> {
    day_of_year
        .iter()
        .map(|d| (2.0 * std::f64::consts::PI * *d as f64 / 365.0).cos())
        .collect()
}

/// Assemble aligned feature columns into a `days x num_features` matrix
pub fn feature_matrix(columns: &[&[f64]]) -> Result<DMatrix<f64>> {
    let rows = columns.first().map(|c| c.len()).unwrap_or(0);
    for col in columns {
        if col.len() != rows {
            return Err(Error::DimensionMismatch {
                feature_len: rows,
                target_len: col.len(),
            });
        }
    }
    Ok(DMatrix::from_fn(rows, columns.len(), |i, j| columns[j][i]))
}
