//! Deterministic chronological splitting of the feature/target series

use nalgebra::{DMatrix, DVector};

use crate::{Error, Result};

/// Split window sizes in days. The test window is the implicit remainder.
#[derive(Debug, Clone, Copy)]
pub struct SplitConfig {
    /// Number of leading days used for training
    pub train_days: usize,
    /// Number of days following the training window used for validation
    pub val_days: usize,
}

/// The train/validation/test windows of the aligned feature and target series
#[derive(Debug, Clone)]
pub struct SplitData {
    /// Training features, `train_days x num_features`
    pub train_x: DMatrix<f64>,
    /// Validation features, `val_days x num_features`
    pub val_x: DMatrix<f64>,
    /// Test features, remainder of the series
    pub test_x: DMatrix<f64>,
    /// Training targets
    pub train_y: DVector<f64>,
    /// Validation targets
    pub val_y: DVector<f64>,
    /// Test targets
    pub test_y: DVector<f64>,
}

/// Slice the aligned series into contiguous, non-overlapping, chronologically
/// ordered train/validation/test windows.
///
/// Any trailing-mean windowing offset must already have been applied to both
/// series identically; a length disagreement here is a contract violation.
pub fn split(features: &DMatrix<f64>, targets: &DVector<f64>, config: &SplitConfig) -> Result<SplitData> {
    let len = features.nrows();
    if len != targets.len() {
        return Err(Error::DimensionMismatch {
            feature_len: len,
            target_len: targets.len(),
        });
    }
    if config.train_days + config.val_days > len {
        return Err(Error::InsufficientSeriesLength {
            len,
            train_days: config.train_days,
            val_days: config.val_days,
        });
    }

    let val_start = config.train_days;
    let test_start = config.train_days + config.val_days;
    let test_days = len - test_start;

    Ok(SplitData {
        train_x: features.rows(0, config.train_days).into_owned(),
        val_x: features.rows(val_start, config.val_days).into_owned(),
        test_x: features.rows(test_start, test_days).into_owned(),
        train_y: targets.rows(0, config.train_days).into_owned(),
        val_y: targets.rows(val_start, config.val_days).into_owned(),
        test_y: targets.rows(test_start, test_days).into_owned(),
    })
}
