//! Hyperparameter optimization for the reservoir ensemble

#[macro_use]
extern crate log;

use common::split::SplitData;
use nalgebra::{DMatrix, DVector};

mod random_grid;

pub use random_grid::{RandomGridSearch, SearchOutcome, SearchSpace, Trial};

/// The read-only series shared by every search worker.
///
/// Workers never mutate it; each trial only needs its own derived seed.
#[derive(Debug)]
pub struct TrainValData {
    /// Training features
    pub train_x: DMatrix<f64>,
    /// Training targets
    pub train_y: DVector<f64>,
    /// Validation features, used only for scoring
    pub val_x: DMatrix<f64>,
    /// Validation targets
    pub val_y: DVector<f64>,
}

impl TrainValData {
    /// Take the train and validation windows of a split, leaving the test
    /// window untouched for the final evaluation
    pub fn from_split(split: &SplitData) -> Self {
        Self {
            train_x: split.train_x.clone(),
            train_y: split.train_y.clone(),
            val_x: split.val_x.clone(),
            val_y: split.val_y.clone(),
        }
    }
}
