//! End-to-end run of the seasonal-transition forecasting pipeline on a
//! synthetic southern-Amazonia-style wet/dry cycle.
//!
//! The real pipeline feeds 41 years of daily precipitation (1979-2019) and
//! the per-year onset dates; ingestion of those tables lives outside this
//! workspace, so this demo generates a synthetic stand-in with the same
//! shape: a seasonal precipitation cycle plus noise, and a sawtooth
//! proximity-to-transition target that resets at each onset.

#[macro_use]
extern crate log;

use std::sync::Arc;

use common::{
    features,
    metrics::sum_squared_error,
    split::{split, SplitConfig},
};
use ensemble::{DirStore, Ensemble, NanPolicy};
use nalgebra::DVector;
use nanorand::{Rng, WyRand};
use optimizers::{RandomGridSearch, SearchSpace, TrainValData};

const YEARS: usize = 41;
const DAYS_PER_YEAR: usize = 365;
const TRAILING_MEAN_WINDOW: usize = 10;

const TRAIN_DAYS: usize = 9000;
const VAL_DAYS: usize = 2000;
const ENSEMBLE_SIZE: usize = 10;
const NUM_TRIALS: usize = 12;
const MEMBERS_PER_TRIAL: usize = 3;
const SEED: u64 = 0;

// climatological onsets of the synthetic cycle (day of year)
const WET_ONSET_DOY: u32 = 305;
const DRY_ONSET_DOY: u32 = 135;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    let total_days = YEARS * DAYS_PER_YEAR;
    let mut rng = WyRand::new_seed(SEED);

    let mut precipitation = Vec::with_capacity(total_days);
    let mut day_of_year = Vec::with_capacity(total_days);
    for day in 0..total_days {
        let doy = (day % DAYS_PER_YEAR) as u32 + 1;
        day_of_year.push(doy);

        // wet season around the turn of the year, dry season mid-year
        let phase = 2.0 * std::f64::consts::PI * doy as f64 / DAYS_PER_YEAR as f64;
        let seasonal = 5.0 * (1.0 + phase.cos());
        let noise = rng.generate::<f64>() * 4.0;
        precipitation.push(seasonal + noise);
    }
    info!("generated {} synthetic days ({} years)", total_days, YEARS);

    let proximity: Vec<f64> = day_of_year.iter().map(|&doy| proximity_signal(doy)).collect();

    // the trailing mean shortens the series; drop the same leading offset
    // from every aligned sequence
    let precip_mean = features::trailing_mean(&precipitation, TRAILING_MEAN_WINDOW);
    let offset = TRAILING_MEAN_WINDOW - 1;
    let cosine = features::seasonal_cosine(&day_of_year[offset..]);
    let feature_m = features::feature_matrix(&[&precip_mean, &cosine])?;
    let targets = DVector::from_vec(proximity[offset..].to_vec());

    let split_config = SplitConfig {
        train_days: TRAIN_DAYS,
        val_days: VAL_DAYS,
    };
    let data = split(&feature_m, &targets, &split_config)?;
    info!(
        "split into {} train / {} val / {} test days",
        data.train_x.nrows(),
        data.val_x.nrows(),
        data.test_x.nrows()
    );

    let space = SearchSpace {
        reservoir_sizes: vec![64, 128, 256],
        spectral_radii: vec![0.7, 0.9, 1.1],
        sparsities: vec![0.05, 0.1, 0.2],
        input_scales: vec![0.1, 0.3, 1.0],
        ridge_params: vec![1e-8, 1e-4, 1e-2],
    };
    let search = RandomGridSearch::new(space, NUM_TRIALS, MEMBERS_PER_TRIAL, SEED);
    let outcome = search.run(Arc::new(TrainValData::from_split(&data)))?;
    for (i, trial) in outcome.trials.iter().enumerate() {
        debug!("trial {:>2}: score {:>12.4} {:?}", i, trial.score, trial.params);
    }
    let best = match outcome.best_params {
        Some(best) => best,
        None => return Err("no search trial produced a finite score".into()),
    };
    info!("best params {:?} with validation sse {:.4}", best, outcome.best_score);

    let input_dim = data.train_x.ncols();
    let (mut ensemble, report) =
        Ensemble::train(&best, input_dim, ENSEMBLE_SIZE, SEED, &data.train_x, &data.train_y)?;
    if report.excluded > 0 {
        warn!("{} ensemble members were excluded after retries", report.excluded);
    }

    let prediction = ensemble.predict(&data.test_x, NanPolicy::Propagate)?;
    let test_sse = sum_squared_error(&prediction.mean, &data.test_y);
    info!(
        "ensemble of {} predicted {} test days, sse {:.4}",
        ensemble.num_members(),
        prediction.mean.len(),
        test_sse
    );

    let store = DirStore::new("artifacts")?;
    ensemble.save_members(&store)?;
    info!("saved member artifacts to ./artifacts");

    Ok(())
}

/// Normalized days since the previous season onset. The signal rises toward
/// 1 as the next transition approaches and resets to 0 at each boundary; the
/// discontinuity is the shape of the reference target, kept as-is.
fn proximity_signal(doy: u32) -> f64 {
    let year = DAYS_PER_YEAR as u32;
    if (DRY_ONSET_DOY..WET_ONSET_DOY).contains(&doy) {
        (doy - DRY_ONSET_DOY) as f64 / (WET_ONSET_DOY - DRY_ONSET_DOY) as f64
    } else {
        let since_wet = if doy >= WET_ONSET_DOY {
            doy - WET_ONSET_DOY
        } else {
            doy + year - WET_ONSET_DOY
        };
        let wet_len = year - WET_ONSET_DOY + DRY_ONSET_DOY;
        since_wet as f64 / wet_len as f64
    }
}
