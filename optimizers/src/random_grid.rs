//! Randomized search over an enumerated hyperparameter grid

use std::{cmp::max, sync::Arc};

use common::{derive_seed, metrics::sum_squared_error, Result};
use crossbeam::channel::unbounded;
use esn::{Esn, HyperParams};
use lin_reg::TikhonovRegularization;
use nanorand::{Rng, WyRand};
use threadpool::ThreadPool;

use crate::TrainValData;

/// The discrete search grid, one finite set of values per axis.
///
/// Combinations are sampled uniformly at random with replacement, so a
/// combination may recur across trials.
#[derive(Debug, Clone)]
pub struct SearchSpace {
    /// Candidate reservoir sizes
    pub reservoir_sizes: Vec<usize>,
    /// Candidate spectral radii
    pub spectral_radii: Vec<f64>,
    /// Candidate reservoir connection probabilities
    pub sparsities: Vec<f64>,
    /// Candidate input projection scales
    pub input_scales: Vec<f64>,
    /// Candidate ridge regression coefficients
    pub ridge_params: Vec<f64>,
}

impl SearchSpace {
    /// Whether any axis has no values to sample from
    pub fn is_empty(&self) -> bool {
        self.reservoir_sizes.is_empty()
            || self.spectral_radii.is_empty()
            || self.sparsities.is_empty()
            || self.input_scales.is_empty()
            || self.ridge_params.is_empty()
    }

    /// Number of distinct combinations in the grid
    pub fn num_combinations(&self) -> usize {
        self.reservoir_sizes.len()
            * self.spectral_radii.len()
            * self.sparsities.len()
            * self.input_scales.len()
            * self.ridge_params.len()
    }

    fn sample(&self, rng: &mut WyRand) -> HyperParams {
        HyperParams {
            reservoir_size: self.reservoir_sizes[rng.generate_range(0..self.reservoir_sizes.len())],
            spectral_radius: self.spectral_radii[rng.generate_range(0..self.spectral_radii.len())],
            sparsity: self.sparsities[rng.generate_range(0..self.sparsities.len())],
            input_scale: self.input_scales[rng.generate_range(0..self.input_scales.len())],
            ridge_param: self.ridge_params[rng.generate_range(0..self.ridge_params.len())],
        }
    }
}

/// One recorded trial of the search history
#[derive(Debug, Clone)]
pub struct Trial {
    /// The sampled hyperparameter combination
    pub params: HyperParams,
    /// Mean validation sum-of-squared-error over the trial's members;
    /// `f64::INFINITY` marks an abandoned trial
    pub score: f64,
}

/// The result of a whole search run
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// The minimum-score combination, `None` if no trial produced a finite
    /// score
    pub best_params: Option<HyperParams>,
    /// The score of `best_params`, `f64::INFINITY` otherwise
    pub best_score: f64,
    /// All trials in dispatch order, kept for reproducibility and audit
    pub trials: Vec<Trial>,
}

/// Optimization by uniform random sampling from the grid.
///
/// Trials are independent given their derived seeds and share only the
/// read-only series, so they are dispatched to a worker pool; aggregation
/// happens after every worker of the batch has reported back.
pub struct RandomGridSearch {
    space: SearchSpace,
    num_trials: usize,
    members_per_trial: usize,
    seed: u64,
}

impl RandomGridSearch {
    /// Create a new search driver.
    ///
    /// # Panics
    /// If `members_per_trial` is zero; a trial needs at least one member
    /// to produce a score.
    pub fn new(space: SearchSpace, num_trials: usize, members_per_trial: usize, seed: u64) -> Self {
        assert!(members_per_trial > 0, "a trial needs at least one member");
        Self {
            space,
            num_trials,
            members_per_trial,
            seed,
        }
    }

    /// Run all trials and return the best combination plus the full history.
    ///
    /// # Errors
    /// Data-shape errors (`InsufficientData`, `DimensionMismatch`) abort the
    /// whole search; transient member failures only cost their trial.
    pub fn run(&self, data: Arc<TrainValData>) -> Result<SearchOutcome> {
        if self.num_trials == 0 || self.space.is_empty() {
            if self.space.is_empty() && self.num_trials > 0 {
                warn!("search space has an empty axis, nothing to sample");
            }
            return Ok(SearchOutcome {
                best_params: None,
                best_score: f64::INFINITY,
                trials: Vec::new(),
            });
        }

        // sampling happens up front on the driver thread so the candidate
        // list is a pure function of the base seed
        let mut rng = WyRand::new_seed(self.seed);
        let candidates: Vec<HyperParams> =
            (0..self.num_trials).map(|_| self.space.sample(&mut rng)).collect();
        debug!(
            "dispatching {} trials over a grid of {} combinations",
            self.num_trials,
            self.space.num_combinations()
        );

        let pool = ThreadPool::new(max(num_cpus::get().saturating_sub(2), 1));
        let (ch_score_s, ch_score_r) = unbounded();
        for (i, candidate) in candidates.iter().enumerate() {
            let ch_score_s = ch_score_s.clone();
            let data = Arc::clone(&data);
            let candidate = candidate.clone();
            let members = self.members_per_trial;
            let base_seed = self.seed;
            pool.execute(move || {
                let result = evaluate_trial(&candidate, members, base_seed, i, &data);
                // the receiver outlives the pool, send cannot fail
                let _ = ch_score_s.send((i, result));
            });
        }
        drop(ch_score_s);

        let mut results: Vec<Option<Result<f64>>> = (0..self.num_trials).map(|_| None).collect();
        while let Ok((i, result)) = ch_score_r.recv() {
            results[i] = Some(result);
        }

        let mut trials = Vec::with_capacity(self.num_trials);
        let mut best_params = None;
        let mut best_score = f64::INFINITY;
        for (i, result) in results.into_iter().enumerate() {
            let score = result.expect("every trial reports exactly once")?;
            if score < best_score {
                best_score = score;
                best_params = Some(candidates[i].clone());
            }
            trials.push(Trial {
                params: candidates[i].clone(),
                score,
            });
        }
        info!("search done, best score {} of {} trials", best_score, trials.len());

        Ok(SearchOutcome {
            best_params,
            best_score,
            trials,
        })
    }
}

/// Score one candidate: train `members` independently seeded reservoirs on
/// the training window and average their validation sum-of-squared-error.
///
/// A member that fails transiently is retried once with a new derived seed;
/// if the retry fails too the whole trial is abandoned and scored
/// `f64::INFINITY`. Shape errors propagate and abort the search.
fn evaluate_trial(
    candidate: &HyperParams,
    members: usize,
    base_seed: u64,
    trial_idx: usize,
    data: &TrainValData,
) -> Result<f64> {
    let regressor = TikhonovRegularization {
        regularization_coeff: candidate.ridge_param,
    };
    let input_dim = data.train_x.ncols();

    let mut losses = Vec::with_capacity(members);
    for m in 0..members {
        let mut trained = None;
        for attempt in 0..2u64 {
            let stream = ((trial_idx as u64) << 16) | m as u64;
            let seed = derive_seed(base_seed, stream, attempt);
            let params = candidate.to_params(input_dim, Some(seed));

            let mut esn = match Esn::new(params) {
                Ok(esn) => esn,
                Err(e) if e.is_transient() => {
                    warn!("trial {} member {} attempt {}: {}", trial_idx, m, attempt, e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            match esn.train_readout(&data.train_x, &data.train_y, &regressor) {
                Ok(readout) => {
                    trained = Some((esn, readout));
                    break;
                }
                Err(e) if e.is_transient() => {
                    warn!("trial {} member {} attempt {}: {}", trial_idx, m, attempt, e);
                }
                Err(e) => return Err(e),
            }
        }

        let Some((mut esn, readout)) = trained else {
            debug!("trial {} abandoned after member {} failed twice", trial_idx, m);
            return Ok(f64::INFINITY);
        };
        let prediction = esn.run_trajectory(&readout, &data.val_x);
        losses.push(sum_squared_error(&prediction, &data.val_y));
    }

    Ok(losses.iter().sum::<f64>() / losses.len() as f64)
}

#[cfg(test)]
mod tests {
    use nalgebra::{DMatrix, DVector};

    use super::*;

    fn sine_data(train_len: usize, val_len: usize) -> TrainValData {
        let omega = 2.0 * std::f64::consts::PI / 80.0;
        let make = |offset: usize, len: usize| {
            let inputs = DMatrix::from_fn(len, 2, |i, j| {
                let phase = omega * (offset + i) as f64;
                if j == 0 {
                    phase.sin()
                } else {
                    phase.cos()
                }
            });
            let targets = DVector::from_fn(len, |i, _| (omega * (offset + i + 1) as f64).sin());
            (inputs, targets)
        };
        let (train_x, train_y) = make(0, train_len);
        let (val_x, val_y) = make(train_len, val_len);
        TrainValData {
            train_x,
            train_y,
            val_x,
            val_y,
        }
    }

    fn single_point_space() -> SearchSpace {
        SearchSpace {
            reservoir_sizes: vec![24],
            spectral_radii: vec![0.9],
            sparsities: vec![0.2],
            input_scales: vec![0.3],
            ridge_params: vec![1e-6],
        }
    }

    #[test]
    fn zero_trials_yield_an_empty_outcome() {
        let search = RandomGridSearch::new(single_point_space(), 0, 2, 42);
        let outcome = search.run(Arc::new(sine_data(100, 30))).unwrap();

        assert!(outcome.trials.is_empty());
        assert!(outcome.best_params.is_none());
        assert!(outcome.best_score.is_infinite());
    }

    #[test]
    fn single_combination_grid_always_samples_it() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let space = single_point_space();
        let expected = HyperParams {
            reservoir_size: 24,
            spectral_radius: 0.9,
            sparsity: 0.2,
            input_scale: 0.3,
            ridge_param: 1e-6,
        };
        let search = RandomGridSearch::new(space, 5, 2, 42);
        let outcome = search.run(Arc::new(sine_data(100, 30))).unwrap();

        assert_eq!(outcome.trials.len(), 5);
        for trial in &outcome.trials {
            assert_eq!(trial.params, expected);
            assert!(trial.score.is_finite());
        }
        assert_eq!(outcome.best_params, Some(expected));
        assert!(outcome.best_score.is_finite());
    }

    #[test]
    fn search_is_reproducible_from_the_seed() {
        let space = SearchSpace {
            reservoir_sizes: vec![16, 24, 32],
            spectral_radii: vec![0.7, 0.9],
            sparsities: vec![0.1, 0.3],
            input_scales: vec![0.1, 0.5],
            ridge_params: vec![1e-8, 1e-4],
        };
        let data = Arc::new(sine_data(120, 40));

        let a = RandomGridSearch::new(space.clone(), 6, 1, 7).run(Arc::clone(&data)).unwrap();
        let b = RandomGridSearch::new(space, 6, 1, 7).run(data).unwrap();

        assert_eq!(a.best_params, b.best_params);
        assert_eq!(a.best_score, b.best_score);
        let scores_a: Vec<f64> = a.trials.iter().map(|t| t.score).collect();
        let scores_b: Vec<f64> = b.trials.iter().map(|t| t.score).collect();
        assert_eq!(scores_a, scores_b);
    }

    #[test]
    fn unrecoverable_members_abandon_the_trial() {
        let mut space = single_point_space();
        // cannot ever produce a nonzero reservoir
        space.sparsities = vec![1e-12];
        let search = RandomGridSearch::new(space, 3, 2, 42);
        let outcome = search.run(Arc::new(sine_data(100, 30))).unwrap();

        assert_eq!(outcome.trials.len(), 3);
        assert!(outcome.trials.iter().all(|t| t.score.is_infinite()));
        assert!(outcome.best_params.is_none());
        assert!(outcome.best_score.is_infinite());
    }

    #[test]
    fn shape_errors_abort_the_search() {
        let mut space = single_point_space();
        space.reservoir_sizes = vec![500];
        let search = RandomGridSearch::new(space, 2, 1, 42);
        let err = search.run(Arc::new(sine_data(100, 30))).unwrap_err();
        assert!(matches!(err, common::Error::InsufficientData { .. }));
    }

    #[test]
    fn empty_axis_yields_an_empty_outcome() {
        let mut space = single_point_space();
        space.ridge_params = Vec::new();
        let search = RandomGridSearch::new(space, 4, 1, 42);
        let outcome = search.run(Arc::new(sine_data(100, 30))).unwrap();

        assert!(outcome.trials.is_empty());
        assert!(outcome.best_params.is_none());
    }
}
