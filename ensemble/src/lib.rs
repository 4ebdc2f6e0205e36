//! Ensemble of independently generated and trained Echo State Networks.
//!
//! Members share one hyperparameter set but are generated from distinct
//! seeds; prediction runs every member over the shared test input and
//! reduces to the arithmetic mean over the member axis.

#[macro_use]
extern crate log;

use common::{derive_seed, Error, Result};
use esn::{Esn, HyperParams, Trajectory};
use lin_reg::{LinReg, TikhonovRegularization};
use nalgebra::{DMatrix, DVector};

mod artifact;

pub use artifact::{ArtifactError, ArtifactKind, ArtifactStore, DirStore, MemStore};

/// How the ensemble mean treats NaN in individual member predictions.
///
/// The default propagates NaN into the mean so a failing member is visible;
/// NaN-aware averaging has to be requested explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NanPolicy {
    /// Any NaN member value makes the mean at that time step NaN
    #[default]
    Propagate,
    /// NaN member values are excluded from the mean at that time step;
    /// the mean is NaN only if every member is NaN there
    Omit,
}

/// One trained ensemble member: a reservoir and the readout that was fit
/// against this exact reservoir's states. The pairing is only valid as
/// constructed; mixing readouts between instances is meaningless.
#[derive(Debug, Clone)]
pub struct EnsembleMember {
    esn: Esn,
    readout: DMatrix<f64>,
}

impl EnsembleMember {
    /// Generate a reservoir and fit its readout in one step
    pub fn train<R: LinReg>(
        params: esn::Params,
        regressor: &R,
        inputs: &DMatrix<f64>,
        targets: &DVector<f64>,
    ) -> Result<Self> {
        let mut esn = Esn::new(params)?;
        let readout = esn.train_readout(inputs, targets, regressor)?;
        Ok(Self { esn, readout })
    }

    /// Reassemble a member from persisted parts (artifact loading)
    pub fn from_parts(esn: Esn, readout: DMatrix<f64>) -> Self {
        Self { esn, readout }
    }

    /// Run this member over a test input from the zero-reset state
    pub fn predict(&mut self, inputs: &DMatrix<f64>) -> Trajectory {
        self.esn.run_trajectory(&self.readout, inputs)
    }

    #[inline(always)]
    pub fn esn(&self) -> &Esn {
        &self.esn
    }

    #[inline(always)]
    pub fn readout(&self) -> &DMatrix<f64> {
        &self.readout
    }
}

/// What `Ensemble::train` did besides producing members
#[derive(Debug, Clone, Copy)]
pub struct TrainReport {
    /// Members that failed generation or training even after one retry
    /// and were left out of the ensemble
    pub excluded: usize,
}

/// The reduced ensemble output
#[derive(Debug, Clone)]
pub struct EnsemblePrediction {
    /// Arithmetic mean over the member axis, one value per test day
    pub mean: Trajectory,
    /// Per-member trajectories, `test_len x num_members`
    pub members: DMatrix<f64>,
}

/// An ordered collection of trained (reservoir, readout) pairs
#[derive(Debug, Clone)]
pub struct Ensemble {
    members: Vec<EnsembleMember>,
}

impl Ensemble {
    /// Train `num_members` independent members that share one hyperparameter
    /// set. Member seeds derive deterministically from `base_seed`, so the
    /// whole ensemble is reproducible.
    ///
    /// A member failing with a transient error is retried once with a fresh
    /// seed, then excluded; the report carries the excluded count. Shape
    /// errors abort instead, since no retry can fix the caller's data.
    pub fn train(
        hyper: &HyperParams,
        input_dim: usize,
        num_members: usize,
        base_seed: u64,
        inputs: &DMatrix<f64>,
        targets: &DVector<f64>,
    ) -> Result<(Self, TrainReport)> {
        let regressor = TikhonovRegularization {
            regularization_coeff: hyper.ridge_param,
        };

        let mut members = Vec::with_capacity(num_members);
        let mut excluded = 0;
        for m in 0..num_members {
            match train_member(hyper, input_dim, base_seed, m as u64, inputs, targets, &regressor)? {
                Some(member) => members.push(member),
                None => excluded += 1,
            }
        }
        if excluded > 0 {
            warn!("{} of {} ensemble members failed and were excluded", excluded, num_members);
        }

        Ok((Self { members }, TrainReport { excluded }))
    }

    /// Assemble an ensemble from already-trained members
    pub fn from_members(members: Vec<EnsembleMember>) -> Self {
        Self { members }
    }

    #[inline(always)]
    pub fn num_members(&self) -> usize {
        self.members.len()
    }

    /// Run every member over the shared test input and reduce to the mean
    /// trajectory. Deterministic; the output length equals the input length.
    ///
    /// # Errors
    /// `EmptyEnsemble` if there are no members.
    pub fn predict(
        &mut self,
        inputs: &DMatrix<f64>,
        nan_policy: NanPolicy,
    ) -> Result<EnsemblePrediction> {
        if self.members.is_empty() {
            return Err(Error::EmptyEnsemble);
        }

        let len = inputs.nrows();
        let n = self.members.len();
        let mut member_predictions = DMatrix::<f64>::zeros(len, n);
        for (j, member) in self.members.iter_mut().enumerate() {
            member_predictions.set_column(j, &member.predict(inputs));
        }

        let mean = DVector::from_fn(len, |i, _| {
            let row = member_predictions.row(i);
            match nan_policy {
                NanPolicy::Propagate => row.sum() / n as f64,
                NanPolicy::Omit => {
                    let mut sum = 0.0;
                    let mut count = 0usize;
                    for v in row.iter() {
                        if !v.is_nan() {
                            sum += v;
                            count += 1;
                        }
                    }
                    if count == 0 {
                        f64::NAN
                    } else {
                        sum / count as f64
                    }
                }
            }
        });

        Ok(EnsemblePrediction {
            mean,
            members: member_predictions,
        })
    }

    /// Persist every member through the artifact store, keyed by member
    /// index 1..=N: one reservoir artifact and one readout artifact each.
    pub fn save_members<S: ArtifactStore>(&self, store: &S) -> std::result::Result<(), ArtifactError> {
        for (i, member) in self.members.iter().enumerate() {
            let index = i + 1;
            store.save(ArtifactKind::Reservoir, index, &bincode::serialize(member.esn())?)?;
            store.save(ArtifactKind::Readout, index, &bincode::serialize(member.readout())?)?;
        }
        Ok(())
    }

    /// Load `num_members` members back by the same keys they were saved under
    pub fn load_members<S: ArtifactStore>(
        store: &S,
        num_members: usize,
    ) -> std::result::Result<Self, ArtifactError> {
        let mut members = Vec::with_capacity(num_members);
        for index in 1..=num_members {
            let esn: Esn = bincode::deserialize(&store.load(ArtifactKind::Reservoir, index)?)?;
            let readout: DMatrix<f64> =
                bincode::deserialize(&store.load(ArtifactKind::Readout, index)?)?;
            members.push(EnsembleMember::from_parts(esn, readout));
        }
        Ok(Self { members })
    }
}

/// Train one member, retrying once with a fresh derived seed on a transient
/// failure. `Ok(None)` marks a member as excluded.
fn train_member<R: LinReg>(
    hyper: &HyperParams,
    input_dim: usize,
    base_seed: u64,
    member: u64,
    inputs: &DMatrix<f64>,
    targets: &DVector<f64>,
    regressor: &R,
) -> Result<Option<EnsembleMember>> {
    for attempt in 0..2u64 {
        let seed = derive_seed(base_seed, member, attempt);
        let params = hyper.to_params(input_dim, Some(seed));
        match EnsembleMember::train(params, regressor, inputs, targets) {
            Ok(member) => return Ok(Some(member)),
            Err(e) if e.is_transient() => {
                warn!("member {} attempt {} failed: {}", member, attempt, e);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}
