use common::{Error, Result};
use lin_reg::LinReg;
use nalgebra::{Const, DMatrix, DVector, Dyn, MatrixView};
use serde::{Deserialize, Serialize};

use crate::{Params, ReservoirConstructor, StateMatrix, Trajectory};

/// One Echo State Network instance: fixed random reservoir and input
/// projection plus the evolving activation state.
///
/// The readout matrix is deliberately not a field; it is fit against the
/// states of one specific instance and the pairing is owned by the caller
/// (the ensemble keeps them together).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Esn {
    params: Params,
    reservoir_weights: DMatrix<f64>,
    input_weights: DMatrix<f64>,
    reservoir_biases: StateMatrix,
    state: StateMatrix,
}

impl Esn {
    /// Generate a fresh reservoir from the parameter set.
    ///
    /// # Errors
    /// `DegenerateReservoir` if the sparse draw came out all-zero; retry
    /// with a new seed.
    pub fn new(params: Params) -> Result<Self> {
        let mut constructor = ReservoirConstructor::new(
            params.seed,
            params.reservoir_size,
            params.spectral_radius,
            params.sparsity,
            params.reservoir_bias_scaling,
            params.input_scaling.clone(),
        );

        let reservoir_weights = constructor.construct_reservoir_weights()?;
        let input_weights = constructor.construct_input_weights();
        let reservoir_biases = constructor.construct_reservoir_biases();
        let state = DVector::from_element(params.reservoir_size, params.initial_state_value);
        trace!(
            "generated reservoir ({}x{}), input projection ({}x{})",
            reservoir_weights.nrows(),
            reservoir_weights.ncols(),
            input_weights.nrows(),
            input_weights.ncols()
        );

        Ok(Self {
            params,
            reservoir_weights,
            input_weights,
            reservoir_biases,
            state,
        })
    }

    #[inline(always)]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The recurrent weight matrix, rescaled to the requested spectral radius
    #[inline(always)]
    pub fn reservoir_weights(&self) -> &DMatrix<f64> {
        &self.reservoir_weights
    }

    /// Reset the state to its initial value
    #[inline(always)]
    pub fn reset_state(&mut self) {
        self.state =
            DVector::from_element(self.params.reservoir_size, self.params.initial_state_value);
    }

    /// Perform the node-to-node update with the newest observed input
    pub fn update_state<'a>(
        &mut self,
        input: &'a MatrixView<'a, f64, Const<1>, Dyn, Const<1>, Dyn>,
    ) {
        let mut state_delta: StateMatrix = &self.input_weights * input.transpose()
            + self.params.leaking_rate * (&self.reservoir_weights * &self.state)
            + &self.reservoir_biases;
        self.params.reservoir_activation.activate(state_delta.as_mut_slice());

        self.state = (1.0 - self.params.leaking_rate) * &self.state + state_delta;
    }

    /// Drive the reservoir over the training window and fit the readout by
    /// (ridge) least squares on the collected states.
    ///
    /// The returned readout is only valid for this instance.
    ///
    /// # Errors
    /// `DimensionMismatch` if inputs and targets disagree in length,
    /// `InsufficientData` if the sequence is shorter than the reservoir,
    /// `SingularSystem` if the unregularized normal equations are singular.
    pub fn train_readout<R: LinReg>(
        &mut self,
        inputs: &DMatrix<f64>,
        targets: &DVector<f64>,
        regressor: &R,
    ) -> Result<DMatrix<f64>> {
        let rows = inputs.nrows();
        if rows != targets.len() {
            return Err(Error::DimensionMismatch {
                feature_len: rows,
                target_len: targets.len(),
            });
        }
        if rows < self.params.reservoir_size {
            return Err(Error::InsufficientData {
                len: rows,
                reservoir_size: self.params.reservoir_size,
            });
        }

        // discard the earliest states, as they depend on the arbitrary
        // initial state
        let washout_len = (rows as f64 * self.params.washout_pct) as usize;
        let harvest_len = rows - washout_len;

        let mut design = DMatrix::<f64>::zeros(harvest_len, self.params.reservoir_size);
        let mut target_matrix = DMatrix::<f64>::zeros(harvest_len, 1);

        self.reset_state();
        for i in 0..rows {
            self.update_state(&inputs.row(i));
            if i >= washout_len {
                design.set_row(i - washout_len, &self.state.transpose());
                target_matrix[(i - washout_len, 0)] = targets[i];
            }
        }
        debug!("harvested design matrix: ({}, {})", design.nrows(), design.ncols());

        let readout = regressor.fit_readout(
            &design.rows(0, design.nrows()),
            &target_matrix.rows(0, target_matrix.nrows()),
        )?;
        self.reset_state();

        Ok(readout)
    }

    /// Run the reservoir over a test input from the zero-reset state and
    /// apply the readout at every step. Deterministic; output length equals
    /// the input length.
    pub fn run_trajectory(&mut self, readout: &DMatrix<f64>, inputs: &DMatrix<f64>) -> Trajectory {
        self.reset_state();
        let mut out = Trajectory::zeros(inputs.nrows());
        for i in 0..inputs.nrows() {
            self.update_state(&inputs.row(i));
            out[i] = (self.state.transpose() * readout)[(0, 0)];
        }
        out
    }
}
