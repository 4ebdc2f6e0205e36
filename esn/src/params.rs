use common::Activation;
use serde::{Deserialize, Serialize};

/// The full parameter set of one Echo State Network instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Number of input features per time step
    pub input_dim: usize,
    /// Number of nodes in the reservoir
    pub reservoir_size: usize,

    /// Controls the retention of information from previous time steps.
    /// The spectral radius determines how fast the influence of an input
    /// dies out in a reservoir with time, and how stable the reservoir
    /// activations are. The spectral radius should be greater in tasks
    /// requiring longer memory of the input.
    pub spectral_radius: f64,
    /// Connection probability within the reservoir, in (0, 1]
    pub sparsity: f64,
    /// Per-feature scaling of the input projection, one entry per input
    /// feature (the weighted input layer)
    pub input_scaling: Vec<f64>,
    /// Scales the randomly generated reservoir biases; 0.0 disables biases
    pub reservoir_bias_scaling: f64,

    /// Tunes the decay time of internal activity of the network.
    /// A leaking rate of 1.0 gives the plain update
    /// `state = f(W_in * u + W * state + b)`.
    pub leaking_rate: f64,
    /// Fraction of initial state transitions to disregard in training
    pub washout_pct: f64,
    /// Activation function of the reservoir state transition
    pub reservoir_activation: Activation,
    /// Initial value of each state node
    pub initial_state_value: f64,
    /// Optional seed for the Rng
    pub seed: Option<u64>,
}

/// One point of the hyperparameter search space.
///
/// Fully determines a reproducible reservoir modulo the generation seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperParams {
    /// Number of nodes in the reservoir
    pub reservoir_size: usize,
    /// Largest eigenvalue magnitude after rescaling
    pub spectral_radius: f64,
    /// Connection probability within the reservoir
    pub sparsity: f64,
    /// Uniform input projection scale, broadcast to every input feature
    pub input_scale: f64,
    /// Ridge regression coefficient of the readout fit
    pub ridge_param: f64,
}

impl HyperParams {
    /// Expand into the full parameter set for `input_dim` input features
    pub fn to_params(&self, input_dim: usize, seed: Option<u64>) -> Params {
        Params {
            input_dim,
            reservoir_size: self.reservoir_size,
            spectral_radius: self.spectral_radius,
            sparsity: self.sparsity,
            input_scaling: vec![self.input_scale; input_dim],
            reservoir_bias_scaling: 0.0,
            leaking_rate: 1.0,
            washout_pct: 0.0,
            reservoir_activation: Activation::Tanh,
            initial_state_value: 0.0,
            seed,
        }
    }
}
