use common::{Error, Result};
use nalgebra::{DMatrix, DVector, Normed};
use nanorand::{Rng, WyRand};

use crate::StateMatrix;

/// Constructs the fixed random weights of an Echo State Network
pub struct ReservoirConstructor {
    /// The number of nodes in the reservoir
    reservoir_size: usize,

    /// Largest eigenvalue magnitude the reservoir is rescaled to
    spectral_radius: f64,

    /// Probability of any reservoir entry being nonzero
    sparsity: f64,

    /// Scales the randomly generated biases
    bias_scaling: f64,

    /// Per-feature scaling of the input projection
    input_scaling: Vec<f64>,

    rng: WyRand,
}

impl ReservoirConstructor {
    pub fn new(
        seed: Option<u64>,
        reservoir_size: usize,
        spectral_radius: f64,
        sparsity: f64,
        bias_scaling: f64,
        input_scaling: Vec<f64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => WyRand::new_seed(seed),
            None => WyRand::new(),
        };

        Self {
            reservoir_size,
            spectral_radius,
            sparsity,
            bias_scaling,
            input_scaling,
            rng,
        }
    }

    /// Build the sparse recurrent weight matrix and rescale it so its
    /// spectral radius equals the requested value exactly.
    ///
    /// # Errors
    /// `DegenerateReservoir` if the sampled matrix has spectral radius zero,
    /// which makes the rescaling undefined. The caller retries with a new
    /// seed.
    pub fn construct_reservoir_weights(&mut self) -> Result<DMatrix<f64>> {
        let n = self.reservoir_size;
        let mut weights = DMatrix::<f64>::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                if self.rng.generate::<f64>() < self.sparsity {
                    weights[(i, j)] = self.rng.generate::<f64>() * 2.0 - 1.0;
                }
            }
        }

        // The reservoir is not symmetric, so the eigenvalues come from a
        // Schur decomposition and may be complex.
        let spec_rad = weights
            .complex_eigenvalues()
            .iter()
            .map(|ev| ev.norm())
            .fold(0.0_f64, f64::max);
        if spec_rad <= f64::EPSILON {
            return Err(Error::DegenerateReservoir {
                size: n,
                sparsity: self.sparsity,
            });
        }
        weights *= self.spectral_radius / spec_rad;

        Ok(weights)
    }

    /// Build the input projection, `reservoir_size x input_dim`, with each
    /// column scaled by its feature's input scale
    pub fn construct_input_weights(&mut self) -> DMatrix<f64> {
        DMatrix::from_fn(self.reservoir_size, self.input_scaling.len(), |_, j| {
            (self.rng.generate::<f64>() * 2.0 - 1.0) * self.input_scaling[j]
        })
    }

    /// Build the reservoir bias vector
    pub fn construct_reservoir_biases(&mut self) -> StateMatrix {
        DVector::from_fn(self.reservoir_size, |_, _| {
            (self.rng.generate::<f64>() * 2.0 - 1.0) * self.bias_scaling
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spectral_radius_is_exact_after_rescaling() {
        let radius = 0.8;
        let mut constructor =
            ReservoirConstructor::new(Some(42), 64, radius, 0.2, 0.0, vec![1.0, 1.0]);
        let weights = constructor.construct_reservoir_weights().unwrap();

        let spec_rad = weights
            .complex_eigenvalues()
            .iter()
            .map(|ev| ev.norm())
            .fold(0.0_f64, f64::max);
        assert!(
            (spec_rad - radius).abs() / radius < 1e-6,
            "spectral radius {} too far from requested {}",
            spec_rad,
            radius
        );
    }

    #[test]
    fn nonzero_fraction_tracks_sparsity() {
        let sparsity = 0.05;
        let n = 500;
        let mut constructor =
            ReservoirConstructor::new(Some(7), n, 0.9, sparsity, 0.0, vec![1.0]);
        let weights = constructor.construct_reservoir_weights().unwrap();

        let nonzero = weights.iter().filter(|v| **v != 0.0).count();
        let fraction = nonzero as f64 / (n * n) as f64;
        assert!(
            (fraction - sparsity).abs() / sparsity < 0.2,
            "nonzero fraction {} too far from sparsity {}",
            fraction,
            sparsity
        );
    }

    #[test]
    fn all_zero_draw_is_degenerate() {
        // sparsity this small never samples an entry for a 3x3 matrix
        let mut constructor =
            ReservoirConstructor::new(Some(1), 3, 0.9, 1e-12, 0.0, vec![1.0]);
        let err = constructor.construct_reservoir_weights().unwrap_err();
        assert!(matches!(err, Error::DegenerateReservoir { size: 3, .. }));
    }

    #[test]
    fn input_columns_use_their_own_scale() {
        let mut constructor =
            ReservoirConstructor::new(Some(3), 50, 0.9, 0.5, 0.0, vec![0.1, 10.0]);
        let input_weights = constructor.construct_input_weights();

        assert_eq!(input_weights.nrows(), 50);
        assert_eq!(input_weights.ncols(), 2);
        assert!(input_weights.column(0).iter().all(|v| v.abs() <= 0.1));
        assert!(input_weights.column(1).iter().any(|v| v.abs() > 0.1));
    }

    #[test]
    fn same_seed_reproduces_the_reservoir() {
        let build = || {
            ReservoirConstructor::new(Some(99), 32, 0.7, 0.3, 0.1, vec![0.5])
                .construct_reservoir_weights()
                .unwrap()
        };
        assert_eq!(build(), build());
    }
}
