use thiserror::Error;

/// Convenience alias for pipeline results
pub type Result<T> = std::result::Result<T, Error>;

/// The error kinds of the numerical pipeline.
///
/// `DegenerateReservoir` and `SingularSystem` are transient: the caller is
/// expected to retry once with a new seed (or a nonzero ridge coefficient)
/// before giving up on a member or trial. The remaining kinds indicate a
/// caller contract violation and abort the run.
#[derive(Debug, Error)]
pub enum Error {
    /// Sparse sampling produced an all-zero reservoir, so the spectral
    /// radius rescaling is undefined.
    #[error(
        "generated reservoir is all-zero (size {size}, sparsity {sparsity}); retry with a new seed"
    )]
    DegenerateReservoir {
        /// Requested reservoir dimension
        size: usize,
        /// Requested connection probability
        sparsity: f64,
    },

    /// The normal-equations matrix of the readout fit is singular and no
    /// ridge regularization was applied.
    #[error("normal-equations matrix is singular; retry with a nonzero ridge coefficient")]
    SingularSystem,

    /// Training sequence too short for the requested reservoir.
    #[error("training sequence of length {len} is shorter than the reservoir size {reservoir_size}")]
    InsufficientData {
        /// Number of training samples supplied
        len: usize,
        /// Reservoir dimension
        reservoir_size: usize,
    },

    /// The requested split windows exceed the series length.
    #[error(
        "series of length {len} cannot be split into {train_days} train + {val_days} validation days"
    )]
    InsufficientSeriesLength {
        /// Total series length
        len: usize,
        /// Requested training window
        train_days: usize,
        /// Requested validation window
        val_days: usize,
    },

    /// Prediction was requested from an ensemble with zero members.
    #[error("ensemble has no trained members")]
    EmptyEnsemble,

    /// Feature and target series disagree in length after windowing.
    #[error("feature series has {feature_len} samples but target series has {target_len}")]
    DimensionMismatch {
        /// Feature series length
        feature_len: usize,
        /// Target series length
        target_len: usize,
    },
}

impl Error {
    /// Whether a retry with a new random seed (or nonzero ridge) can succeed
    #[inline(always)]
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::DegenerateReservoir { .. } | Error::SingularSystem)
    }
}
