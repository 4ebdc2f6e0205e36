use common::Result;
use nalgebra::{Const, DMatrix, Dyn, MatrixView};

mod tikhonov_regularization;

pub use tikhonov_regularization::TikhonovRegularization;

/// Generic way of performing linear regression and fitting the readout matrix
pub trait LinReg: Clone {
    /// Fit a readout matrix mapping collected reservoir states to targets
    ///
    /// # Parameters
    /// design: state matrix with one row per retained time step
    /// targets: target matrix with one row per retained time step
    ///
    /// # Errors
    /// `SingularSystem` if the normal-equations matrix cannot be inverted
    fn fit_readout<'a>(
        &self,
        design: &'a MatrixView<'a, f64, Dyn, Dyn, Const<1>, Dyn>,
        targets: &'a MatrixView<'a, f64, Dyn, Dyn, Const<1>, Dyn>,
    ) -> Result<DMatrix<f64>>;
}
