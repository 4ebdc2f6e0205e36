use common::{Error, Result};
use nalgebra::{Const, DMatrix, Dim, Dyn, Matrix, MatrixView};

use super::LinReg;

/// Tikhonov regularization aka ridge regression
/// It is particularly useful to mitigate the problem of multicollinearity in
/// linear regression. With `regularization_coeff = 0` it reduces to ordinary
/// least squares.
#[derive(Debug, Clone)]
pub struct TikhonovRegularization {
    /// Ridge parameter
    pub regularization_coeff: f64,
}

impl LinReg for TikhonovRegularization {
    fn fit_readout<'a>(
        &self,
        design: &'a MatrixView<'a, f64, Dyn, Dyn, Const<1>, Dyn>,
        targets: &'a MatrixView<'a, f64, Dyn, Dyn, Const<1>, Dyn>,
    ) -> Result<DMatrix<f64>> {
        let reg_m: DMatrix<f64> = Matrix::from_diagonal_element_generic(
            Dim::from_usize(design.ncols()),
            Dim::from_usize(design.ncols()),
            self.regularization_coeff,
        );

        let p0 = design.transpose() * design;
        let p1 = (p0 + reg_m).try_inverse().ok_or(Error::SingularSystem)?;
        let p2 = design.transpose() * targets;

        Ok(p1 * p2)
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{Dyn, VecStorage};
    use round::round;

    use super::*;

    #[test]
    fn tikhonov_regularization() {
        if let Err(_) = pretty_env_logger::try_init() {}

        // Note the first column being just ones
        let design: DMatrix<f64> = Matrix::from_vec_generic(
            Dim::from_usize(4),
            Dim::from_usize(3),
            vec![1.0, 1.0, 1.0, 1.0, 0.0, 1.0, 2.0, 3.0, 0.0, 0.0, 1.0, 2.0],
        );
        let targets: DMatrix<f64> = Matrix::from_vec_generic(
            Dim::from_usize(4),
            Dim::from_usize(1),
            vec![1.0, 2.0, 3.0, 4.0],
        );
        log::info!("design: {}, targets: {}", design, targets);

        let regressor = TikhonovRegularization {
            regularization_coeff: 0.0,
        };
        let mut readout_matrix = regressor
            .fit_readout(&design.columns(0, design.ncols()), &targets.columns(0, targets.ncols()))
            .unwrap();
        log::info!("readout_matrix: {}", readout_matrix);

        let goal_matrix: Matrix<f64, Dyn, Const<1>, VecStorage<f64, Dyn, Const<1>>> =
            Matrix::from_vec_generic(Dim::from_usize(3), Dim::from_usize(1), vec![1.0, 1.0, 0.0]);

        // round readout
        readout_matrix.iter_mut().for_each(|v| *v = round(*v, 1));

        assert_eq!(readout_matrix, goal_matrix);
    }

    #[test]
    fn tikhonov_regularization_shifted() {
        if let Err(_) = pretty_env_logger::try_init() {}

        // Note the first column being just ones
        let design: DMatrix<f64> = Matrix::from_vec_generic(
            Dim::from_usize(4),
            Dim::from_usize(3),
            vec![100.0, 100.0, 100.0, 100.0, 0.0, 100.0, 200.0, 300.0, 0.0, 0.0, 100.0, 200.0],
        );
        let targets: DMatrix<f64> = Matrix::from_vec_generic(
            Dim::from_usize(4),
            Dim::from_usize(1),
            vec![100.0, 200.0, 300.0, 400.0],
        );

        let regressor = TikhonovRegularization {
            regularization_coeff: 0.0,
        };
        let mut readout_matrix = regressor
            .fit_readout(&design.columns(0, design.ncols()), &targets.columns(0, targets.ncols()))
            .unwrap();

        let goal_matrix: Matrix<f64, Dyn, Const<1>, VecStorage<f64, Dyn, Const<1>>> =
            Matrix::from_vec_generic(Dim::from_usize(3), Dim::from_usize(1), vec![1.0, 1.0, 0.0]);

        // round readout
        readout_matrix.iter_mut().for_each(|v| *v = round(*v, 1));

        assert_eq!(readout_matrix, goal_matrix);
    }

    #[test]
    fn singular_system_without_ridge_is_an_error() {
        // two identical columns make X'X rank deficient
        let design: DMatrix<f64> = Matrix::from_vec_generic(
            Dim::from_usize(3),
            Dim::from_usize(2),
            vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0],
        );
        let targets: DMatrix<f64> =
            Matrix::from_vec_generic(Dim::from_usize(3), Dim::from_usize(1), vec![1.0, 2.0, 3.0]);

        let regressor = TikhonovRegularization {
            regularization_coeff: 0.0,
        };
        let err = regressor
            .fit_readout(&design.columns(0, design.ncols()), &targets.columns(0, targets.ncols()))
            .unwrap_err();
        assert!(matches!(err, Error::SingularSystem));

        // a nonzero ridge makes the same system solvable
        let regressor = TikhonovRegularization {
            regularization_coeff: 1e-6,
        };
        assert!(regressor
            .fit_readout(&design.columns(0, design.ncols()), &targets.columns(0, targets.ncols()))
            .is_ok());
    }
}
