//! Loss metrics shared by the search driver and the reporting step

use nalgebra::DVector;

/// Sum of squared errors between a prediction and its target.
///
/// Panics in debug builds if the lengths disagree; callers validate shapes
/// before prediction, so a mismatch here is a logic error.
pub fn sum_squared_error(prediction: &DVector<f64>, target: &DVector<f64>) -> f64 {
    debug_assert_eq!(prediction.len(), target.len());
    prediction
        .iter()
        .zip(target.iter())
        .map(|(p, t)| (p - t) * (p - t))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sse_of_identical_series_is_zero() {
        let a = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        assert_eq!(sum_squared_error(&a, &a), 0.0);
    }

    #[test]
    fn sse_accumulates_squared_residuals() {
        let pred = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let target = DVector::from_vec(vec![0.0, 4.0, 3.0]);
        assert_eq!(sum_squared_error(&pred, &target), 5.0);
    }

    #[test]
    fn sse_propagates_nan() {
        let pred = DVector::from_vec(vec![f64::NAN, 1.0]);
        let target = DVector::from_vec(vec![0.0, 1.0]);
        assert!(sum_squared_error(&pred, &target).is_nan());
    }
}
