//! Leave-one-out cross-validation.
//!
//! Each fold withholds exactly one sample, retrains on the remainder, and
//! predicts the withheld sample with the fold's model. Folds are independent
//! and deterministic, so the per-sample loop goes through the maybe-parallel
//! macro.

use crate::iter_maybe_parallel;
use crate::matrix::SpectralMatrix;
use crate::regression::{predict, train_pls};
#[cfg(feature = "parallel")]
use rayon::iter::ParallelIterator;

/// Out-of-fold predictions for every sample.
///
/// A fold trains on n - 1 samples, so its component count is reduced to
/// `max(1, min(components, n - 2))`; the calibration count is used whenever
/// it stays feasible. A fold whose training degenerates (too few samples or
/// a singular latent system) falls back to the supplied full-calibration
/// prediction for that sample instead of aborting the run.
///
/// `fallback` must hold one value per sample; missing entries degrade to 0.
pub fn cross_validate_loo(
    x: &SpectralMatrix,
    y: &[f64],
    components: usize,
    fallback: &[f64],
) -> Vec<f64> {
    let n = x.nrows();
    if n == 0 {
        return Vec::new();
    }
    let fold_components = components.min(n.saturating_sub(2)).max(1);

    iter_maybe_parallel!(0..n)
        .map(|i| {
            let train_idx: Vec<usize> = (0..n).filter(|&j| j != i).collect();
            let x_fold = x.select_rows(&train_idx);
            let y_fold: Vec<f64> = train_idx.iter().map(|&j| y[j]).collect();

            match train_pls(&x_fold, &y_fold, fold_components) {
                Some(model) => predict(&model, &x.row(i)),
                None => {
                    log::warn!(
                        "cross-validation fold {} failed to train; using calibration prediction",
                        i
                    );
                    fallback.get(i).copied().unwrap_or(0.0)
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaled_spectra(n: usize, m: usize) -> (SpectralMatrix, Vec<f64>) {
        let shape: Vec<f64> = (0..m).map(|j| 1.0 + (j as f64 * 0.9).cos().abs()).collect();
        let rows: Vec<Vec<f64>> = (0..n)
            .map(|i| {
                let scale = 1.0 + i as f64 * 0.5;
                shape.iter().map(|&s| s * scale).collect()
            })
            .collect();
        let y: Vec<f64> = (0..n).map(|i| 1.0 + i as f64 * 0.5).collect();
        (SpectralMatrix::from_rows(&rows).unwrap(), y)
    }

    #[test]
    fn test_one_prediction_per_sample() {
        let (x, y) = scaled_spectra(7, 10);
        let fallback = vec![0.0; 7];
        let cv = cross_validate_loo(&x, &y, 2, &fallback);
        assert_eq!(cv.len(), 7);
    }

    #[test]
    fn test_out_of_fold_predictions_generalize() {
        // A rank-one spectral family is predicted exactly even when the
        // sample itself is withheld.
        let (x, y) = scaled_spectra(6, 8);
        let fallback = vec![0.0; 6];
        let cv = cross_validate_loo(&x, &y, 1, &fallback);
        for i in 0..6 {
            assert!(
                (cv[i] - y[i]).abs() < 1e-6,
                "fold {}: predicted {} for reference {}",
                i,
                cv[i],
                y[i]
            );
        }
    }

    #[test]
    fn test_two_samples_fall_back() {
        // Each fold has a single training sample, which cannot be fit; the
        // caller's calibration predictions come back untouched.
        let (x, y) = scaled_spectra(2, 6);
        let fallback = vec![41.0, 42.0];
        let cv = cross_validate_loo(&x, &y, 1, &fallback);
        assert_eq!(cv, fallback);
    }

    #[test]
    fn test_component_count_reduced_for_tight_datasets() {
        // n = 3 leaves folds of 2 samples; the fold rule clamps to a single
        // component and the run must stay finite.
        let (x, y) = scaled_spectra(3, 6);
        let fallback = vec![0.0; 3];
        let cv = cross_validate_loo(&x, &y, 5, &fallback);
        assert_eq!(cv.len(), 3);
        for v in &cv {
            assert!(v.is_finite());
        }
    }

    #[test]
    fn test_empty_input() {
        let x = SpectralMatrix::zeros(0, 0);
        assert!(cross_validate_loo(&x, &[], 1, &[]).is_empty());
    }
}
