//! Calibration analysis entry points.
//!
//! This module ties the pipeline together: preprocess the active samples,
//! fit the PLS model, validate it by leave-one-out, derive the aggregate
//! statistics, and screen residual outliers. Every operation is a pure
//! function of its inputs; nothing is retained between invocations.

use crate::matrix::SpectralMatrix;
use crate::outliers::{score_residuals, DEFAULT_OUTLIER_THRESHOLD};
use crate::preprocess::{apply_steps, PreprocessingStep};
use crate::regression::{predict, principal_component_scores, train_pls};
use crate::slice_maybe_parallel;
use crate::statistics::{calibration_stats, predictive_power};
use crate::validation::cross_validate_loo;
#[cfg(feature = "parallel")]
use rayon::iter::ParallelIterator;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum number of active samples for a stable calibration.
pub const MIN_SAMPLES: usize = 3;

/// One spectral sample: instrument readings plus a reference value.
///
/// `active` controls inclusion in training; `color` is display metadata
/// carried through untouched for the calling layer's plots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub id: String,
    pub spectrum: Vec<f64>,
    pub reference_value: f64,
    pub active: bool,
    pub color: String,
}

/// Errors surfaced by the analysis entry points.
///
/// Everything else in the pipeline degrades instead of failing: invalid
/// preprocessing parameters pass through as identity, singular latent
/// systems are ridge-stabilized, and failed cross-validation folds fall
/// back to the calibration prediction.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("at least 3 active samples are required for a stable calibration, found {found}")]
    InsufficientSamples { found: usize },
    #[error("active samples do not share a common spectral axis")]
    InconsistentSpectra,
    #[error("numerical failure while fitting the calibration model")]
    TrainingFailed,
}

/// Aggregate figures of merit for a calibration run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationMetrics {
    /// Correlation between reference values and fitted predictions.
    pub r: f64,
    /// Coefficient of determination.
    pub r2: f64,
    /// Cross-validated predictive power (Q² estimate).
    pub q2: f64,
    /// Standard error of calibration (RMSE of the fitted model).
    pub sec: f64,
    /// Standard error of cross-validation (RMSE of out-of-fold predictions).
    pub secv: f64,
    /// Slope of predicted vs. actual.
    pub slope: f64,
    /// Offset of predicted vs. actual.
    pub offset: f64,
}

/// Per-sample prediction record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplePrediction {
    pub id: String,
    pub actual: f64,
    pub predicted: f64,
    /// Out-of-fold prediction from leave-one-out validation.
    pub predicted_cv: f64,
    pub residual: f64,
}

/// Per-sample outlier verdict with the owning sample's id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierRecord {
    pub id: String,
    /// Standardized residual distance.
    pub distance: f64,
    pub is_outlier: bool,
}

/// Consolidated result of one calibration run.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResults {
    /// Latent components actually used (clamped to the feasible maximum).
    pub n_components: usize,
    pub metrics: CalibrationMetrics,
    /// Regression intercept (B0).
    pub intercept: f64,
    /// Coefficient vector aligned with the spectral axis.
    pub coefficients: Vec<f64>,
    pub predictions: Vec<SamplePrediction>,
    pub outliers: Vec<OutlierRecord>,
    /// The preprocessed spectra the model was fitted on.
    pub processed_spectra: SpectralMatrix,
}

/// One point of the component-count optimization sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub components: usize,
    pub sec: f64,
    pub secv: f64,
}

/// One sample's coordinates in the leading principal-component plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcaScorePoint {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub color: String,
}

/// Train and validate a calibration model over the active samples.
///
/// The requested component count is clamped to the feasible range
/// `1..=n_active - 1`; the value actually used is surfaced in
/// [`ModelResults::n_components`]. Fewer than [`MIN_SAMPLES`] active
/// samples is an error.
pub fn run_analysis(
    samples: &[Sample],
    steps: &[PreprocessingStep],
    n_components: usize,
) -> Result<ModelResults, AnalysisError> {
    let active: Vec<&Sample> = samples.iter().filter(|s| s.active).collect();
    let n = active.len();
    if n < MIN_SAMPLES {
        return Err(AnalysisError::InsufficientSamples { found: n });
    }

    let processed: Vec<Vec<f64>> = slice_maybe_parallel!(active)
        .map(|s| apply_steps(&s.spectrum, steps))
        .collect();
    let x = SpectralMatrix::from_rows(&processed).ok_or(AnalysisError::InconsistentSpectra)?;
    let y: Vec<f64> = active.iter().map(|s| s.reference_value).collect();

    let safe_components = n_components.clamp(1, n - 1);
    if safe_components != n_components {
        log::debug!(
            "requested {} latent components, using {} for {} active samples",
            n_components,
            safe_components,
            n
        );
    }

    let model = train_pls(&x, &y, safe_components).ok_or(AnalysisError::TrainingFailed)?;

    let cal_predictions: Vec<f64> = (0..n).map(|i| predict(&model, &x.row(i))).collect();
    let stats_cal = calibration_stats(&y, &cal_predictions);

    let cv_predictions = cross_validate_loo(&x, &y, safe_components, &cal_predictions);
    let stats_cv = calibration_stats(&y, &cv_predictions);
    let q2 = predictive_power(&y, &cv_predictions);

    let residuals: Vec<f64> = y
        .iter()
        .zip(cal_predictions.iter())
        .map(|(&actual, &pred)| actual - pred)
        .collect();
    let scores = score_residuals(&residuals, stats_cal.rmse, DEFAULT_OUTLIER_THRESHOLD);

    let predictions: Vec<SamplePrediction> = active
        .iter()
        .enumerate()
        .map(|(i, s)| SamplePrediction {
            id: s.id.clone(),
            actual: y[i],
            predicted: cal_predictions[i],
            predicted_cv: cv_predictions[i],
            residual: residuals[i],
        })
        .collect();
    let outliers: Vec<OutlierRecord> = active
        .iter()
        .zip(scores.iter())
        .map(|(s, score)| OutlierRecord {
            id: s.id.clone(),
            distance: score.distance,
            is_outlier: score.is_outlier,
        })
        .collect();

    log::info!(
        "calibrated {} samples with {} latent components: sec {:.4}, secv {:.4}",
        n,
        safe_components,
        stats_cal.rmse,
        stats_cv.rmse
    );

    Ok(ModelResults {
        n_components: safe_components,
        metrics: CalibrationMetrics {
            r: stats_cal.r,
            r2: stats_cal.r2,
            q2,
            sec: stats_cal.rmse,
            secv: stats_cv.rmse,
            slope: stats_cal.slope,
            offset: stats_cal.offset,
        },
        intercept: model.intercept,
        coefficients: model.coefficients,
        predictions,
        outliers,
        processed_spectra: x,
    })
}

/// Sweep the component count and collect calibration/validation error pairs.
///
/// Runs the full pipeline for `k = 1..=min(max_components, n_active - 2)`;
/// the upper cap keeps every swept model cross-validatable. Stops early on
/// the first k that cannot be trained and returns the successfully computed
/// prefix (possibly empty) instead of failing the whole call.
pub fn run_optimization_sweep(
    samples: &[Sample],
    steps: &[PreprocessingStep],
    max_components: usize,
) -> Vec<SweepPoint> {
    let n_active = samples.iter().filter(|s| s.active).count();
    let limit = max_components.min(n_active.saturating_sub(2));

    let mut points = Vec::with_capacity(limit);
    for k in 1..=limit {
        match run_analysis(samples, steps, k) {
            Ok(results) => points.push(SweepPoint {
                components: k,
                sec: results.metrics.sec,
                secv: results.metrics.secv,
            }),
            Err(err) => {
                log::warn!("optimization sweep stopped at {} components: {}", k, err);
                break;
            }
        }
    }
    points
}

/// Project the active samples onto their two leading principal components.
///
/// Exploratory view of sample similarity after preprocessing; colors pass
/// through for the calling layer's scatter plot.
pub fn run_pca_scores(
    samples: &[Sample],
    steps: &[PreprocessingStep],
) -> Result<Vec<PcaScorePoint>, AnalysisError> {
    let active: Vec<&Sample> = samples.iter().filter(|s| s.active).collect();
    let n = active.len();
    if n < MIN_SAMPLES {
        return Err(AnalysisError::InsufficientSamples { found: n });
    }

    let processed: Vec<Vec<f64>> = slice_maybe_parallel!(active)
        .map(|s| apply_steps(&s.spectrum, steps))
        .collect();
    let x = SpectralMatrix::from_rows(&processed).ok_or(AnalysisError::InconsistentSpectra)?;

    let pca = principal_component_scores(&x, 2).ok_or(AnalysisError::TrainingFailed)?;
    let n_scores = pca.scores.ncols();

    Ok(active
        .iter()
        .enumerate()
        .map(|(i, s)| PcaScorePoint {
            id: s.id.clone(),
            x: pca.scores[(i, 0)],
            y: if n_scores > 1 { pca.scores[(i, 1)] } else { 0.0 },
            color: s.color.clone(),
        })
        .collect())
}
