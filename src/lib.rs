//! # chemcal-core
//!
//! Core chemometric calibration algorithms in Rust.
//!
//! This crate builds linear calibration models that predict a reference
//! laboratory value from a measured spectrum:
//! - Spectral preprocessing (Savitzky-Golay smoothing/derivatives, standard
//!   normal variate, linear detrend)
//! - SIMPLS-style partial-least-squares regression
//! - Leave-one-out cross-validation
//! - Calibration statistics (r, r², Q², SEC, SECV, bias line)
//! - Deterministic residual-based outlier screening
//! - Component-count optimization sweeps
//! - Exportable model snapshots for prediction-only consumers
//!
//! ## Data Layout
//!
//! Spectra are rows of a column-major [`matrix::SpectralMatrix`]: a dataset
//! of n samples with m-point spectra is an n x m matrix, so all samples at
//! one spectral point form a contiguous column.
//!
//! ## Concurrency
//!
//! Every operation is a pure, synchronous function of its inputs; no state
//! survives between calls. The optional `parallel` feature routes the
//! per-sample outer loops through rayon.

#![allow(clippy::needless_range_loop)]

pub mod parallel;

pub mod analysis;
pub mod helpers;
pub mod matrix;
pub mod outliers;
pub mod preprocess;
pub mod regression;
pub mod snapshot;
pub mod statistics;
pub mod validation;

// Re-export commonly used items
pub use helpers::NUMERICAL_EPS;

pub use matrix::SpectralMatrix;

pub use preprocess::{apply_step, apply_steps, apply_steps_traced, PreprocessingStep, StepOutcome};

pub use regression::{predict, principal_component_scores, train_pls, PcaScores, TrainedModel};

pub use statistics::{calibration_stats, predictive_power, RegressionStats};

pub use outliers::{score_residuals, OutlierScore, DEFAULT_OUTLIER_THRESHOLD};

pub use validation::cross_validate_loo;

pub use analysis::{
    run_analysis, run_optimization_sweep, run_pca_scores, AnalysisError, CalibrationMetrics,
    ModelResults, OutlierRecord, PcaScorePoint, Sample, SamplePrediction, SweepPoint, MIN_SAMPLES,
};

pub use snapshot::ModelSnapshot;
