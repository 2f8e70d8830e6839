//! Persisted model snapshots.
//!
//! A snapshot is everything a prediction-only consumer needs: the analytical
//! property name, the preprocessing pipeline used at training time, and the
//! fitted intercept and coefficient vector. Prediction from a reloaded
//! snapshot reproduces the in-memory calibration predictions exactly, and
//! the JSON encoding round-trips without loss.

use crate::analysis::{CalibrationMetrics, ModelResults};
use crate::helpers::dot;
use crate::preprocess::{apply_steps, PreprocessingStep};
use serde::{Deserialize, Serialize};

/// Exportable record of one trained calibration model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    /// Name of the predicted analytical property.
    pub analytical_property: String,
    /// Latent components used at training time.
    pub n_components: usize,
    /// Preprocessing pipeline applied to raw spectra before prediction.
    pub preprocessing: Vec<PreprocessingStep>,
    /// Regression intercept (B0).
    pub intercept: f64,
    /// Coefficient vector aligned with the spectral axis.
    pub coefficients: Vec<f64>,
    /// Figures of merit from the training run, for display on reload.
    pub metrics: CalibrationMetrics,
}

impl ModelSnapshot {
    /// Capture a snapshot of a completed calibration run.
    pub fn from_results(
        analytical_property: impl Into<String>,
        steps: &[PreprocessingStep],
        results: &ModelResults,
    ) -> Self {
        Self {
            analytical_property: analytical_property.into(),
            n_components: results.n_components,
            preprocessing: steps.to_vec(),
            intercept: results.intercept,
            coefficients: results.coefficients.clone(),
            metrics: results.metrics,
        }
    }

    /// Predict the analytical property for one raw spectrum.
    ///
    /// Applies the stored preprocessing pipeline, then the linear model.
    /// Non-finite results collapse to 0.0, matching the live predictor.
    pub fn predict(&self, raw_spectrum: &[f64]) -> f64 {
        let processed = apply_steps(raw_spectrum, &self.preprocessing);
        let prediction = self.intercept + dot(&processed, &self.coefficients);
        if prediction.is_finite() {
            prediction
        } else {
            0.0
        }
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON produced by [`ModelSnapshot::to_json`].
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
