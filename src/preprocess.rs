//! Spectral preprocessing pipeline.
//!
//! Transforms are applied in list order, each consuming the previous step's
//! output. A step with invalid or degenerate parameters never fails: it
//! passes the spectrum through unchanged and reports [`StepOutcome::Skipped`]
//! so callers can observe the degradation.
//!
//! Methods:
//! - Savitzky-Golay smoothing / differentiation (local least-squares
//!   polynomial, convolution coefficients from the normal equations)
//! - Standard normal variate (per-spectrum standardization)
//! - Linear detrend (subtract an OLS line of intensity vs. index)
//! - Multiplicative scatter correction (declared, currently pass-through)

use crate::helpers::{mean, sample_std};
use crate::matrix::{self, SpectralMatrix};
use serde::{Deserialize, Serialize};

/// A single preprocessing transform with its parameters.
///
/// Serializes with a `method` tag so stored pipelines (model snapshots)
/// remain readable: `{"method":"savgol","window_size":5,...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PreprocessingStep {
    /// Identity transform.
    None,
    /// Savitzky-Golay filter. `derivative` 0 smooths; higher orders
    /// differentiate.
    #[serde(rename = "savgol")]
    SavitzkyGolay {
        window_size: usize,
        polynomial_order: usize,
        derivative: usize,
    },
    /// Standard normal variate: per-spectrum centering and unit scaling.
    Snv,
    /// Multiplicative scatter correction. Declared for pipeline
    /// compatibility; currently passes through (see `DESIGN.md`).
    Msc,
    /// Subtract the least-squares line of intensity vs. index position.
    Detrend,
}

/// Whether a step transformed the spectrum or passed it through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The transform ran.
    Applied,
    /// Invalid or degenerate parameters; the spectrum passed through
    /// unchanged.
    Skipped,
}

/// Apply a full preprocessing pipeline to one spectrum.
///
/// Output length equals input length for every step. Steps that cannot run
/// degrade to identity; use [`apply_steps_traced`] to observe which did.
pub fn apply_steps(spectrum: &[f64], steps: &[PreprocessingStep]) -> Vec<f64> {
    apply_steps_traced(spectrum, steps).0
}

/// Apply a pipeline and report the per-step outcome alongside the result.
pub fn apply_steps_traced(
    spectrum: &[f64],
    steps: &[PreprocessingStep],
) -> (Vec<f64>, Vec<StepOutcome>) {
    let mut processed = spectrum.to_vec();
    let mut outcomes = Vec::with_capacity(steps.len());
    for step in steps {
        let (next, outcome) = apply_step(&processed, step);
        processed = next;
        outcomes.push(outcome);
    }
    (processed, outcomes)
}

/// Apply a single step, returning the transformed spectrum and its outcome.
pub fn apply_step(spectrum: &[f64], step: &PreprocessingStep) -> (Vec<f64>, StepOutcome) {
    match step {
        PreprocessingStep::None => (spectrum.to_vec(), StepOutcome::Applied),
        PreprocessingStep::Snv => snv(spectrum),
        PreprocessingStep::SavitzkyGolay {
            window_size,
            polynomial_order,
            derivative,
        } => savitzky_golay(spectrum, *window_size, *polynomial_order, *derivative),
        PreprocessingStep::Detrend => detrend(spectrum),
        PreprocessingStep::Msc => {
            log::debug!("msc step has no numerical definition yet; passing spectrum through");
            (spectrum.to_vec(), StepOutcome::Skipped)
        }
    }
}

/// Standard normal variate: subtract the spectrum's own mean and divide by
/// its own sample standard deviation (N - 1 divisor).
///
/// Zero-variance spectra pass through unchanged.
fn snv(spectrum: &[f64]) -> (Vec<f64>, StepOutcome) {
    if spectrum.is_empty() {
        return (Vec::new(), StepOutcome::Skipped);
    }
    let m = mean(spectrum);
    let sd = sample_std(spectrum);
    if sd <= 0.0 {
        log::debug!("snv skipped: spectrum has zero variance");
        return (spectrum.to_vec(), StepOutcome::Skipped);
    }
    let out = spectrum.iter().map(|&x| (x - m) / sd).collect();
    (out, StepOutcome::Applied)
}

/// Subtract the ordinary-least-squares line of intensity vs. index.
///
/// Spectra with fewer than two points pass through unchanged.
fn detrend(spectrum: &[f64]) -> (Vec<f64>, StepOutcome) {
    let n = spectrum.len();
    if n < 2 {
        return (spectrum.to_vec(), StepOutcome::Skipped);
    }
    let nf = n as f64;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_x2 = 0.0;
    for (i, &y) in spectrum.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
    }
    let denom = nf * sum_x2 - sum_x * sum_x;
    let slope = (nf * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / nf;
    if !slope.is_finite() || !intercept.is_finite() {
        return (spectrum.to_vec(), StepOutcome::Skipped);
    }
    let out = spectrum
        .iter()
        .enumerate()
        .map(|(i, &y)| y - (slope * i as f64 + intercept))
        .collect();
    (out, StepOutcome::Applied)
}

/// Savitzky-Golay filter / derivative.
///
/// Fits a local polynomial of `polynomial_order` over a sliding window of
/// odd width centered at each interior point, convolving the spectrum with
/// coefficients obtained from the least-squares normal equations. The first
/// and last `window_size / 2` points pass through unmodified.
///
/// Parameter invariants (violations degrade to identity): the window must be
/// odd, at least 3, and strictly wider than the polynomial order; the
/// derivative order must not exceed the polynomial order.
fn savitzky_golay(
    spectrum: &[f64],
    window_size: usize,
    polynomial_order: usize,
    derivative: usize,
) -> (Vec<f64>, StepOutcome) {
    let n = spectrum.len();
    if window_size % 2 == 0
        || window_size < 3
        || polynomial_order >= window_size
        || derivative > polynomial_order
    {
        log::debug!(
            "savitzky-golay skipped: invalid parameters (window {}, order {}, derivative {})",
            window_size,
            polynomial_order,
            derivative
        );
        return (spectrum.to_vec(), StepOutcome::Skipped);
    }
    if n < window_size {
        return (spectrum.to_vec(), StepOutcome::Skipped);
    }

    let coeffs = match savgol_coefficients(window_size, polynomial_order, derivative) {
        Some(c) => c,
        None => return (spectrum.to_vec(), StepOutcome::Skipped),
    };

    let half = window_size / 2;
    let mut out = spectrum.to_vec();
    for i in half..n - half {
        let mut conv = 0.0;
        for (j, &c) in coeffs.iter().enumerate() {
            conv += spectrum[i - half + j] * c;
        }
        out[i] = conv;
    }
    (out, StepOutcome::Applied)
}

/// Convolution coefficients for a Savitzky-Golay window.
///
/// Builds the polynomial design matrix over window offsets, solves the
/// normal-equation system `(A'A) C = A'`, scales the requested derivative
/// row by its factorial, and reverses it into convolution order.
fn savgol_coefficients(
    window_size: usize,
    polynomial_order: usize,
    derivative: usize,
) -> Option<Vec<f64>> {
    let half = window_size as isize / 2;
    let p = polynomial_order + 1;

    let mut design = SpectralMatrix::zeros(window_size, p);
    for i in 0..window_size {
        let offset = (i as isize - half) as f64;
        let mut power = 1.0;
        for j in 0..p {
            design[(i, j)] = power;
            power *= offset;
        }
    }

    let design_t = matrix::transpose(&design);
    let normal = matrix::matmul(&design_t, &design)?;
    let pseudo_inverse = matrix::solve(&normal, &design_t)?;

    let scale = factorial(derivative);
    let mut coeffs: Vec<f64> = (0..window_size)
        .map(|j| pseudo_inverse[(derivative, j)] * scale)
        .collect();
    coeffs.reverse();
    Some(coeffs)
}

fn factorial(n: usize) -> f64 {
    (2..=n).map(|k| k as f64).product()
}
