//! Partial-least-squares regression on spectral data.
//!
//! This module provides the SIMPLS-style trainer, the linear predictor, and
//! a principal-component score projection for exploratory plots.
//!
//! The trainer extracts latent components by deflating the covariance vector
//! `X'y` against an orthonormalized loading basis, then solves a small
//! ridge-stabilized system to map latent scores back to a full-length
//! coefficient vector. The returned [`TrainedModel`] is immutable and
//! self-contained: intercept, coefficients, and the centering means used
//! during fitting.

use crate::helpers::{dot, mean, norm};
use crate::matrix::{self, SpectralMatrix};
use nalgebra::SVD;

/// Norm floor guarding score/basis normalization against blow-up.
const NORM_FLOOR: f64 = 1e-12;

/// Ridge term added to the latent normal equations. Purely a numerical
/// stabilizer against rank deficiency, not a tunable hyperparameter.
const RIDGE: f64 = 1e-8;

/// A fitted calibration model.
///
/// Immutable once produced; one instance per training invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    /// Regression intercept (B0).
    pub intercept: f64,
    /// Coefficient vector, aligned index-for-index with the spectral axis.
    pub coefficients: Vec<f64>,
    /// Column means of the training spectra.
    pub x_mean: Vec<f64>,
    /// Mean of the training reference values.
    pub y_mean: f64,
}

/// Fit a PLS model with up to `components` latent components.
///
/// The component count is clamped to `min(n - 1, m)`. Returns `None` when
/// the input cannot support a fit at all: fewer than two samples, an empty
/// spectral axis, a response length mismatch, zero requested components, or
/// a latent system the ridge-stabilized solve still cannot invert.
pub fn train_pls(x: &SpectralMatrix, y: &[f64], components: usize) -> Option<TrainedModel> {
    let (n, m) = x.shape();
    if n < 2 || m == 0 || y.len() != n || components < 1 {
        return None;
    }
    let n_comp = components.min(n - 1).min(m);

    // Center X and y, retaining the means for prediction.
    let x_means = x.column_means();
    let y_mean = mean(y);
    let mut x0 = SpectralMatrix::zeros(n, m);
    for j in 0..m {
        for i in 0..n {
            x0[(i, j)] = x[(i, j)] - x_means[j];
        }
    }
    let y0: Vec<f64> = y.iter().map(|&yi| yi - y_mean).collect();

    // Covariance vector S = X'y, deflated once per extracted component.
    let mut s = matrix::tr_matvec(&x0, &y0);

    let mut weights = SpectralMatrix::zeros(m, n_comp);
    let mut basis = SpectralMatrix::zeros(m, n_comp);

    for a in 0..n_comp {
        let mut r = s.clone();
        let mut t = matrix::matvec(&x0, &r);

        let mut t_norm = norm(&t);
        if t_norm < NORM_FLOOR {
            t_norm = 1.0;
        }
        for ti in &mut t {
            *ti /= t_norm;
        }
        for ri in &mut r {
            *ri /= t_norm;
        }

        let p = matrix::tr_matvec(&x0, &t);

        // Classical Gram-Schmidt of the loading against the retained basis.
        let mut v = p.clone();
        for prev in 0..a {
            let basis_col = basis.column(prev);
            let projection = dot(basis_col, &p);
            for (vi, &bi) in v.iter_mut().zip(basis_col.iter()) {
                *vi -= projection * bi;
            }
        }
        let mut v_norm = norm(&v);
        if v_norm < NORM_FLOOR {
            v_norm = 1.0;
        }
        for vi in &mut v {
            *vi /= v_norm;
        }

        for j in 0..m {
            weights[(j, a)] = r[j];
            basis[(j, a)] = v[j];
        }

        // Deflate S by its projection onto the new basis direction.
        let v_dot_s = dot(&v, &s);
        for (si, &vi) in s.iter_mut().zip(v.iter()) {
            *si -= vi * v_dot_s;
        }
    }

    // Regress y on the latent scores T = X0 * W through a small ridge-
    // stabilized system, then map back to the spectral axis: B = W * C.
    let t_mat = matrix::matmul(&x0, &weights)?;
    let mut normal = matrix::matmul(&matrix::transpose(&t_mat), &t_mat)?;
    for a in 0..n_comp {
        normal[(a, a)] += RIDGE;
    }
    let t_y = matrix::tr_matvec(&t_mat, &y0);
    let rhs = SpectralMatrix::from_column_major(t_y, n_comp, 1)?;
    let c = matrix::solve(&normal, &rhs)?;
    let coefficients = matrix::matvec(&weights, c.column(0));

    let intercept = y_mean - dot(&x_means, &coefficients);

    Some(TrainedModel {
        intercept,
        coefficients,
        x_mean: x_means,
        y_mean,
    })
}

/// Predict the reference property for one (already preprocessed) spectrum.
///
/// Non-finite results collapse to 0.0 rather than propagating NaN; the
/// caller-facing statistics expect finite values everywhere.
pub fn predict(model: &TrainedModel, spectrum: &[f64]) -> f64 {
    let prediction = model.intercept + dot(spectrum, &model.coefficients);
    if prediction.is_finite() {
        prediction
    } else {
        0.0
    }
}

/// Result of a principal-component score projection.
pub struct PcaScores {
    /// Singular values, one per extracted component, decreasing.
    pub singular_values: Vec<f64>,
    /// Score matrix (n x ncomp): per-sample coordinates in component space.
    pub scores: SpectralMatrix,
    /// Column means subtracted before the decomposition.
    pub mean: Vec<f64>,
}

/// Project spectra onto their leading principal components via SVD.
///
/// Scores are `U * S` of the column-centered data. Returns `None` for empty
/// input, zero components, or an SVD that fails to produce factors.
pub fn principal_component_scores(x: &SpectralMatrix, ncomp: usize) -> Option<PcaScores> {
    let (n, m) = x.shape();
    if n == 0 || m == 0 || ncomp < 1 {
        return None;
    }
    let ncomp = ncomp.min(n).min(m);

    let means = x.column_means();
    let mut centered = SpectralMatrix::zeros(n, m);
    for j in 0..m {
        for i in 0..n {
            centered[(i, j)] = x[(i, j)] - means[j];
        }
    }

    let svd = SVD::new(centered.to_dmatrix(), true, false);
    let u = svd.u.as_ref()?;
    let singular_values: Vec<f64> = svd.singular_values.iter().take(ncomp).cloned().collect();

    let mut scores = SpectralMatrix::zeros(n, ncomp);
    for (k, &sv) in singular_values.iter().enumerate() {
        for i in 0..n {
            scores[(i, k)] = u[(i, k)] * sv;
        }
    }

    Some(PcaScores {
        singular_values,
        scores,
        mean: means,
    })
}
