//! Scalar helper functions shared across the calibration pipeline.

/// Small epsilon for numerical comparisons (e.g., avoiding division by zero).
pub const NUMERICAL_EPS: f64 = 1e-10;

/// Arithmetic mean of a slice.
///
/// Returns 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Bessel-corrected sample standard deviation (divisor N - 1).
///
/// Returns 0.0 for slices with fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|&v| (v - m) * (v - m)).sum();
    (ss / (n - 1) as f64).sqrt()
}

/// Dot product of two equal-length slices.
///
/// Extra elements of the longer slice are ignored.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(&x, &y)| x * y).sum()
}

/// Euclidean norm of a vector.
pub fn norm(v: &[f64]) -> f64 {
    v.iter().map(|&x| x * x).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_basic() {
        assert!((mean(&[1.0, 2.0, 3.0]) - 2.0).abs() < NUMERICAL_EPS);
    }

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_sample_std_known_value() {
        // Variance of [2, 4, 4, 4, 5, 5, 7, 9] with N-1 divisor is 32/7
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let expected = (32.0f64 / 7.0).sqrt();
        assert!((sample_std(&values) - expected).abs() < NUMERICAL_EPS);
    }

    #[test]
    fn test_sample_std_constant_is_zero() {
        assert_eq!(sample_std(&[3.0, 3.0, 3.0, 3.0]), 0.0);
    }

    #[test]
    fn test_sample_std_short_input() {
        assert_eq!(sample_std(&[]), 0.0);
        assert_eq!(sample_std(&[1.0]), 0.0);
    }

    #[test]
    fn test_dot_orthogonal() {
        assert_eq!(dot(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_dot_basic() {
        assert!((dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]) - 32.0).abs() < NUMERICAL_EPS);
    }

    #[test]
    fn test_norm_unit() {
        let inv_sqrt2 = 1.0 / 2.0f64.sqrt();
        assert!((norm(&[inv_sqrt2, inv_sqrt2]) - 1.0).abs() < NUMERICAL_EPS);
    }

    #[test]
    fn test_norm_zero() {
        assert_eq!(norm(&[0.0, 0.0, 0.0]), 0.0);
    }
}
