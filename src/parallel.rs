//! Parallel iteration abstraction for the outer per-sample loops.
//!
//! This module provides conditional parallel/sequential iteration based on
//! the `parallel` feature flag. With the feature enabled, the per-sample
//! loops (preprocessing a whole dataset, leave-one-out folds) run on rayon;
//! without it every operation runs sequentially on the caller's thread.
//!
//! A single training run is always sequential; only the embarrassingly
//! parallel outer loops go through these macros.
//!
//! # Usage
//!
//! ```ignore
//! use crate::iter_maybe_parallel;
//!
//! let predictions: Vec<f64> = iter_maybe_parallel!(0..n)
//!     .map(|i| predict_fold(i))
//!     .collect();
//! ```

/// Macro for conditionally parallel iteration over ranges or owned collections.
///
/// When the `parallel` feature is enabled, uses `into_par_iter()`.
/// Otherwise, uses `into_iter()` for sequential execution.
#[macro_export]
macro_rules! iter_maybe_parallel {
    ($expr:expr) => {{
        #[cfg(feature = "parallel")]
        {
            use rayon::iter::IntoParallelIterator;

            IntoParallelIterator::into_par_iter($expr)
        }
        #[cfg(not(feature = "parallel"))]
        {
            IntoIterator::into_iter($expr)
        }
    }};
}

/// Macro for conditionally parallel reference iteration over slices.
///
/// When the `parallel` feature is enabled, uses `par_iter()`.
/// Otherwise, uses `iter()` for sequential execution.
#[macro_export]
macro_rules! slice_maybe_parallel {
    ($expr:expr) => {{
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            $expr.par_iter()
        }
        #[cfg(not(feature = "parallel"))]
        {
            $expr.iter()
        }
    }};
}

// Re-export macros at module level
pub use iter_maybe_parallel;
pub use slice_maybe_parallel;
