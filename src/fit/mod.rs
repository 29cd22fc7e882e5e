//! Churn model fitting.
//!
//! Responsibilities:
//!
//! - fit a binary logistic regression on the encoded design (Newton/IRLS)
//! - derive standard errors, Wald intervals, p-values and odds ratios
//! - surface non-convergence and degenerate designs as `FitError`

pub mod error;
pub mod fitter;

pub use error::*;
pub use fitter::*;
