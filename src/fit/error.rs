use thiserror::Error;

/// Reasons a logistic regression fit cannot produce usable estimates.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("invalid design: {0}")]
    Shape(String),

    #[error("invalid solver settings: {0}")]
    Settings(String),

    #[error("confidence level must lie in (0, 1), got {0}")]
    InvalidConfidence(f64),

    #[error("design column `{column}` is collinear with the columns before it")]
    Collinear { column: String },

    #[error("information matrix is singular at iteration {iteration}")]
    Singular { iteration: usize },

    #[error("perfect separation detected at iteration {iteration}; coefficients are not identified")]
    PerfectSeparation { iteration: usize },

    #[error("non-finite {what} after {iteration} iterations")]
    NonFinite { what: &'static str, iteration: usize },
}

pub type FitResult<T> = Result<T, FitError>;
