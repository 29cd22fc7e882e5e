//! Symmetric positive-definite solves for Newton steps.
//!
//! Each IRLS iteration solves a small `k × k` system of the form:
//!
//! ```text
//! (Xᵀ W X) δ = Xᵀ (y - μ)
//! ```
//!
//! Implementation choices:
//! - Cholesky first; the information matrix is SPD whenever X has full column rank.
//! - SVD fallback with progressively looser tolerances for borderline systems.
//! - Collinearity is checked once on the column-scaled design; a Newton system
//!   that degenerates later (vanishing weights) is a property of the iterate,
//!   not of the design.

use nalgebra::{DMatrix, DVector};

/// Smallest accepted ratio between the smallest and largest singular value.
pub const MIN_RECIPROCAL_CONDITION: f64 = 1e-12;

/// Returns true when `a` is numerically rank deficient.
pub fn is_rank_deficient(a: &DMatrix<f64>) -> bool {
    if a.nrows() == 0 || a.ncols() == 0 {
        return true;
    }
    let sv = a.clone().singular_values();
    let max = sv.max();
    let min = sv.min();
    if !(max.is_finite() && min.is_finite()) || max <= 0.0 {
        return true;
    }
    min / max < MIN_RECIPROCAL_CONDITION
}

/// Index of the first column of `x` that is (numerically) a linear combination
/// of the columns before it, or `None` when `x` has full column rank.
///
/// Columns are scaled to unit norm first so that the check depends on the
/// geometry of the design, not on the units of each column.
pub fn first_dependent_column(x: &DMatrix<f64>) -> Option<usize> {
    let mut scaled = x.clone();
    for (j, mut col) in scaled.column_iter_mut().enumerate() {
        let norm = col.norm();
        if !(norm.is_finite() && norm > 0.0) {
            return Some(j);
        }
        col /= norm;
    }
    (1..scaled.ncols()).find(|&j| {
        let lead = scaled.columns(0, j + 1);
        is_rank_deficient(&(lead.transpose() * lead))
    })
}

/// Solve `a x = b` for a symmetric positive-definite `a`.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_spd(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    if let Some(chol) = a.clone().cholesky() {
        let x = chol.solve(b);
        if x.iter().all(|v| v.is_finite()) {
            return Some(x);
        }
    }

    let svd = a.clone().svd(true, true);
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(x) = svd.solve(b, tol) {
            if x.iter().all(|v| v.is_finite()) {
                return Some(x);
            }
        }
    }

    None
}

/// Invert a symmetric positive-definite matrix (the covariance of the estimates).
pub fn invert_spd(a: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    let inv = match a.clone().cholesky() {
        Some(chol) => chol.inverse(),
        None => a.clone().try_inverse()?,
    };
    if inv.iter().all(|v| v.is_finite()) {
        Some(inv)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_small_spd_system() {
        // [[4,1],[1,3]] x = [1,2] -> x = [1/11, 7/11]
        let a = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 3.0]);
        let b = DVector::from_row_slice(&[1.0, 2.0]);
        let x = solve_spd(&a, &b).unwrap();
        assert!((x[0] - 1.0 / 11.0).abs() < 1e-12);
        assert!((x[1] - 7.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn inverse_round_trips_to_identity() {
        let a = DMatrix::from_row_slice(2, 2, &[2.0, 0.5, 0.5, 1.0]);
        let inv = invert_spd(&a).unwrap();
        let id = &a * &inv;
        assert!((id[(0, 0)] - 1.0).abs() < 1e-12);
        assert!(id[(0, 1)].abs() < 1e-12);
    }

    #[test]
    fn duplicated_column_is_rank_deficient() {
        // Gram matrix of two identical columns.
        let a = DMatrix::from_row_slice(2, 2, &[3.0, 3.0, 3.0, 3.0]);
        assert!(is_rank_deficient(&a));
        assert!(!is_rank_deficient(&DMatrix::<f64>::identity(3, 3)));
    }

    #[test]
    fn dependent_column_is_located() {
        // const, a, 2a + 1
        let x = DMatrix::from_row_slice(
            4,
            3,
            &[1.0, 0.0, 1.0, 1.0, 1.0, 3.0, 1.0, 2.0, 5.0, 1.0, 3.0, 7.0],
        );
        assert_eq!(first_dependent_column(&x), Some(2));

        let zero = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
        assert_eq!(first_dependent_column(&zero), Some(1));

        // Badly scaled but independent columns.
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 1e4, 1.0, 2e4, 1.0, 4e4]);
        assert_eq!(first_dependent_column(&x), None);
    }
}
