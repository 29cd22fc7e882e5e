//! Binary logistic regression by Newton–Raphson (IRLS).
//!
//! Given:
//! - a design matrix `X` (`n × k`, first column constant)
//! - labels `y ∈ {0, 1}`
//!
//! we maximize the Bernoulli log-likelihood
//!
//! ```text
//! ℓ(β) = Σ y_i η_i − ln(1 + e^{η_i}),   η = Xβ
//! ```
//!
//! Each iteration solves `(XᵀWX) δ = Xᵀ(y − μ)` with `W = diag(μ(1 − μ))`,
//! halving the step while the likelihood decreases. Iteration stops when
//! `max|δ| < tol` or after `max_iter` steps; hitting the cap is not an error but
//! leaves `converged = false` on the result.
//!
//! Degenerate inputs:
//! - collinear columns of `X` are rejected before iterating (`FitError::Collinear`)
//! - labels reproduced exactly by the fit are `FitError::PerfectSeparation`
//! - a 0/1 column whose `1` rows share one outcome (quasi-separation) has no
//!   finite estimate; the fit is returned with `converged = false` and the
//!   column listed in `separated_columns`. If the weights of such rows vanish
//!   far enough to make `XᵀWX` singular, iteration stops at the last
//!   well-conditioned iterate.
//!
//! Inference uses the inverse information matrix at the solution: Wald z
//! statistics, two-sided normal p-values and `β ± z_{1−α/2}·se` intervals.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::data::sigmoid;
use crate::domain::FitConfig;
use crate::features::EncodedDesign;
use crate::fit::error::{FitError, FitResult};
use crate::math::{
    bernoulli_log_likelihood_at, chi2_sf, first_dependent_column, invert_spd, is_rank_deficient,
    normal_ppf, normal_two_sided_p, softplus, solve_spd,
};

/// Maximum number of step halvings per Newton iteration.
const MAX_STEP_HALVINGS: usize = 20;

/// Fitted probabilities closer than this to every label mean the classes are separated.
const SEPARATION_TOL: f64 = 1e-10;

/// One estimated coefficient with its Wald statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    pub name: String,
    pub estimate: f64,
    /// `NaN` when the covariance entry is not usable.
    pub std_error: f64,
    pub z: f64,
    pub p_value: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

impl Coefficient {
    pub fn odds_ratio(&self) -> OddsRatio {
        OddsRatio {
            name: self.name.clone(),
            odds_ratio: self.estimate.exp(),
            lower: self.ci_lower.exp(),
            upper: self.ci_upper.exp(),
        }
    }
}

/// Exponentiated coefficient and interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsRatio {
    pub name: String,
    pub odds_ratio: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Fitted logistic regression and its diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogitFit {
    pub coefficients: Vec<Coefficient>,
    pub n_obs: usize,
    pub df_model: usize,
    pub df_resid: usize,
    pub log_likelihood: f64,
    pub null_log_likelihood: f64,
    /// McFadden's pseudo R².
    pub pseudo_r2: f64,
    /// Likelihood-ratio statistic against the intercept-only model.
    pub llr: f64,
    pub llr_p_value: f64,
    pub aic: f64,
    pub bic: f64,
    pub iterations: usize,
    pub converged: bool,
    pub confidence: f64,
    /// Indicator columns whose `1` rows all share one outcome.
    #[serde(default)]
    pub separated_columns: Vec<String>,
}

impl LogitFit {
    pub fn coefficient(&self, name: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.name == name)
    }

    pub fn odds_ratios(&self) -> Vec<OddsRatio> {
        self.coefficients.iter().map(Coefficient::odds_ratio).collect()
    }

    pub fn betas(&self) -> DVector<f64> {
        DVector::from_iterator(self.coefficients.len(), self.coefficients.iter().map(|c| c.estimate))
    }

    /// Predicted churn probabilities for the rows of `x`.
    pub fn predict_proba(&self, x: &DMatrix<f64>) -> DVector<f64> {
        probabilities(x, &self.betas())
    }
}

/// Fit `P(churn = 1) = sigmoid(Xβ)` on an encoded design.
pub fn fit_logit(design: &EncodedDesign, config: &FitConfig) -> FitResult<LogitFit> {
    fit_logit_matrix(&design.x, &design.y, &design.columns, config)
}

/// Fit on a raw matrix; `names` labels the columns of `x`.
pub fn fit_logit_matrix(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    names: &[String],
    config: &FitConfig,
) -> FitResult<LogitFit> {
    validate(x, y, names, config)?;
    if let Some(j) = first_dependent_column(x) {
        return Err(FitError::Collinear {
            column: names[j].clone(),
        });
    }
    let n = x.nrows();
    let k = x.ncols();

    let separated_columns: Vec<String> = separated_indicators(x, y)
        .into_iter()
        .map(|j| names[j].clone())
        .collect();
    if !separated_columns.is_empty() {
        log::warn!(
            "quasi-separation: {} have a single outcome; their estimates are not identified",
            separated_columns.join(", ")
        );
    }

    let mut beta = DVector::<f64>::zeros(k);
    let mut ll = log_likelihood(x, y, &beta);
    let mut converged = false;
    let mut iterations = 0;
    // Last iterate whose information matrix was well conditioned.
    let mut stable = (beta.clone(), ll, iterations);

    for iter in 1..=config.max_iter {
        let mu = probabilities(x, &beta);
        if iter > 1 && is_separated(&mu, y) {
            return Err(FitError::PerfectSeparation { iteration: iter - 1 });
        }

        let info = information_matrix(x, &mu);
        if is_rank_deficient(&info) {
            if iter > 1 && classifies_perfectly(&mu, y) {
                return Err(FitError::PerfectSeparation { iteration: iter - 1 });
            }
            if iter == 1 {
                return Err(FitError::Singular { iteration: iter });
            }
            log::warn!(
                "information matrix degenerated at iteration {iter}; stopping at iteration {}",
                stable.2
            );
            break;
        }
        stable = (beta.clone(), ll, iterations);

        let grad = x.transpose() * (y - &mu);
        let delta = solve_spd(&info, &grad).ok_or(FitError::Singular { iteration: iter })?;

        let mut step = 1.0;
        let mut candidate = &beta + &delta;
        let mut ll_new = log_likelihood(x, y, &candidate);
        for _ in 0..MAX_STEP_HALVINGS {
            if ll_new.is_finite() && ll_new >= ll - 1e-12 * ll.abs().max(1.0) {
                break;
            }
            step *= 0.5;
            candidate = &beta + &delta * step;
            ll_new = log_likelihood(x, y, &candidate);
        }
        if !ll_new.is_finite() || candidate.iter().any(|v| !v.is_finite()) {
            return Err(FitError::NonFinite { what: "coefficients", iteration: iter });
        }

        let max_change = (&delta * step).amax();
        beta = candidate;
        ll = ll_new;
        iterations = iter;
        log::debug!("logit iter={iter} ll={ll:.6} max_step={max_change:.3e} halving={step}");

        if max_change < config.tol {
            converged = true;
            break;
        }
    }

    let mut mu = probabilities(x, &beta);
    if is_separated(&mu, y) {
        return Err(FitError::PerfectSeparation { iteration: iterations });
    }
    let mut info = information_matrix(x, &mu);
    if is_rank_deficient(&info) {
        (beta, ll, iterations) = stable;
        converged = false;
        mu = probabilities(x, &beta);
        info = information_matrix(x, &mu);
    }
    if !separated_columns.is_empty() {
        converged = false;
    }
    if !converged {
        log::warn!(
            "logistic regression did not converge after {iterations} iterations (tol={:e})",
            config.tol
        );
    }

    let cov = invert_spd(&info);
    if cov.is_none() {
        log::warn!("information matrix could not be inverted; standard errors are unavailable");
    }

    let z_crit = normal_ppf(1.0 - (1.0 - config.confidence) / 2.0);
    let coefficients = names
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let std_error = cov
                .as_ref()
                .map(|c| c[(j, j)])
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map_or(f64::NAN, f64::sqrt);
            let estimate = beta[j];
            let z = estimate / std_error;
            Coefficient {
                name: name.clone(),
                estimate,
                std_error,
                z,
                p_value: normal_two_sided_p(z),
                ci_lower: estimate - z_crit * std_error,
                ci_upper: estimate + z_crit * std_error,
            }
        })
        .collect();

    let n_f = n as f64;
    let k_f = k as f64;
    let null_log_likelihood = bernoulli_log_likelihood_at(y.mean(), n_f);
    let pseudo_r2 = if null_log_likelihood != 0.0 {
        1.0 - ll / null_log_likelihood
    } else {
        f64::NAN
    };
    let df_model = k.saturating_sub(1);
    let llr = 2.0 * (ll - null_log_likelihood);
    let llr_p_value = if df_model > 0 {
        chi2_sf(llr, df_model as f64)
    } else {
        f64::NAN
    };

    Ok(LogitFit {
        coefficients,
        n_obs: n,
        df_model,
        df_resid: n - k,
        log_likelihood: ll,
        null_log_likelihood,
        pseudo_r2,
        llr,
        llr_p_value,
        aic: -2.0 * ll + 2.0 * k_f,
        bic: -2.0 * ll + k_f * n_f.ln(),
        iterations,
        converged,
        confidence: config.confidence,
        separated_columns,
    })
}

fn validate(x: &DMatrix<f64>, y: &DVector<f64>, names: &[String], config: &FitConfig) -> FitResult<()> {
    let (n, k) = x.shape();
    if n == 0 || k == 0 {
        return Err(FitError::Shape("design matrix is empty".to_string()));
    }
    if y.len() != n {
        return Err(FitError::Shape(format!("{} labels for {n} rows", y.len())));
    }
    if names.len() != k {
        return Err(FitError::Shape(format!("{} names for {k} columns", names.len())));
    }
    if n <= k {
        return Err(FitError::Shape(format!("need more rows than columns (n={n}, k={k})")));
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(FitError::Shape("design matrix contains non-finite values".to_string()));
    }
    if y.iter().any(|&v| v != 0.0 && v != 1.0) {
        return Err(FitError::Shape("labels must be 0 or 1".to_string()));
    }
    if config.max_iter == 0 {
        return Err(FitError::Settings("max_iter must be > 0".to_string()));
    }
    if !(config.tol.is_finite() && config.tol > 0.0) {
        return Err(FitError::Settings("tol must be a positive number".to_string()));
    }
    if !(config.confidence > 0.0 && config.confidence < 1.0) {
        return Err(FitError::InvalidConfidence(config.confidence));
    }
    Ok(())
}

fn probabilities(x: &DMatrix<f64>, beta: &DVector<f64>) -> DVector<f64> {
    (x * beta).map(sigmoid)
}

fn log_likelihood(x: &DMatrix<f64>, y: &DVector<f64>, beta: &DVector<f64>) -> f64 {
    let eta = x * beta;
    eta.iter()
        .zip(y.iter())
        .map(|(&e, &yi)| yi * e - softplus(e))
        .sum()
}

/// `Xᵀ diag(μ(1 − μ)) X`.
fn information_matrix(x: &DMatrix<f64>, mu: &DVector<f64>) -> DMatrix<f64> {
    let mut xw = x.clone();
    for (i, mut row) in xw.row_iter_mut().enumerate() {
        row *= mu[i] * (1.0 - mu[i]);
    }
    x.transpose() * xw
}

fn is_separated(mu: &DVector<f64>, y: &DVector<f64>) -> bool {
    mu.iter().zip(y.iter()).all(|(&m, &yi)| (m - yi).abs() < SEPARATION_TOL)
}

/// Non-constant 0/1 columns whose `1` rows all carry the same label.
fn separated_indicators(x: &DMatrix<f64>, y: &DVector<f64>) -> Vec<usize> {
    (0..x.ncols())
        .filter(|&j| {
            let col = x.column(j);
            if !col.iter().all(|&v| v == 0.0 || v == 1.0) {
                return false;
            }
            let ones: Vec<f64> = col
                .iter()
                .zip(y.iter())
                .filter(|(v, _)| **v == 1.0)
                .map(|(_, &yi)| yi)
                .collect();
            if ones.is_empty() || ones.len() == col.len() {
                return false;
            }
            ones.iter().all(|&yi| yi == ones[0])
        })
        .collect()
}

fn classifies_perfectly(mu: &DVector<f64>, y: &DVector<f64>) -> bool {
    mu.iter().zip(y.iter()).all(|(&m, &yi)| (m > 0.5) == (yi == 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::generate_seeded;
    use crate::domain::{ContractType, CustomerTable, GeneratorConfig, InternetService};
    use crate::features::encode;
    use rand::prelude::*;
    use rand::rngs::StdRng;

    fn names(k: usize) -> Vec<String> {
        (0..k).map(|j| format!("x{j}")).collect()
    }

    fn default_fit() -> LogitFit {
        let table = generate_seeded(&GeneratorConfig::default()).unwrap();
        let design = encode(&table).unwrap();
        fit_logit(&design, &FitConfig::default()).unwrap()
    }

    #[test]
    fn recovers_known_coefficients() {
        let mut rng = StdRng::seed_from_u64(11);
        let true_beta = [-0.5, 1.2, -0.8];
        let n = 20_000;
        let mut data = Vec::with_capacity(n * 3);
        let mut labels = Vec::with_capacity(n);
        for _ in 0..n {
            let a: f64 = rng.gen_range(-2.0..2.0);
            let b: f64 = if rng.gen_bool(0.4) { 1.0 } else { 0.0 };
            let eta = true_beta[0] + true_beta[1] * a + true_beta[2] * b;
            labels.push(if rng.gen_bool(sigmoid(eta)) { 1.0 } else { 0.0 });
            data.extend_from_slice(&[1.0, a, b]);
        }
        let x = DMatrix::from_row_slice(n, 3, &data);
        let y = DVector::from_vec(labels);

        let fit = fit_logit_matrix(&x, &y, &names(3), &FitConfig::default()).unwrap();
        assert!(fit.converged);
        for (c, truth) in fit.coefficients.iter().zip(true_beta) {
            assert!((c.estimate - truth).abs() < 0.1, "{}: {} vs {truth}", c.name, c.estimate);
        }
    }

    #[test]
    fn churn_model_has_expected_signs() {
        let fit = default_fit();
        assert!(fit.converged);
        assert!(fit.iterations < FitConfig::default().max_iter);
        assert!(fit.coefficient("contract_type_Monthly").unwrap().estimate > 0.0);
        assert!(fit.coefficient("contract_type_TwoYear").unwrap().estimate < 0.0);
        assert!(fit.coefficient("tenure_months").unwrap().estimate < 0.0);
        assert!(fit.coefficient("internet_service_FiberOptic").unwrap().estimate > 0.0);
    }

    #[test]
    fn odds_ratio_interval_brackets_point_estimate() {
        let fit = default_fit();
        for or in fit.odds_ratios() {
            assert!(or.lower <= or.odds_ratio && or.odds_ratio <= or.upper, "{or:?}");
            assert!(or.lower > 0.0);
        }
    }

    #[test]
    fn diagnostics_are_consistent() {
        let fit = default_fit();
        assert_eq!(fit.n_obs, 2000);
        assert_eq!(fit.df_model, 6);
        assert_eq!(fit.df_resid, 2000 - 7);
        assert!(fit.log_likelihood > fit.null_log_likelihood);
        assert!(fit.pseudo_r2 > 0.0 && fit.pseudo_r2 < 1.0);
        assert!(fit.llr_p_value < 1e-6);
        assert!((fit.aic - (-2.0 * fit.log_likelihood + 14.0)).abs() < 1e-9);
        for c in &fit.coefficients {
            assert!((0.0..=1.0).contains(&c.p_value));
            assert!(c.std_error > 0.0);
        }
    }

    #[test]
    fn iteration_cap_is_reported_not_hidden() {
        let table = generate_seeded(&GeneratorConfig::default()).unwrap();
        let design = encode(&table).unwrap();
        let config = FitConfig {
            max_iter: 1,
            ..FitConfig::default()
        };
        let fit = fit_logit(&design, &config).unwrap();
        assert!(!fit.converged);
        assert_eq!(fit.iterations, 1);
    }

    #[test]
    fn collinear_columns_are_rejected_by_name() {
        let n = 40;
        let mut data = Vec::with_capacity(n * 3);
        let mut labels = Vec::with_capacity(n);
        for i in 0..n {
            let a = i as f64 / 10.0;
            data.extend_from_slice(&[1.0, a, 2.0 * a]);
            labels.push(if i % 3 == 0 { 1.0 } else { 0.0 });
        }
        let x = DMatrix::from_row_slice(n, 3, &data);
        let y = DVector::from_vec(labels);
        let err = fit_logit_matrix(&x, &y, &names(3), &FitConfig::default()).unwrap_err();
        assert_eq!(err, FitError::Collinear { column: "x2".to_string() });
    }

    /// Generated customers with every `TwoYear` churn label forced to 0 and the
    /// `None` internet level removed.
    fn quasi_separated_table() -> CustomerTable {
        let table = generate_seeded(&GeneratorConfig {
            num_customers: 600,
            ..GeneratorConfig::default()
        })
        .unwrap();
        let rows = table
            .rows()
            .iter()
            .filter(|r| r.internet_service != InternetService::NoService)
            .cloned()
            .map(|mut r| {
                if r.contract_type == ContractType::TwoYear {
                    r.churn = 0;
                }
                r
            })
            .collect();
        CustomerTable::new(rows)
    }

    #[test]
    fn single_outcome_level_is_flagged_not_fatal() {
        let table = quasi_separated_table();
        let design = encode(&table).unwrap();
        assert_eq!(design.column_index("internet_service_None"), None);
        assert_eq!(design.ncols(), 6);

        let fit = fit_logit(&design, &FitConfig::default()).unwrap();
        assert!(!fit.converged);
        assert_eq!(fit.separated_columns, vec!["contract_type_TwoYear".to_string()]);
        let two_year = fit.coefficient("contract_type_TwoYear").unwrap();
        assert!(two_year.estimate < -3.0, "{two_year:?}");
        assert!(fit.coefficient("contract_type_Monthly").unwrap().estimate > 0.0);
        assert!(fit.log_likelihood.is_finite());

        let text = crate::report::format_model_summary(&fit);
        assert!(text.contains("WARNING"));
        assert!(text.contains("contract_type_TwoYear"));
    }

    #[test]
    fn small_samples_yield_a_fit() {
        for seed in 0..20 {
            let config = GeneratorConfig {
                num_customers: 100,
                seed,
                ..GeneratorConfig::default()
            };
            let design = encode(&generate_seeded(&config).unwrap()).unwrap();
            let fit = fit_logit(&design, &FitConfig::default())
                .unwrap_or_else(|e| panic!("seed {seed}: {e}"));
            if !fit.separated_columns.is_empty() {
                assert!(!fit.converged, "seed {seed}");
            }
        }
    }

    #[test]
    fn fitted_probabilities_match_churn_rate() {
        // With an intercept the score equations force mean(μ) = mean(y).
        let table = generate_seeded(&GeneratorConfig::default()).unwrap();
        let design = encode(&table).unwrap();
        let fit = fit_logit(&design, &FitConfig::default()).unwrap();
        let p = fit.predict_proba(&design.x);
        assert_eq!(p.len(), design.nrows());
        assert!((p.mean() - design.y.mean()).abs() < 1e-6);
    }

    #[test]
    fn separable_labels_are_reported() {
        let t = [-2.0, -1.0, 1.0, 2.0];
        let mut data = Vec::new();
        for v in t {
            data.extend_from_slice(&[1.0, v]);
        }
        let x = DMatrix::from_row_slice(4, 2, &data);
        let y = DVector::from_row_slice(&[0.0, 0.0, 1.0, 1.0]);
        let config = FitConfig {
            max_iter: 100,
            ..FitConfig::default()
        };
        let err = fit_logit_matrix(&x, &y, &names(2), &config).unwrap_err();
        assert!(matches!(err, FitError::PerfectSeparation { .. }), "{err:?}");
    }

    #[test]
    fn rejects_bad_inputs() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[0.0, 1.0, 0.5]);
        let err = fit_logit_matrix(&x, &y, &names(2), &FitConfig::default()).unwrap_err();
        assert!(matches!(err, FitError::Shape(_)));

        let y = DVector::from_row_slice(&[0.0, 1.0, 0.0]);
        let config = FitConfig {
            confidence: 1.5,
            ..FitConfig::default()
        };
        let err = fit_logit_matrix(&x, &y, &names(2), &config).unwrap_err();
        assert_eq!(err, FitError::InvalidConfidence(1.5));
    }
}
