//! Formatted terminal output for every printed section.
//!
//! We keep formatting code in one place so:
//! - the generator, encoder and fitter stay free of presentation concerns
//! - output changes are localized
//!
//! Floating-point values are shown with four decimals.

use crate::domain::{Category, CustomerRecord};
use crate::features::EncodedDesign;
use crate::fit::LogitFit;
use crate::report::{CategoricalSummary, ColumnInfo, NumericColumn, ValueCount};

/// Four-decimal formatting; non-finite values print as `NaN` / `inf`.
pub fn fmt4(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else {
        format!("{v:.4}")
    }
}

/// Format the first rows of the generated table.
pub fn format_head(rows: &[CustomerRecord]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>11} {:>13} {:<13} {:<16} {:>12} {:>5}\n",
        "customer_id", "tenure_months", "contract_type", "internet_service", "monthly_bill", "churn"
    ));
    for r in rows {
        out.push_str(&format!(
            "{:>11} {:>13} {:<13} {:<16} {:>12} {:>5}\n",
            r.customer_id,
            r.tenure_months,
            r.contract_type.label(),
            r.internet_service.label(),
            fmt4(r.monthly_bill),
            r.churn
        ));
    }
    out
}

/// Format the column/dtype overview.
pub fn format_info(rows: usize, columns: &[ColumnInfo]) -> String {
    let mut out = String::new();
    out.push_str(&format!("CustomerTable: {rows} entries"));
    if rows > 0 {
        out.push_str(&format!(", 1 to {rows}"));
    }
    out.push('\n');
    out.push_str(&format!("Data columns (total {} columns):\n", columns.len()));
    out.push_str(&format!(" {:>2}  {:<18} {:>14}  {}\n", "#", "Column", "Non-Null Count", "Dtype"));
    out.push_str(&format!(" {:-<2}  {:-<18} {:-<14}  {:-<8}\n", "", "", "", ""));
    for (i, c) in columns.iter().enumerate() {
        out.push_str(&format!(
            " {:>2}  {:<18} {:>14}  {}\n",
            i,
            c.name,
            format!("{} non-null", c.non_null),
            c.dtype
        ));
    }
    out
}

/// Format numeric `describe()` output (one column per variable).
pub fn format_numeric_describe(columns: &[NumericColumn]) -> String {
    let width = columns.iter().map(|c| c.name.len()).max().unwrap_or(0).max(12);
    let mut out = String::new();

    out.push_str(&format!("{:<6}", ""));
    for c in columns {
        out.push_str(&format!(" {:>width$}", c.name));
    }
    out.push('\n');

    let rows: [(&str, fn(&NumericColumn) -> f64); 8] = [
        ("count", |c| c.summary.count as f64),
        ("mean", |c| c.summary.mean),
        ("std", |c| c.summary.std),
        ("min", |c| c.summary.min),
        ("25%", |c| c.summary.q25),
        ("50%", |c| c.summary.q50),
        ("75%", |c| c.summary.q75),
        ("max", |c| c.summary.max),
    ];
    for (label, get) in rows {
        out.push_str(&format!("{label:<6}"));
        for c in columns {
            out.push_str(&format!(" {:>width$}", fmt4(get(c))));
        }
        out.push('\n');
    }
    out
}

/// Format categorical `describe()` output.
pub fn format_categorical_describe(summaries: &[CategoricalSummary]) -> String {
    let width = summaries.iter().map(|s| s.name.len()).max().unwrap_or(0).max(12);
    let mut out = String::new();

    out.push_str(&format!("{:<6}", ""));
    for s in summaries {
        out.push_str(&format!(" {:>width$}", s.name));
    }
    out.push('\n');

    out.push_str(&format!("{:<6}", "count"));
    for s in summaries {
        out.push_str(&format!(" {:>width$}", s.count));
    }
    out.push('\n');
    out.push_str(&format!("{:<6}", "unique"));
    for s in summaries {
        out.push_str(&format!(" {:>width$}", s.unique));
    }
    out.push('\n');
    out.push_str(&format!("{:<6}", "top"));
    for s in summaries {
        out.push_str(&format!(" {:>width$}", s.top.as_deref().unwrap_or("-")));
    }
    out.push('\n');
    out.push_str(&format!("{:<6}", "freq"));
    for s in summaries {
        out.push_str(&format!(" {:>width$}", s.freq));
    }
    out.push('\n');
    out
}

/// Format a value-counts table for one column.
pub fn format_value_counts(column: &str, counts: &[ValueCount]) -> String {
    let width = counts.iter().map(|c| c.level.len()).max().unwrap_or(0).max(column.len());
    let mut out = String::new();
    out.push_str(&format!("{column:<width$} {:>6}\n", "count"));
    for c in counts {
        out.push_str(&format!("{:<width$} {:>6}\n", c.level, c.count));
    }
    out
}

pub fn format_churn_rate(rate_pct: f64) -> String {
    format!("Overall churn rate: {}%\n", fmt4(rate_pct))
}

/// Format the first rows of the encoded design (`X`) and labels (`y`).
pub fn format_design_head(design: &EncodedDesign, n: usize) -> String {
    let widths: Vec<usize> = design.columns.iter().map(|c| c.len().max(9)).collect();
    let mut out = String::new();

    out.push_str("X:\n");
    out.push_str(&format!("{:>5}", ""));
    for (c, w) in design.columns.iter().zip(&widths) {
        out.push_str(&format!(" {c:>w$}"));
    }
    out.push('\n');
    for i in 0..n.min(design.nrows()) {
        out.push_str(&format!("{i:>5}"));
        for (v, w) in design.row(i).iter().zip(&widths) {
            out.push_str(&format!(" {:>w$}", fmt4(*v)));
        }
        out.push('\n');
    }

    out.push_str("\ny:\n");
    for i in 0..n.min(design.nrows()) {
        out.push_str(&format!("{i:>5} {:>5}\n", design.y[i]));
    }

    for enc in &design.categoricals {
        out.push_str(&format!(
            "reference level for {}: {}\n",
            enc.column,
            enc.reference()
        ));
    }
    out
}

/// Interval bound labels such as `2.5%` / `97.5%`.
pub fn ci_labels(confidence: f64) -> (String, String) {
    let tail = (1.0 - confidence) / 2.0 * 100.0;
    (trim_pct(tail), trim_pct(100.0 - tail))
}

fn trim_pct(v: f64) -> String {
    // Ten decimals absorb the float noise of `(1 - c) / 2 * 100` for any usable level.
    let s = format!("{v:.10}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    format!("{s}%")
}

/// Format the regression summary: diagnostics block plus coefficient table.
pub fn format_model_summary(fit: &LogitFit) -> String {
    let mut out = String::new();
    out.push_str("=== Logit Regression Results ===\n");

    let left = [
        ("Dep. Variable:", "churn".to_string()),
        ("Model:", "Logit".to_string()),
        ("Method:", "MLE (Newton/IRLS)".to_string()),
        ("converged:", if fit.converged { "True" } else { "False" }.to_string()),
        ("Iterations:", fit.iterations.to_string()),
        ("AIC:", fmt4(fit.aic)),
        ("BIC:", fmt4(fit.bic)),
    ];
    let right = [
        ("No. Observations:", fit.n_obs.to_string()),
        ("Df Residuals:", fit.df_resid.to_string()),
        ("Df Model:", fit.df_model.to_string()),
        ("Pseudo R-squ.:", fmt4(fit.pseudo_r2)),
        ("Log-Likelihood:", fmt4(fit.log_likelihood)),
        ("LL-Null:", fmt4(fit.null_log_likelihood)),
        ("LLR p-value:", fmt_p(fit.llr_p_value)),
    ];
    for ((lk, lv), (rk, rv)) in left.iter().zip(right.iter()) {
        out.push_str(&format!("{lk:<15} {lv:>18}   {rk:<18} {rv:>14}\n"));
    }

    if !fit.converged {
        out.push_str(&format!(
            "WARNING: no convergence after {} iterations; estimates may be unreliable.\n",
            fit.iterations
        ));
    }
    for column in &fit.separated_columns {
        out.push_str(&format!(
            "WARNING: every customer with {column} = 1 has the same outcome; its coefficient is not identified.\n"
        ));
    }

    let name_w = fit.coefficients.iter().map(|c| c.name.len()).max().unwrap_or(0).max(12);
    let (lo, hi) = ci_labels(fit.confidence);
    let rule = "-".repeat(name_w + 6 * 11);
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&format!(
        "{:<name_w$} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}\n",
        "", "coef", "std err", "z", "P>|z|", lo, hi
    ));
    out.push_str(&rule);
    out.push('\n');
    for c in &fit.coefficients {
        out.push_str(&format!(
            "{:<name_w$} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}\n",
            c.name,
            fmt4(c.estimate),
            fmt4(c.std_error),
            fmt4(c.z),
            fmt_p(c.p_value),
            fmt4(c.ci_lower),
            fmt4(c.ci_upper)
        ));
    }
    out.push_str(&rule);
    out.push('\n');
    out
}

/// Format the odds-ratio table (exponentiated coefficients and bounds).
pub fn format_odds_ratios(fit: &LogitFit) -> String {
    let name_w = fit.coefficients.iter().map(|c| c.name.len()).max().unwrap_or(0).max(12);
    let (lo, hi) = ci_labels(fit.confidence);
    let mut out = String::new();
    out.push_str(&format!("{:<name_w$} {:>12} {:>12} {:>12}\n", "", lo, hi, "Odds Ratio"));
    for or in fit.odds_ratios() {
        out.push_str(&format!(
            "{:<name_w$} {:>12} {:>12} {:>12}\n",
            or.name,
            fmt4(or.lower),
            fmt4(or.upper),
            fmt4(or.odds_ratio)
        ));
    }
    out
}

fn fmt_p(p: f64) -> String {
    if p.is_finite() && p > 0.0 && p < 1e-4 {
        format!("{p:.3e}")
    } else {
        fmt4(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::Coefficient;

    fn toy_fit(converged: bool) -> LogitFit {
        LogitFit {
            coefficients: vec![
                Coefficient {
                    name: "const".to_string(),
                    estimate: -1.0,
                    std_error: 0.5,
                    z: -2.0,
                    p_value: 0.0455,
                    ci_lower: -1.98,
                    ci_upper: -0.02,
                },
                Coefficient {
                    name: "tenure_months".to_string(),
                    estimate: 0.0,
                    std_error: 0.1,
                    z: 0.0,
                    p_value: 1.0,
                    ci_lower: -0.196,
                    ci_upper: 0.196,
                },
            ],
            n_obs: 10,
            df_model: 1,
            df_resid: 8,
            log_likelihood: -5.0,
            null_log_likelihood: -6.0,
            pseudo_r2: 1.0 / 6.0,
            llr: 2.0,
            llr_p_value: 0.157,
            aic: 14.0,
            bic: 14.6,
            iterations: 5,
            converged,
            confidence: 0.95,
            separated_columns: Vec::new(),
        }
    }

    #[test]
    fn four_decimal_formatting() {
        assert_eq!(fmt4(1.0 / 3.0), "0.3333");
        assert_eq!(fmt4(f64::NAN), "NaN");
    }

    #[test]
    fn ci_labels_for_common_levels() {
        assert_eq!(ci_labels(0.95), ("2.5%".to_string(), "97.5%".to_string()));
        assert_eq!(ci_labels(0.90), ("5%".to_string(), "95%".to_string()));
        assert_eq!(ci_labels(0.99999), ("0.0005%".to_string(), "99.9995%".to_string()));
    }

    #[test]
    fn odds_table_exponentiates() {
        let text = format_odds_ratios(&toy_fit(true));
        assert!(text.contains("Odds Ratio"));
        // exp(0) = 1 for the tenure row.
        let tenure = text.lines().find(|l| l.starts_with("tenure_months")).unwrap();
        assert!(tenure.trim_end().ends_with("1.0000"));
    }

    #[test]
    fn non_convergence_is_visible_in_summary() {
        assert!(!format_model_summary(&toy_fit(true)).contains("WARNING"));
        let text = format_model_summary(&toy_fit(false));
        assert!(text.contains("converged:"));
        assert!(text.contains("WARNING: no convergence after 5 iterations"));

        let mut fit = toy_fit(false);
        fit.separated_columns = vec!["contract_type_TwoYear".to_string()];
        let text = format_model_summary(&fit);
        assert!(text.contains("contract_type_TwoYear = 1 has the same outcome"));
    }

    #[test]
    fn value_counts_table_lists_zero_rows() {
        let counts = vec![
            ValueCount { level: "0".to_string(), count: 4 },
            ValueCount { level: "1".to_string(), count: 0 },
        ];
        let text = format_value_counts("churn", &counts);
        assert!(text.lines().any(|l| l.split_whitespace().eq(["1", "0"])));
    }
}
