//! Descriptive statistics over the generated table.
//!
//! Everything here is a read-only projection of `CustomerTable`; formatting of
//! the printed sections lives in `format`.

use serde::Serialize;

use crate::domain::{Category, ContractType, CustomerTable, InternetService};

pub mod format;

pub use format::*;

/// pandas-style `describe()` statistics for one numeric column.
///
/// Empty input yields `count = 0` and `NaN` for every statistic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n − 1 denominator).
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericColumn {
    pub name: &'static str,
    pub summary: NumericSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub level: String,
    pub count: usize,
}

/// `describe(include='object')` view of one categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoricalSummary {
    pub name: &'static str,
    pub count: usize,
    /// Levels with at least one occurrence.
    pub unique: usize,
    pub top: Option<String>,
    pub freq: usize,
}

/// `info()` view of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: &'static str,
    pub non_null: usize,
    pub dtype: &'static str,
}

/// All descriptive outputs of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveReport {
    pub rows: usize,
    pub columns: Vec<ColumnInfo>,
    pub numeric: Vec<NumericColumn>,
    pub categorical: Vec<CategoricalSummary>,
    pub contract_counts: Vec<ValueCount>,
    pub internet_counts: Vec<ValueCount>,
    pub churn_counts: Vec<ValueCount>,
    /// Percentage of churners.
    pub churn_rate: f64,
}

pub fn describe(table: &CustomerTable) -> DescriptiveReport {
    let contracts = table.contracts();
    let services = table.services();
    DescriptiveReport {
        rows: table.len(),
        columns: column_info(table),
        numeric: describe_table(table),
        categorical: vec![
            describe_categorical(&contracts),
            describe_categorical(&services),
        ],
        contract_counts: value_counts(&contracts),
        internet_counts: value_counts(&services),
        churn_counts: churn_counts(table),
        churn_rate: churn_rate(table),
    }
}

pub fn column_info(table: &CustomerTable) -> Vec<ColumnInfo> {
    let n = table.len();
    [
        ("customer_id", "int64"),
        ("tenure_months", "int64"),
        (ContractType::COLUMN, "category"),
        (InternetService::COLUMN, "category"),
        ("monthly_bill", "float64"),
        ("churn", "int64"),
    ]
    .into_iter()
    .map(|(name, dtype)| ColumnInfo {
        name,
        non_null: n,
        dtype,
    })
    .collect()
}

pub fn describe_table(table: &CustomerTable) -> Vec<NumericColumn> {
    vec![
        NumericColumn {
            name: "customer_id",
            summary: describe_numeric(&table.ids()),
        },
        NumericColumn {
            name: "tenure_months",
            summary: describe_numeric(&table.tenures()),
        },
        NumericColumn {
            name: "monthly_bill",
            summary: describe_numeric(&table.bills()),
        },
        NumericColumn {
            name: "churn",
            summary: describe_numeric(&table.churn_labels()),
        },
    ]
}

pub fn describe_numeric(values: &[f64]) -> NumericSummary {
    let count = values.len();
    if count == 0 {
        return NumericSummary {
            count,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            q25: f64::NAN,
            q50: f64::NAN,
            q75: f64::NAN,
            max: f64::NAN,
        };
    }

    let n = count as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = if count > 1 {
        (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
    } else {
        f64::NAN
    };

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    NumericSummary {
        count,
        mean,
        std,
        min: sorted[0],
        q25: quantile_sorted(&sorted, 0.25),
        q50: quantile_sorted(&sorted, 0.50),
        q75: quantile_sorted(&sorted, 0.75),
        max: sorted[count - 1],
    }
}

/// Quantile of sorted data, linearly interpolating between closest ranks.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

/// Count of every level of `C`, most frequent first.
///
/// Levels that never occur are listed with a count of zero. Ties keep the
/// category's level order.
pub fn value_counts<C: Category>(values: &[C]) -> Vec<ValueCount> {
    let mut counts = vec![0usize; C::levels().len()];
    for v in values {
        counts[v.index()] += 1;
    }
    let mut out: Vec<ValueCount> = C::levels()
        .iter()
        .zip(counts)
        .map(|(level, count)| ValueCount {
            level: level.label().to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

/// Counts of churn labels `0` and `1`, most frequent first (zeros included).
pub fn churn_counts(table: &CustomerTable) -> Vec<ValueCount> {
    let churned = table.rows().iter().filter(|r| r.churn == 1).count();
    let mut out = vec![
        ValueCount {
            level: "0".to_string(),
            count: table.len() - churned,
        },
        ValueCount {
            level: "1".to_string(),
            count: churned,
        },
    ];
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

pub fn describe_categorical<C: Category>(values: &[C]) -> CategoricalSummary {
    let counts = value_counts(values);
    let unique = counts.iter().filter(|c| c.count > 0).count();
    let top = counts.first().filter(|c| c.count > 0);
    CategoricalSummary {
        name: C::COLUMN,
        count: values.len(),
        unique,
        top: top.map(|c| c.level.clone()),
        freq: top.map(|c| c.count).unwrap_or(0),
    }
}

/// Percentage of customers with `churn = 1`; `0.0` for an empty table.
pub fn churn_rate(table: &CustomerTable) -> f64 {
    if table.is_empty() {
        return 0.0;
    }
    let churned = table.rows().iter().filter(|r| r.churn == 1).count();
    100.0 * churned as f64 / table.len() as f64
}
