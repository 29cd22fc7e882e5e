//! Chart data for the churn visualizations.
//!
//! The four charts are computed here once and rendered either as text
//! (`ascii`) or interactively (`crate::tui`).

use serde::Serialize;

use crate::domain::{Category, ContractType, CustomerRecord, CustomerTable};
use crate::report::quantile_sorted;

pub mod ascii;

pub use ascii::*;

/// Default number of histogram bins.
pub const DEFAULT_BINS: usize = 12;

/// The charts shown by `report` and the TUI, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    ChurnRate,
    ByContract,
    Tenure,
    MonthlyBill,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::ChurnRate,
        ChartKind::ByContract,
        ChartKind::Tenure,
        ChartKind::MonthlyBill,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ChartKind::ChurnRate => "Overall churn rate",
            ChartKind::ByContract => "Churn by contract type",
            ChartKind::Tenure => "Tenure (months) distribution by churn",
            ChartKind::MonthlyBill => "Monthly bill distribution by churn",
        }
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|&k| k == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let i = Self::ALL.iter().position(|&k| k == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Customer counts split by churn label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChurnSplit {
    pub stayed: usize,
    pub churned: usize,
}

impl ChurnSplit {
    pub fn total(&self) -> usize {
        self.stayed + self.churned
    }

    /// Share of churners in `[0, 1]`; `0.0` when empty.
    pub fn churn_share(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.churned as f64 / self.total() as f64
        }
    }

    fn add(&mut self, r: &CustomerRecord) {
        if r.churn == 1 {
            self.churned += 1;
        } else {
            self.stayed += 1;
        }
    }
}

pub fn churn_split(table: &CustomerTable) -> ChurnSplit {
    let mut split = ChurnSplit::default();
    for r in table.rows() {
        split.add(r);
    }
    split
}

/// Churn split for every contract type, in level order (empty levels included).
pub fn churn_by_contract(table: &CustomerTable) -> Vec<(ContractType, ChurnSplit)> {
    let mut out: Vec<(ContractType, ChurnSplit)> = ContractType::levels()
        .iter()
        .map(|&c| (c, ChurnSplit::default()))
        .collect();
    for r in table.rows() {
        out[r.contract_type.index()].1.add(r);
    }
    out
}

/// Five-number summary drawn next to each histogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoxSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl BoxSummary {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        Some(Self {
            min: sorted[0],
            q1: quantile_sorted(&sorted, 0.25),
            median: quantile_sorted(&sorted, 0.5),
            q3: quantile_sorted(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
        })
    }
}

/// Histogram of one numeric column with shared bins for both churn groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChurnHistogram {
    pub column: &'static str,
    /// `bins + 1` ascending edges; the last bin is closed on the right.
    pub edges: Vec<f64>,
    pub stayed: Vec<usize>,
    pub churned: Vec<usize>,
    pub stayed_box: Option<BoxSummary>,
    pub churned_box: Option<BoxSummary>,
}

impl ChurnHistogram {
    pub fn bins(&self) -> usize {
        self.stayed.len()
    }

    pub fn max_count(&self) -> usize {
        self.stayed
            .iter()
            .chain(self.churned.iter())
            .copied()
            .max()
            .unwrap_or(0)
    }
}

pub fn tenure_histogram(table: &CustomerTable, bins: usize) -> ChurnHistogram {
    histogram_by_churn(table, "tenure_months", bins, |r| r.tenure_months as f64)
}

pub fn bill_histogram(table: &CustomerTable, bins: usize) -> ChurnHistogram {
    histogram_by_churn(table, "monthly_bill", bins, |r| r.monthly_bill)
}

/// Bin `value(row)` over the whole table, then count each churn group.
pub fn histogram_by_churn<F>(
    table: &CustomerTable,
    column: &'static str,
    bins: usize,
    value: F,
) -> ChurnHistogram
where
    F: Fn(&CustomerRecord) -> f64,
{
    let bins = bins.max(1);
    let (stayed_vals, churned_vals) = table.split_by_churn(&value);

    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in stayed_vals.iter().chain(churned_vals.iter()) {
        lo = lo.min(*v);
        hi = hi.max(*v);
    }
    if !lo.is_finite() || !hi.is_finite() {
        lo = 0.0;
        hi = 1.0;
    }
    if hi <= lo {
        hi = lo + 1.0;
    }

    let step = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + step * i as f64).collect();
    let bin_of = |v: f64| (((v - lo) / step).floor() as usize).min(bins - 1);

    let mut stayed = vec![0usize; bins];
    let mut churned = vec![0usize; bins];
    for &v in &stayed_vals {
        stayed[bin_of(v)] += 1;
    }
    for &v in &churned_vals {
        churned[bin_of(v)] += 1;
    }

    ChurnHistogram {
        column,
        edges,
        stayed,
        churned,
        stayed_box: BoxSummary::from_values(&stayed_vals),
        churned_box: BoxSummary::from_values(&churned_vals),
    }
}
