//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory by the generator, reporter, encoder and fitter
//! - emitted as JSON by `churn fit --json`

use serde::{Deserialize, Serialize};

/// A categorical customer attribute with a fixed, ordered set of levels.
///
/// `levels()` is the *sampling* order (the order probabilities are given in).
/// Encoding sorts levels by `label()` instead, see `crate::features`.
pub trait Category: Copy + Eq + std::fmt::Debug + 'static {
    /// Column name used in reports and encoded feature names.
    const COLUMN: &'static str;

    fn levels() -> &'static [Self];

    fn label(self) -> &'static str;

    /// Position of this level in `levels()`.
    fn index(self) -> usize {
        Self::levels()
            .iter()
            .position(|&level| level == self)
            .unwrap_or(0)
    }
}

/// Billing contract of a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractType {
    Monthly,
    Annual,
    TwoYear,
}

impl ContractType {
    pub const ALL: [ContractType; 3] = [ContractType::Monthly, ContractType::Annual, ContractType::TwoYear];
}

impl Category for ContractType {
    const COLUMN: &'static str = "contract_type";

    fn levels() -> &'static [Self] {
        &Self::ALL
    }

    fn label(self) -> &'static str {
        match self {
            ContractType::Monthly => "Monthly",
            ContractType::Annual => "Annual",
            ContractType::TwoYear => "TwoYear",
        }
    }
}

/// Internet service subscribed by a customer.
///
/// `NoService` is reported with the label `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InternetService {
    FiberOptic,
    Dsl,
    NoService,
}

impl InternetService {
    pub const ALL: [InternetService; 3] = [
        InternetService::FiberOptic,
        InternetService::Dsl,
        InternetService::NoService,
    ];
}

impl Category for InternetService {
    const COLUMN: &'static str = "internet_service";

    fn levels() -> &'static [Self] {
        &Self::ALL
    }

    fn label(self) -> &'static str {
        match self {
            InternetService::FiberOptic => "FiberOptic",
            InternetService::Dsl => "DSL",
            InternetService::NoService => "None",
        }
    }
}

/// One simulated customer (one row of the generated table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: u32,
    pub tenure_months: u32,
    pub contract_type: ContractType,
    pub internet_service: InternetService,
    pub monthly_bill: f64,
    /// 0 = stayed, 1 = churned.
    pub churn: u8,
}

/// The generated customer table.
///
/// Rows are stored in id order and never mutated after generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerTable {
    rows: Vec<CustomerRecord>,
}

impl CustomerTable {
    pub fn new(rows: Vec<CustomerRecord>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[CustomerRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn head(&self, n: usize) -> &[CustomerRecord] {
        &self.rows[..n.min(self.rows.len())]
    }

    pub fn ids(&self) -> Vec<f64> {
        self.rows.iter().map(|r| f64::from(r.customer_id)).collect()
    }

    pub fn tenures(&self) -> Vec<f64> {
        self.rows.iter().map(|r| f64::from(r.tenure_months)).collect()
    }

    pub fn bills(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.monthly_bill).collect()
    }

    pub fn churn_labels(&self) -> Vec<f64> {
        self.rows.iter().map(|r| f64::from(r.churn)).collect()
    }

    pub fn contracts(&self) -> Vec<ContractType> {
        self.rows.iter().map(|r| r.contract_type).collect()
    }

    pub fn services(&self) -> Vec<InternetService> {
        self.rows.iter().map(|r| r.internet_service).collect()
    }

    /// Values of `column` split by churn status: `(stayed, churned)`.
    pub fn split_by_churn(&self, column: impl Fn(&CustomerRecord) -> f64) -> (Vec<f64>, Vec<f64>) {
        let mut stayed = Vec::new();
        let mut churned = Vec::new();
        for r in &self.rows {
            if r.churn == 1 {
                churned.push(column(r));
            } else {
                stayed.push(column(r));
            }
        }
        (stayed, churned)
    }
}

/// Normal prior for the per-contract base bill (drawn once per run).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BillPrior {
    pub mean: f64,
    pub std_dev: f64,
}

/// Coefficients of the log-odds formula used to synthesize churn labels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChurnCoefficients {
    pub intercept: f64,
    pub per_tenure_month: f64,
    /// Indexed by `ContractType::index()`.
    pub contract: [f64; 3],
    pub fiber_optic: f64,
    /// Applied to every service other than fiber.
    pub other_service: f64,
    pub per_bill_unit: f64,
}

impl Default for ChurnCoefficients {
    fn default() -> Self {
        Self {
            intercept: -2.5,
            per_tenure_month: -0.05,
            contract: [3.0, -1.5, -2.5],
            fiber_optic: 0.8,
            other_service: -0.5,
            per_bill_unit: 0.03,
        }
    }
}

/// Everything the synthetic data generator needs.
///
/// Probability and prior arrays are indexed in the `levels()` order of the
/// corresponding category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub num_customers: usize,
    pub seed: u64,

    pub tenure_min: u32,
    pub tenure_max: u32,

    pub contract_probs: [f64; 3],
    pub internet_probs: [f64; 3],

    pub base_bill: [BillPrior; 3],
    pub bill_per_tenure_month: f64,
    pub bill_noise_sd: f64,
    pub bill_min: f64,
    pub bill_max: f64,

    pub churn: ChurnCoefficients,
}

pub const DEFAULT_NUM_CUSTOMERS: usize = 2000;
pub const DEFAULT_SEED: u64 = 42;

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            num_customers: DEFAULT_NUM_CUSTOMERS,
            seed: DEFAULT_SEED,
            tenure_min: 1,
            tenure_max: 72,
            contract_probs: [0.60, 0.25, 0.15],
            internet_probs: [0.55, 0.35, 0.10],
            base_bill: [
                BillPrior { mean: 60.0, std_dev: 20.0 },
                BillPrior { mean: 70.0, std_dev: 25.0 },
                BillPrior { mean: 80.0, std_dev: 25.0 },
            ],
            bill_per_tenure_month: 0.2,
            bill_noise_sd: 5.0,
            bill_min: 20.0,
            bill_max: 120.0,
            churn: ChurnCoefficients::default(),
        }
    }
}

/// Logistic regression solver settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitConfig {
    /// Newton/IRLS iteration cap.
    pub max_iter: usize,
    /// Convergence tolerance on the largest coefficient update.
    pub tol: f64,
    /// Two-sided confidence level for Wald intervals (e.g. 0.95).
    pub confidence: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_iter: 35,
            tol: 1e-8,
            confidence: 0.95,
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub generator: GeneratorConfig,
    pub fit: FitConfig,

    /// Rows shown by the head tables.
    pub head_rows: usize,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorConfig::default(),
            fit: FitConfig::default(),
            head_rows: 5,
            plot: true,
            plot_width: 60,
            plot_height: 12,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u32, churn: u8) -> CustomerRecord {
        CustomerRecord {
            customer_id: id,
            tenure_months: id * 2,
            contract_type: ContractType::Monthly,
            internet_service: InternetService::Dsl,
            monthly_bill: 50.0 + f64::from(id),
            churn,
        }
    }

    #[test]
    fn category_index_follows_level_order() {
        assert_eq!(ContractType::TwoYear.index(), 2);
        assert_eq!(InternetService::Dsl.index(), 1);
        assert_eq!(InternetService::NoService.label(), "None");
    }

    #[test]
    fn head_is_clamped_to_table_length() {
        let table = CustomerTable::new(vec![record(1, 0), record(2, 1)]);
        assert_eq!(table.head(5).len(), 2);
        assert_eq!(table.head(1)[0].customer_id, 1);
    }

    #[test]
    fn split_by_churn_partitions_rows() {
        let table = CustomerTable::new(vec![record(1, 0), record(2, 1), record(3, 0)]);
        let (stayed, churned) = table.split_by_churn(|r| r.monthly_bill);
        assert_eq!(stayed, vec![51.0, 53.0]);
        assert_eq!(churned, vec![52.0]);
    }

    #[test]
    fn default_probabilities_sum_to_one() {
        let cfg = GeneratorConfig::default();
        assert!((cfg.contract_probs.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((cfg.internet_probs.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }
}
