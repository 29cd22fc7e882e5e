//! Dummy (one-hot) encoding of the customer table into a regression design.
//!
//! Conventions:
//! - the first column is the constant `const` (intercept)
//! - numeric features follow in table order: `tenure_months`, `monthly_bill`
//! - each categorical column expands to one 0/1 indicator per observed level
//!   except the reference level, which is the alphabetically first observed
//!   label (`Annual` for contracts, `DSL` for internet service whenever those
//!   occur). Levels absent from the table get no column.
//! - `customer_id` and `churn` are never features; `churn` becomes `y`

use nalgebra::{DMatrix, DVector};

use crate::domain::{Category, ContractType, CustomerTable, InternetService};
use crate::error::AppError;

pub const INTERCEPT: &str = "const";

/// How one categorical column was expanded.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalEncoding {
    pub column: String,
    /// Observed levels in encoding (alphabetical) order; `levels[0]` is the reference.
    pub levels: Vec<String>,
    /// Design-matrix column of the indicator for `levels[i + 1]`.
    pub indicator_columns: Vec<usize>,
}

impl CategoricalEncoding {
    pub fn reference(&self) -> &str {
        &self.levels[0]
    }
}

/// Encoded design matrix plus the parallel label vector.
#[derive(Debug, Clone)]
pub struct EncodedDesign {
    pub columns: Vec<String>,
    pub x: DMatrix<f64>,
    pub y: DVector<f64>,
    pub categoricals: Vec<CategoricalEncoding>,
}

impl EncodedDesign {
    pub fn nrows(&self) -> usize {
        self.x.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.x.ncols()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn row(&self, i: usize) -> Vec<f64> {
        self.x.row(i).iter().copied().collect()
    }

    /// Recover the original level of categorical `column` for row `i`.
    ///
    /// All-zero indicators map back to the reference level. Returns `None` for an
    /// unknown column, an out-of-range row, or a row with more than one indicator set.
    pub fn decode_category(&self, column: &str, i: usize) -> Option<&str> {
        if i >= self.nrows() {
            return None;
        }
        let enc = self.categoricals.iter().find(|c| c.column == column)?;
        let mut found: Option<&str> = None;
        for (k, &col) in enc.indicator_columns.iter().enumerate() {
            if self.x[(i, col)] == 1.0 {
                if found.is_some() {
                    return None;
                }
                found = Some(&enc.levels[k + 1]);
            }
        }
        Some(found.unwrap_or(enc.reference()))
    }
}

/// Levels of `C` sorted by label.
pub fn encoding_levels<C: Category>() -> Vec<C> {
    let mut levels = C::levels().to_vec();
    levels.sort_by_key(|l| l.label());
    levels
}

/// Build the design matrix and label vector from the table.
pub fn encode(table: &CustomerTable) -> Result<EncodedDesign, AppError> {
    if table.is_empty() {
        return Err(AppError::new(3, "No customers to encode."));
    }

    let mut columns: Vec<String> = vec![
        INTERCEPT.to_string(),
        "tenure_months".to_string(),
        "monthly_bill".to_string(),
    ];
    let mut data: Vec<Vec<f64>> = vec![vec![1.0; table.len()], table.tenures(), table.bills()];
    let mut categoricals = Vec::new();

    categoricals.push(append_indicators(&table.contracts(), &mut columns, &mut data));
    categoricals.push(append_indicators(&table.services(), &mut columns, &mut data));

    let n = table.len();
    let k = columns.len();
    let x = DMatrix::from_fn(n, k, |i, j| data[j][i]);
    let y = DVector::from_vec(table.churn_labels());

    Ok(EncodedDesign {
        columns,
        x,
        y,
        categoricals,
    })
}

fn append_indicators<C: Category>(
    values: &[C],
    columns: &mut Vec<String>,
    data: &mut Vec<Vec<f64>>,
) -> CategoricalEncoding {
    let levels: Vec<C> = encoding_levels::<C>()
        .into_iter()
        .filter(|level| values.contains(level))
        .collect();
    let mut indicator_columns = Vec::with_capacity(levels.len().saturating_sub(1));

    for &level in levels.iter().skip(1) {
        indicator_columns.push(columns.len());
        columns.push(format!("{}_{}", C::COLUMN, level.label()));
        data.push(
            values
                .iter()
                .map(|&v| if v == level { 1.0 } else { 0.0 })
                .collect(),
        );
    }

    CategoricalEncoding {
        column: C::COLUMN.to_string(),
        levels: levels.iter().map(|l| l.label().to_string()).collect(),
        indicator_columns,
    }
}

/// Reference (dropped) level for contracts when every level occurs.
pub fn contract_reference() -> ContractType {
    encoding_levels::<ContractType>()[0]
}

/// Reference (dropped) level for internet service when every level occurs.
pub fn internet_reference() -> InternetService {
    encoding_levels::<InternetService>()[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::generate_seeded;
    use crate::domain::{CustomerRecord, GeneratorConfig};

    fn tiny_table() -> CustomerTable {
        let rows = vec![
            (ContractType::Monthly, InternetService::FiberOptic, 1),
            (ContractType::Annual, InternetService::Dsl, 0),
            (ContractType::TwoYear, InternetService::NoService, 0),
            (ContractType::Monthly, InternetService::NoService, 1),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, (contract_type, internet_service, churn))| CustomerRecord {
            customer_id: i as u32 + 1,
            tenure_months: 10 * (i as u32 + 1),
            contract_type,
            internet_service,
            monthly_bill: 40.0 + i as f64,
            churn,
        })
        .collect();
        CustomerTable::new(rows)
    }

    #[test]
    fn reference_levels_are_alphabetical_first() {
        assert_eq!(contract_reference(), ContractType::Annual);
        assert_eq!(internet_reference(), InternetService::Dsl);
    }

    #[test]
    fn column_layout_is_documented_order() {
        let design = encode(&tiny_table()).unwrap();
        assert_eq!(
            design.columns,
            vec![
                "const",
                "tenure_months",
                "monthly_bill",
                "contract_type_Monthly",
                "contract_type_TwoYear",
                "internet_service_FiberOptic",
                "internet_service_None",
            ]
        );
        assert_eq!(design.row(0), vec![1.0, 10.0, 40.0, 1.0, 0.0, 1.0, 0.0]);
        assert_eq!(design.row(1), vec![1.0, 20.0, 41.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(design.y.as_slice(), &[1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn each_categorical_loses_one_level() {
        let design = encode(&tiny_table()).unwrap();
        for enc in &design.categoricals {
            assert_eq!(enc.indicator_columns.len(), enc.levels.len() - 1);
        }
    }

    #[test]
    fn decoding_reconstructs_every_row() {
        let table = generate_seeded(&GeneratorConfig {
            num_customers: 300,
            ..GeneratorConfig::default()
        })
        .unwrap();
        let design = encode(&table).unwrap();
        assert_eq!(design.nrows(), table.len());

        for (i, r) in table.rows().iter().enumerate() {
            assert_eq!(design.decode_category("contract_type", i), Some(r.contract_type.label()));
            assert_eq!(design.decode_category("internet_service", i), Some(r.internet_service.label()));
            assert_eq!(design.y[i], f64::from(r.churn));
            assert_eq!(design.x[(i, 1)], f64::from(r.tenure_months));
        }
    }

    #[test]
    fn absent_levels_get_no_column() {
        // No Annual contracts and no DSL customers.
        let rows: Vec<CustomerRecord> = tiny_table()
            .rows()
            .iter()
            .filter(|r| r.contract_type != ContractType::Annual)
            .cloned()
            .collect();
        let design = encode(&CustomerTable::new(rows)).unwrap();
        assert_eq!(
            design.columns,
            vec![
                "const",
                "tenure_months",
                "monthly_bill",
                "contract_type_TwoYear",
                "internet_service_None",
            ]
        );
        assert_eq!(design.categoricals[0].reference(), "Monthly");
        assert_eq!(design.categoricals[1].reference(), "FiberOptic");
        assert_eq!(design.decode_category("contract_type", 1), Some("TwoYear"));
        assert_eq!(design.decode_category("internet_service", 0), Some("FiberOptic"));
        assert_eq!(design.column_index("internet_service_None"), Some(4));
    }

    #[test]
    fn empty_table_is_rejected() {
        let err = encode(&CustomerTable::default()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
