//! Shared pipeline used by the CLI subcommands and the TUI.
//!
//! generate -> describe -> encode, then fit as a separate step so callers can
//! print the descriptive sections before the model runs.

use crate::data::generate_seeded;
use crate::domain::{CustomerTable, FitConfig, RunConfig};
use crate::error::AppError;
use crate::features::{encode, EncodedDesign};
use crate::fit::{fit_logit, LogitFit};
use crate::report::{describe, DescriptiveReport};

/// Everything computed before the model fit.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub table: CustomerTable,
    pub report: DescriptiveReport,
    pub design: EncodedDesign,
}

/// Generate, describe and encode a table per `config`.
pub fn prepare(config: &RunConfig) -> Result<RunOutput, AppError> {
    let table = generate_seeded(&config.generator)?;
    let report = describe(&table);
    let design = encode(&table)?;
    log::debug!(
        "encoded design: {} rows x {} columns ({})",
        design.nrows(),
        design.ncols(),
        design.columns.join(", ")
    );
    Ok(RunOutput {
        table,
        report,
        design,
    })
}

/// Fit the churn model on a prepared run.
pub fn fit_model(run: &RunOutput, config: &FitConfig) -> Result<LogitFit, AppError> {
    let fit = fit_logit(&run.design, config)?;
    log::info!(
        "logit fit: {} iterations, converged={}, log-likelihood={:.4}",
        fit.iterations,
        fit.converged,
        fit.log_likelihood
    );
    Ok(fit)
}

/// `prepare` followed by `fit_model`.
pub fn run_fit(config: &RunConfig) -> Result<(RunOutput, LogitFit), AppError> {
    let run = prepare(config)?;
    let fit = fit_model(&run, &config.fit)?;
    Ok((run, fit))
}
