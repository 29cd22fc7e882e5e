//! Command-line parsing for the `churn` binary.
//!
//! Parsing and validation live here; `crate::app` only dispatches.

use clap::{Args, Parser, Subcommand};

use crate::domain::{
    DEFAULT_NUM_CUSTOMERS, DEFAULT_SEED, FitConfig, GeneratorConfig, RunConfig,
};
use crate::error::AppError;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "churn",
    version,
    about = "Synthetic telecom churn data, descriptive report and logistic regression"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate the table, print descriptive statistics and charts, then fit the model.
    Report(RunArgs),
    /// Generate, encode and fit; print only the model tables.
    Fit(FitArgs),
    /// Browse the charts interactively.
    Tui(RunArgs),
}

/// Options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Number of customers to generate.
    #[arg(short = 'n', long, env = "CHURN_CUSTOMERS", default_value_t = DEFAULT_NUM_CUSTOMERS)]
    pub customers: usize,

    /// Random seed for generation.
    #[arg(long, env = "CHURN_SEED", default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Newton/IRLS iteration cap.
    #[arg(long, default_value_t = 35)]
    pub max_iter: usize,

    /// Convergence tolerance on the largest coefficient update.
    #[arg(long, default_value_t = 1e-8)]
    pub tol: f64,

    /// Confidence level for coefficient and odds-ratio intervals.
    #[arg(long, default_value_t = 0.95)]
    pub confidence: f64,

    /// Rows shown by the head tables.
    #[arg(long, default_value_t = 5)]
    pub head: usize,

    /// ASCII chart width (characters).
    #[arg(long, default_value_t = 60)]
    pub width: usize,

    /// ASCII histogram height (lines).
    #[arg(long, default_value_t = 12)]
    pub height: usize,

    /// Skip the ASCII charts.
    #[arg(long, default_value_t = false)]
    pub no_plot: bool,
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Print the fit as JSON instead of tables.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl RunArgs {
    /// Validate flags and build the pipeline configuration.
    pub fn to_run_config(&self) -> Result<RunConfig, AppError> {
        if self.customers == 0 {
            return Err(AppError::invalid_config("--customers must be at least 1"));
        }
        if self.max_iter == 0 {
            return Err(AppError::invalid_config("--max-iter must be at least 1"));
        }
        if !(self.tol.is_finite() && self.tol > 0.0) {
            return Err(AppError::invalid_config(format!(
                "--tol must be a positive number, got {}",
                self.tol
            )));
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(AppError::invalid_config(format!(
                "--confidence must lie in (0, 1), got {}",
                self.confidence
            )));
        }

        Ok(RunConfig {
            generator: GeneratorConfig {
                num_customers: self.customers,
                seed: self.seed,
                ..GeneratorConfig::default()
            },
            fit: FitConfig {
                max_iter: self.max_iter,
                tol: self.tol,
                confidence: self.confidence,
            },
            head_rows: self.head,
            plot: !self.no_plot,
            plot_width: self.width.max(10),
            plot_height: self.height.max(4),
        })
    }
}

/// Rewrite argv so `churn` defaults to `churn report`.
///
/// - `churn`                      -> `churn report`
/// - `churn -n 500 ...`           -> `churn report -n 500 ...`
/// - `churn --help/--version/-h`  -> unchanged
pub fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("report".to_string());
        return argv;
    };

    if matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help") {
        return argv;
    }
    if matches!(arg1.as_str(), "report" | "fit" | "tui") {
        return argv;
    }
    if arg1.starts_with('-') {
        argv.insert(1, "report".to_string());
    }
    argv
}
