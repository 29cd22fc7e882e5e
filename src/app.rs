//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initializes logging
//! - parses CLI arguments
//! - runs the pipeline and prints each section

use clap::Parser;

use crate::cli::{Command, FitArgs, RunArgs};
use crate::domain::{Category, ContractType, InternetService, RunConfig};
use crate::error::AppError;
use crate::fit::LogitFit;
use crate::report;

pub mod pipeline;

/// Entry point for the `churn` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init();

    let argv = crate::cli::rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Report(args) => handle_report(&args),
        Command::Fit(args) => handle_fit(&args),
        Command::Tui(args) => crate::tui::run(args.to_run_config()?),
    }
}

fn handle_report(args: &RunArgs) -> Result<(), AppError> {
    let config = args.to_run_config()?;
    let run = pipeline::prepare(&config)?;
    print!("{}", format_descriptive(&run, &config));

    // The descriptive sections are already out; a fit failure only loses the model tables.
    let fit = pipeline::fit_model(&run, &config.fit)?;
    print!("{}", format_model(&fit));
    Ok(())
}

fn handle_fit(args: &FitArgs) -> Result<(), AppError> {
    let config = args.run.to_run_config()?;
    let (_, fit) = pipeline::run_fit(&config)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&fit)?);
    } else {
        print!("{}", format_model(&fit));
    }
    Ok(())
}

/// Every section printed before the model fit, in report order.
pub fn format_descriptive(run: &pipeline::RunOutput, config: &RunConfig) -> String {
    let r = &run.report;
    let mut out = String::new();

    section(&mut out, "First rows", &report::format_head(run.table.head(config.head_rows)));
    section(&mut out, "Table info", &report::format_info(r.rows, &r.columns));
    section(&mut out, "Numeric summary", &report::format_numeric_describe(&r.numeric));
    section(
        &mut out,
        "Categorical summary",
        &report::format_categorical_describe(&r.categorical),
    );
    section(&mut out, "Churn rate", &report::format_churn_rate(r.churn_rate));

    if config.plot {
        section(
            &mut out,
            "Charts",
            &crate::plot::render_all(&run.table, config.plot_width, config.plot_height),
        );
    }

    let counts = [
        report::format_value_counts(ContractType::COLUMN, &r.contract_counts),
        report::format_value_counts(InternetService::COLUMN, &r.internet_counts),
        report::format_value_counts("churn", &r.churn_counts),
    ]
    .join("\n");
    section(&mut out, "Value counts", &counts);
    section(
        &mut out,
        "Encoded design (first rows)",
        &report::format_design_head(&run.design, config.head_rows),
    );
    out
}

pub fn format_model(fit: &LogitFit) -> String {
    let mut out = String::new();
    section(&mut out, "Model summary", &report::format_model_summary(fit));
    section(&mut out, "Odds ratios", &report::format_odds_ratios(fit));
    out
}

fn section(out: &mut String, title: &str, body: &str) {
    out.push_str(&format!("--- {title} ---\n"));
    out.push_str(body);
    if !body.ends_with('\n') {
        out.push('\n');
    }
    out.push('\n');
}
