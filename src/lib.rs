//! `churn-lab` library crate.
//!
//! The binary (`churn`) is a thin wrapper around this library so that:
//!
//! - generation, encoding and fitting are testable without spawning processes
//! - the CLI report and the TUI share one pipeline

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod features;
pub mod fit;
pub mod math;
pub mod plot;
pub mod report;
pub mod tui;
