//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - categorical attributes (`ContractType`, `InternetService`, `Category`)
//! - the generated table (`CustomerRecord`, `CustomerTable`)
//! - run configuration (`GeneratorConfig`, `FitConfig`, `RunConfig`)

pub mod types;

pub use types::*;
