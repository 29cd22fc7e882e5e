//! Data sources. The only source is the seeded synthetic customer generator.

pub mod sample;

pub use sample::{churn_log_odds, generate_customers, generate_seeded, sigmoid};
