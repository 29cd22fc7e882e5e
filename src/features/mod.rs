//! Feature encoding for the churn regression.

pub mod one_hot;

pub use one_hot::*;
