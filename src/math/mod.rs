//! Mathematical utilities: SPD solves and distribution functions.

pub mod dist;
pub mod solve;

pub use dist::*;
pub use solve::*;
