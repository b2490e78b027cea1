pub mod analyzer;
pub mod chart_patterns;
pub mod indicators;
pub mod levels;
pub mod patterns;

#[cfg(test)]
mod indicators_tests;

pub use analyzer::*;
pub use chart_patterns::*;
pub use indicators::*;
pub use levels::*;
pub use patterns::*;
