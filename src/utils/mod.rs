//! Numeric helpers shared by the models and forecasts.

pub mod optimization;
pub mod stats;

pub use optimization::{nelder_mead, Minimum, NelderMeadConfig};
pub use stats::{mean, quantile_sorted, sort_finite};
