//! Forecasting models.

mod traits;

pub mod exponential;
pub mod fixed;

pub use exponential::HoltWinters;
pub use fixed::FixedSamples;
pub use traits::{BoxedForecaster, Forecaster, ModelSpec};
