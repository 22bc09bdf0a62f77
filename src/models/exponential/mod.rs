//! Exponential smoothing models.
//!
//! Holt-Winters with additive trend and additive seasonality, sampling
//! future paths from its fitted state-space recursions.

mod holt_winters;

pub use holt_winters::HoltWinters;
