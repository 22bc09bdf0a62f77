//! Forecaster trait defining the common interface for all models.

use crate::core::{SampledForecast, TimeSeries};
use crate::error::Result;

/// Common interface for sampling forecasters.
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
pub trait Forecaster {
    /// Fit the model to a training series.
    fn fit(&mut self, series: &TimeSeries) -> Result<()>;

    /// Draw `num_samples` trajectories over the `horizon` periods following
    /// the training data.
    fn predict(&self, horizon: usize, num_samples: usize) -> Result<SampledForecast>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool;

    /// In-sample one-step-ahead predictions, when the model keeps them.
    fn fitted_values(&self) -> Option<&[f64]> {
        None
    }
}

/// Type alias for boxed forecaster trait objects.
///
/// # Example
///
/// ```
/// use forecast_explorer::models::{BoxedForecaster, Forecaster, HoltWinters};
///
/// let model: BoxedForecaster = Box::new(HoltWinters::auto());
/// assert_eq!(model.name(), "HoltWinters");
/// assert!(!model.is_fitted());
/// ```
pub type BoxedForecaster = Box<dyn Forecaster>;

/// Named factory producing a fresh, unfitted model for every run.
///
/// # Example
///
/// ```
/// use forecast_explorer::models::{FixedSamples, ModelSpec};
///
/// let spec = ModelSpec::new("Fixed", || Box::new(FixedSamples::new(vec![1.0, 2.0])));
/// let model = spec.create();
/// assert!(!model.is_fitted());
/// ```
pub struct ModelSpec {
    /// Display name of the model
    pub name: &'static str,
    factory: Box<dyn Fn() -> BoxedForecaster + Send + Sync>,
}

impl ModelSpec {
    pub fn new<F>(name: &'static str, factory: F) -> Self
    where
        F: Fn() -> BoxedForecaster + Send + Sync + 'static,
    {
        Self {
            name,
            factory: Box::new(factory),
        }
    }

    /// Create a new model instance.
    pub fn create(&self) -> BoxedForecaster {
        (self.factory)()
    }
}

impl std::fmt::Debug for ModelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSpec").field("name", &self.name).finish()
    }
}
