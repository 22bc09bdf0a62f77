//! Sampled forecasts and the quantile bands derived from them.

use crate::error::{ForecastError, Result};
use crate::utils::stats::{quantile_sorted, sort_finite};
use chrono::{DateTime, Utc};

/// Lower and upper quantile used to shade a forecast's uncertainty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantileBand {
    low: f64,
    high: f64,
}

impl QuantileBand {
    /// Create a band, requiring `0 < low < high < 1`.
    pub fn new(low: f64, high: f64) -> Result<Self> {
        let in_range = |q: f64| q > 0.0 && q < 1.0;
        if !(in_range(low) && in_range(high) && low < high) {
            return Err(ForecastError::InvalidQuantileBand { low, high });
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }
}

impl Default for QuantileBand {
    fn default() -> Self {
        Self {
            low: 0.05,
            high: 0.95,
        }
    }
}

/// Forecast expressed as sampled values: `samples[step][draw]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledForecast {
    timestamps: Vec<DateTime<Utc>>,
    samples: Vec<Vec<f64>>,
    label: String,
}

impl SampledForecast {
    /// Create a forecast; every step must carry the same number of samples.
    pub fn new(timestamps: Vec<DateTime<Utc>>, samples: Vec<Vec<f64>>) -> Result<Self> {
        if timestamps.len() != samples.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: timestamps.len(),
                got: samples.len(),
            });
        }
        if let Some(first) = samples.first() {
            if let Some(bad) = samples.iter().find(|s| s.len() != first.len()) {
                return Err(ForecastError::DimensionMismatch {
                    expected: first.len(),
                    got: bad.len(),
                });
            }
        }
        Ok(Self {
            timestamps,
            samples,
            label: "forecast".to_string(),
        })
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of forecast periods.
    pub fn horizon(&self) -> usize {
        self.samples.len()
    }

    /// Number of sampled values per period.
    pub fn num_samples(&self) -> usize {
        self.samples.first().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Sampled values for one forecast step.
    pub fn step(&self, index: usize) -> Result<&[f64]> {
        self.samples
            .get(index)
            .map(|s| s.as_slice())
            .ok_or(ForecastError::IndexOutOfBounds {
                index,
                size: self.samples.len(),
            })
    }

    pub fn samples(&self) -> &[Vec<f64>] {
        &self.samples
    }

    /// Per-period quantile `q` of the sampled values.
    pub fn quantile(&self, q: f64) -> Result<Vec<f64>> {
        if !(0.0..=1.0).contains(&q) {
            return Err(ForecastError::InvalidParameter(format!(
                "quantile {} outside [0, 1]",
                q
            )));
        }
        Ok(self
            .samples
            .iter()
            .map(|step| quantile_sorted(&sort_finite(step), q))
            .collect())
    }

    /// Per-period median of the sampled values.
    pub fn median(&self) -> Vec<f64> {
        self.samples
            .iter()
            .map(|step| quantile_sorted(&sort_finite(step), 0.5))
            .collect()
    }

    /// Median and band curves for presentation.
    pub fn band(&self, band: QuantileBand) -> ForecastBand {
        let mut out = ForecastBand {
            timestamps: self.timestamps.clone(),
            low: Vec::with_capacity(self.horizon()),
            median: Vec::with_capacity(self.horizon()),
            high: Vec::with_capacity(self.horizon()),
            quantiles: band,
            label: self.label.clone(),
        };
        for step in &self.samples {
            let sorted = sort_finite(step);
            let median = quantile_sorted(&sorted, 0.5);
            // The envelope always contains the median, also for bands entirely above or below it.
            out.low.push(quantile_sorted(&sorted, band.low()).min(median));
            out.high.push(quantile_sorted(&sorted, band.high()).max(median));
            out.median.push(median);
        }
        out
    }
}

/// Per-period low/median/high curves of a forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastBand {
    pub timestamps: Vec<DateTime<Utc>>,
    pub low: Vec<f64>,
    pub median: Vec<f64>,
    pub high: Vec<f64>,
    pub quantiles: QuantileBand,
    pub label: String,
}

impl ForecastBand {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}
