//! TimeSeries data structure for period-indexed observations.

use crate::core::period::Period;
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Datelike, Utc};
use std::collections::HashMap;

/// A time series with strictly increasing timestamps and one or more value channels.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    timestamps: Vec<DateTime<Utc>>,
    /// Values stored in column-major format: values[channel][observation]
    values: Vec<Vec<f64>>,
    labels: Vec<String>,
    period: Option<Period>,
}

/// Builder for constructing TimeSeries.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesBuilder {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<Vec<f64>>,
    labels: Vec<String>,
    period: Option<Period>,
}

impl TimeSeriesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timestamps(mut self, timestamps: Vec<DateTime<Utc>>) -> Self {
        self.timestamps = timestamps;
        self
    }

    /// Set a single channel.
    pub fn values(mut self, values: Vec<f64>) -> Self {
        self.values = vec![values];
        self
    }

    /// Set several channels, one inner vector per channel.
    pub fn channels(mut self, values: Vec<Vec<f64>>) -> Self {
        self.values = values;
        self
    }

    pub fn labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    pub fn build(self) -> Result<TimeSeries> {
        TimeSeries::new(self.timestamps, self.values, self.labels, self.period)
    }
}

impl TimeSeries {
    /// Create a new TimeSeries, validating ordering and channel lengths.
    pub fn new(
        timestamps: Vec<DateTime<Utc>>,
        values: Vec<Vec<f64>>,
        labels: Vec<String>,
        period: Option<Period>,
    ) -> Result<Self> {
        if timestamps.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ForecastError::TimestampError(
                "timestamps must be strictly increasing".to_string(),
            ));
        }

        for channel in &values {
            if channel.len() != timestamps.len() {
                return Err(ForecastError::DimensionMismatch {
                    expected: timestamps.len(),
                    got: channel.len(),
                });
            }
        }

        if !labels.is_empty() && labels.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: values.len(),
                got: labels.len(),
            });
        }

        Ok(Self {
            timestamps,
            values,
            labels,
            period,
        })
    }

    /// Create a simple univariate time series.
    pub fn univariate(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        Self::new(timestamps, vec![values], vec![], None)
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Number of value channels (1 for univariate).
    pub fn dimensions(&self) -> usize {
        self.values.len()
    }

    pub fn is_multivariate(&self) -> bool {
        self.values.len() > 1
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Get values for a specific channel.
    pub fn values(&self, dimension: usize) -> Result<&[f64]> {
        self.values
            .get(dimension)
            .map(|v| v.as_slice())
            .ok_or(ForecastError::IndexOutOfBounds {
                index: dimension,
                size: self.values.len(),
            })
    }

    /// Get primary (first channel) values.
    pub fn primary_values(&self) -> &[f64] {
        self.values.first().map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn values_by_dimension(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// Observation at `index` across all channels.
    pub fn row(&self, index: usize) -> Result<Vec<f64>> {
        if index >= self.len() {
            return Err(ForecastError::IndexOutOfBounds {
                index,
                size: self.len(),
            });
        }
        Ok(self.values.iter().map(|dim| dim[index]).collect())
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Label of a channel, falling back to `value` / `value_<n>` when unlabelled.
    pub fn label(&self, dimension: usize) -> String {
        match self.labels.get(dimension) {
            Some(label) => label.clone(),
            None if self.dimensions() <= 1 => "value".to_string(),
            None => format!("value_{}", dimension),
        }
    }

    /// Index of the channel with the given label.
    pub fn channel_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn set_labels(&mut self, labels: Vec<String>) -> Result<()> {
        if !labels.is_empty() && labels.len() != self.dimensions() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.dimensions(),
                got: labels.len(),
            });
        }
        self.labels = labels;
        Ok(())
    }

    pub fn period(&self) -> Option<Period> {
        self.period
    }

    pub fn set_period(&mut self, period: Period) {
        self.period = Some(period);
    }

    /// Extract observations `start..end`, keeping labels and period.
    pub fn slice(&self, start: usize, end: usize) -> Result<TimeSeries> {
        if start > end {
            return Err(ForecastError::InvalidParameter(
                "start must be <= end".to_string(),
            ));
        }
        if end > self.len() {
            return Err(ForecastError::IndexOutOfBounds {
                index: end,
                size: self.len(),
            });
        }

        Ok(TimeSeries {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self
                .values
                .iter()
                .map(|dim| dim[start..end].to_vec())
                .collect(),
            labels: self.labels.clone(),
            period: self.period,
        })
    }

    /// The last `n` observations (the whole series if shorter).
    pub fn tail(&self, n: usize) -> TimeSeries {
        let start = self.len().saturating_sub(n);
        TimeSeries {
            timestamps: self.timestamps[start..].to_vec(),
            values: self.values.iter().map(|dim| dim[start..].to_vec()).collect(),
            labels: self.labels.clone(),
            period: self.period,
        }
    }

    /// A univariate series holding one channel, labelled.
    pub fn channel(&self, dimension: usize) -> Result<TimeSeries> {
        let values = self.values(dimension)?.to_vec();
        Ok(TimeSeries {
            timestamps: self.timestamps.clone(),
            values: vec![values],
            labels: vec![self.label(dimension)],
            period: self.period,
        })
    }

    /// Check if series has missing values (NaN or Inf).
    pub fn has_missing_values(&self) -> bool {
        self.values
            .iter()
            .any(|dim| dim.iter().any(|v| !v.is_finite()))
    }

    /// Calendar year of each timestamp.
    pub fn years(&self) -> Vec<i32> {
        self.timestamps.iter().map(|t| t.year()).collect()
    }

    /// Calendar quarter (1-4) of each timestamp.
    pub fn quarters(&self) -> Vec<u32> {
        self.timestamps
            .iter()
            .map(|t| (t.month() - 1) / 3 + 1)
            .collect()
    }

    /// Labels of the `horizon` periods following the last observation.
    pub fn future_timestamps(&self, horizon: usize) -> Result<Vec<DateTime<Utc>>> {
        let period = self.period.ok_or_else(|| {
            ForecastError::FrequencyInference("series has no resampling period".to_string())
        })?;
        let last = self.timestamps.last().ok_or(ForecastError::EmptyData)?;
        Ok(period.following_labels(last, horizon))
    }

    /// Infer the period from the modal spacing between timestamps.
    pub fn infer_period(&self) -> Result<Period> {
        if self.len() < 2 {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: self.len(),
            });
        }

        let mut counts: HashMap<i64, usize> = HashMap::new();
        for w in self.timestamps.windows(2) {
            *counts.entry((w[1] - w[0]).num_days()).or_insert(0) += 1;
        }

        // Month and quarter lengths vary, so bucket spacings through Period first.
        let mut votes: HashMap<Period, usize> = HashMap::new();
        for (days, count) in counts {
            if let Some(period) = Period::from_spacing_days(days) {
                *votes.entry(period).or_insert(0) += count;
            }
        }

        let total = self.len() - 1;
        votes
            .into_iter()
            .max_by_key(|(_, count)| *count)
            .filter(|(_, count)| *count * 2 > total)
            .map(|(period, _)| period)
            .ok_or_else(|| {
                ForecastError::FrequencyInference("no dominant calendar spacing".to_string())
            })
    }
}
