//! Raw observations before resampling.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};

/// Timestamped rows in file order. Timestamps may repeat or be unsorted,
/// and missing values are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeries {
    timestamps: Vec<DateTime<Utc>>,
    /// values[channel][row]
    values: Vec<Vec<f64>>,
    labels: Vec<String>,
}

impl RawSeries {
    pub fn new(
        timestamps: Vec<DateTime<Utc>>,
        values: Vec<Vec<f64>>,
        labels: Vec<String>,
    ) -> Result<Self> {
        if values.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "at least one value column is required".to_string(),
            ));
        }
        if labels.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: values.len(),
                got: labels.len(),
            });
        }
        for channel in &values {
            if channel.len() != timestamps.len() {
                return Err(ForecastError::DimensionMismatch {
                    expected: timestamps.len(),
                    got: channel.len(),
                });
            }
        }
        Ok(Self {
            timestamps,
            values,
            labels,
        })
    }

    /// Single unlabelled channel, convenient for tests and small inputs.
    pub fn univariate(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        Self::new(timestamps, vec![values], vec!["value".to_string()])
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.values.len()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn values_by_dimension(&self) -> &[Vec<f64>] {
        &self.values
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn raw_series_accepts_unsorted_and_duplicate_rows() {
        let t = Utc.with_ymd_and_hms(2020, 1, 5, 0, 0, 0).unwrap();
        let raw = RawSeries::univariate(
            vec![t, t, t - chrono::Duration::days(3)],
            vec![1.0, 2.0, f64::NAN],
        )
        .unwrap();
        assert_eq!(raw.len(), 3);
        assert_eq!(raw.dimensions(), 1);
    }

    #[test]
    fn raw_series_validates_shapes() {
        let t = Utc.with_ymd_and_hms(2020, 1, 5, 0, 0, 0).unwrap();
        assert!(RawSeries::new(vec![t], vec![], vec![]).is_err());
        assert!(RawSeries::new(vec![t], vec![vec![1.0, 2.0]], vec!["a".into()]).is_err());
        assert!(RawSeries::new(vec![t], vec![vec![1.0]], vec![]).is_err());
    }
}
