//! Deterministic stand-in forecaster.

use crate::core::{Period, SampledForecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use chrono::{DateTime, Utc};

/// Returns the same configured samples for every forecast period.
///
/// The configured values are cycled (or cut short) to the requested number of
/// samples, so forecasts are fully predictable in tests.
#[derive(Debug, Clone)]
pub struct FixedSamples {
    values: Vec<f64>,
    fitted: Option<(DateTime<Utc>, Period, String)>,
}

impl FixedSamples {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            fitted: None,
        }
    }

    /// A single repeated value.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl Forecaster for FixedSamples {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        if self.values.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "fixed samples must not be empty".to_string(),
            ));
        }
        let last = *series.timestamps().last().ok_or(ForecastError::EmptyData)?;
        let period = match series.period() {
            Some(p) => p,
            None => series.infer_period()?,
        };
        self.fitted = Some((last, period, series.label(0)));
        Ok(())
    }

    fn predict(&self, horizon: usize, num_samples: usize) -> Result<SampledForecast> {
        let (last, period, label) = self.fitted.as_ref().ok_or(ForecastError::FitRequired)?;
        if num_samples == 0 {
            return Err(ForecastError::InvalidParameter(
                "at least one sample is required".to_string(),
            ));
        }
        let draws: Vec<f64> = self.values.iter().copied().cycle().take(num_samples).collect();
        let timestamps = period.following_labels(last, horizon);
        Ok(SampledForecast::new(timestamps, vec![draws; horizon])?.with_label(label.clone()))
    }

    fn name(&self) -> &str {
        "FixedSamples"
    }

    fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn quarterly(n: usize) -> TimeSeries {
        let start = Utc.with_ymd_and_hms(2019, 12, 31, 0, 0, 0).unwrap();
        let mut ts = TimeSeries::univariate(
            Period::Quarterly.following_labels(&start, n),
            vec![1.0; n],
        )
        .unwrap();
        ts.set_period(Period::Quarterly);
        ts
    }

    #[test]
    fn cycles_samples_to_requested_count() {
        let mut model = FixedSamples::new(vec![1.0, 2.0, 3.0]);
        model.fit(&quarterly(8)).unwrap();

        let forecast = model.predict(2, 5).unwrap();
        assert_eq!(forecast.step(0).unwrap(), &[1.0, 2.0, 3.0, 1.0, 2.0]);
        assert_eq!(forecast.step(1).unwrap(), &[1.0, 2.0, 3.0, 1.0, 2.0]);
        assert_eq!(
            forecast.timestamps(),
            &[
                Utc.with_ymd_and_hms(2022, 3, 31, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2022, 6, 30, 0, 0, 0).unwrap(),
            ]
        );
    }

    #[test]
    fn truncates_when_fewer_samples_requested() {
        let mut model = FixedSamples::new(vec![4.0, 5.0, 6.0]);
        model.fit(&quarterly(4)).unwrap();
        assert_eq!(model.predict(1, 2).unwrap().step(0).unwrap(), &[4.0, 5.0]);
    }

    #[test]
    fn infers_period_when_series_has_none() {
        let start = Utc.with_ymd_and_hms(2019, 12, 31, 0, 0, 0).unwrap();
        let ts = TimeSeries::univariate(Period::Monthly.following_labels(&start, 6), vec![0.0; 6])
            .unwrap();
        let mut model = FixedSamples::constant(1.0);
        model.fit(&ts).unwrap();
        assert_eq!(
            model.predict(1, 1).unwrap().timestamps()[0],
            Utc.with_ymd_and_hms(2020, 7, 31, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn empty_configuration_is_rejected() {
        let mut model = FixedSamples::new(vec![]);
        assert!(model.fit(&quarterly(4)).is_err());
        assert!(!model.is_fitted());
        assert_eq!(model.predict(1, 1).unwrap_err(), ForecastError::FitRequired);
    }
}
