//! One full run from a loaded table to forecast charts.
//!
//! Nothing is cached between runs: every call resamples, splits, fits and
//! samples from scratch, so a run is a pure function of its inputs (and of
//! the model's seed).

use crate::core::{ForecastBand, Period, QuantileBand, SampledForecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::io::RawTable;
use crate::models::{HoltWinters, ModelSpec};
use crate::render::{forecast_chart, Chart};
use crate::transform::{max_holdout, resample, split, EmptyPeriodPolicy, TrainValidationSplit};
use tracing::{debug, info, warn};

/// Upper bound on samples drawn per forecast period.
pub const MAX_SAMPLES: usize = 10_000;

/// Holdout used when none is given.
pub const DEFAULT_HOLDOUT: usize = 36;

/// Samples drawn per period when none is given.
pub const DEFAULT_SAMPLES: usize = 1_000;

/// Which columns to read and how to aggregate them.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRequest {
    pub time_column: String,
    pub value_columns: Vec<String>,
    pub period: Period,
    pub policy: EmptyPeriodPolicy,
    /// Keep only the last `n` table rows before aggregating.
    pub last: Option<usize>,
}

impl SeriesRequest {
    pub fn new<S: Into<String>>(
        time_column: impl Into<String>,
        value_columns: impl IntoIterator<Item = S>,
        period: Period,
    ) -> Self {
        Self {
            time_column: time_column.into(),
            value_columns: value_columns.into_iter().map(Into::into).collect(),
            period,
            policy: EmptyPeriodPolicy::default(),
            last: None,
        }
    }

    pub fn with_policy(mut self, policy: EmptyPeriodPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_last(mut self, rows: usize) -> Self {
        self.last = Some(rows);
        self
    }
}

/// Extract the requested columns and sum them into periods.
pub fn prepare_series(table: &RawTable, request: &SeriesRequest) -> Result<TimeSeries> {
    if request.value_columns.is_empty() {
        return Err(ForecastError::InvalidParameter(
            "at least one value column is required".to_string(),
        ));
    }
    let tail;
    let table = match request.last {
        Some(n) => {
            tail = table.tail(n);
            &tail
        }
        None => table,
    };
    let columns: Vec<&str> = request.value_columns.iter().map(String::as_str).collect();
    let raw = table.to_raw_series(&request.time_column, &columns)?;
    let series = resample(&raw, request.period, request.policy)?;
    info!(
        rows = raw.len(),
        periods = series.len(),
        period = %request.period,
        policy = %request.policy,
        "resampled series"
    );
    Ok(series)
}

/// Forecast controls.
///
/// Setters do not validate; [`ForecastParams::validate`] does, before any
/// work is done.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastParams {
    /// Validation length. `None` means [`DEFAULT_HOLDOUT`], reduced when the
    /// series is too short to keep two seasonal cycles for training.
    pub holdout: Option<usize>,
    pub num_samples: usize,
    pub low_quantile: f64,
    pub high_quantile: f64,
}

impl Default for ForecastParams {
    fn default() -> Self {
        let band = QuantileBand::default();
        Self {
            holdout: None,
            num_samples: DEFAULT_SAMPLES,
            low_quantile: band.low(),
            high_quantile: band.high(),
        }
    }
}

impl ForecastParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_holdout(mut self, holdout: usize) -> Self {
        self.holdout = Some(holdout);
        self
    }

    pub fn with_num_samples(mut self, num_samples: usize) -> Self {
        self.num_samples = num_samples;
        self
    }

    pub fn with_quantiles(mut self, low: f64, high: f64) -> Self {
        self.low_quantile = low;
        self.high_quantile = high;
        self
    }

    /// The validated quantile band.
    pub fn band(&self) -> Result<QuantileBand> {
        QuantileBand::new(self.low_quantile, self.high_quantile)
    }

    /// Check sample count and quantiles. The holdout is checked against the
    /// series when the run splits it.
    pub fn validate(&self) -> Result<QuantileBand> {
        if self.num_samples == 0 || self.num_samples > MAX_SAMPLES {
            return Err(ForecastError::InvalidSampleCount {
                got: self.num_samples,
                max: MAX_SAMPLES,
            });
        }
        self.band()
    }

    /// Holdout to use for a series of `len` periods.
    pub fn holdout_for(&self, len: usize, period: Period) -> usize {
        match self.holdout {
            Some(h) => h,
            None => match max_holdout(len, period) {
                Some(max) if max < DEFAULT_HOLDOUT => {
                    warn!(max, "series too short for the default holdout, reducing it");
                    max
                }
                _ => DEFAULT_HOLDOUT,
            },
        }
    }
}

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct ForecastRun {
    pub model: String,
    pub series: TimeSeries,
    pub split: TrainValidationSplit,
    /// One forecast per channel, in channel order.
    pub forecasts: Vec<SampledForecast>,
    pub bands: Vec<ForecastBand>,
    pub chart: Chart,
}

/// Split, fit one model per channel and sample over the validation window.
///
/// Every channel gets a fresh model from `model` that sees only its training
/// segment.
pub fn run_forecast(
    series: &TimeSeries,
    params: &ForecastParams,
    model: &ModelSpec,
) -> Result<ForecastRun> {
    let band = params.validate()?;
    let period = match series.period() {
        Some(p) => p,
        None => series.infer_period()?,
    };
    let holdout = params.holdout_for(series.len(), period);
    let parts = split(series, holdout)?;
    info!(
        train = parts.train.len(),
        validation = parts.validation.len(),
        "split series"
    );

    let horizon = parts.validation.len();
    let mut forecasts = Vec::with_capacity(series.dimensions());
    for channel in 0..series.dimensions() {
        let training = parts.train.channel(channel)?;
        let mut forecaster = model.create();
        forecaster.fit(&training)?;
        let forecast = forecaster.predict(horizon, params.num_samples)?;
        debug!(
            model = forecaster.name(),
            channel = %training.label(0),
            horizon,
            samples = params.num_samples,
            "sampled forecast"
        );
        forecasts.push(forecast);
    }

    let bands = forecasts.iter().map(|f| f.band(band)).collect();
    let chart = forecast_chart(series, &forecasts, band)
        .with_title(format!("{} forecast, {} periods held out", model.name, horizon));

    Ok(ForecastRun {
        model: model.name.to_string(),
        series: series.clone(),
        split: parts,
        forecasts,
        bands,
        chart,
    })
}

/// Load columns from a table and forecast them in one go.
pub fn run(
    table: &RawTable,
    request: &SeriesRequest,
    params: &ForecastParams,
    model: &ModelSpec,
) -> Result<ForecastRun> {
    // Reject bad controls before touching the data.
    params.validate()?;
    let series = prepare_series(table, request)?;
    run_forecast(&series, params, model)
}

/// Holt-Winters with parameters fitted per run, optionally seeded.
pub fn holt_winters(seed: Option<u64>) -> ModelSpec {
    ModelSpec::new("HoltWinters", move || {
        let model = HoltWinters::auto();
        Box::new(match seed {
            Some(seed) => model.with_seed(seed),
            None => model,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::io::Cell;
    use crate::models::FixedSamples;
    use chrono::{TimeZone, Utc};

    fn monthly(n: usize, channels: usize) -> TimeSeries {
        let start = Utc.with_ymd_and_hms(2009, 12, 31, 0, 0, 0).unwrap();
        let values = (0..channels)
            .map(|c| (0..n).map(|i| (i + c * 1000) as f64).collect())
            .collect();
        let labels = (0..channels).map(|c| format!("ch{}", c)).collect();
        TimeSeries::new(
            Period::Monthly.following_labels(&start, n),
            values,
            labels,
            Some(Period::Monthly),
        )
        .unwrap()
    }

    fn fixed() -> ModelSpec {
        ModelSpec::new("Fixed", || Box::new(FixedSamples::new(vec![1.0, 2.0, 3.0, 4.0])))
    }

    #[test]
    fn ten_years_monthly_with_default_holdout() {
        let run = run_forecast(&monthly(120, 1), &ForecastParams::default(), &fixed()).unwrap();
        assert_eq!(run.split.train.len(), 84);
        assert_eq!(run.split.validation.len(), 36);
        assert_eq!(run.forecasts.len(), 1);
        assert_eq!(run.forecasts[0].horizon(), 36);
        assert_eq!(run.forecasts[0].num_samples(), 1000);
        assert_eq!(
            run.forecasts[0].timestamps(),
            run.split.validation.timestamps()
        );
    }

    #[test]
    fn default_holdout_shrinks_for_short_series() {
        let params = ForecastParams::default();
        assert_eq!(params.holdout_for(120, Period::Monthly), 36);
        assert_eq!(params.holdout_for(40, Period::Monthly), 16);
        // Nothing to shrink to; the split reports the problem.
        assert_eq!(params.holdout_for(20, Period::Monthly), 36);
        assert_eq!(params.with_holdout(50).holdout_for(40, Period::Monthly), 50);
    }

    #[test]
    fn short_yearly_series_fits_with_default_controls() {
        let start = Utc.with_ymd_and_hms(2009, 12, 31, 0, 0, 0).unwrap();
        let series = TimeSeries::new(
            Period::Yearly.following_labels(&start, 10),
            vec![(0..10).map(|i| 200.0 + 15.0 * i as f64).collect()],
            vec!["Sales".into()],
            Some(Period::Yearly),
        )
        .unwrap();
        let params = ForecastParams::new().with_num_samples(50);
        assert_eq!(params.holdout_for(10, Period::Yearly), 7);

        let run = run_forecast(&series, &params, &holt_winters(Some(1))).unwrap();
        assert_eq!(run.split.train.len(), 3);
        assert_eq!(run.split.validation.len(), 7);
        assert_eq!(run.forecasts[0].horizon(), 7);
    }

    #[test]
    fn explicit_holdout_is_checked_by_split() {
        let series = monthly(24, 1);
        for holdout in [0, 24] {
            let err = run_forecast(&series, &ForecastParams::new().with_holdout(holdout), &fixed())
                .unwrap_err();
            assert_eq!(err.category(), ErrorCategory::Parameter);
        }
    }

    #[test]
    fn bad_controls_are_rejected_before_fitting() {
        let series = monthly(48, 1);
        let err = run_forecast(
            &series,
            &ForecastParams::new().with_quantiles(0.9, 0.1),
            &fixed(),
        )
        .unwrap_err();
        assert!(matches!(err, ForecastError::InvalidQuantileBand { .. }));

        for samples in [0, MAX_SAMPLES + 1] {
            let err = run_forecast(
                &series,
                &ForecastParams::new().with_num_samples(samples),
                &fixed(),
            )
            .unwrap_err();
            assert!(matches!(err, ForecastError::InvalidSampleCount { .. }));
        }
    }

    #[test]
    fn each_channel_gets_its_own_forecast() {
        let run = run_forecast(
            &monthly(48, 2),
            &ForecastParams::new().with_holdout(6).with_num_samples(10),
            &fixed(),
        )
        .unwrap();
        assert_eq!(run.forecasts.len(), 2);
        assert_eq!(run.forecasts[1].label(), "ch1");
        assert_eq!(run.bands.len(), 2);
        assert!(run.bands[0].low.iter().zip(&run.bands[0].high).all(|(l, h)| l <= h));
        assert_eq!(run.model, "Fixed");
    }

    #[test]
    fn table_to_forecast() {
        let rows = (0..36)
            .map(|i| {
                let month = i % 12 + 1;
                let year = 2018 + i / 12;
                vec![
                    Cell::Text(format!("{}-{:02}-15", year, month)),
                    Cell::Number(100.0 + i as f64),
                ]
            })
            .collect();
        let table = RawTable::new(vec!["Month".into(), "Sales".into()], rows);
        let request = SeriesRequest::new("Month", ["Sales"], Period::Monthly).with_last(24);
        let run = run(
            &table,
            &request,
            &ForecastParams::new().with_holdout(12).with_num_samples(5),
            &fixed(),
        )
        .unwrap();
        assert_eq!(run.series.len(), 24);
        assert_eq!(run.series.label(0), "Sales");
        assert_eq!(run.split.train.len(), 12);
        assert_eq!(
            run.forecasts[0].timestamps()[0],
            Utc.with_ymd_and_hms(2020, 1, 31, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn missing_value_columns_are_rejected() {
        let table = RawTable::new(vec!["Month".into()], vec![]);
        let request = SeriesRequest::new("Month", Vec::<String>::new(), Period::Monthly);
        assert!(matches!(
            prepare_series(&table, &request),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn seeded_holt_winters_is_reproducible() {
        let series = {
            let start = Utc.with_ymd_and_hms(2009, 12, 31, 0, 0, 0).unwrap();
            let values = (0..60)
                .map(|i| 50.0 + i as f64 + 5.0 * ((i % 12) as f64).sin())
                .collect();
            let mut ts =
                TimeSeries::univariate(Period::Monthly.following_labels(&start, 60), values)
                    .unwrap();
            ts.set_period(Period::Monthly);
            ts
        };
        let params = ForecastParams::new().with_holdout(12).with_num_samples(50);
        let a = run_forecast(&series, &params, &holt_winters(Some(3))).unwrap();
        let b = run_forecast(&series, &params, &holt_winters(Some(3))).unwrap();
        assert_eq!(a.forecasts[0].samples(), b.forecasts[0].samples());
        assert_eq!(a.model, "HoltWinters");
    }
}
