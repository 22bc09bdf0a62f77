//! Aggregation of raw observations into calendar periods.

use crate::core::{Period, PeriodBucket, RawSeries, TimeSeries, SUPPORTED_YEARS};
use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Value given to a period that received no finite observations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyPeriodPolicy {
    /// An empty sum: the period reads 0.
    #[default]
    Zero,
    /// The period reads NaN and models refuse to fit across it.
    Missing,
}

impl EmptyPeriodPolicy {
    fn fill(self) -> f64 {
        match self {
            EmptyPeriodPolicy::Zero => 0.0,
            EmptyPeriodPolicy::Missing => f64::NAN,
        }
    }
}

impl fmt::Display for EmptyPeriodPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyPeriodPolicy::Zero => f.write_str("zero"),
            EmptyPeriodPolicy::Missing => f.write_str("missing"),
        }
    }
}

impl FromStr for EmptyPeriodPolicy {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero" | "0" => Ok(EmptyPeriodPolicy::Zero),
            "missing" | "nan" => Ok(EmptyPeriodPolicy::Missing),
            other => Err(ForecastError::InvalidParameter(format!(
                "unknown empty-period policy '{}' (expected zero or missing)",
                other
            ))),
        }
    }
}

/// Running sum and number of finite contributions for one channel of one period.
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

/// Sum raw observations per period.
///
/// The result is sorted by period and has one entry for every period between
/// the first and the last observation, whatever order the rows came in. NaN
/// observations are skipped; a period with nothing to sum is filled according
/// to `policy`.
pub fn resample(raw: &RawSeries, period: Period, policy: EmptyPeriodPolicy) -> Result<TimeSeries> {
    aggregate(
        raw.timestamps().iter().map(|t| t.date_naive()),
        raw.values_by_dimension(),
        raw.labels().to_vec(),
        period,
        policy,
    )
}

/// Resample an existing series, e.g. a monthly series to quarters.
///
/// Applying this to a series already resampled at `period` with the same
/// policy returns it unchanged.
pub fn resample_series(
    series: &TimeSeries,
    period: Period,
    policy: EmptyPeriodPolicy,
) -> Result<TimeSeries> {
    let labels = (0..series.dimensions()).map(|d| series.label(d)).collect();
    aggregate(
        series.timestamps().iter().map(|t| t.date_naive()),
        series.values_by_dimension(),
        labels,
        period,
        policy,
    )
}

fn aggregate(
    dates: impl Iterator<Item = NaiveDate>,
    channels: &[Vec<f64>],
    labels: Vec<String>,
    period: Period,
    policy: EmptyPeriodPolicy,
) -> Result<TimeSeries> {
    let width = channels.len();
    let mut buckets: BTreeMap<NaiveDate, (PeriodBucket, Vec<Accumulator>)> = BTreeMap::new();
    let mut rows = 0usize;

    for (row, date) in dates.enumerate() {
        rows += 1;
        if !SUPPORTED_YEARS.contains(&date.year()) {
            return Err(ForecastError::TimestampError(format!(
                "observation {}: {} is outside years {} to {}",
                row + 1,
                date,
                SUPPORTED_YEARS.start(),
                SUPPORTED_YEARS.end()
            )));
        }
        let bucket = period.bucket(date);
        let (_, acc) = buckets
            .entry(bucket.end())
            .or_insert_with(|| (bucket, vec![Accumulator::default(); width]));
        for (channel, values) in channels.iter().enumerate() {
            let v = values[row];
            if !v.is_nan() {
                acc[channel].sum += v;
                acc[channel].count += 1;
            }
        }
    }

    let (first, last) = match (buckets.values().next(), buckets.values().next_back()) {
        (Some((first, _)), Some((last, _))) => (*first, *last),
        _ => return Err(ForecastError::EmptyData),
    };

    let mut timestamps = Vec::new();
    let mut values: Vec<Vec<f64>> = vec![Vec::new(); width];
    let mut bucket = first;
    let mut empty_periods = 0usize;
    loop {
        timestamps.push(bucket.label());
        match buckets.get(&bucket.end()) {
            Some((_, acc)) => {
                for (channel, a) in acc.iter().enumerate() {
                    values[channel].push(if a.count > 0 { a.sum } else { policy.fill() });
                }
            }
            None => {
                empty_periods += 1;
                for channel in values.iter_mut() {
                    channel.push(policy.fill());
                }
            }
        }
        if bucket.end() >= last.end() {
            break;
        }
        bucket = bucket.next();
    }

    debug!(
        %period,
        rows,
        periods = timestamps.len(),
        empty_periods,
        %policy,
        "resampled observations"
    );

    TimeSeries::new(timestamps, values, labels, Some(period))
}
