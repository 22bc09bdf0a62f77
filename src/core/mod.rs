//! Core data structures for time series exploration and forecasting.

mod forecast;
mod period;
mod raw;
mod time_series;

pub use forecast::{ForecastBand, QuantileBand, SampledForecast};
pub use period::{Anchor, Period, PeriodBucket, SUPPORTED_YEARS};
pub use raw::RawSeries;
pub use time_series::{TimeSeries, TimeSeriesBuilder};
