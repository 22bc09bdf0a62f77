//! # forecast-explorer
//!
//! Explore and forecast a tabular time series.
//!
//! A run loads a spreadsheet or delimited file ([`io`]), sums the chosen
//! columns into calendar periods ([`transform`]), splits off a validation
//! window, fits a sampling forecaster to the training part ([`models`]) and
//! draws the median forecast with a quantile band ([`render`]). [`pipeline`]
//! wires these steps together; [`explore`] builds the exploratory chart set.
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use forecast_explorer::prelude::*;
//!
//! let start = Utc.with_ymd_and_hms(2009, 12, 31, 0, 0, 0).unwrap();
//! let mut series = TimeSeries::univariate(
//!     Period::Monthly.following_labels(&start, 120),
//!     (0..120).map(|i| i as f64).collect(),
//! )
//! .unwrap();
//! series.set_period(Period::Monthly);
//!
//! let stub = ModelSpec::new("Fixed", || Box::new(FixedSamples::new(vec![1.0, 2.0])));
//! let run = run_forecast(&series, &ForecastParams::default(), &stub).unwrap();
//! assert_eq!(run.split.train.len(), 84);
//! assert_eq!(run.forecasts[0].horizon(), 36);
//! ```

#![allow(clippy::needless_range_loop)]

pub mod config;
pub mod core;
pub mod error;
pub mod explore;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod transform;
pub mod utils;

pub use error::{ErrorCategory, ForecastError, Result};

pub mod prelude {
    pub use crate::core::{Period, QuantileBand, SampledForecast, TimeSeries};
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::{FixedSamples, Forecaster, HoltWinters, ModelSpec};
    pub use crate::pipeline::{run_forecast, ForecastParams, SeriesRequest};
    pub use crate::transform::{resample, split, EmptyPeriodPolicy};
}
