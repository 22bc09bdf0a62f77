//! Reshaping of loaded data ahead of charting and forecasting.
//!
//! Raw observations are summed into calendar periods, split positionally
//! into training and validation segments, and pivoted by year and quarter.
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use forecast_explorer::core::{Period, RawSeries};
//! use forecast_explorer::transform::{resample, EmptyPeriodPolicy};
//!
//! let raw = RawSeries::univariate(
//!     vec![
//!         Utc.with_ymd_and_hms(2020, 1, 5, 0, 0, 0).unwrap(),
//!         Utc.with_ymd_and_hms(2020, 1, 20, 0, 0, 0).unwrap(),
//!         Utc.with_ymd_and_hms(2020, 2, 10, 0, 0, 0).unwrap(),
//!     ],
//!     vec![10.0, 5.0, 7.0],
//! )
//! .unwrap();
//!
//! let monthly = resample(&raw, Period::Monthly, EmptyPeriodPolicy::Zero).unwrap();
//! assert_eq!(monthly.primary_values(), &[15.0, 7.0]);
//! ```

pub mod pivot;
pub mod resample;
pub mod split;

pub use pivot::{pivot_year_quarter, YearQuarterPivot};
pub use resample::{resample, resample_series, EmptyPeriodPolicy};
pub use split::{max_holdout, min_train_len, split, TrainValidationSplit};
