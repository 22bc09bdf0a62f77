//! Positional train/validation splitting.

use crate::core::{Period, TimeSeries};
use crate::error::{ForecastError, Result};

/// A leading training segment and the trailing validation segment.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainValidationSplit {
    pub train: TimeSeries,
    pub validation: TimeSeries,
}

impl TrainValidationSplit {
    pub fn holdout(&self) -> usize {
        self.validation.len()
    }
}

/// Hold out the last `holdout` observations for validation.
///
/// Both segments must be non-empty, so `holdout` has to lie in `1..len`.
pub fn split(series: &TimeSeries, holdout: usize) -> Result<TrainValidationSplit> {
    let len = series.len();
    if holdout == 0 || holdout >= len {
        return Err(ForecastError::InvalidHoldout {
            holdout,
            len,
            max: len.saturating_sub(1),
        });
    }
    let cut = len - holdout;
    Ok(TrainValidationSplit {
        train: series.slice(0, cut)?,
        validation: series.slice(cut, len)?,
    })
}

/// Fewest training periods a model is fitted on: two full seasonal cycles,
/// and never fewer than three points.
pub fn min_train_len(period: Period) -> usize {
    (2 * period.periods_per_year()).max(3)
}

/// Largest holdout that leaves [`min_train_len`] periods to train on.
pub fn max_holdout(len: usize, period: Period) -> Option<usize> {
    len.checked_sub(min_train_len(period))
        .filter(|&max| max >= 1)
}
