//! Calendar pivots used by the heatmap and grouped charts.

use crate::core::TimeSeries;
use crate::error::Result;
use chrono::Datelike;
use std::collections::BTreeMap;

/// Sums of one channel laid out as years (rows) by quarters (columns).
#[derive(Debug, Clone, PartialEq)]
pub struct YearQuarterPivot {
    pub label: String,
    pub years: Vec<i32>,
    /// cells[year_index][quarter - 1]; NaN where no observation fell.
    pub cells: Vec<[f64; 4]>,
}

impl YearQuarterPivot {
    /// Cell for a given year and quarter (1-4).
    pub fn get(&self, year: i32, quarter: u32) -> Option<f64> {
        let row = self.years.iter().position(|&y| y == year)?;
        let col = (quarter as usize).checked_sub(1)?;
        self.cells[row].get(col).copied()
    }

    /// Values of one quarter across all years.
    pub fn quarter_column(&self, quarter: u32) -> Vec<f64> {
        let col = (quarter.clamp(1, 4) - 1) as usize;
        self.cells.iter().map(|row| row[col]).collect()
    }
}

/// Group a channel by (year, quarter) and sum.
///
/// NaN observations are skipped; a cell with no finite observation is NaN,
/// leaving an empty square in the heatmap.
pub fn pivot_year_quarter(series: &TimeSeries, channel: usize) -> Result<YearQuarterPivot> {
    let values = series.values(channel)?;
    let mut sums: BTreeMap<i32, [Option<f64>; 4]> = BTreeMap::new();

    for (t, &v) in series.timestamps().iter().zip(values) {
        let quarter = ((t.month() - 1) / 3) as usize;
        let row = sums.entry(t.year()).or_insert([None; 4]);
        if !v.is_nan() {
            *row[quarter].get_or_insert(0.0) += v;
        }
    }

    let years = sums.keys().copied().collect();
    let cells = sums
        .values()
        .map(|row| row.map(|cell| cell.unwrap_or(f64::NAN)))
        .collect();

    Ok(YearQuarterPivot {
        label: series.label(channel),
        years,
        cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Period;
    use chrono::{TimeZone, Utc};

    #[test]
    fn pivots_monthly_sums_into_quarters() {
        let start = Utc.with_ymd_and_hms(2019, 12, 31, 0, 0, 0).unwrap();
        // 2020-01 .. 2021-03
        let timestamps = Period::Monthly.following_labels(&start, 15);
        let series = TimeSeries::univariate(timestamps, vec![1.0; 15]).unwrap();

        let pivot = pivot_year_quarter(&series, 0).unwrap();
        assert_eq!(pivot.years, vec![2020, 2021]);
        assert_eq!(pivot.cells[0], [3.0, 3.0, 3.0, 3.0]);
        assert_eq!(pivot.get(2021, 1), Some(3.0));
        assert!(pivot.get(2021, 2).unwrap().is_nan());
        assert_eq!(pivot.get(2022, 1), None);
        assert_eq!(pivot.quarter_column(1), vec![3.0, 3.0]);
        assert_eq!(pivot.label, "value");
    }

    #[test]
    fn unknown_channel_is_an_error() {
        let t = Utc.with_ymd_and_hms(2020, 1, 31, 0, 0, 0).unwrap();
        let series = TimeSeries::univariate(vec![t], vec![1.0]).unwrap();
        assert!(pivot_year_quarter(&series, 3).is_err());
    }
}
