//! Calendar periods with explicit boundary rules.
//!
//! A [`Period`] never relies on ambient date-library offsets: every timestamp
//! maps to exactly one [`PeriodBucket`] whose inclusive `start..=end` range and
//! label follow the period's [`Anchor`].

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Deserialize;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Calendar years a timestamp may fall in to be bucketed or parsed.
pub const SUPPORTED_YEARS: RangeInclusive<i32> = 1..=9999;

/// Boundary rule of a period. Buckets are labelled by their last day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// Monday through Sunday, labelled by the Sunday.
    WeekEndingSunday,
    /// Calendar month, labelled by its last day.
    MonthEnd,
    /// Calendar quarter (Jan-Mar, Apr-Jun, Jul-Sep, Oct-Dec), labelled by its last day.
    QuarterEnd,
    /// Calendar year, labelled by December 31.
    YearEnd,
}

/// Resampling period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Period {
    pub const ALL: [Period; 4] = [
        Period::Weekly,
        Period::Monthly,
        Period::Quarterly,
        Period::Yearly,
    ];

    pub fn anchor(&self) -> Anchor {
        match self {
            Period::Weekly => Anchor::WeekEndingSunday,
            Period::Monthly => Anchor::MonthEnd,
            Period::Quarterly => Anchor::QuarterEnd,
            Period::Yearly => Anchor::YearEnd,
        }
    }

    /// Number of periods in one year; also the natural seasonal cycle length.
    pub fn periods_per_year(&self) -> usize {
        match self {
            Period::Weekly => 52,
            Period::Monthly => 12,
            Period::Quarterly => 4,
            Period::Yearly => 1,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
            Period::Quarterly => "quarterly",
            Period::Yearly => "yearly",
        }
    }

    /// The bucket containing `date`.
    pub fn bucket(&self, date: NaiveDate) -> PeriodBucket {
        let anchor = self.anchor();
        let (start, end) = match anchor {
            Anchor::WeekEndingSunday => {
                let offset = u64::from(date.weekday().num_days_from_monday());
                let start = date.checked_sub_days(Days::new(offset)).unwrap_or(NaiveDate::MIN);
                let end = start.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX);
                (start, end)
            }
            Anchor::MonthEnd => (
                ymd(date.year(), date.month(), 1),
                ymd(
                    date.year(),
                    date.month(),
                    days_in_month(date.year(), date.month()),
                ),
            ),
            Anchor::QuarterEnd => {
                let first_month = (date.month() - 1) / 3 * 3 + 1;
                let last_month = first_month + 2;
                (
                    ymd(date.year(), first_month, 1),
                    ymd(
                        date.year(),
                        last_month,
                        days_in_month(date.year(), last_month),
                    ),
                )
            }
            Anchor::YearEnd => (ymd(date.year(), 1, 1), ymd(date.year(), 12, 31)),
        };
        PeriodBucket { start, end, anchor }
    }

    /// The bucket containing a UTC timestamp.
    pub fn bucket_of(&self, timestamp: &DateTime<Utc>) -> PeriodBucket {
        self.bucket(timestamp.date_naive())
    }

    /// Labels of the `count` periods following the one containing `last`.
    pub fn following_labels(&self, last: &DateTime<Utc>, count: usize) -> Vec<DateTime<Utc>> {
        let mut bucket = self.bucket_of(last);
        (0..count)
            .map(|_| {
                bucket = bucket.next();
                bucket.label()
            })
            .collect()
    }

    /// Guess the period from a typical spacing between labels, in days.
    pub fn from_spacing_days(days: i64) -> Option<Period> {
        match days {
            7 => Some(Period::Weekly),
            28..=31 => Some(Period::Monthly),
            89..=92 => Some(Period::Quarterly),
            365 | 366 => Some(Period::Yearly),
            _ => None,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Period {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "w" | "week" | "weekly" => Ok(Period::Weekly),
            "m" | "month" | "monthly" => Ok(Period::Monthly),
            "q" | "quarter" | "quarterly" => Ok(Period::Quarterly),
            "a" | "y" | "year" | "yearly" | "annual" => Ok(Period::Yearly),
            other => Err(ForecastError::InvalidParameter(format!(
                "unknown period '{}' (expected weekly, monthly, quarterly or yearly)",
                other
            ))),
        }
    }
}

/// One period: inclusive calendar range plus the anchor that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeriodBucket {
    start: NaiveDate,
    end: NaiveDate,
    anchor: Anchor,
}

impl PeriodBucket {
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Timestamp used for the bucket in a resampled series: its last day at midnight UTC.
    pub fn label(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.end.and_time(NaiveTime::default()))
    }

    /// The bucket immediately after this one.
    pub fn next(&self) -> PeriodBucket {
        let period = match self.anchor {
            Anchor::WeekEndingSunday => Period::Weekly,
            Anchor::MonthEnd => Period::Monthly,
            Anchor::QuarterEnd => Period::Quarterly,
            Anchor::YearEnd => Period::Yearly,
        };
        period.bucket(self.end.succ_opt().unwrap_or(self.end))
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

// Saturates at the end of chrono's representable range.
fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MAX)
}
