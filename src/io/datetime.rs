//! Date/time parsing for time columns.

use crate::core::SUPPORTED_YEARS;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d-%b-%Y",
];

/// Month-only forms, parsed by prefixing day 1.
const MONTH_FORMATS: &[&str] = &["%Y-%m", "%Y/%m", "%b %Y", "%B %Y", "%b-%Y"];

/// Largest serial number Excel represents (9999-12-31).
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Parse a textual date or date-time into UTC.
///
/// Offsets are honoured for RFC 3339 input; everything else is taken as UTC.
/// Month-only input (`2020-03`, `Mar 2020`) lands on the first of the month
/// and a bare four-digit year on January 1. Years outside
/// [`SUPPORTED_YEARS`] are rejected.
pub fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    parse_any_year(text).filter(|t| SUPPORTED_YEARS.contains(&t.year()))
}

fn parse_any_year(text: &str) -> Option<DateTime<Utc>> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&dt));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(midnight(d));
        }
    }
    for fmt in MONTH_FORMATS {
        let with_day = format!("1 {}", s);
        let fmt = format!("%d {}", fmt);
        if let Ok(d) = NaiveDate::parse_from_str(&with_day, &fmt) {
            return Some(midnight(d));
        }
    }
    if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
        let year: i32 = s.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1).map(midnight);
    }
    None
}

/// Convert an Excel serial day number (1900 date system) to UTC.
pub fn excel_serial_to_datetime(serial: f64) -> Option<DateTime<Utc>> {
    excel_serial_to_naive(serial).map(|dt| Utc.from_utc_datetime(&dt))
}

/// Convert an Excel serial day number to a naive date-time.
///
/// Day 0 is 1899-12-30, which absorbs Excel's fictitious 1900-02-29 for
/// every date after February 1900.
pub fn excel_serial_to_naive(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_time(NaiveTime::default());
    let days = serial.trunc();
    let seconds = ((serial - days) * 86_400.0).round() as i64;
    Some(epoch + Duration::days(days as i64) + Duration::seconds(seconds))
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}
