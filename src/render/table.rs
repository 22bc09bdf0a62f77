//! Terminal tables for column summaries, series, splits and forecast bands.

use crate::core::{ForecastBand, TimeSeries};
use crate::io::{ColumnSummary, RawTable};
use crate::transform::TrainValidationSplit;
use chrono::{DateTime, Utc};
use comfy_table::{Cell, CellAlignment, Table};

fn date(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%d").to_string()
}

fn number(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:.2}", v)
    }
}

/// Right-align every column after the first.
fn align_values(table: &mut Table) {
    for column in table.column_iter_mut().skip(1) {
        column.set_cell_alignment(CellAlignment::Right);
    }
}

/// Name, non-null count and kind of each column.
pub fn column_summary_table(summary: &[ColumnSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["column", "non-null", "kind"]);
    for column in summary {
        table.add_row(vec![
            Cell::new(&column.name),
            Cell::new(column.non_null),
            Cell::new(&column.kind),
        ]);
    }
    table
}

/// The raw cells of a loaded table, as read.
pub fn raw_table(raw: &RawTable) -> Table {
    let mut table = Table::new();
    table.set_header(raw.headers());
    for row in raw.rows() {
        table.add_row(row.iter().map(Cell::new));
    }
    table
}

/// The series' observations, keeping only the last `max_rows` when given.
pub fn series_table(series: &TimeSeries, max_rows: Option<usize>) -> Table {
    let mut header = vec!["date".to_string()];
    header.extend((0..series.dimensions()).map(|d| series.label(d)));
    let mut table = Table::new();
    table.set_header(header);

    let shown = match max_rows {
        Some(n) => series.tail(n),
        None => series.clone(),
    };
    for (i, t) in shown.timestamps().iter().enumerate() {
        let mut row = vec![Cell::new(date(t))];
        row.extend(
            shown
                .values_by_dimension()
                .iter()
                .map(|channel| Cell::new(number(channel[i]))),
        );
        table.add_row(row);
    }
    align_values(&mut table);
    table
}

/// Length and date range of the training and validation segments.
pub fn split_table(split: &TrainValidationSplit) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["segment", "periods", "first", "last"]);
    for (name, part) in [("train", &split.train), ("validation", &split.validation)] {
        let ts = part.timestamps();
        table.add_row(vec![
            Cell::new(name),
            Cell::new(part.len()),
            Cell::new(ts.first().map(date).unwrap_or_default()),
            Cell::new(ts.last().map(date).unwrap_or_default()),
        ]);
    }
    table
}

/// Low, median and high per forecast period, next to the held-out actuals when known.
pub fn band_table(band: &ForecastBand, actual: Option<&TimeSeries>) -> Table {
    let q = band.quantiles;
    let mut header = vec![
        "date".to_string(),
        format!("q{:.2}", q.low()),
        "median".to_string(),
        format!("q{:.2}", q.high()),
    ];
    if actual.is_some() {
        header.push("actual".to_string());
    }
    let mut table = Table::new();
    table.set_header(header);

    for (i, t) in band.timestamps.iter().enumerate() {
        let mut row = vec![
            Cell::new(date(t)),
            Cell::new(number(band.low[i])),
            Cell::new(number(band.median[i])),
            Cell::new(number(band.high[i])),
        ];
        if let Some(series) = actual {
            let observed = series
                .timestamps()
                .iter()
                .position(|s| s == t)
                .and_then(|j| series.row(j).ok())
                .and_then(|values| values.first().copied());
            row.push(Cell::new(observed.map(number).unwrap_or_default()));
        }
        table.add_row(row);
    }
    align_values(&mut table);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Period, QuantileBand, SampledForecast};
    use crate::io::ColumnKind;
    use crate::transform::split;
    use chrono::TimeZone;

    fn monthly(n: usize) -> TimeSeries {
        let start = Utc.with_ymd_and_hms(2019, 12, 31, 0, 0, 0).unwrap();
        let mut ts = TimeSeries::univariate(
            Period::Monthly.following_labels(&start, n),
            (1..=n).map(|i| i as f64 * 10.0).collect(),
        )
        .unwrap();
        ts.set_labels(vec!["Sales".into()]).unwrap();
        ts.set_period(Period::Monthly);
        ts
    }

    #[test]
    fn value_columns_are_right_aligned() {
        let text = series_table(&monthly(12), None).to_string();
        let row = text.lines().find(|l| l.contains("2020-01-31")).unwrap();
        // "10.00" is narrower than "120.00", so it is padded on the left.
        assert!(row.contains("  10.00 "), "{row}");
    }

    #[test]
    fn raw_table_shows_cells_as_read() {
        use crate::io::Cell as RawCell;
        let raw = RawTable::from_grid(
            vec![
                vec![RawCell::Text("Month".into()), RawCell::Text("Sales".into())],
                vec![RawCell::Text("2020-01-31".into()), RawCell::Number(5.0)],
                vec![RawCell::Text("2020-02-29".into()), RawCell::Empty],
            ],
            0,
        )
        .unwrap();
        let table = raw_table(&raw);
        assert_eq!(table.row_iter().count(), 2);
        let text = table.to_string();
        assert!(text.contains("Month"));
        assert!(text.contains("2020-02-29"));
    }

    #[test]
    fn summary_lists_every_column() {
        let summary = vec![
            ColumnSummary {
                name: "Month".into(),
                non_null: 120,
                kind: ColumnKind::DateTime,
            },
            ColumnSummary {
                name: "Sales".into(),
                non_null: 118,
                kind: ColumnKind::Numeric,
            },
        ];
        let text = column_summary_table(&summary).to_string();
        assert!(text.contains("Month"));
        assert!(text.contains("datetime"));
        assert!(text.contains("118"));
    }

    #[test]
    fn series_table_can_show_the_tail() {
        let table = series_table(&monthly(24), Some(3));
        assert_eq!(table.row_iter().count(), 3);
        let text = table.to_string();
        assert!(text.contains("2021-12-31"));
        assert!(text.contains("240.00"));
        assert!(!text.contains("2020-01-31"));
    }

    #[test]
    fn split_table_reports_both_segments() {
        let parts = split(&monthly(24), 6).unwrap();
        let text = split_table(&parts).to_string();
        assert!(text.contains("train"));
        assert!(text.contains("18"));
        assert!(text.contains("2021-07-31"));
    }

    #[test]
    fn band_table_joins_actuals() {
        let series = monthly(24);
        let parts = split(&series, 2).unwrap();
        let forecast = SampledForecast::new(
            parts.validation.timestamps().to_vec(),
            vec![vec![1.0, 2.0, 3.0]; 2],
        )
        .unwrap();
        let band = forecast.band(QuantileBand::default());
        let table = band_table(&band, Some(&parts.validation));
        let text = table.to_string();
        assert!(text.contains("q0.05"));
        assert!(text.contains("actual"));
        assert!(text.contains("240.00"));
    }
}
