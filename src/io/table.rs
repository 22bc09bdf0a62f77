//! Tabular data as read from a file, before any typing of columns.

use crate::core::RawSeries;
use crate::error::{ForecastError, Result};
use crate::io::datetime::{excel_serial_to_datetime, parse_datetime};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::fmt;

/// One cell of a loaded table.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl Cell {
    /// Text cell, or `Empty` for blank input.
    pub fn text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Cell::DateTime(dt) => Some(Utc.from_utc_datetime(dt)),
            Cell::Number(serial) => excel_serial_to_datetime(*serial),
            Cell::Text(s) => parse_datetime(s),
            Cell::Empty => None,
        }
    }

    /// Numeric value; `Ok(None)` for empty cells, `Err(())` when not coercible.
    fn as_number(&self) -> std::result::Result<Option<f64>, ()> {
        match self {
            Cell::Empty => Ok(None),
            Cell::Number(v) => Ok(Some(*v)),
            Cell::Text(s) => s.replace(',', "").trim().parse::<f64>().map(Some).map_err(|_| ()),
            Cell::DateTime(_) => Err(()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(v) => write!(f, "{}", v),
            Cell::Text(s) => f.write_str(s),
            Cell::DateTime(dt) => write!(f, "{}", dt),
        }
    }
}

/// Inferred type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    DateTime,
    Numeric,
    Text,
    Empty,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnKind::DateTime => "datetime",
            ColumnKind::Numeric => "numeric",
            ColumnKind::Text => "text",
            ColumnKind::Empty => "empty",
        };
        f.write_str(name)
    }
}

/// Name, non-null count and inferred kind of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub non_null: usize,
    pub kind: ColumnKind,
}

/// Named columns with rows of cells; every row has one cell per header.
///
/// Each data row remembers its 1-based row number in the source, so errors
/// point at the line a user sees in their file or sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
    row_numbers: Vec<usize>,
}

impl RawTable {
    /// A table whose header is row 1 and whose data starts on row 2.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let row_numbers = (2..rows.len() + 2).collect();
        Self::with_row_numbers(headers, rows, row_numbers)
    }

    fn with_row_numbers(
        headers: Vec<String>,
        rows: Vec<Vec<Cell>>,
        row_numbers: Vec<usize>,
    ) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();
        Self {
            headers,
            rows,
            row_numbers,
        }
    }

    /// Build a table from raw grid rows, taking the header from row `header_row`.
    ///
    /// Grid rows are numbered from 1 in order. Rows above the header are
    /// discarded, as are fully blank rows below it.
    pub fn from_grid(grid: Vec<Vec<Cell>>, header_row: usize) -> Result<Self> {
        Self::from_numbered_grid(
            grid.into_iter().enumerate().map(|(i, row)| (i + 1, row)).collect(),
            header_row,
        )
    }

    /// Like [`RawTable::from_grid`], with each grid row tagged by its source row number.
    pub fn from_numbered_grid(grid: Vec<(usize, Vec<Cell>)>, header_row: usize) -> Result<Self> {
        let mut rows = grid.into_iter().skip(header_row);
        let (_, header) = rows.next().ok_or(ForecastError::NoRows)?;
        let headers: Vec<String> = header
            .iter()
            .enumerate()
            .map(|(i, cell)| match cell {
                Cell::Empty => format!("column_{}", i),
                other => other.to_string(),
            })
            .collect();
        let (row_numbers, rows): (Vec<usize>, Vec<Vec<Cell>>) = rows
            .filter(|(_, row)| row.iter().any(|c| !c.is_empty()))
            .unzip();
        Ok(Self::with_row_numbers(headers, rows, row_numbers))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Source row number of data row `index`.
    pub fn row_number(&self, index: usize) -> Option<usize> {
        self.row_numbers.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ForecastError::ColumnNotFound(name.to_string()))
    }

    /// Keep only the given columns, renaming each `(source, alias)` pair.
    pub fn select(&self, columns: &[(&str, &str)]) -> Result<RawTable> {
        let indices = columns
            .iter()
            .map(|(source, _)| self.column_index(source))
            .collect::<Result<Vec<_>>>()?;
        let headers = columns.iter().map(|(_, alias)| alias.to_string()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(RawTable::with_row_numbers(headers, rows, self.row_numbers.clone()))
    }

    /// The last `n` rows.
    pub fn tail(&self, n: usize) -> RawTable {
        let start = self.rows.len().saturating_sub(n);
        RawTable {
            headers: self.headers.clone(),
            rows: self.rows[start..].to_vec(),
            row_numbers: self.row_numbers[start..].to_vec(),
        }
    }

    /// Non-null count and inferred kind of every column.
    pub fn column_summary(&self) -> Vec<ColumnSummary> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let cells: Vec<&Cell> = self
                    .rows
                    .iter()
                    .map(|row| &row[i])
                    .filter(|c| !c.is_empty())
                    .collect();
                let kind = if cells.is_empty() {
                    ColumnKind::Empty
                } else if cells.iter().all(|c| c.as_number().is_ok()) {
                    ColumnKind::Numeric
                } else if cells
                    .iter()
                    .all(|c| matches!(c, Cell::DateTime(_)) || c.as_datetime().is_some())
                {
                    ColumnKind::DateTime
                } else {
                    ColumnKind::Text
                };
                ColumnSummary {
                    name: name.clone(),
                    non_null: cells.len(),
                    kind,
                }
            })
            .collect()
    }

    /// Parse the time column and value columns into raw observations.
    pub fn to_raw_series(&self, time_column: &str, value_columns: &[&str]) -> Result<RawSeries> {
        if value_columns.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "at least one value column is required".to_string(),
            ));
        }
        let time_idx = self.column_index(time_column)?;
        let value_idx = value_columns
            .iter()
            .map(|c| self.column_index(c))
            .collect::<Result<Vec<_>>>()?;

        let mut timestamps = Vec::with_capacity(self.rows.len());
        let mut values: Vec<Vec<f64>> = vec![Vec::with_capacity(self.rows.len()); value_idx.len()];

        for (row, &line) in self.rows.iter().zip(&self.row_numbers) {
            let time_cell = &row[time_idx];
            if time_cell.is_empty() && value_idx.iter().all(|&i| row[i].is_empty()) {
                continue;
            }
            let timestamp =
                time_cell
                    .as_datetime()
                    .ok_or_else(|| ForecastError::UnparseableTime {
                        column: time_column.to_string(),
                        row: line,
                        value: time_cell.to_string(),
                    })?;
            timestamps.push(timestamp);

            for (channel, (&i, name)) in value_idx.iter().zip(value_columns).enumerate() {
                let cell = &row[i];
                let value = cell.as_number().map_err(|_| ForecastError::NonNumeric {
                    column: name.to_string(),
                    row: line,
                    value: cell.to_string(),
                })?;
                values[channel].push(value.unwrap_or(f64::NAN));
            }
        }

        if timestamps.is_empty() {
            return Err(ForecastError::NoRows);
        }

        RawSeries::new(
            timestamps,
            values,
            value_columns.iter().map(|c| c.to_string()).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<Cell>> {
        rows.iter()
            .map(|r| r.iter().map(|c| Cell::text(c)).collect())
            .collect()
    }

    fn sales_table() -> RawTable {
        RawTable::from_grid(
            grid(&[
                &["Date", "Sales", "Region"],
                &["2020-01-05", "10", "east"],
                &["2020-01-20", "5", "west"],
                &["2020-02-10", "7", ""],
            ]),
            0,
        )
        .unwrap()
    }

    #[test]
    fn header_offset_skips_preamble_rows() {
        let table = RawTable::from_grid(
            grid(&[
                &["Back to Contents", "", ""],
                &["Sourcekey", "X1", "X2"],
                &["Date", "Sales", "Other"],
                &["2020-01-31", "1", "2"],
                &["", "", ""],
            ]),
            2,
        )
        .unwrap();
        assert_eq!(table.headers(), &["Date", "Sales", "Other"]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn header_row_past_the_end_is_no_rows() {
        let result = RawTable::from_grid(grid(&[&["a", "b"]]), 3);
        assert!(matches!(result, Err(ForecastError::NoRows)));
    }

    #[test]
    fn blank_header_cells_get_positional_names() {
        let table = RawTable::from_grid(grid(&[&["", "Sales"], &["2020-01-01", "1"]]), 0).unwrap();
        assert_eq!(table.headers(), &["column_0", "Sales"]);
    }

    #[test]
    fn column_summary_counts_and_infers_kinds() {
        let summary = sales_table().column_summary();
        assert_eq!(summary[0].kind, ColumnKind::DateTime);
        assert_eq!(summary[0].non_null, 3);
        assert_eq!(summary[1].kind, ColumnKind::Numeric);
        assert_eq!(summary[2].kind, ColumnKind::Text);
        assert_eq!(summary[2].non_null, 2);
    }

    #[test]
    fn select_renames_and_tail_keeps_last_rows() {
        let table = sales_table()
            .select(&[("Date", "Month"), ("Sales", "Sales")])
            .unwrap();
        assert_eq!(table.headers(), &["Month", "Sales"]);

        let tail = table.tail(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail.rows()[0][1], Cell::Text("5".into()));

        assert!(matches!(
            sales_table().select(&[("Missing", "x")]),
            Err(ForecastError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn to_raw_series_parses_times_and_values() {
        let raw = sales_table().to_raw_series("Date", &["Sales"]).unwrap();
        assert_eq!(raw.len(), 3);
        assert_eq!(raw.values_by_dimension()[0], vec![10.0, 5.0, 7.0]);
        assert_eq!(raw.labels(), &["Sales"]);
        assert_eq!(
            raw.timestamps()[0],
            Utc.with_ymd_and_hms(2020, 1, 5, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn to_raw_series_reports_unparseable_time() {
        let table = RawTable::from_grid(
            grid(&[&["Date", "Sales"], &["2020-01-05", "1"], &["soon", "2"]]),
            0,
        )
        .unwrap();
        let err = table.to_raw_series("Date", &["Sales"]).unwrap_err();
        assert_eq!(
            err,
            ForecastError::UnparseableTime {
                column: "Date".into(),
                row: 3,
                value: "soon".into()
            }
        );
    }

    #[test]
    fn to_raw_series_reports_non_numeric_values() {
        let table =
            RawTable::from_grid(grid(&[&["Date", "Sales"], &["2020-01-05", "lots"]]), 0).unwrap();
        assert!(matches!(
            table.to_raw_series("Date", &["Sales"]),
            Err(ForecastError::NonNumeric { row: 2, .. })
        ));
    }

    #[test]
    fn errors_name_the_source_row_below_a_preamble() {
        let table = RawTable::from_grid(
            grid(&[
                &["Quarterly report", ""],
                &["Date", "Sales"],
                &["2020-01-05", "1"],
                &["", ""],
                &["2020-01-07", "lots"],
            ]),
            1,
        )
        .unwrap();
        assert_eq!(table.row_number(0), Some(3));
        assert_eq!(table.row_number(1), Some(5));
        assert_eq!(table.tail(1).row_number(0), Some(5));
        assert!(matches!(
            table.to_raw_series("Date", &["Sales"]),
            Err(ForecastError::NonNumeric { row: 5, .. })
        ));
    }

    #[test]
    fn values_with_thousands_separators_and_blanks_are_coerced() {
        let table = RawTable::from_grid(
            grid(&[
                &["Date", "Sales"],
                &["2020-01-05", "1,234.5"],
                &["2020-01-06", ""],
            ]),
            0,
        )
        .unwrap();
        let raw = table.to_raw_series("Date", &["Sales"]).unwrap();
        assert_eq!(raw.values_by_dimension()[0][0], 1234.5);
        assert!(raw.values_by_dimension()[0][1].is_nan());
    }

    #[test]
    fn empty_table_is_no_rows() {
        let table = RawTable::from_grid(grid(&[&["Date", "Sales"]]), 0).unwrap();
        assert!(matches!(
            table.to_raw_series("Date", &["Sales"]),
            Err(ForecastError::NoRows)
        ));
    }

    #[test]
    fn spreadsheet_cells_convert_to_timestamps() {
        let dt = NaiveDate::from_ymd_opt(2021, 3, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let table = RawTable::new(
            vec!["Date".into(), "Sales".into()],
            vec![
                vec![Cell::DateTime(dt), Cell::Number(5.0)],
                // Excel serial 44316 is 2021-04-30
                vec![Cell::Number(44316.0), Cell::Number(6.0)],
            ],
        );
        let raw = table.to_raw_series("Date", &["Sales"]).unwrap();
        assert_eq!(
            raw.timestamps()[1],
            Utc.with_ymd_and_hms(2021, 4, 30, 0, 0, 0).unwrap()
        );
    }
}
