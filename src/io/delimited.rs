//! Delimited text (CSV, TSV, semicolon-separated) loading.

use crate::error::{ForecastError, Result};
use crate::io::table::{Cell, RawTable};
use std::io::Read;
use std::path::Path;

/// Convert a user-facing delimiter into the single byte the reader expects.
pub fn delimiter_byte(delimiter: char) -> Result<u8> {
    if delimiter.is_ascii() && delimiter != '\n' && delimiter != '\r' && delimiter != '"' {
        Ok(delimiter as u8)
    } else {
        Err(ForecastError::InvalidParameter(format!(
            "delimiter {:?} must be a single ASCII character other than a quote or newline",
            delimiter
        )))
    }
}

/// Read a delimited file from disk.
pub fn read_delimited_path(path: &Path, delimiter: char, header_row: usize) -> Result<RawTable> {
    let file = std::fs::File::open(path)?;
    read_delimited(file, delimiter, header_row)
}

/// Read delimited text, taking the header from record `header_row`.
///
/// Records may have differing widths; short rows are padded with empty cells.
pub fn read_delimited<R: Read>(reader: R, delimiter: char, header_row: usize) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter_byte(delimiter)?)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut grid = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        // Line on which the record starts, so blank lines still count.
        let line = record.position().map_or(i + 1, |p| p.line() as usize);
        grid.push((line, record.iter().map(Cell::text).collect::<Vec<_>>()));
    }
    if grid.is_empty() {
        return Err(ForecastError::NoRows);
    }
    RawTable::from_numbered_grid(grid, header_row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_comma_separated_text() {
        let data = "Date,Sales\n2020-01-05,10\n2020-01-20,5\n";
        let table = read_delimited(data.as_bytes(), ',', 0).unwrap();
        assert_eq!(table.headers(), &["Date", "Sales"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1][1], Cell::Text("5".into()));
    }

    #[test]
    fn honours_delimiter_and_quotes() {
        let data = "Date;Sales;Note\n2020-01-05;\"1,234\";\"a; b\"\n";
        let table = read_delimited(data.as_bytes(), ';', 0).unwrap();
        assert_eq!(table.rows()[0][1], Cell::Text("1,234".into()));
        assert_eq!(table.rows()[0][2], Cell::Text("a; b".into()));
    }

    #[test]
    fn rows_keep_their_line_numbers() {
        let data = "Sales report\nDate,Sales\n2020-01-05,10\n2020-01-06,\"1,\n200\"\n2020-01-07,3\n";
        let table = read_delimited(data.as_bytes(), ',', 1).unwrap();
        assert_eq!(table.row_number(0), Some(3));
        // The quoted field spans lines 4 and 5.
        assert_eq!(table.row_number(1), Some(4));
        assert_eq!(table.row_number(2), Some(6));
    }

    #[test]
    fn pads_short_rows() {
        let data = "Date,Sales,Other\n2020-01-05,10\n";
        let table = read_delimited(data.as_bytes(), ',', 0).unwrap();
        assert_eq!(table.rows()[0][2], Cell::Empty);
    }

    #[test]
    fn wrong_delimiter_yields_single_column() {
        let data = "Date;Sales\n2020-01-05;10\n";
        let table = read_delimited(data.as_bytes(), ',', 0).unwrap();
        assert_eq!(table.headers(), &["Date;Sales"]);
        assert!(table.column_index("Sales").is_err());
    }

    #[test]
    fn rejects_unusable_delimiters() {
        assert!(delimiter_byte('\t').is_ok());
        assert!(delimiter_byte('"').is_err());
        assert!(delimiter_byte('§').is_err());
    }

    #[test]
    fn empty_input_has_no_rows() {
        assert!(matches!(
            read_delimited("".as_bytes(), ',', 0),
            Err(ForecastError::NoRows)
        ));
    }
}
