//! Spreadsheet (xlsx, xls, xlsb, ods) loading through calamine.

use crate::error::{ForecastError, Result};
use crate::io::datetime::excel_serial_to_naive;
use crate::io::table::{Cell, RawTable};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::debug;

/// Names of the sheets in a workbook, in workbook order.
pub fn sheet_names(path: &Path) -> Result<Vec<String>> {
    let workbook = open_workbook_auto(path)?;
    Ok(workbook.sheet_names())
}

/// Read one sheet (the first when `sheet` is `None`).
///
/// `header_row` counts from the top of the sheet, so leading rows that the
/// workbook leaves unused still count towards the offset.
pub fn read_sheet(path: &Path, sheet: Option<&str>, header_row: usize) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path)?;
    let names = workbook.sheet_names();
    let name = match sheet {
        Some(wanted) => names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| ForecastError::UnknownSheet {
                name: wanted.to_string(),
                available: names.join(", "),
            })?,
        None => names.first().cloned().ok_or(ForecastError::NoRows)?,
    };

    let range = workbook.worksheet_range(&name)?;
    let (first_row, first_col) = range.start().unwrap_or((0, 0));
    debug!(sheet = %name, first_row, first_col, "reading worksheet");

    if header_row < first_row as usize {
        return Err(ForecastError::Spreadsheet(format!(
            "header row {} lies above the first used row {} of sheet '{}'",
            header_row, first_row, name
        )));
    }
    // Rows above the used range are absent from `rows()`.
    let skip = header_row - first_row as usize;

    // Numbered as the sheet shows them, from 1 at the top.
    let grid: Vec<(usize, Vec<Cell>)> = range
        .rows()
        .enumerate()
        .map(|(i, row)| (first_row as usize + i + 1, row.iter().map(cell_from_data).collect()))
        .collect();
    RawTable::from_numbered_grid(grid, skip)
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::text(s),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            excel_serial_to_naive(serial)
                .map(Cell::DateTime)
                .unwrap_or(Cell::Number(serial))
        }
        other => Cell::text(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_text_cells_convert() {
        assert_eq!(cell_from_data(&Data::Int(3)), Cell::Number(3.0));
        assert_eq!(cell_from_data(&Data::Float(2.5)), Cell::Number(2.5));
        assert_eq!(cell_from_data(&Data::String("  ".into())), Cell::Empty);
        assert_eq!(
            cell_from_data(&Data::String("Sales".into())),
            Cell::Text("Sales".into())
        );
        assert_eq!(cell_from_data(&Data::Bool(true)), Cell::Text("true".into()));
    }

    #[test]
    fn missing_workbook_is_an_input_error() {
        let err = read_sheet(Path::new("does-not-exist.xlsx"), None, 0).unwrap_err();
        assert_eq!(err.category(), crate::error::ErrorCategory::Input);
    }
}
