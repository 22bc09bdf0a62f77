//! Loading tabular files into [`RawTable`]s.
//!
//! Delimited text and spreadsheets share one entry point, [`load`], which
//! picks a reader from the file extension.

pub mod datetime;
pub mod delimited;
pub mod spreadsheet;
pub mod table;

pub use datetime::{excel_serial_to_datetime, parse_datetime};
pub use table::{Cell, ColumnKind, ColumnSummary, RawTable};

use crate::error::Result;
use std::path::Path;
use tracing::info;

/// How to read an input file.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    /// Field separator for delimited text.
    pub delimiter: char,
    /// Worksheet to read; the first sheet when `None`.
    pub sheet: Option<String>,
    /// Zero-based row holding the column names.
    pub header_row: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            sheet: None,
            header_row: 0,
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    pub fn with_header_row(mut self, header_row: usize) -> Self {
        self.header_row = header_row;
        self
    }
}

/// File formats understood by [`load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Delimited,
    Spreadsheet,
}

impl SourceFormat {
    /// Spreadsheet extensions select calamine; everything else is read as text.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("xlsx" | "xlsm" | "xlsb" | "xls" | "xla" | "xlam" | "ods") => {
                SourceFormat::Spreadsheet
            }
            _ => SourceFormat::Delimited,
        }
    }
}

/// Load a file into a table of cells.
pub fn load(path: impl AsRef<Path>, options: &LoadOptions) -> Result<RawTable> {
    let path = path.as_ref();
    let format = SourceFormat::from_path(path);
    let table = match format {
        SourceFormat::Spreadsheet => {
            spreadsheet::read_sheet(path, options.sheet.as_deref(), options.header_row)?
        }
        SourceFormat::Delimited => {
            delimited::read_delimited_path(path, options.delimiter, options.header_row)?
        }
    };
    info!(
        path = %path.display(),
        ?format,
        rows = table.len(),
        columns = table.headers().len(),
        "loaded table"
    );
    Ok(table)
}
