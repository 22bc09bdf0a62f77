//! Error types for the forecast-explorer library.

use thiserror::Error;

/// Result type alias for loader, pipeline and model operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Broad class of a failure, used to decide how it is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed file, unparseable time column, wrong delimiter.
    Input,
    /// A user-supplied parameter is outside its valid range.
    Parameter,
    /// The forecasting model could not fit or predict.
    Model,
    /// The plotting backend failed.
    Render,
}

/// Errors that can occur while loading, resampling, forecasting or rendering.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// File could not be opened or read.
    #[error("i/o error: {0}")]
    Io(String),

    /// Delimited text could not be parsed.
    #[error("delimited text error: {0}")]
    Csv(String),

    /// Spreadsheet could not be opened or read.
    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    /// The requested sheet does not exist in the workbook.
    #[error("sheet '{name}' not found (available: {available})")]
    UnknownSheet { name: String, available: String },

    /// The requested column does not exist in the table.
    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    /// A cell of the time column is not a date/time. `row` is 1-based and
    /// counts every row of the source, header and preamble included.
    #[error("column '{column}' row {row}: cannot parse '{value}' as a date/time")]
    UnparseableTime {
        column: String,
        row: usize,
        value: String,
    },

    /// A cell of a value column is not numeric. `row` is the source row, as above.
    #[error("column '{column}' row {row}: cannot parse '{value}' as a number")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },

    /// No data rows remain after parsing.
    #[error("no rows remain after parsing")]
    NoRows,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Holdout length leaves no training data or exceeds the series.
    #[error("invalid holdout {holdout}: must be between 1 and {max} for a series of length {len}")]
    InvalidHoldout {
        holdout: usize,
        len: usize,
        max: usize,
    },

    /// Quantile band bounds are out of order or outside (0, 1).
    #[error("invalid quantile band ({low}, {high}): need 0 < low < high < 1")]
    InvalidQuantileBand { low: f64, high: f64 },

    /// Number of forecast samples is outside the accepted range.
    #[error("invalid sample count {got}: must be between 1 and {max}")]
    InvalidSampleCount { got: usize, max: usize },

    /// A configuration file could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Missing values detected when not allowed.
    #[error("missing values detected in data")]
    MissingValues,

    /// The series has no period, so future timestamps cannot be derived.
    #[error("could not infer frequency: {0}")]
    FrequencyInference(String),

    /// Index out of bounds.
    #[error("index out of bounds: {index} (size: {size})")]
    IndexOutOfBounds { index: usize, size: usize },

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),

    /// Chart drawing failed.
    #[error("render error: {0}")]
    Render(String),
}

impl ForecastError {
    /// Classify the error for reporting.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptyData
            | Self::Io(_)
            | Self::Csv(_)
            | Self::Spreadsheet(_)
            | Self::UnknownSheet { .. }
            | Self::ColumnNotFound(_)
            | Self::UnparseableTime { .. }
            | Self::NonNumeric { .. }
            | Self::NoRows => ErrorCategory::Input,
            Self::InvalidParameter(_)
            | Self::InvalidHoldout { .. }
            | Self::InvalidQuantileBand { .. }
            | Self::InvalidSampleCount { .. }
            | Self::Config(_) => ErrorCategory::Parameter,
            Self::InsufficientData { .. }
            | Self::DimensionMismatch { .. }
            | Self::TimestampError(_)
            | Self::FitRequired
            | Self::MissingValues
            | Self::FrequencyInference(_)
            | Self::IndexOutOfBounds { .. }
            | Self::ComputationError(_) => ErrorCategory::Model,
            Self::Render(_) => ErrorCategory::Render,
        }
    }
}

impl From<std::io::Error> for ForecastError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}

impl From<calamine::Error> for ForecastError {
    fn from(err: calamine::Error) -> Self {
        Self::Spreadsheet(err.to_string())
    }
}
