//! File-based defaults for the command-line tool.
//!
//! Every field is optional in the TOML file; command-line flags override
//! whatever the file provides.
//!
//! ```toml
//! [input]
//! delimiter = ";"
//! time_column = "Month"
//! value_columns = ["Sales"]
//!
//! [forecast]
//! period = "monthly"
//! samples = 500
//! seed = 42
//!
//! [output]
//! dir = "out"
//! ```

use crate::core::Period;
use crate::error::{ForecastError, Result};
use crate::io::LoadOptions;
use crate::pipeline::{ForecastParams, DEFAULT_SAMPLES};
use crate::render::DEFAULT_SIZE;
use crate::transform::EmptyPeriodPolicy;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExplorerConfig {
    #[serde(default)]
    pub input: InputSettings,

    #[serde(default)]
    pub forecast: ForecastSettings,

    #[serde(default)]
    pub output: OutputSettings,
}

/// Where the series comes from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputSettings {
    /// Field delimiter of delimited text
    pub delimiter: char,

    /// Spreadsheet sheet, first sheet when absent
    pub sheet: Option<String>,

    /// 0-based row holding the column names
    pub header_row: usize,

    pub time_column: Option<String>,

    pub value_columns: Vec<String>,

    /// Keep only the last rows of the table
    pub last: Option<usize>,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            delimiter: ',',
            sheet: None,
            header_row: 0,
            time_column: None,
            value_columns: Vec::new(),
            last: None,
        }
    }
}

/// Forecast controls.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastSettings {
    pub period: Option<Period>,

    /// Validation length; the default shrinks for short series
    pub holdout: Option<usize>,

    /// Samples drawn per forecast period
    pub samples: usize,

    pub low_quantile: f64,

    pub high_quantile: f64,

    /// Seed for reproducible sampling
    pub seed: Option<u64>,

    pub empty_periods: EmptyPeriodPolicy,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        let params = ForecastParams::default();
        Self {
            period: None,
            holdout: None,
            samples: DEFAULT_SAMPLES,
            low_quantile: params.low_quantile,
            high_quantile: params.high_quantile,
            seed: None,
            empty_periods: EmptyPeriodPolicy::default(),
        }
    }
}

/// Where and how charts are written.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSettings {
    pub dir: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("charts"),
            width: DEFAULT_SIZE.0,
            height: DEFAULT_SIZE.1,
        }
    }
}

impl OutputSettings {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl ExplorerConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ForecastError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|e| ForecastError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn load_options(&self) -> LoadOptions {
        let options = LoadOptions::new()
            .with_delimiter(self.input.delimiter)
            .with_header_row(self.input.header_row);
        match &self.input.sheet {
            Some(sheet) => options.with_sheet(sheet.clone()),
            None => options,
        }
    }

    pub fn forecast_params(&self) -> ForecastParams {
        let params = ForecastParams::new()
            .with_num_samples(self.forecast.samples)
            .with_quantiles(self.forecast.low_quantile, self.forecast.high_quantile);
        match self.forecast.holdout {
            Some(h) => params.with_holdout(h),
            None => params,
        }
    }
}
