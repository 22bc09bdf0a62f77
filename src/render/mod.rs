//! Charts and tables.
//!
//! Charts are built as toolkit-independent [`Chart`] values and drawn by
//! [`svg`]; tabular output for the terminal lives in [`table`].

pub mod chart;
pub mod svg;
pub mod table;

pub use chart::{
    forecast_chart, grouped_by_quarter, heatmap, series_chart, Attribute, BandTrace, Chart,
    ChartBody, ChartKind, HeatmapData, Trace, XAxis,
};
pub use svg::{render_to_file, render_to_string, DEFAULT_SIZE};
pub use table::{band_table, column_summary_table, raw_table, series_table, split_table};
