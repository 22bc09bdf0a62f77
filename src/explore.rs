//! The exploratory chart gallery for one channel of a series.

use crate::core::{Period, TimeSeries};
use crate::error::Result;
use crate::render::{
    grouped_by_quarter, heatmap, render_to_file, series_chart, Attribute, Chart, ChartKind,
};
use crate::transform::{pivot_year_quarter, resample_series, EmptyPeriodPolicy};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// A chart together with the file stem it is written under.
#[derive(Debug, Clone)]
pub struct GalleryChart {
    pub name: String,
    pub chart: Chart,
}

impl GalleryChart {
    fn new(name: &str, chart: Chart) -> Self {
        Self {
            name: name.to_string(),
            chart,
        }
    }
}

/// Build every exploratory view of `channel`.
///
/// In order: the plain line, lines per year, the plain area, areas per
/// quarter, yearly totals as bars, the quarterly breakdown per year as
/// stacked bars, grouped bars, stacked areas, overlapping areas and lines,
/// and the year by quarter heatmap.
pub fn gallery(series: &TimeSeries, channel: usize) -> Result<Vec<GalleryChart>> {
    let mut charts = vec![
        GalleryChart::new("line", series_chart(series, channel, ChartKind::Line, None)?),
        GalleryChart::new(
            "line-by-year",
            series_chart(series, channel, ChartKind::Line, Some(Attribute::Year))?,
        ),
        GalleryChart::new("area", series_chart(series, channel, ChartKind::Area, None)?),
        GalleryChart::new(
            "area-by-quarter",
            series_chart(series, channel, ChartKind::Area, Some(Attribute::Quarter))?,
        ),
    ];

    let yearly = resample_series(
        &series.channel(channel)?,
        Period::Yearly,
        EmptyPeriodPolicy::Zero,
    )?;
    let label = series.label(channel);
    charts.push(GalleryChart::new(
        "yearly-bar",
        series_chart(&yearly, 0, ChartKind::Bar, Some(Attribute::Year))?
            .with_title(format!("Yearly {}", label)),
    ));

    for (name, kind) in [
        ("quarterly-stacked-bar", ChartKind::StackedBar),
        ("quarterly-grouped-bar", ChartKind::GroupedBar),
        ("quarterly-stacked-area", ChartKind::StackedArea),
        ("quarterly-overlapping-area", ChartKind::OverlappingArea),
        ("quarterly-line", ChartKind::Line),
    ] {
        charts.push(GalleryChart::new(name, grouped_by_quarter(series, channel, kind)?));
    }

    charts.push(GalleryChart::new(
        "heatmap",
        heatmap(&pivot_year_quarter(series, channel)?),
    ));
    Ok(charts)
}

/// Write each chart to `<out_dir>/<name>.svg`, creating the directory.
pub fn write_gallery(
    charts: &[GalleryChart],
    out_dir: &Path,
    size: (u32, u32),
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;
    let mut written = Vec::with_capacity(charts.len());
    for item in charts {
        let path = out_dir.join(format!("{}.svg", item.name));
        render_to_file(&item.chart, &path, size)?;
        written.push(path);
    }
    info!(dir = %out_dir.display(), charts = written.len(), "wrote gallery");
    Ok(written)
}
