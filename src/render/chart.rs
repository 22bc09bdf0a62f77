//! Backend-independent chart descriptions.
//!
//! Builders turn series, pivots and forecasts into a [`Chart`]; renderers in
//! sibling modules decide how to draw it. Dates on the x axis are encoded as
//! days since 1970-01-01.

use crate::core::{ForecastBand, QuantileBand, SampledForecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::transform::{pivot_year_quarter, YearQuarterPivot};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::fmt;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// How the chart's data is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Line,
    Area,
    Bar,
    StackedBar,
    GroupedBar,
    StackedArea,
    OverlappingArea,
    Heatmap,
    Forecast,
}

impl ChartKind {
    /// Whether traces are drawn on top of each other's cumulative sums.
    pub fn is_stacked(&self) -> bool {
        matches!(self, ChartKind::StackedBar | ChartKind::StackedArea)
    }

    /// Whether the value axis should include zero.
    pub fn needs_zero_baseline(&self) -> bool {
        !matches!(self, ChartKind::Line | ChartKind::Forecast | ChartKind::Heatmap)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Area => "area",
            ChartKind::Bar => "bar",
            ChartKind::StackedBar => "stacked-bar",
            ChartKind::GroupedBar => "grouped-bar",
            ChartKind::StackedArea => "stacked-area",
            ChartKind::OverlappingArea => "overlapping-area",
            ChartKind::Heatmap => "heatmap",
            ChartKind::Forecast => "forecast",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Meaning of x coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum XAxis {
    /// Days since 1970-01-01.
    Date,
    /// Calendar year as a number.
    Year,
    /// Integer positions naming categories (heatmap columns).
    Category(Vec<String>),
}

impl XAxis {
    /// Tick label for an x coordinate.
    pub fn format(&self, x: f64) -> String {
        match self {
            XAxis::Date => date_from_x(x)
                .map(|d| d.format("%Y-%m").to_string())
                .unwrap_or_default(),
            XAxis::Year => format!("{:.0}", x),
            XAxis::Category(names) => {
                if (x - x.round()).abs() > 1e-6 || x < 0.0 {
                    return String::new();
                }
                names.get(x.round() as usize).cloned().unwrap_or_default()
            }
        }
    }
}

/// Derived calendar attribute used to split a series into coloured traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Year,
    Quarter,
}

impl Attribute {
    /// Trace name for a timestamp, e.g. `2021` or `Q3`.
    pub fn of(&self, t: &DateTime<Utc>) -> String {
        match self {
            Attribute::Year => t.year().to_string(),
            Attribute::Quarter => format!("Q{}", (t.month() - 1) / 3 + 1),
        }
    }
}

/// One named sequence of points.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub name: String,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
}

impl Trace {
    pub fn new(name: impl Into<String>, xs: Vec<f64>, ys: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            xs,
            ys,
        }
    }

    /// Points whose coordinates are both finite.
    pub fn finite_points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.xs
            .iter()
            .zip(&self.ys)
            .map(|(&x, &y)| (x, y))
            .filter(|(x, y)| x.is_finite() && y.is_finite())
    }
}

/// Median curve and shaded band of one forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct BandTrace {
    pub name: String,
    pub xs: Vec<f64>,
    pub low: Vec<f64>,
    pub median: Vec<f64>,
    pub high: Vec<f64>,
    pub quantiles: QuantileBand,
}

impl From<&ForecastBand> for BandTrace {
    fn from(band: &ForecastBand) -> Self {
        Self {
            name: band.label.clone(),
            xs: band.timestamps.iter().map(x_from_date).collect(),
            low: band.low.clone(),
            median: band.median.clone(),
            high: band.high.clone(),
            quantiles: band.quantiles,
        }
    }
}

/// Matrix of values with named rows and columns.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapData {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    /// cells[row][column]
    pub cells: Vec<Vec<f64>>,
}

impl HeatmapData {
    /// Smallest and largest finite cell, if any.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        finite_range(self.cells.iter().flatten().copied())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartBody {
    Traces(Vec<Trace>),
    Heatmap(HeatmapData),
    Forecast {
        observed: Vec<Trace>,
        bands: Vec<BandTrace>,
    },
}

/// A complete chart description.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: String,
    pub kind: ChartKind,
    pub x_axis: XAxis,
    pub x_label: String,
    pub y_label: String,
    pub body: ChartBody,
}

impl Chart {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Traces as drawn: cumulative sums for stacked kinds, unchanged otherwise.
    pub fn drawn_traces(&self) -> Vec<Trace> {
        match &self.body {
            ChartBody::Traces(traces) if self.kind.is_stacked() => stack(traces),
            ChartBody::Traces(traces) => traces.clone(),
            ChartBody::Forecast { observed, .. } => observed.clone(),
            ChartBody::Heatmap(_) => Vec::new(),
        }
    }

    /// Extent of the data in chart coordinates, `None` when nothing is finite.
    pub fn bounds(&self) -> Option<((f64, f64), (f64, f64))> {
        if let ChartBody::Heatmap(data) = &self.body {
            if data.rows.is_empty() || data.columns.is_empty() {
                return None;
            }
            return Some((
                (-0.5, data.columns.len() as f64 - 0.5),
                (-0.5, data.rows.len() as f64 - 0.5),
            ));
        }

        let traces = self.drawn_traces();
        let mut xs: Vec<f64> = traces.iter().flat_map(|t| t.xs.iter().copied()).collect();
        let mut ys: Vec<f64> = traces.iter().flat_map(|t| t.ys.iter().copied()).collect();
        if let ChartBody::Forecast { bands, .. } = &self.body {
            for band in bands {
                xs.extend(band.xs.iter().copied());
                ys.extend(band.low.iter().chain(&band.median).chain(&band.high).copied());
            }
        }
        if self.kind.needs_zero_baseline() {
            ys.push(0.0);
        }
        let (x0, x1) = finite_range(xs.into_iter())?;
        let (y0, y1) = finite_range(ys.into_iter())?;
        Some(((x0, x1), (y0, y1)))
    }
}

/// Encode a timestamp as fractional days since 1970-01-01.
pub fn x_from_date(t: &DateTime<Utc>) -> f64 {
    t.timestamp() as f64 / SECONDS_PER_DAY
}

/// Calendar date for an x coordinate produced by [`x_from_date`].
pub fn date_from_x(x: f64) -> Option<NaiveDate> {
    if !x.is_finite() {
        return None;
    }
    NaiveDate::from_ymd_opt(1970, 1, 1)?.checked_add_signed(Duration::days(x.floor() as i64))
}

fn finite_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Cumulative sums of traces at shared x positions; NaN counts as zero.
pub fn stack(traces: &[Trace]) -> Vec<Trace> {
    let mut running: BTreeMap<u64, f64> = BTreeMap::new();
    traces
        .iter()
        .map(|trace| {
            let ys = trace
                .xs
                .iter()
                .zip(&trace.ys)
                .map(|(x, y)| {
                    let total = running.entry(x.to_bits()).or_insert(0.0);
                    if y.is_finite() {
                        *total += y;
                    }
                    *total
                })
                .collect();
            Trace::new(trace.name.clone(), trace.xs.clone(), ys)
        })
        .collect()
}

/// Line, area or bar chart of one channel, optionally split by a calendar attribute.
pub fn series_chart(
    series: &TimeSeries,
    channel: usize,
    kind: ChartKind,
    color_by: Option<Attribute>,
) -> Result<Chart> {
    if !matches!(kind, ChartKind::Line | ChartKind::Area | ChartKind::Bar) {
        return Err(ForecastError::InvalidParameter(format!(
            "series charts are line, area or bar, not {}",
            kind
        )));
    }
    let values = series.values(channel)?;
    let label = series.label(channel);

    let traces = match color_by {
        None => vec![Trace::new(
            label.clone(),
            series.timestamps().iter().map(x_from_date).collect(),
            values.to_vec(),
        )],
        Some(attribute) => {
            let mut groups: Vec<Trace> = Vec::new();
            for (t, &v) in series.timestamps().iter().zip(values) {
                let name = attribute.of(t);
                let idx = match groups.iter().position(|g| g.name == name) {
                    Some(i) => i,
                    None => {
                        groups.push(Trace::new(name, Vec::new(), Vec::new()));
                        groups.len() - 1
                    }
                };
                groups[idx].xs.push(x_from_date(t));
                groups[idx].ys.push(v);
            }
            groups
        }
    };

    let title = match color_by {
        None => format!("{} ({})", label, kind),
        Some(Attribute::Year) => format!("{} by year", label),
        Some(Attribute::Quarter) => format!("{} by quarter", label),
    };

    Ok(Chart {
        title,
        kind,
        x_axis: XAxis::Date,
        x_label: "date".to_string(),
        y_label: label,
        body: ChartBody::Traces(traces),
    })
}

/// Quarterly sums per year with one trace per quarter, x being the year.
pub fn grouped_by_quarter(series: &TimeSeries, channel: usize, kind: ChartKind) -> Result<Chart> {
    if !matches!(
        kind,
        ChartKind::StackedBar
            | ChartKind::GroupedBar
            | ChartKind::StackedArea
            | ChartKind::OverlappingArea
            | ChartKind::Line
    ) {
        return Err(ForecastError::InvalidParameter(format!(
            "quarterly charts are stacked/grouped bars, stacked/overlapping areas or lines, not {}",
            kind
        )));
    }
    let pivot = pivot_year_quarter(series, channel)?;
    let xs: Vec<f64> = pivot.years.iter().map(|&y| f64::from(y)).collect();
    let traces = (1..=4)
        .map(|q| Trace::new(format!("Q{}", q), xs.clone(), pivot.quarter_column(q)))
        .collect();

    Ok(Chart {
        title: format!("Quarterly {} ({})", pivot.label, kind),
        kind,
        x_axis: XAxis::Year,
        x_label: "year".to_string(),
        y_label: pivot.label.clone(),
        body: ChartBody::Traces(traces),
    })
}

/// Year by quarter heatmap.
pub fn heatmap(pivot: &YearQuarterPivot) -> Chart {
    let columns: Vec<String> = (1..=4).map(|q| format!("Q{}", q)).collect();
    Chart {
        title: format!("{} by year and quarter", pivot.label),
        kind: ChartKind::Heatmap,
        x_axis: XAxis::Category(columns.clone()),
        x_label: "quarter".to_string(),
        y_label: "year".to_string(),
        body: ChartBody::Heatmap(HeatmapData {
            rows: pivot.years.iter().map(|y| y.to_string()).collect(),
            columns,
            cells: pivot.cells.iter().map(|row| row.to_vec()).collect(),
        }),
    }
}

/// Observed channels plus each forecast's median and shaded quantile band.
pub fn forecast_chart(
    series: &TimeSeries,
    forecasts: &[SampledForecast],
    band: QuantileBand,
) -> Chart {
    let xs: Vec<f64> = series.timestamps().iter().map(x_from_date).collect();
    let observed = (0..series.dimensions())
        .map(|d| {
            Trace::new(
                series.label(d),
                xs.clone(),
                series.values_by_dimension()[d].clone(),
            )
        })
        .collect();
    let bands = forecasts
        .iter()
        .map(|f| BandTrace::from(&f.band(band)))
        .collect();

    Chart {
        title: format!(
            "Forecast with {:.0}%-{:.0}% band",
            band.low() * 100.0,
            band.high() * 100.0
        ),
        kind: ChartKind::Forecast,
        x_axis: XAxis::Date,
        x_label: "date".to_string(),
        y_label: "value".to_string(),
        body: ChartBody::Forecast { observed, bands },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Period;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn monthly(n: usize) -> TimeSeries {
        let start = Utc.with_ymd_and_hms(2019, 12, 31, 0, 0, 0).unwrap();
        let mut ts = TimeSeries::univariate(
            Period::Monthly.following_labels(&start, n),
            (1..=n).map(|i| i as f64).collect(),
        )
        .unwrap();
        ts.set_labels(vec!["Sales".into()]).unwrap();
        ts.set_period(Period::Monthly);
        ts
    }

    #[test]
    fn dates_encode_as_days_since_epoch() {
        let t = Utc.with_ymd_and_hms(1970, 1, 11, 0, 0, 0).unwrap();
        assert_relative_eq!(x_from_date(&t), 10.0);
        assert_eq!(date_from_x(10.0), NaiveDate::from_ymd_opt(1970, 1, 11));
        assert_eq!(XAxis::Date.format(x_from_date(&monthly(1).timestamps()[0])), "2020-01");
    }

    #[test]
    fn plain_series_chart_has_one_trace() {
        let chart = series_chart(&monthly(24), 0, ChartKind::Line, None).unwrap();
        match &chart.body {
            ChartBody::Traces(traces) => {
                assert_eq!(traces.len(), 1);
                assert_eq!(traces[0].name, "Sales");
                assert_eq!(traces[0].ys.len(), 24);
            }
            other => panic!("unexpected body {:?}", other),
        }
        assert_eq!(chart.y_label, "Sales");
    }

    #[test]
    fn color_by_splits_traces() {
        let by_year = series_chart(&monthly(24), 0, ChartKind::Line, Some(Attribute::Year)).unwrap();
        let names: Vec<String> = by_year.drawn_traces().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["2020", "2021"]);

        let by_quarter =
            series_chart(&monthly(12), 0, ChartKind::Area, Some(Attribute::Quarter)).unwrap();
        let traces = by_quarter.drawn_traces();
        assert_eq!(traces.len(), 4);
        assert_eq!(traces[1].name, "Q2");
        assert_eq!(traces[1].ys, vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn series_chart_rejects_grouped_kinds() {
        assert!(series_chart(&monthly(3), 0, ChartKind::Heatmap, None).is_err());
        assert!(series_chart(&monthly(3), 2, ChartKind::Line, None).is_err());
    }

    #[test]
    fn stacked_bars_accumulate() {
        let series = monthly(24);
        let chart = grouped_by_quarter(&series, 0, ChartKind::StackedBar).unwrap();
        let drawn = chart.drawn_traces();
        assert_eq!(drawn.len(), 4);
        // 2020: Q1 = 1+2+3, Q1..Q4 total = 78
        assert_relative_eq!(drawn[0].ys[0], 6.0);
        assert_relative_eq!(drawn[3].ys[0], 78.0);
        let ((x0, x1), (y0, y1)) = chart.bounds().unwrap();
        assert_eq!((x0, x1), (2020.0, 2021.0));
        assert_eq!(y0, 0.0);
        assert!(y1 >= 78.0 + 144.0);

        let grouped = grouped_by_quarter(&series, 0, ChartKind::GroupedBar).unwrap();
        assert_relative_eq!(grouped.drawn_traces()[3].ys[0], 10.0 + 11.0 + 12.0);
        assert!(grouped_by_quarter(&series, 0, ChartKind::Bar).is_err());
    }

    #[test]
    fn heatmap_lays_out_years_by_quarters() {
        let pivot = pivot_year_quarter(&monthly(15), 0).unwrap();
        let chart = heatmap(&pivot);
        match &chart.body {
            ChartBody::Heatmap(data) => {
                assert_eq!(data.rows, vec!["2020", "2021"]);
                assert_eq!(data.columns, vec!["Q1", "Q2", "Q3", "Q4"]);
                assert!(data.cells[1][1].is_nan());
                assert_eq!(data.value_range(), Some((6.0, 42.0)));
            }
            other => panic!("unexpected body {:?}", other),
        }
        assert_eq!(chart.x_axis.format(2.0), "Q3");
        assert_eq!(chart.x_axis.format(2.5), "");
    }

    #[test]
    fn forecast_chart_carries_bands() {
        let series = monthly(12);
        let timestamps = series.future_timestamps(2).unwrap();
        let forecast = SampledForecast::new(
            timestamps,
            vec![vec![1.0, 2.0, 3.0, 4.0, 5.0], vec![2.0, 4.0, 6.0, 8.0, 10.0]],
        )
        .unwrap()
        .with_label("Sales");
        let chart = forecast_chart(&series, &[forecast], QuantileBand::default());

        match &chart.body {
            ChartBody::Forecast { observed, bands } => {
                assert_eq!(observed.len(), 1);
                assert_eq!(bands.len(), 1);
                assert_relative_eq!(bands[0].median[1], 6.0);
                assert!(bands[0].low[0] <= bands[0].median[0]);
                assert!(bands[0].median[0] <= bands[0].high[0]);
            }
            other => panic!("unexpected body {:?}", other),
        }
        let ((_, x1), _) = chart.bounds().unwrap();
        assert!(x1 > x_from_date(series.timestamps().last().unwrap()));
    }
}
