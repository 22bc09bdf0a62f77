//! SVG rendering of [`Chart`]s with plotters.

use crate::error::{ForecastError, Result};
use crate::render::chart::{BandTrace, Chart, ChartBody, ChartKind, HeatmapData, Trace};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::error::Error;
use std::path::Path;
use tracing::debug;

/// Default canvas size in pixels.
pub const DEFAULT_SIZE: (u32, u32) = (1280, 720);

/// Trace colours, cycled.
const PALETTE: [RGBColor; 10] = [
    RGBColor(99, 110, 250),
    RGBColor(239, 85, 59),
    RGBColor(0, 204, 150),
    RGBColor(171, 99, 250),
    RGBColor(255, 161, 90),
    RGBColor(25, 211, 243),
    RGBColor(255, 102, 146),
    RGBColor(182, 232, 128),
    RGBColor(255, 151, 255),
    RGBColor(254, 203, 82),
];

type DrawResult = std::result::Result<(), Box<dyn Error>>;

fn color(i: usize) -> RGBColor {
    PALETTE[i % PALETTE.len()]
}

/// Render a chart to an SVG file.
pub fn render_to_file(chart: &Chart, path: &Path, size: (u32, u32)) -> Result<()> {
    let root = SVGBackend::new(path, size).into_drawing_area();
    draw(root, chart).map_err(|e| ForecastError::Render(e.to_string()))?;
    debug!(path = %path.display(), kind = %chart.kind, "wrote chart");
    Ok(())
}

/// Render a chart to an SVG document in memory.
pub fn render_to_string(chart: &Chart, size: (u32, u32)) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        draw(root, chart).map_err(|e| ForecastError::Render(e.to_string()))?;
    }
    Ok(svg)
}

fn draw<DB>(root: DrawingArea<DB, Shift>, chart: &Chart) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    match &chart.body {
        ChartBody::Heatmap(data) => draw_heatmap(&root, chart, data)?,
        _ => draw_cartesian(&root, chart)?,
    }

    root.present()?;
    Ok(())
}

/// Widen a degenerate or tight range and add a margin.
fn padded((lo, hi): (f64, f64), pad: f64) -> (f64, f64) {
    if (hi - lo).abs() < f64::EPSILON {
        let half = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
        return (lo - half, hi + half);
    }
    let margin = (hi - lo) * pad;
    (lo - margin, hi + margin)
}

/// Smallest gap between distinct x positions, used as the bar slot width.
fn slot_width(traces: &[Trace]) -> f64 {
    let mut xs: Vec<f64> = traces
        .iter()
        .flat_map(|t| t.xs.iter().copied())
        .filter(|x| x.is_finite())
        .collect();
    xs.sort_by(|a, b| a.total_cmp(b));
    xs.dedup();
    xs.windows(2)
        .map(|w| w[1] - w[0])
        .fold(None, |acc: Option<f64>, gap| Some(acc.map_or(gap, |a| a.min(gap))))
        .unwrap_or(1.0)
}

fn draw_cartesian<DB>(root: &DrawingArea<DB, Shift>, chart: &Chart) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let traces = chart.drawn_traces();
    let bar_like = matches!(
        chart.kind,
        ChartKind::Bar | ChartKind::StackedBar | ChartKind::GroupedBar
    );
    let slot = if bar_like { slot_width(&traces) } else { 0.0 };

    let ((x0, x1), (data_y0, data_y1)) = chart.bounds().unwrap_or(((0.0, 1.0), (0.0, 1.0)));
    let (x0, x1) = padded((x0 - slot / 2.0, x1 + slot / 2.0), 0.02);
    let (mut y0, y1) = padded((data_y0, data_y1), 0.05);
    // Bars and areas of non-negative data sit on the x axis.
    if chart.kind.needs_zero_baseline() && data_y0 >= 0.0 {
        y0 = 0.0;
    }

    let mut ctx = ChartBuilder::on(root)
        .caption(&chart.title, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(80)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    let x_format = |x: &f64| chart.x_axis.format(*x);
    ctx.configure_mesh()
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .x_label_formatter(&x_format)
        .y_label_formatter(&|y| format!("{:.1}", y))
        .draw()?;

    match chart.kind {
        ChartKind::Line | ChartKind::Forecast => {
            for (i, trace) in traces.iter().enumerate() {
                let c = color(i);
                ctx.draw_series(LineSeries::new(trace.finite_points(), c.stroke_width(2)))?
                    .label(trace.name.clone())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], c));
            }
        }
        ChartKind::Area | ChartKind::OverlappingArea => {
            for (i, trace) in traces.iter().enumerate() {
                let c = color(i);
                ctx.draw_series(
                    AreaSeries::new(trace.finite_points(), 0.0, c.mix(0.35)).border_style(c),
                )?
                .label(trace.name.clone())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], c.filled()));
            }
        }
        ChartKind::StackedArea => {
            // Highest cumulative curve first so lower layers stay visible.
            for (i, trace) in traces.iter().enumerate().rev() {
                let c = color(i);
                ctx.draw_series(AreaSeries::new(trace.finite_points(), 0.0, c.mix(0.9)).border_style(c))?
                    .label(trace.name.clone())
                    .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], c.filled()));
            }
        }
        ChartKind::Bar => {
            let half = slot * 0.4;
            for (i, trace) in traces.iter().enumerate() {
                let c = color(i);
                ctx.draw_series(
                    trace
                        .finite_points()
                        .map(|(x, y)| Rectangle::new([(x - half, 0.0), (x + half, y)], c.filled())),
                )?
                .label(trace.name.clone())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], c.filled()));
            }
        }
        ChartKind::StackedBar => {
            let half = slot * 0.4;
            let mut base: Vec<f64> = Vec::new();
            for (i, trace) in traces.iter().enumerate() {
                let c = color(i);
                let bottoms: Vec<f64> = if i == 0 {
                    vec![0.0; trace.ys.len()]
                } else {
                    base.clone()
                };
                let bars: Vec<_> = trace
                    .xs
                    .iter()
                    .zip(&trace.ys)
                    .zip(&bottoms)
                    .filter(|((x, y), _)| x.is_finite() && y.is_finite())
                    .map(|((&x, &top), &bottom)| {
                        Rectangle::new([(x - half, bottom), (x + half, top)], c.filled())
                    })
                    .collect();
                ctx.draw_series(bars)?
                    .label(trace.name.clone())
                    .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], c.filled()));
                base = trace.ys.clone();
            }
        }
        ChartKind::GroupedBar => {
            let n = traces.len().max(1) as f64;
            let width = slot * 0.8 / n;
            for (i, trace) in traces.iter().enumerate() {
                let c = color(i);
                let offset = -slot * 0.4 + width * i as f64;
                ctx.draw_series(trace.finite_points().map(|(x, y)| {
                    Rectangle::new([(x + offset, 0.0), (x + offset + width, y)], c.filled())
                }))?
                .label(trace.name.clone())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], c.filled()));
            }
        }
        ChartKind::Heatmap => {}
    }

    if let ChartBody::Forecast { bands, .. } = &chart.body {
        for (i, band) in bands.iter().enumerate() {
            draw_band(&mut ctx, band, color(traces.len() + i))?;
        }
    }

    if traces.len() > 1 || matches!(chart.body, ChartBody::Forecast { .. }) {
        ctx.configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK.mix(0.3))
            .position(SeriesLabelPosition::UpperLeft)
            .draw()?;
    }
    Ok(())
}

fn draw_band<DB>(
    ctx: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    band: &BandTrace,
    c: RGBColor,
) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let finite = |i: &usize| {
        band.xs[*i].is_finite() && band.low[*i].is_finite() && band.high[*i].is_finite()
    };
    let idx: Vec<usize> = (0..band.xs.len()).filter(finite).collect();
    let mut outline: Vec<(f64, f64)> = idx.iter().map(|&i| (band.xs[i], band.high[i])).collect();
    outline.extend(idx.iter().rev().map(|&i| (band.xs[i], band.low[i])));

    if outline.len() >= 3 {
        let q = band.quantiles;
        ctx.draw_series(std::iter::once(Polygon::new(outline, c.mix(0.25))))?
            .label(format!(
                "{} {:.0}%-{:.0}%",
                band.name,
                q.low() * 100.0,
                q.high() * 100.0
            ))
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], c.mix(0.25).filled()));
    }

    let median = band
        .xs
        .iter()
        .zip(&band.median)
        .map(|(&x, &y)| (x, y))
        .filter(|(x, y)| x.is_finite() && y.is_finite());
    ctx.draw_series(LineSeries::new(median, c.stroke_width(2)))?
        .label(format!("{} median", band.name))
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], c));
    Ok(())
}

/// Linear ramp from a pale to a dark blue.
fn heat_color(value: f64, (lo, hi): (f64, f64)) -> RGBColor {
    let t = if hi > lo { ((value - lo) / (hi - lo)).clamp(0.0, 1.0) } else { 0.5 };
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    RGBColor(lerp(239, 13), lerp(243, 8), lerp(255, 135))
}

fn draw_heatmap<DB>(root: &DrawingArea<DB, Shift>, chart: &Chart, data: &HeatmapData) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let ((x0, x1), (y0, y1)) = chart.bounds().unwrap_or(((-0.5, 0.5), (-0.5, 0.5)));
    let mut ctx = ChartBuilder::on(root)
        .caption(&chart.title, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(80)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    let x_format = |x: &f64| chart.x_axis.format(*x);
    let y_format = |y: &f64| {
        if (y - y.round()).abs() > 1e-6 || *y < 0.0 {
            return String::new();
        }
        data.rows.get(y.round() as usize).cloned().unwrap_or_default()
    };
    ctx.configure_mesh()
        .disable_mesh()
        .x_labels(data.columns.len().max(1))
        .y_labels(data.rows.len().max(1))
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .x_label_formatter(&x_format)
        .y_label_formatter(&y_format)
        .draw()?;

    let range = data.value_range().unwrap_or((0.0, 1.0));
    let cells = data.cells.iter().enumerate().flat_map(|(r, row)| {
        row.iter().enumerate().filter(|(_, v)| v.is_finite()).map(move |(c, &v)| {
            let (x, y) = (c as f64, r as f64);
            Rectangle::new(
                [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                heat_color(v, range).filled(),
            )
        })
    });
    ctx.draw_series(cells)?;
    Ok(())
}
