use anyhow::{anyhow, Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::ops::Range;

use crate::ir::{Bar, BarSeries, BoxGroup, ChartSpec, Geometry, HistogramBin, TrendLine};
use crate::{OutputFormat, RenderOptions};

const BAR_COLOR: RGBColor = RGBColor(99, 110, 250);
const POINT_COLOR: RGBColor = RGBColor(0, 90, 160);
const TREND_COLOR: RGBColor = RGBColor(239, 85, 59);

/// Largest accepted canvas side, in pixels.
pub const MAX_CANVAS_SIDE: u32 = 16_384;

const TITLE_CHARS: usize = 80;
const AXIS_CHARS: usize = 70;
const TICK_CHARS: usize = 18;

/// Draw a chart spec and encode it in the requested format.
pub fn render_chart(spec: &ChartSpec, options: &RenderOptions) -> Result<Vec<u8>> {
    if options.width == 0 || options.height == 0 {
        anyhow::bail!("Canvas size must be positive (got {}x{})", options.width, options.height);
    }
    if options.width > MAX_CANVAS_SIDE || options.height > MAX_CANVAS_SIDE {
        anyhow::bail!(
            "Canvas size {}x{} exceeds the {MAX_CANVAS_SIDE}px limit",
            options.width,
            options.height
        );
    }
    match options.format {
        OutputFormat::Png => render_png(spec, options.width, options.height),
        OutputFormat::Svg => render_svg(spec, options.width, options.height),
    }
}

fn render_png(spec: &ChartSpec, width: u32, height: u32) -> Result<Vec<u8>> {
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(3))
        .ok_or_else(|| anyhow!("Canvas size {width}x{height} is too large"))?;
    let mut buffer = vec![0u8; len];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw_chart(&root, spec)?;
    }

    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(&buffer, width, height, image::ColorType::Rgb8)
            .context("Failed to encode PNG")?;
    }

    Ok(png_bytes)
}

fn render_svg(spec: &ChartSpec, width: u32, height: u32) -> Result<Vec<u8>> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        draw_chart(&root, spec)?;
    }
    Ok(svg.into_bytes())
}

fn draw_err<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> anyhow::Error {
    anyhow!("Failed to draw chart: {err}")
}

fn draw_chart<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, spec: &ChartSpec) -> Result<()> {
    root.fill(&WHITE).map_err(draw_err)?;

    match &spec.geometry {
        Geometry::Empty => {}
        Geometry::Histogram { bins } => draw_histogram(root, spec, bins)?,
        Geometry::Bar { bars } => draw_bars(root, spec, bars)?,
        Geometry::Scatter { points, trend } => draw_scatter(root, spec, points, trend.as_ref())?,
        Geometry::BoxPlot { groups } => draw_box_plot(root, spec, groups)?,
        Geometry::GroupedBar { categories, series } => {
            draw_grouped_bars(root, spec, categories, series)?
        }
    }

    root.present().map_err(draw_err)?;
    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        short.push_str("...");
        short
    }
}

fn chart_builder<'a, 'b, DB: DrawingBackend>(
    root: &'a DrawingArea<DB, Shift>,
    spec: &ChartSpec,
) -> ChartBuilder<'a, 'b, DB> {
    let mut builder = ChartBuilder::on(root);
    builder.margin(10).x_label_area_size(60).y_label_area_size(60);
    if let Some(title) = &spec.title {
        builder.caption(truncate(title, TITLE_CHARS), ("sans-serif", 18));
    }
    builder
}

fn axis_desc(label: &Option<String>) -> String {
    label.as_deref().map(|l| truncate(l, AXIS_CHARS)).unwrap_or_default()
}

/// Data range with 5% padding, widened around a single value.
///
/// Falls back to the unpadded range when padding would overflow.
fn padded_range(values: impl IntoIterator<Item = f64>) -> Range<f64> {
    let (min, max) = values
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    if min == max {
        return (min - 1.0)..(max + 1.0);
    }
    let padding = (max * 0.5 - min * 0.5) * 0.1;
    let (lo, hi) = (min - padding, max + padding);
    if lo.is_finite() && hi.is_finite() {
        lo..hi
    } else {
        min..max
    }
}

/// Reject axis ranges plotters cannot lay out, including spans wider than
/// `f64::MAX`.
fn checked_range(range: Range<f64>) -> Result<Range<f64>> {
    let span = range.end - range.start;
    if range.start.is_finite() && range.end.is_finite() && span.is_finite() && span > 0.0 {
        Ok(range)
    } else {
        Err(anyhow!("Invalid axis range {}..{}", range.start, range.end))
    }
}

fn count_range(max_count: usize) -> Range<f64> {
    0.0..((max_count as f64) * 1.1).max(1.0)
}

/// Categories sit at integer positions; anything in between is unlabeled.
fn category_range(n: usize) -> Range<f64> {
    -0.5..(n.max(1) as f64 - 0.5)
}

fn category_label(categories: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    categories
        .get(idx as usize)
        .map(|c| truncate(c, TICK_CHARS))
        .unwrap_or_default()
}

fn draw_histogram<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    bins: &[HistogramBin],
) -> Result<()> {
    let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
        return Ok(());
    };
    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0);

    let mut chart = chart_builder(root, spec)
        .build_cartesian_2d(checked_range(first.start..last.end)?, count_range(max_count))
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .x_desc(axis_desc(&spec.x_label))
        .y_desc(axis_desc(&spec.y_label))
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series(bins.iter().map(|b| {
            Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], BAR_COLOR.mix(0.8).filled())
        }))
        .map_err(draw_err)?;

    Ok(())
}

fn draw_bars<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, spec: &ChartSpec, bars: &[Bar]) -> Result<()> {
    let categories: Vec<String> = bars.iter().map(|b| b.label.clone()).collect();
    let max_count = bars.iter().map(|b| b.count).max().unwrap_or(0);

    let mut chart = chart_builder(root, spec)
        .build_cartesian_2d(category_range(categories.len()), count_range(max_count))
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(categories.len())
        .x_label_formatter(&|x| category_label(&categories, *x))
        .x_desc(axis_desc(&spec.x_label))
        .y_desc(axis_desc(&spec.y_label))
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series(bars.iter().enumerate().map(|(i, b)| {
            let x = i as f64;
            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, b.count as f64)], BAR_COLOR.mix(0.8).filled())
        }))
        .map_err(draw_err)?;

    Ok(())
}

fn draw_scatter<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    points: &[(f64, f64)],
    trend: Option<&TrendLine>,
) -> Result<()> {
    let x_range = checked_range(padded_range(points.iter().map(|p| p.0)))?;
    let y_range = checked_range(padded_range(points.iter().map(|p| p.1)))?;

    let mut chart = chart_builder(root, spec)
        .build_cartesian_2d(x_range, y_range)
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .x_desc(axis_desc(&spec.x_label))
        .y_desc(axis_desc(&spec.y_label))
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series(points.iter().map(|&(x, y)| Circle::new((x, y), 3, POINT_COLOR.mix(0.7).filled())))
        .map_err(draw_err)?;

    if let Some(trend) = trend {
        let line = vec![
            (trend.x_min, trend.predict(trend.x_min)),
            (trend.x_max, trend.predict(trend.x_max)),
        ];
        chart
            .draw_series(LineSeries::new(line, TREND_COLOR.stroke_width(2)))
            .map_err(draw_err)?;
    }

    Ok(())
}

fn draw_box_plot<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    groups: &[BoxGroup],
) -> Result<()> {
    let categories: Vec<String> = groups.iter().map(|g| g.category.clone()).collect();
    let y_range = checked_range(padded_range(groups.iter().flat_map(|g| g.points.iter().copied())))?;

    let mut chart = chart_builder(root, spec)
        .build_cartesian_2d(category_range(categories.len()), y_range)
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(categories.len())
        .x_label_formatter(&|x| category_label(&categories, *x))
        .x_desc(axis_desc(&spec.x_label))
        .y_desc(axis_desc(&spec.y_label))
        .draw()
        .map_err(draw_err)?;

    const HALF_WIDTH: f64 = 0.3;
    const CAP_HALF: f64 = 0.12;

    for (i, group) in groups.iter().enumerate() {
        let x = i as f64;
        let s = &group.summary;

        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(x - HALF_WIDTH, s.q3), (x + HALF_WIDTH, s.q1)],
                BAR_COLOR.mix(0.3).filled(),
            )))
            .map_err(draw_err)?;

        let outline = vec![
            vec![(x - HALF_WIDTH, s.q1), (x + HALF_WIDTH, s.q1), (x + HALF_WIDTH, s.q3), (x - HALF_WIDTH, s.q3), (x - HALF_WIDTH, s.q1)],
            vec![(x - HALF_WIDTH, s.median), (x + HALF_WIDTH, s.median)],
            vec![(x, s.lower_whisker), (x, s.q1)],
            vec![(x, s.q3), (x, s.upper_whisker)],
            vec![(x - CAP_HALF, s.lower_whisker), (x + CAP_HALF, s.lower_whisker)],
            vec![(x - CAP_HALF, s.upper_whisker), (x + CAP_HALF, s.upper_whisker)],
        ];
        chart
            .draw_series(outline.into_iter().map(|path| PathElement::new(path, BAR_COLOR.stroke_width(2))))
            .map_err(draw_err)?;

        // Every observation, spread sideways so ties stay visible
        chart
            .draw_series(group.points.iter().enumerate().map(|(j, &v)| {
                let jitter = ((j % 9) as f64 - 4.0) * 0.025;
                Circle::new((x + jitter, v), 2, POINT_COLOR.mix(0.6).filled())
            }))
            .map_err(draw_err)?;
    }

    Ok(())
}

fn draw_grouped_bars<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    categories: &[String],
    series: &[BarSeries],
) -> Result<()> {
    if series.is_empty() {
        return Ok(());
    }
    let max_count = series
        .iter()
        .flat_map(|s| s.counts.iter().copied())
        .max()
        .unwrap_or(0);

    let mut chart = chart_builder(root, spec)
        .build_cartesian_2d(category_range(categories.len()), count_range(max_count))
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(categories.len())
        .x_label_formatter(&|x| category_label(categories, *x))
        .x_desc(axis_desc(&spec.x_label))
        .y_desc(axis_desc(&spec.y_label))
        .draw()
        .map_err(draw_err)?;

    // Side-by-side bars
    let num_series = series.len() as f64;
    let bar_width = 0.8 / num_series;

    for (series_idx, s) in series.iter().enumerate() {
        let color = Palette99::pick(series_idx).to_rgba();
        let offset = (series_idx as f64 - (num_series - 1.0) / 2.0) * bar_width;

        chart
            .draw_series(s.counts.iter().enumerate().map(move |(cat_idx, &count)| {
                let x_center = cat_idx as f64 + offset;
                Rectangle::new(
                    [(x_center - bar_width / 2.0, 0.0), (x_center + bar_width / 2.0, count as f64)],
                    color.filled(),
                )
            }))
            .map_err(draw_err)?
            .label(truncate(&s.key, TICK_CHARS))
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(draw_err)?;

    Ok(())
}
