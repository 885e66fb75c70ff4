//! Line chart of memory usage per section.
//!
//! One line per metric, drawn in [`SectionTable::ordered_columns`] order so the
//! aggregate (`total`) line is painted last, on top of the others. Missing
//! values split a line into segments instead of being interpolated.

use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::Context;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::memlog::{DEFAULT_PREFIX, SectionTable};

/// Matplotlib's default "tab10" color cycle.
const TAB10: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

/// Chart size and labels
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

impl ChartStyle {
    pub fn default_title(prefix: &str) -> String {
        format!("{prefix} Memory Usage Over Sections")
    }
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 960,
            title: Self::default_title(DEFAULT_PREFIX),
            x_label: "# Planner returns".to_string(),
            y_label: "Memory (GB)".to_string(),
        }
    }
}

/// Extensions the bitmap encoder picks a format from.
const BITMAP_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Image encoding, picked from the output extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartFormat {
    Svg,
    /// The bitmap encoder chooses png, jpeg or bmp from the extension
    Bitmap,
    /// No extension, or one the encoder doesn't know: written as PNG
    Png,
}

impl ChartFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => ChartFormat::Svg,
            Some(ext)
                if BITMAP_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known)) =>
            {
                ChartFormat::Bitmap
            }
            _ => ChartFormat::Png,
        }
    }
}

/// Sibling of `path` with a `.png` extension, used to encode PNG data for
/// paths whose own extension says nothing about the format.
fn png_staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "chart".to_string());
    path.with_file_name(format!(".{name}.memplot.png"))
}

/// Plot-ready points for one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    pub name: String,
    /// Runs of consecutive sections that have a value
    pub segments: Vec<Vec<(f64, f64)>>,
}

impl MetricSeries {
    fn points(&self) -> impl Iterator<Item = &(f64, f64)> {
        self.segments.iter().flatten()
    }
}

/// Turn table columns into drawable series, skipping metrics with no values.
pub fn build_series(table: &SectionTable) -> Vec<MetricSeries> {
    table
        .ordered_columns()
        .into_iter()
        .filter_map(|column| {
            let mut segments = Vec::new();
            let mut segment = Vec::new();
            for (row, value) in table.column_series(column).into_iter().enumerate() {
                match value.filter(|v| v.is_finite()) {
                    Some(value) => segment.push((row as f64, value)),
                    None if !segment.is_empty() => segments.push(std::mem::take(&mut segment)),
                    None => {}
                }
            }
            if !segment.is_empty() {
                segments.push(segment);
            }

            if segments.is_empty() {
                log::warn!("Skipping {column}: no numeric values");
                return None;
            }
            Some(MetricSeries {
                name: column.to_string(),
                segments,
            })
        })
        .collect()
}

/// X range covering every section, at least one unit wide.
fn x_range(sections: usize) -> Range<f64> {
    let last = sections.saturating_sub(1).max(1) as f64;
    0.0..last
}

/// Y range over all points with 5% headroom on both sides.
fn y_range(series: &[MetricSeries]) -> Range<f64> {
    let (min, max) = series
        .iter()
        .flat_map(MetricSeries::points)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), (_, y)| {
            (min.min(*y), max.max(*y))
        });
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }

    let span = max - min;
    let pad = if span > 0.0 {
        span * 0.05
    } else {
        (max.abs() * 0.1).max(0.1)
    };
    (min - pad)..(max + pad)
}

/// Render the table to `path`, creating parent directories as needed.
///
/// Returns the resolved path of the written image.
pub fn save_chart(
    table: &SectionTable,
    path: &Path,
    style: &ChartStyle,
) -> anyhow::Result<PathBuf> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let series = build_series(table);
    let size = (style.width, style.height);
    let drawn = match ChartFormat::from_path(path) {
        ChartFormat::Svg => {
            let root = SVGBackend::new(path, size).into_drawing_area();
            draw_chart(root, &series, table.len(), style)
        }
        ChartFormat::Bitmap => {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            draw_chart(root, &series, table.len(), style)
        }
        ChartFormat::Png => {
            let staging = png_staging_path(path);
            let root = BitMapBackend::new(&staging, size).into_drawing_area();
            let drawn = draw_chart(root, &series, table.len(), style).and_then(|()| {
                std::fs::rename(&staging, path)
                    .with_context(|| format!("Failed to move {}", staging.display()))
            });
            if drawn.is_err() {
                let _ = std::fs::remove_file(&staging);
            }
            drawn
        }
    };
    drawn.with_context(|| format!("Failed to write chart to {}", path.display()))?;

    log::info!("Wrote {} series to {}", series.len(), path.display());
    Ok(dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()))
}

fn draw_chart<DB>(
    root: DrawingArea<DB, Shift>,
    series: &[MetricSeries],
    sections: usize,
    style: &ChartStyle,
) -> anyhow::Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&style.title, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range(sections), y_range(series))?;

    chart
        .configure_mesh()
        .x_desc(style.x_label.as_str())
        .y_desc(style.y_label.as_str())
        .x_labels(sections.clamp(2, 12))
        .x_label_formatter(&|v| format!("{v:.0}"))
        .y_label_formatter(&|v| format!("{v:.3}"))
        .bold_line_style(BLACK.mix(0.3))
        .light_line_style(TRANSPARENT)
        .draw()?;

    for (idx, metric) in series.iter().enumerate() {
        let line_style = TAB10[idx % TAB10.len()].stroke_width(2);

        for (segment_idx, segment) in metric.segments.iter().enumerate() {
            // A lone point has no line to draw
            if segment.len() == 1 {
                chart.draw_series(std::iter::once(Circle::new(
                    segment[0],
                    3,
                    line_style.filled(),
                )))?;
            }

            let anno = chart.draw_series(LineSeries::new(segment.iter().copied(), line_style))?;
            if segment_idx == 0 {
                anno.label(metric.name.as_str()).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], line_style)
                });
            }
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK.mix(0.3))
        .draw()?;

    root.present()?;
    Ok(())
}
