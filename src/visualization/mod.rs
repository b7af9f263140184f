pub mod chart;
pub mod interaction;
pub mod pipeline;
pub mod records;
pub mod scale;

use serde::Serialize;
use std::str::FromStr;
use std::time::Instant;
use crate::config::ChartConfig;
use crate::errors::{AppError, AppResult};
use crate::models::Record;
use chart::{render_bar_chart, render_line_chart, Bar, ChartSurface};
use interaction::{HoverState, HoverStyle, Marker, Tooltip};
use pipeline::{aggregate_by_company, apply_filter, time_series};

pub use records::RecordCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Bar,
}

impl FromStr for ChartKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "line" => Ok(ChartKind::Line),
            "bar" => Ok(ChartKind::Bar),
            other => Err(AppError::InvalidInput(format!(
                "Unknown chart '{}', expected 'line' or 'bar'",
                other
            ))),
        }
    }
}

/// Both charts for one task, drawn from the same filtered records.
#[derive(Debug, Clone, Serialize)]
pub struct TaskCharts {
    pub task_id: i64,
    pub year: Option<i32>,
    pub record_count: usize,
    pub line_svg: String,
    pub markers: Vec<Marker>,
    pub hover: HoverStyle,
    pub bar_svg: String,
    pub bars: Vec<Bar>,
}

pub fn render_task_charts(
    task_id: i64,
    records: &[Record],
    year: Option<i32>,
    config: &ChartConfig,
) -> AppResult<TaskCharts> {
    let filtered = apply_filter(records, year);
    let series = time_series(&filtered);
    let totals = aggregate_by_company(&filtered);
    let hover = HoverState::new(HoverStyle::from(config));

    let mut line = ChartSurface::new(config.width, config.height);
    let markers = render_line_chart(&mut line, &series, &hover)?;

    let mut bar = ChartSurface::new(config.width, config.height);
    let bars = render_bar_chart(&mut bar, &totals)?;

    tracing::debug!(
        "Rendered charts for task {} (year {:?}): {} of {} records",
        task_id,
        year,
        filtered.len(),
        records.len()
    );

    Ok(TaskCharts {
        task_id,
        year,
        record_count: filtered.len(),
        line_svg: line.into_svg(),
        markers,
        hover: *hover.style(),
        bar_svg: bar.into_svg(),
        bars,
    })
}

/// Just one chart, at rest, as an SVG document.
pub fn render_chart(
    kind: ChartKind,
    records: &[Record],
    year: Option<i32>,
    config: &ChartConfig,
) -> AppResult<String> {
    let filtered = apply_filter(records, year);
    let mut surface = ChartSurface::new(config.width, config.height);
    match kind {
        ChartKind::Line => {
            let hover = HoverState::new(HoverStyle::from(config));
            render_line_chart(&mut surface, &time_series(&filtered), &hover)?;
        }
        ChartKind::Bar => {
            render_bar_chart(&mut surface, &aggregate_by_company(&filtered))?;
        }
    }
    Ok(surface.into_svg())
}

/// The line chart as seen with the pointer at a given spot.
#[derive(Debug, Clone, Serialize)]
pub struct HoverFrame {
    pub hovered: Option<usize>,
    pub tooltip: Option<Tooltip>,
    pub tooltip_text: Option<String>,
    pub opacity: f64,
    pub line_svg: String,
}

/// Feeds a pointer position into `hover` and redraws the line chart with the
/// hovered marker enlarged. The tooltip of a marker just left keeps showing
/// with falling opacity until the fade runs out.
pub fn hover_line_chart(
    records: &[Record],
    year: Option<i32>,
    config: &ChartConfig,
    hover: &mut HoverState,
    pointer: (i32, i32),
    now: Instant,
) -> AppResult<HoverFrame> {
    let filtered = apply_filter(records, year);
    let series = time_series(&filtered);
    let mut surface = ChartSurface::new(config.width, config.height);

    // Marker positions do not depend on the hover state
    let markers = render_line_chart(&mut surface, &series, hover)?;
    hover.pointer_at(&markers, pointer.0, pointer.1, now);
    render_line_chart(&mut surface, &series, hover)?;

    let shown = hover.tooltip(&markers, now);
    Ok(HoverFrame {
        hovered: hover.hovered(),
        tooltip: shown.map(|(tip, _)| tip.clone()),
        tooltip_text: shown.map(|(tip, _)| tip.text()),
        opacity: shown.map_or(0.0, |(_, opacity)| opacity),
        line_svg: surface.into_svg(),
    })
}
