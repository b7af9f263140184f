// SVG renderers for the two task charts. Every render starts from an empty
// surface, so re-rendering after a filter change never leaves stale marks.
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::Serialize;
use crate::errors::{AppError, AppResult};
use super::interaction::{HoverState, Marker, Tooltip};
use super::pipeline::{CompanyTotal, SeriesPoint};
use super::scale::{date_domain, date_from_day_number, day_number, max_value, value_domain, BandScale};

const MARGIN_TOP: u32 = 20;
const MARGIN_RIGHT: u32 = 20;
const X_LABEL_AREA: u32 = 40;
const Y_LABEL_AREA: u32 = 60;
const STEEL_BLUE: RGBColor = RGBColor(70, 130, 180);

// Fraction of each band left empty between bars
pub const BAR_PADDING: f64 = 0.1;

/// Drawing target for one chart.
#[derive(Debug, Clone)]
pub struct ChartSurface {
    width: u32,
    height: u32,
    svg: String,
}

impl ChartSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            svg: String::new(),
        }
    }

    #[cfg(test)]
    pub fn svg(&self) -> &str {
        &self.svg
    }

    pub fn into_svg(self) -> String {
        self.svg
    }
}

/// A drawn bar, in surface pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub company: String,
    pub total: f64,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

fn render_err<E: std::fmt::Display>(err: E) -> AppError {
    AppError::Render(err.to_string())
}

/// Sales over time. Returns one hoverable marker per point, in date order.
/// Markers are drawn at the radius `hover` gives them.
pub fn render_line_chart(
    surface: &mut ChartSurface,
    series: &[SeriesPoint<'_>],
    hover: &HoverState,
) -> AppResult<Vec<Marker>> {
    surface.svg.clear();
    let size = (surface.width, surface.height);

    let (start, end) = date_domain(series.iter().map(|p| p.date));
    let (y_min, y_max) = value_domain(max_value(series.iter().map(|p| p.price)));
    let mut markers = Vec::with_capacity(series.len());

    {
        let root = SVGBackend::with_string(&mut surface.svg, size).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let mut chart = ChartBuilder::on(&root)
            .margin_top(MARGIN_TOP)
            .margin_right(MARGIN_RIGHT)
            .x_label_area_size(X_LABEL_AREA)
            .y_label_area_size(Y_LABEL_AREA)
            .build_cartesian_2d(day_number(start)..day_number(end), y_min..y_max)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(6)
            .y_labels(10)
            .x_label_formatter(&|x| {
                date_from_day_number(*x)
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default()
            })
            .y_label_formatter(&|y| format!("{:.0}", y))
            .y_desc("Price")
            .draw()
            .map_err(render_err)?;

        if !series.is_empty() {
            chart
                .draw_series(LineSeries::new(
                    series.iter().map(|p| (day_number(p.date), p.price)),
                    STEEL_BLUE.stroke_width(2),
                ))
                .map_err(render_err)?;

            chart
                .draw_series(series.iter().enumerate().map(|(i, p)| {
                    Circle::new((day_number(p.date), p.price), hover.radius(i), STEEL_BLUE.filled())
                }))
                .map_err(render_err)?;

            for point in series {
                let (x, y) = chart.backend_coord(&(day_number(point.date), point.price));
                markers.push(Marker {
                    x,
                    y,
                    tooltip: Tooltip::from_record(point.record),
                });
            }
        }

        root.present().map_err(render_err)?;
    }

    tracing::debug!("Rendered line chart with {} points", markers.len());
    Ok(markers)
}

/// Total sales per company, one band per company in input order.
pub fn render_bar_chart(surface: &mut ChartSurface, totals: &[CompanyTotal]) -> AppResult<Vec<Bar>> {
    surface.svg.clear();
    let size = (surface.width, surface.height);

    let (y_min, y_max) = value_domain(max_value(totals.iter().map(|t| t.total)));
    let bands = BandScale::new(totals.len(), (0.0, 1.0), BAR_PADDING);
    let mut bars = Vec::with_capacity(totals.len());

    {
        let root = SVGBackend::with_string(&mut surface.svg, size).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let mut chart = ChartBuilder::on(&root)
            .margin_top(MARGIN_TOP)
            .margin_right(MARGIN_RIGHT)
            .x_label_area_size(X_LABEL_AREA)
            .y_label_area_size(Y_LABEL_AREA)
            .build_cartesian_2d(0f64..1f64, y_min..y_max)
            .map_err(render_err)?;

        // Categories are labelled by hand below; the numeric x axis stays blank
        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(1)
            .x_label_formatter(&|_| String::new())
            .y_labels(10)
            .y_label_formatter(&|y| format!("{:.0}", y))
            .y_desc("Total sales")
            .draw()
            .map_err(render_err)?;

        chart
            .draw_series(totals.iter().enumerate().map(|(i, t)| {
                let x0 = bands.start(i);
                Rectangle::new([(x0, 0.0), (x0 + bands.bandwidth(), t.total)], STEEL_BLUE.filled())
            }))
            .map_err(render_err)?;

        let label_style = ("sans-serif", 12)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Top));

        for (i, total) in totals.iter().enumerate() {
            let x0 = bands.start(i);
            let (left, top) = chart.backend_coord(&(x0, total.total));
            let (right, bottom) = chart.backend_coord(&(x0 + bands.bandwidth(), 0.0));
            bars.push(Bar {
                company: total.company.clone(),
                total: total.total,
                x: left,
                y: top,
                width: right - left,
                height: bottom - top,
            });

            let (cx, axis_y) = chart.backend_coord(&(bands.center(i), 0.0));
            root.draw(&Text::new(total.company.clone(), (cx, axis_y + 6), label_style.clone()))
                .map_err(render_err)?;
        }

        root.present().map_err(render_err)?;
    }

    tracing::debug!("Rendered bar chart with {} bars", bars.len());
    Ok(bars)
}
