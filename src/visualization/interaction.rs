// Hover behaviour of line chart markers: entering a marker enlarges it and
// shows its tooltip, leaving shrinks it back and fades the tooltip out.
use chrono::NaiveDate;
use serde::Serialize;
use std::time::{Duration, Instant};
use crate::config::ChartConfig;
use crate::models::Record;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub company: String,
    pub car_model: String,
    pub sale_date: NaiveDate,
    pub price: f64,
}

impl Tooltip {
    pub fn from_record(record: &Record) -> Self {
        Self {
            company: record.company.clone(),
            car_model: record.car_model.clone(),
            sale_date: record.sale_date,
            price: record.price,
        }
    }

    pub fn text(&self) -> String {
        format!(
            "Company: {}\nModel: {}\nDate: {}\nPrice: ${:.2}",
            self.company, self.car_model, self.sale_date, self.price
        )
    }
}

/// A data point drawn on the line chart, in surface pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub x: i32,
    pub y: i32,
    pub tooltip: Tooltip,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HoverStyle {
    pub radius: u32,
    pub hover_radius: u32,
    #[serde(rename = "fade_ms", serialize_with = "as_millis")]
    pub fade: Duration,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl From<&ChartConfig> for HoverStyle {
    fn from(config: &ChartConfig) -> Self {
        Self {
            radius: config.marker_radius,
            hover_radius: config.marker_hover_radius.max(config.marker_radius),
            fade: Duration::from_millis(config.tooltip_fade_ms),
        }
    }
}

impl Default for HoverStyle {
    fn default() -> Self {
        Self::from(&ChartConfig::default())
    }
}

// Index of the marker under (x, y), nearest first
pub fn hit_test(markers: &[Marker], style: &HoverStyle, x: i32, y: i32) -> Option<usize> {
    let reach = i64::from(style.hover_radius) * i64::from(style.hover_radius);
    markers
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let dx = i64::from(m.x - x);
            let dy = i64::from(m.y - y);
            (i, dx * dx + dy * dy)
        })
        .filter(|&(_, dist)| dist <= reach)
        .min_by_key(|&(_, dist)| dist)
        .map(|(i, _)| i)
}

#[derive(Debug, Clone, PartialEq)]
pub struct HoverState {
    style: HoverStyle,
    hovered: Option<usize>,
    fading: Option<(usize, Instant)>,
}

impl HoverState {
    pub fn new(style: HoverStyle) -> Self {
        Self {
            style,
            hovered: None,
            fading: None,
        }
    }

    pub fn style(&self) -> &HoverStyle {
        &self.style
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    // Back to rest: nothing hovered, nothing fading
    pub fn reset(&mut self) {
        self.hovered = None;
        self.fading = None;
    }

    /// Moves the pointer to `(x, y)`: enters the marker under it, or leaves
    /// the hovered one when the pointer is over empty space.
    pub fn pointer_at(&mut self, markers: &[Marker], x: i32, y: i32, now: Instant) {
        match hit_test(markers, &self.style, x, y) {
            Some(index) if self.hovered != Some(index) => self.enter(index),
            Some(_) => {}
            None => self.leave(now),
        }
    }

    pub fn enter(&mut self, index: usize) {
        self.hovered = Some(index);
        self.fading = None;
    }

    pub fn leave(&mut self, now: Instant) {
        if let Some(index) = self.hovered.take() {
            self.fading = Some((index, now + self.style.fade));
        }
    }

    pub fn radius(&self, index: usize) -> u32 {
        if self.hovered == Some(index) {
            self.style.hover_radius
        } else {
            self.style.radius
        }
    }

    /// Tooltip to show at `now` with its opacity in `0.0..=1.0`.
    pub fn tooltip<'a>(&self, markers: &'a [Marker], now: Instant) -> Option<(&'a Tooltip, f64)> {
        if let Some(index) = self.hovered {
            return markers.get(index).map(|m| (&m.tooltip, 1.0));
        }
        let (index, hidden_at) = self.fading?;
        if now >= hidden_at || self.style.fade.is_zero() {
            return None;
        }
        let remaining = hidden_at.duration_since(now).as_secs_f64();
        let opacity = remaining / self.style.fade.as_secs_f64();
        markers.get(index).map(|m| (&m.tooltip, opacity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::record;

    fn markers() -> Vec<Marker> {
        vec![
            Marker { x: 10, y: 10, tooltip: Tooltip::from_record(&record("2023-01-01", "Honda", "Civic", 21000.0)) },
            Marker { x: 40, y: 12, tooltip: Tooltip::from_record(&record("2023-02-01", "Toyota", "Camry", 26000.0)) },
        ]
    }

    #[test]
    fn test_hover_enlarges_and_shows_tooltip() {
        let style = HoverStyle::default();
        let markers = markers();
        let mut hover = HoverState::new(style);
        let now = Instant::now();

        let hit = hit_test(&markers, &style, 42, 10).unwrap();
        assert_eq!(hit, 1);
        hover.enter(hit);

        assert_eq!(hover.radius(1), style.hover_radius);
        assert_eq!(hover.radius(0), style.radius);
        let (tip, opacity) = hover.tooltip(&markers, now).unwrap();
        assert_eq!(tip.company, "Toyota");
        assert_eq!(opacity, 1.0);
        assert_eq!(tip.text(), "Company: Toyota\nModel: Camry\nDate: 2023-02-01\nPrice: $26000.00");
    }

    #[test]
    fn test_leave_fades_then_hides() {
        let style = HoverStyle::default();
        let markers = markers();
        let mut hover = HoverState::new(style);
        let now = Instant::now();

        hover.enter(0);
        hover.leave(now);
        assert_eq!(hover.radius(0), style.radius);

        let (_, opacity) = hover.tooltip(&markers, now + style.fade / 2).unwrap();
        assert!(opacity > 0.0 && opacity < 1.0);
        assert!(hover.tooltip(&markers, now + style.fade).is_none());
    }

    #[test]
    fn test_pointer_moves_between_markers() {
        let style = HoverStyle::default();
        let markers = markers();
        let mut hover = HoverState::new(style);
        let now = Instant::now();

        hover.pointer_at(&markers, 11, 9, now);
        assert_eq!(hover.hovered(), Some(0));
        hover.pointer_at(&markers, 40, 12, now);
        assert_eq!(hover.hovered(), Some(1));

        hover.pointer_at(&markers, 300, 300, now);
        assert_eq!(hover.hovered(), None);
        assert_eq!(hover.tooltip(&markers, now).map(|(t, _)| t.company.as_str()), Some("Toyota"));
        assert!(hover.tooltip(&markers, now + style.fade).is_none());

        hover.enter(0);
        hover.reset();
        assert_eq!(hover.tooltip(&markers, now), None);
    }

    #[test]
    fn test_miss_hits_nothing() {
        assert_eq!(hit_test(&markers(), &HoverStyle::default(), 200, 200), None);
    }
}
