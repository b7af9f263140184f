// Scale helpers shared by both charts: value domains rounded outward to
// tick-friendly numbers, a date domain that never collapses, and a band
// scale for categories.
use chrono::{Datelike, Duration, NaiveDate};

// Headroom above the largest value
pub const HEADROOM: f64 = 1.1;
pub const DEFAULT_TICKS: usize = 10;
pub const PLACEHOLDER_MAX: f64 = 1.0;

/// Rounds `value` up to a multiple of a 1/2/5 x 10^n tick step.
pub fn nice_ceil(value: f64, ticks: usize) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return PLACEHOLDER_MAX;
    }
    let step = tick_step(value, ticks);
    // Guard against 11.000000000000002-style quotients
    ((value / step) - 1e-9).ceil() * step
}

fn tick_step(span: f64, ticks: usize) -> f64 {
    let raw = span / ticks.max(1) as f64;
    let power = 10f64.powf(raw.log10().floor());
    let error = raw / power;
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    factor * power
}

/// `[0, nice(max * 1.1)]`, or the placeholder `[0, 1]` for empty or all-zero data.
pub fn value_domain(max: Option<f64>) -> (f64, f64) {
    match max {
        Some(max) => (0.0, nice_ceil(max * HEADROOM, DEFAULT_TICKS)),
        None => (0.0, PLACEHOLDER_MAX),
    }
}

pub fn max_value(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    values.into_iter().fold(None, |acc, v| match acc {
        Some(m) if m >= v => Some(m),
        _ => Some(v),
    })
}

// Dates are plotted as day numbers
pub fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

pub fn date_from_day_number(day: f64) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(day.round() as i32)
}

/// Min..max of `dates`. A single date is padded by a day on each side (only
/// inward at the ends of the calendar) and an empty input falls back to a
/// fixed placeholder week.
pub fn date_domain(dates: impl IntoIterator<Item = NaiveDate>) -> (NaiveDate, NaiveDate) {
    let mut iter = dates.into_iter();
    let Some(first) = iter.next() else {
        return placeholder_week();
    };

    let (min, max) = iter.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
    if min != max {
        return (min, max);
    }
    let day = Duration::days(1);
    match (min.checked_sub_signed(day), max.checked_add_signed(day)) {
        (Some(lo), Some(hi)) => (lo, hi),
        (None, Some(hi)) => (min, hi),
        (Some(lo), None) => (lo, max),
        (None, None) => placeholder_week(),
    }
}

fn placeholder_week() -> (NaiveDate, NaiveDate) {
    let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN);
    (start, start.checked_add_signed(Duration::days(7)).unwrap_or(NaiveDate::MAX))
}

/// One band per category with the same inner and outer padding fraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandScale {
    count: usize,
    range: (f64, f64),
    padding: f64,
}

impl BandScale {
    pub fn new(count: usize, range: (f64, f64), padding: f64) -> Self {
        Self {
            count,
            range,
            padding: padding.clamp(0.0, 1.0),
        }
    }

    pub fn step(&self) -> f64 {
        let width = self.range.1 - self.range.0;
        width / (self.count as f64 + self.padding).max(1.0)
    }

    pub fn bandwidth(&self) -> f64 {
        self.step() * (1.0 - self.padding)
    }

    pub fn start(&self, index: usize) -> f64 {
        let step = self.step();
        self.range.0 + step * self.padding + step * index as f64
    }

    pub fn center(&self, index: usize) -> f64 {
        self.start(index) + self.bandwidth() / 2.0
    }
}
