// Turns a task's records into the datasets the two charts draw.
use chrono::NaiveDate;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashMap;
use crate::models::Record;

/// One point of the sales-over-time line, in date order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint<'a> {
    pub date: NaiveDate,
    pub price: f64,
    pub record: &'a Record,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyTotal {
    pub company: String,
    pub total: f64,
}

// Keeps the records sold in `year`, or borrows the input untouched when
// there is no filter.
pub fn apply_filter(records: &[Record], year: Option<i32>) -> Cow<'_, [Record]> {
    match year {
        None => Cow::Borrowed(records),
        Some(year) => Cow::Owned(
            records
                .iter()
                .filter(|r| r.year() == year)
                .cloned()
                .collect(),
        ),
    }
}

// Stable ascending sort by sale date
pub fn time_series(records: &[Record]) -> Vec<SeriesPoint<'_>> {
    let mut points: Vec<SeriesPoint<'_>> = records
        .iter()
        .map(|record| SeriesPoint {
            date: record.sale_date,
            price: record.price,
            record,
        })
        .collect();
    points.sort_by_key(|p| p.date);
    points
}

// Sums price per company, in order of each company's first appearance
pub fn aggregate_by_company(records: &[Record]) -> Vec<CompanyTotal> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<CompanyTotal> = Vec::new();

    for record in records {
        match index.get(record.company.as_str()) {
            Some(&i) => totals[i].total += record.price,
            None => {
                index.insert(&record.company, totals.len());
                totals.push(CompanyTotal {
                    company: record.company.clone(),
                    total: record.price,
                });
            }
        }
    }

    totals
}
