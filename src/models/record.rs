use serde::{Deserialize, Serialize};
use chrono::{Datelike, NaiveDate};
use super::timestamp;

// One sale belonging to a completed task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(deserialize_with = "timestamp::date")]
    pub sale_date: NaiveDate,
    pub price: f64,
    pub company: String,
    pub car_model: String,
}

impl Record {
    pub fn year(&self) -> i32 {
        self.sale_date.year()
    }
}
