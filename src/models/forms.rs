use serde::Deserialize;
use crate::errors::{AppError, AppResult};
use super::task::{companies, CreateTaskRequest};

// Submission as typed by the user. Companies arrive as free text.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SubmitForm {
    pub start_year: i32,
    pub end_year: i32,
    #[serde(default)]
    pub companies: Option<String>,
}

impl SubmitForm {
    pub fn into_request(self) -> CreateTaskRequest {
        CreateTaskRequest {
            start_year: self.start_year,
            end_year: self.end_year,
            companies: self.companies.as_deref().and_then(companies::split),
        }
    }
}

// Pointer position over the line chart, in chart pixels
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct PointerForm {
    pub x: i32,
    pub y: i32,
}

// `?year=` on the chart endpoint. Blank means no filter.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct FilterQuery {
    #[serde(default)]
    pub year: Option<String>,
}

impl FilterQuery {
    pub fn year(&self) -> AppResult<Option<i32>> {
        match self.year.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|e| AppError::InvalidInput(format!("Invalid year filter '{}': {}", raw, e))),
        }
    }
}
