use thiserror::Error;
use std::time::Duration;

// Failures talking to the analysis backend. Cloneable so the tracker can
// keep the last one in its published view.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Task {0} not found")]
    NotFound(i64),

    #[error("Backend call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed backend response: {0}")]
    Decode(String),

    #[error("Records for task {task_id} are unavailable while its status is {status}")]
    NotReady { task_id: i64, status: String },
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

pub type BackendResult<T> = Result<T, BackendError>;
