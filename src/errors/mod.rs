// Error taxonomy of the viewer. Submission, Fetch and Poll are kept apart so a
// caller can tell "the analysis failed" from "we lost contact with it".
use thiserror::Error;

pub mod backend;
pub mod response;

pub use backend::{BackendError, BackendResult};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Task creation failed: {0}")]
    Submission(BackendError),

    #[error("Fetch failed: {0}")]
    Fetch(BackendError),

    #[error("Polling task {task_id} failed: {source}")]
    Poll {
        task_id: i64,
        #[source]
        source: BackendError,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Selection of task {0} was superseded by a newer request")]
    Superseded(i64),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    // Text shown to the user, one wording per failure kind.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Submission(e) => format!("Error: {}", backend_message(e)),
            AppError::Poll { source, .. } => {
                format!("Error polling status: {}", backend_message(source))
            }
            other => format!("Error: {}", other),
        }
    }
}

fn backend_message(err: &BackendError) -> String {
    match err {
        BackendError::Rejected { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

// Custom result type
pub type AppResult<T> = Result<T, AppError>;
