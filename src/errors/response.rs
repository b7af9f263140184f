use axum::{
    response::{IntoResponse, Response, Json},
    http::StatusCode,
};
use serde_json::json;
use crate::errors::{AppError, BackendError};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Superseded(_) => StatusCode::CONFLICT,
            AppError::Render(_) | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Submission(err) | AppError::Fetch(err) => backend_status(err),
            AppError::Poll { source, .. } => backend_status(source),
        };

        tracing::debug!("Responding with {}: {}", status, self);
        (status, Json(json!({ "error": self.user_message() }))).into_response()
    }
}

// Backend failures map onto the closest gateway-side status
fn backend_status(err: &BackendError) -> StatusCode {
    match err {
        BackendError::Rejected { status, .. } if *status < 500 => StatusCode::BAD_REQUEST,
        BackendError::NotFound(_) => StatusCode::NOT_FOUND,
        BackendError::NotReady { .. } => StatusCode::CONFLICT,
        BackendError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_GATEWAY,
    }
}
