use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};
use crate::errors::AppResult;
use crate::models::SubmitForm;
use crate::services::TaskBackend;
use crate::tracker::{Submission, TrackerView};
use super::AppState;

pub(super) fn view_json(view: &TrackerView) -> Value {
    json!({
        "task_id": view.task_id,
        "phase": view.phase.label(),
        "status": view.status,
        "terminal": view.is_terminal(),
        "message": view.message(),
        "store_error": view.store_error.as_ref().map(|e| e.user_message()),
    })
}

fn submission_json(submission: &Submission) -> Value {
    json!({
        "task_id": submission.task_id,
        "status": submission.status,
        "message": format!("Task {} created with status: {}", submission.task_id, submission.status),
        "store_error": submission.store_error.as_ref().map(|e| e.user_message()),
    })
}

pub async fn submit_task<B: TaskBackend>(
    State(state): State<AppState<B>>,
    Json(form): Json<SubmitForm>,
) -> AppResult<Response> {
    tracing::info!("Received analysis request {}-{}", form.start_year, form.end_year);

    let submission = state.tracker.submit(form.into_request()).await?;
    Ok((StatusCode::CREATED, Json(submission_json(&submission))).into_response())
}

pub async fn select_task<B: TaskBackend>(
    Path(task_id): Path<i64>,
    State(state): State<AppState<B>>,
) -> AppResult<Response> {
    // A new selection always starts a fresh visualization session
    state.records.invalidate().await;
    state.hover().reset();

    let view = state.tracker.select(task_id).await?;
    tracing::debug!("Task {} selected: {}", task_id, view.message());
    Ok(Json(view_json(&view)).into_response())
}

pub async fn get_status<B: TaskBackend>(State(state): State<AppState<B>>) -> Json<Value> {
    let view = state.tracker.view();
    tracing::trace!("Tracker status: {:?}", view);
    Json(view_json(&view))
}
