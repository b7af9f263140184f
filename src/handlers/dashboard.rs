use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;
use std::time::Instant;
use crate::errors::AppResult;
use crate::models::{FilterQuery, PointerForm, Task};
use crate::services::TaskBackend;
use crate::visualization::{hover_line_chart, render_chart, render_task_charts, ChartKind};
use super::AppState;

#[derive(Serialize)]
struct TaskEntry<'a> {
    #[serde(flatten)]
    task: &'a Task,
    label: String,
}

fn task_list<B: TaskBackend>(state: &AppState<B>) -> Response {
    let snapshot = state.store.all();
    let tasks: Vec<TaskEntry<'_>> = snapshot
        .iter()
        .map(|task| TaskEntry { task, label: task.label() })
        .collect();
    Json(json!({ "tasks": tasks })).into_response()
}

pub async fn list_tasks<B: TaskBackend>(State(state): State<AppState<B>>) -> Response {
    task_list(&state)
}

pub async fn refresh_tasks<B: TaskBackend>(State(state): State<AppState<B>>) -> AppResult<Response> {
    state.store.refresh().await?;
    Ok(task_list(&state))
}

pub async fn view_charts<B: TaskBackend>(
    Path(task_id): Path<i64>,
    Query(filter): Query<FilterQuery>,
    State(state): State<AppState<B>>,
) -> AppResult<Response> {
    let year = filter.year()?;
    let records = state.records.load(task_id).await?;
    let charts = render_task_charts(task_id, &records, year, &state.config.chart)?;
    Ok(Json(charts).into_response())
}

// Raw SVG of one chart, for embedding directly
pub async fn chart_svg<B: TaskBackend>(
    Path((task_id, kind)): Path<(i64, String)>,
    Query(filter): Query<FilterQuery>,
    State(state): State<AppState<B>>,
) -> AppResult<Response> {
    let kind: ChartKind = kind.parse()?;
    let year = filter.year()?;
    let records = state.records.load(task_id).await?;
    let svg = render_chart(kind, &records, year, &state.config.chart)?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

pub async fn hover_chart<B: TaskBackend>(
    Path(task_id): Path<i64>,
    Query(filter): Query<FilterQuery>,
    State(state): State<AppState<B>>,
    Json(pointer): Json<PointerForm>,
) -> AppResult<Response> {
    let year = filter.year()?;
    let records = state.records.load(task_id).await?;

    let mut hover = state.hover();
    let frame = hover_line_chart(
        &records,
        year,
        &state.config.chart,
        &mut hover,
        (pointer.x, pointer.y),
        Instant::now(),
    )?;
    tracing::trace!("Pointer at ({}, {}) on task {}: {:?}", pointer.x, pointer.y, task_id, frame.hovered);
    Ok(Json(frame).into_response())
}
