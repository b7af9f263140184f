mod dashboard;
mod task;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::{Arc, Mutex, MutexGuard};
use crate::config::Config;
use crate::services::{TaskBackend, TaskStore};
use crate::tracker::Tracker;
use crate::visualization::interaction::{HoverState, HoverStyle};
use crate::visualization::RecordCache;

// Everything the handlers share
pub struct AppState<B: TaskBackend> {
    pub tracker: Arc<Tracker<B>>,
    pub store: Arc<TaskStore<B>>,
    pub records: Arc<RecordCache<B>>,
    // Pointer state of the line chart in the current visualization session
    pub hover: Arc<Mutex<HoverState>>,
    pub config: Config,
}

impl<B: TaskBackend> AppState<B> {
    pub fn new(backend: Arc<B>, config: Config) -> Self {
        let timeout = config.backend.request_timeout();
        let store = Arc::new(TaskStore::new(backend.clone(), timeout));
        let tracker = Arc::new(Tracker::new(backend.clone(), store.clone(), &config.tracker, timeout));
        let records = Arc::new(RecordCache::new(backend, timeout));
        let hover = Arc::new(Mutex::new(HoverState::new(HoverStyle::from(&config.chart))));
        Self {
            tracker,
            store,
            records,
            hover,
            config,
        }
    }

    pub fn hover(&self) -> MutexGuard<'_, HoverState> {
        self.hover.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<B: TaskBackend> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            tracker: self.tracker.clone(),
            store: self.store.clone(),
            records: self.records.clone(),
            hover: self.hover.clone(),
            config: self.config.clone(),
        }
    }
}

pub fn router<B: TaskBackend>(state: AppState<B>) -> Router {
    Router::new()
        // Task lifecycle
        .route("/tasks", post(task::submit_task::<B>).get(dashboard::list_tasks::<B>))
        .route("/tasks/refresh", post(dashboard::refresh_tasks::<B>))
        .route("/tasks/:task_id/select", post(task::select_task::<B>))
        .route("/status", get(task::get_status::<B>))

        // Visualizations
        .route("/tasks/:task_id/charts", get(dashboard::view_charts::<B>))
        .route("/tasks/:task_id/charts/hover", post(dashboard::hover_chart::<B>))
        .route("/tasks/:task_id/charts/:kind", get(dashboard::chart_svg::<B>))

        .with_state(state)
}
