use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use crate::errors::{BackendError, BackendResult};
use crate::models::{CreateTaskRequest, CreatedTask, Record, Task};

/// Request/response contract of the analysis backend.
///
/// Transport and authentication belong to the implementation. Every method
/// reports failures as [`BackendError`] so callers can classify them.
#[async_trait]
pub trait TaskBackend: Send + Sync + 'static {
    async fn create_task(&self, request: &CreateTaskRequest) -> BackendResult<CreatedTask>;

    async fn get_task(&self, task_id: i64) -> BackendResult<Task>;

    /// All known tasks, in backend order.
    async fn get_all_tasks(&self) -> BackendResult<Vec<Task>>;

    /// Only defined once the task has completed.
    async fn get_task_records(&self, task_id: i64) -> BackendResult<Vec<Record>>;
}

// Bounds a single backend call
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> BackendResult<T>
where
    F: Future<Output = BackendResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_elapsed) => {
            tracing::warn!("Backend call exceeded {:?}", limit);
            Err(BackendError::Timeout(limit))
        }
    }
}
