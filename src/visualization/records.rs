use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use crate::errors::{AppError, AppResult, BackendError};
use crate::models::{Record, TaskStatus};
use crate::services::{with_timeout, TaskBackend};

struct Cached {
    task_id: i64,
    records: Arc<Vec<Record>>,
}

/// Records of the task being viewed. They are fetched once per selection and
/// reused for every filter change until `invalidate` is called.
pub struct RecordCache<B: TaskBackend> {
    backend: Arc<B>,
    timeout: Duration,
    slot: Mutex<Option<Cached>>,
}

impl<B: TaskBackend> RecordCache<B> {
    pub fn new(backend: Arc<B>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            slot: Mutex::new(None),
        }
    }

    pub async fn load(&self, task_id: i64) -> AppResult<Arc<Vec<Record>>> {
        // Held across the fetch so concurrent chart requests share one download
        let mut slot = self.slot.lock().await;
        if let Some(cached) = slot.as_ref().filter(|c| c.task_id == task_id) {
            return Ok(cached.records.clone());
        }

        let task = with_timeout(self.timeout, self.backend.get_task(task_id))
            .await
            .map_err(AppError::Fetch)?;
        if task.status != TaskStatus::Completed {
            tracing::warn!("Records requested for task {} while {}", task_id, task.status);
            return Err(AppError::Fetch(BackendError::NotReady {
                task_id,
                status: task.status.to_string(),
            }));
        }

        let records = with_timeout(self.timeout, self.backend.get_task_records(task_id))
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch records for task {}: {}", task_id, e);
                AppError::Fetch(e)
            })?;

        tracing::info!("Loaded {} records for task {}", records.len(), task_id);
        let records = Arc::new(records);
        *slot = Some(Cached {
            task_id,
            records: records.clone(),
        });
        Ok(records)
    }

    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }
}
