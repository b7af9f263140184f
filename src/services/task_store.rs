use std::sync::{Arc, RwLock};
use std::time::Duration;
use crate::errors::{AppError, AppResult};
use crate::models::Task;
use super::backend::{with_timeout, TaskBackend};

/// Latest known list of tasks.
///
/// Readers get an `Arc` to an immutable snapshot; `refresh` swaps in a whole
/// new list, so a half-updated list is never observable.
pub struct TaskStore<B: TaskBackend> {
    backend: Arc<B>,
    timeout: Duration,
    snapshot: RwLock<Arc<Vec<Task>>>,
}

impl<B: TaskBackend> TaskStore<B> {
    pub fn new(backend: Arc<B>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            snapshot: RwLock::new(Arc::new(Vec::new())),
        }
    }

    // On failure the previous snapshot stays in place
    pub async fn refresh(&self) -> AppResult<()> {
        let tasks = with_timeout(self.timeout, self.backend.get_all_tasks())
            .await
            .map_err(|e| {
                tracing::warn!("Task list refresh failed, keeping previous snapshot: {}", e);
                AppError::Fetch(e)
            })?;

        tracing::debug!("Task list refreshed with {} tasks", tasks.len());
        let fresh = Arc::new(tasks);
        match self.snapshot.write() {
            Ok(mut slot) => *slot = fresh,
            Err(poisoned) => *poisoned.into_inner() = fresh,
        }
        Ok(())
    }

    pub fn all(&self) -> Arc<Vec<Task>> {
        match self.snapshot.read() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    #[cfg(test)]
    pub fn get(&self, task_id: i64) -> Option<Task> {
        self.all().iter().find(|t| t.id == task_id).cloned()
    }
}
