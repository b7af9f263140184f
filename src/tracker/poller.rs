use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use crate::errors::AppError;
use crate::models::Task;
use crate::services::{with_timeout, TaskBackend};
use super::lifecycle::Shared;
use super::state::{Failure, Outcome, Phase};

// A scheduled poll loop. Cancelling it guarantees no further tick fires.
pub(super) struct PollHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl PollHandle {
    pub(super) fn cancel(self) {
        self.cancel.cancel();
        self.join.abort();
    }
}

pub(super) fn spawn<B: TaskBackend>(shared: Arc<Shared<B>>, task_id: i64, epoch: u64) -> PollHandle {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let join = tokio::spawn(async move {
        poll_until_terminal(shared, task_id, epoch, token).await;
    });
    PollHandle { cancel, join }
}

// One tick at a time: the next sleep only starts after the previous
// response has been applied.
async fn poll_until_terminal<B: TaskBackend>(
    shared: Arc<Shared<B>>,
    task_id: i64,
    epoch: u64,
    cancel: CancellationToken,
) {
    tracing::info!("Polling task {} every {:?}", task_id, shared.interval);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = sleep(shared.interval) => {}
        }

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            res = with_timeout(shared.call_timeout, shared.backend.get_task(task_id)) => res,
        };

        let task: Task = match fetched {
            Ok(task) => task,
            Err(e) => {
                tracing::error!("Lost contact with task {}: {}", task_id, e);
                let failure = Failure::Poll(AppError::Poll { task_id, source: e });
                shared.finish(epoch, None, Phase::Failed(failure), None);
                return;
            }
        };

        tracing::debug!("Task {} reported status {}", task_id, task.status);
        match shared.policy.classify(&task.status) {
            Outcome::InProgress => {
                if !shared.record_progress(epoch, task.status) {
                    break;
                }
            }
            Outcome::Failed => {
                tracing::warn!("Task {} failed with status {}", task_id, task.status);
                let status = task.status.clone();
                shared.finish(epoch, Some(task.status), Phase::Failed(Failure::Analysis(status)), None);
                return;
            }
            Outcome::Succeeded => {
                tracing::info!("Task {} completed", task_id);
                let store_error = shared.store.refresh().await.err();
                shared.finish(epoch, Some(task.status), Phase::Completed, store_error);
                return;
            }
        }
    }

    tracing::debug!("Poll loop for task {} cancelled", task_id);
}
