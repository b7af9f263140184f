use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use crate::config::TrackerConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{CreateTaskRequest, TaskStatus};
use crate::services::{with_timeout, TaskBackend, TaskStore};
use super::poller::{self, PollHandle};
use super::state::{Failure, Outcome, Phase, TerminalPolicy, TrackerView};

/// Result of a successful `submit`
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub task_id: i64,
    pub status: TaskStatus,
    pub store_error: Option<AppError>,
}

struct Control {
    // Bumped on every cancellation; responses tagged with an older epoch are dropped
    epoch: u64,
    poll: Option<PollHandle>,
}

pub(super) struct Shared<B: TaskBackend> {
    pub(super) backend: Arc<B>,
    pub(super) store: Arc<TaskStore<B>>,
    pub(super) policy: TerminalPolicy,
    pub(super) interval: Duration,
    pub(super) call_timeout: Duration,
    control: Mutex<Control>,
    view: watch::Sender<TrackerView>,
}

impl<B: TaskBackend> Shared<B> {
    fn control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // Stops whatever loop is running and opens a new epoch
    fn begin(&self) -> u64 {
        let mut control = self.control();
        control.epoch += 1;
        if let Some(handle) = control.poll.take() {
            tracing::debug!("Cancelling active poll loop");
            handle.cancel();
        }
        control.epoch
    }

    fn publish(&self, epoch: u64, update: impl FnOnce(&mut TrackerView)) -> bool {
        let control = self.control();
        if control.epoch != epoch {
            return false;
        }
        self.view.send_modify(update);
        true
    }

    // Moves a freshly created or selected task to its first state and
    // starts polling when it is still in progress.
    fn settle(self: &Arc<Self>, epoch: u64, task_id: i64, status: TaskStatus) -> bool {
        let mut control = self.control();
        if control.epoch != epoch {
            return false;
        }

        let phase = match self.policy.classify(&status) {
            Outcome::InProgress => {
                control.poll = Some(poller::spawn(self.clone(), task_id, epoch));
                Phase::Polling
            }
            Outcome::Succeeded => Phase::Completed,
            Outcome::Failed => Phase::Failed(Failure::Analysis(status.clone())),
        };

        tracing::info!("Task {} is now {} ({})", task_id, phase.label(), status);
        self.view.send_replace(TrackerView::tracking(task_id, phase, status));
        true
    }

    pub(super) fn record_progress(&self, epoch: u64, status: TaskStatus) -> bool {
        self.publish(epoch, |view| {
            view.phase = Phase::Polling;
            view.status = Some(status);
        })
    }

    // Terminal transition from inside the poll loop
    pub(super) fn finish(
        &self,
        epoch: u64,
        status: Option<TaskStatus>,
        phase: Phase,
        store_error: Option<AppError>,
    ) {
        let mut control = self.control();
        if control.epoch != epoch {
            return;
        }
        // The loop is exiting on its own, so just let go of the handle
        control.poll = None;
        self.view.send_modify(|view| {
            if status.is_some() {
                view.status = status;
            }
            view.phase = phase;
            if store_error.is_some() {
                view.store_error = store_error;
            }
        });
    }
}

/// Follows one analysis task at a time from creation to a terminal state.
///
/// State changes are published through a `watch` channel. Dropping the
/// tracker cancels any scheduled poll.
pub struct Tracker<B: TaskBackend> {
    shared: Arc<Shared<B>>,
}

impl<B: TaskBackend> Tracker<B> {
    pub fn new(
        backend: Arc<B>,
        store: Arc<TaskStore<B>>,
        config: &TrackerConfig,
        call_timeout: Duration,
    ) -> Self {
        let (view, _) = watch::channel(TrackerView::idle());
        Self {
            shared: Arc::new(Shared {
                backend,
                store,
                policy: TerminalPolicy::new(&config.terminal_statuses),
                interval: config.poll_interval(),
                call_timeout,
                control: Mutex::new(Control { epoch: 0, poll: None }),
                view,
            }),
        }
    }

    pub fn view(&self) -> TrackerView {
        self.shared.view.borrow().clone()
    }

    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<TrackerView> {
        self.shared.view.subscribe()
    }

    /// Creates a task and starts following it. On rejection nothing changes:
    /// any task already being tracked keeps being tracked.
    pub async fn submit(&self, request: CreateTaskRequest) -> AppResult<Submission> {
        tracing::info!(
            "Submitting analysis {}-{} for {:?}",
            request.start_year,
            request.end_year,
            request.companies
        );

        let created = with_timeout(self.shared.call_timeout, self.shared.backend.create_task(&request))
            .await
            .map_err(|e| {
                tracing::error!("Task creation rejected: {}", e);
                AppError::Submission(e)
            })?;

        let epoch = self.shared.begin();
        self.shared.publish(epoch, |view| {
            *view = TrackerView::tracking(created.id, Phase::Created, created.status.clone());
        });

        // The new task is in the list before its first poll goes out
        let store_error = self.shared.store.refresh().await.err();
        self.shared.settle(epoch, created.id, created.status.clone());
        if let Some(err) = &store_error {
            self.shared.publish(epoch, |view| view.store_error = Some(err.clone()));
        }

        Ok(Submission {
            task_id: created.id,
            status: created.status,
            store_error,
        })
    }

    /// Switches to another task. The previous loop is cancelled before the
    /// task is fetched.
    pub async fn select(&self, task_id: i64) -> AppResult<TrackerView> {
        let epoch = self.shared.begin();
        self.shared.publish(epoch, |view| *view = TrackerView::idle());
        tracing::info!("Selecting task {}", task_id);

        let task = with_timeout(self.shared.call_timeout, self.shared.backend.get_task(task_id))
            .await
            .map_err(|e| {
                tracing::warn!("Failed to fetch task {}: {}", task_id, e);
                AppError::Fetch(e)
            })?;

        if !self.shared.settle(epoch, task.id, task.status) {
            tracing::debug!("Selection of task {} superseded", task_id);
            return Err(AppError::Superseded(task_id));
        }
        Ok(self.view())
    }

    /// Stops polling and forgets the tracked task.
    pub fn cancel(&self) {
        let epoch = self.shared.begin();
        self.shared.publish(epoch, |view| *view = TrackerView::idle());
    }
}

impl<B: TaskBackend> Drop for Tracker<B> {
    fn drop(&mut self) {
        self.shared.begin();
    }
}
