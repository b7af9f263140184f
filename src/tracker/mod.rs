mod lifecycle;
mod poller;
mod state;

pub use lifecycle::{Submission, Tracker};
pub use state::TrackerView;

#[cfg(test)]
mod tests {
    use super::*;
    use super::state::{Failure, Phase};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::{sleep, timeout};
    use crate::config::TrackerConfig;
    use crate::errors::{AppError, BackendError};
    use crate::models::{CreateTaskRequest, TaskStatus};
    use crate::services::testing::{record, task, Call, ScriptedBackend};
    use crate::services::{TaskBackend, TaskStore};

    const CALL_TIMEOUT: Duration = Duration::from_secs(30);

    fn setup(config: TrackerConfig) -> (Arc<ScriptedBackend>, Arc<TaskStore<ScriptedBackend>>, Tracker<ScriptedBackend>) {
        let backend = Arc::new(ScriptedBackend::new());
        let store = Arc::new(TaskStore::new(backend.clone(), CALL_TIMEOUT));
        let tracker = Tracker::new(backend.clone(), store.clone(), &config, CALL_TIMEOUT);
        (backend, store, tracker)
    }

    fn request() -> CreateTaskRequest {
        CreateTaskRequest {
            start_year: 2020,
            end_year: 2024,
            companies: Some(vec!["Honda".to_string(), "Toyota".to_string()]),
        }
    }

    async fn wait_terminal(tracker: &Tracker<ScriptedBackend>) -> TrackerView {
        let mut rx = tracker.subscribe();
        let view = timeout(Duration::from_secs(600), rx.wait_for(|v| v.is_terminal()))
            .await
            .expect("tracker never reached a terminal state")
            .expect("tracker dropped")
            .clone();
        view
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_polls_until_completed() {
        let (backend, store, tracker) = setup(TrackerConfig::default());
        backend.set_next_id(7);
        backend.script(7, vec![
            Ok(TaskStatus::Pending),
            Ok(TaskStatus::Running),
            Ok(TaskStatus::Completed),
        ]);
        backend.put_records(7, vec![record("2023-04-01", "Honda", "Civic", 24000.0)]);

        let submission = tracker.submit(request()).await.unwrap();
        assert_eq!(submission.task_id, 7);
        assert_eq!(submission.status, TaskStatus::Pending);
        assert_eq!(submission.store_error, None);
        assert_eq!(tracker.view().phase, Phase::Polling);
        assert_eq!(store.get(7).map(|t| t.status), Some(TaskStatus::Pending));

        let view = wait_terminal(&tracker).await;
        assert_eq!(view.phase, Phase::Completed);
        assert_eq!(view.task_id, Some(7));
        assert_eq!(view.message(), "Task 7 status: completed");
        assert_eq!(backend.get_calls(7), 3);

        let stored = store.get(7).unwrap();
        assert_eq!(stored.status, TaskStatus::Completed);
        assert_eq!(stored.companies, Some(vec!["Honda".to_string(), "Toyota".to_string()]));
        assert_eq!(backend.get_task_records(7).await.unwrap().len(), 1);

        // One refresh for submit, one for completion
        let lists = backend.calls().iter().filter(|c| **c == Call::List).count();
        assert_eq!(lists, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reported_failure_stops_polling() {
        let (backend, _store, tracker) = setup(TrackerConfig::default());
        backend.script(1, vec![Ok(TaskStatus::Running), Ok(TaskStatus::Failed)]);

        tracker.submit(request()).await.unwrap();
        let view = wait_terminal(&tracker).await;
        assert_eq!(view.phase, Phase::Failed(Failure::Analysis(TaskStatus::Failed)));
        assert_eq!(view.message(), "Task 1 analysis failed with status: failed");

        sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.get_calls(1), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_is_a_poll_error() {
        let (backend, _store, tracker) = setup(TrackerConfig::default());
        backend.script(1, vec![
            Ok(TaskStatus::Pending),
            Err(BackendError::Transport("connection reset".into())),
        ]);

        tracker.submit(request()).await.unwrap();
        let view = wait_terminal(&tracker).await;
        let expected = AppError::Poll {
            task_id: 1,
            source: BackendError::Transport("connection reset".into()),
        };
        assert_eq!(view.phase, Phase::Failed(Failure::Poll(expected)));
        assert!(view.message().starts_with("Error polling status:"));

        sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.get_calls(1), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_terminal_status_stops_polling() {
        let config = TrackerConfig {
            terminal_statuses: vec!["completed".into(), "failed".into(), "cancelled".into()],
            ..TrackerConfig::default()
        };
        let (backend, _store, tracker) = setup(config);
        backend.script(1, vec![Ok(TaskStatus::from("cancelled"))]);

        tracker.submit(request()).await.unwrap();
        let view = wait_terminal(&tracker).await;
        assert_eq!(
            view.phase,
            Phase::Failed(Failure::Analysis(TaskStatus::Other("cancelled".into())))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_submission_starts_nothing() {
        let (backend, _store, tracker) = setup(TrackerConfig::default());
        backend.fail_create_with(BackendError::Rejected {
            status: 400,
            message: "start_year and end_year are required".into(),
        });

        let err = tracker.submit(request()).await.unwrap_err();
        assert!(matches!(err, AppError::Submission(BackendError::Rejected { status: 400, .. })));
        assert_eq!(err.user_message(), "Error: start_year and end_year are required");
        assert_eq!(tracker.view(), TrackerView::idle());

        sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.calls(), vec![Call::Create]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_cancels_previous_loop() {
        let (backend, _store, tracker) = setup(TrackerConfig::default());
        backend.put_task(task(2, TaskStatus::Completed));

        tracker.submit(request()).await.unwrap();
        sleep(Duration::from_millis(4500)).await;
        let polled_before = backend.get_calls(1);
        assert_eq!(polled_before, 2);

        let view = tracker.select(2).await.unwrap();
        assert_eq!(view.task_id, Some(2));
        assert_eq!(view.phase, Phase::Completed);

        sleep(Duration::from_secs(60)).await;
        assert_eq!(backend.get_calls(1), polled_before);
        assert_eq!(tracker.view().task_id, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_in_progress_task_starts_polling() {
        let (backend, _store, tracker) = setup(TrackerConfig::default());
        backend.put_task(task(3, TaskStatus::Running));
        backend.script(3, vec![Ok(TaskStatus::Running), Ok(TaskStatus::Completed)]);

        let view = tracker.select(3).await.unwrap();
        assert_eq!(view.phase, Phase::Polling);

        let view = wait_terminal(&tracker).await;
        assert_eq!(view.phase, Phase::Completed);
        assert_eq!(backend.get_calls(3), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_missing_task_is_fetch_error() {
        let (_backend, _store, tracker) = setup(TrackerConfig::default());
        let err = tracker.select(99).await.unwrap_err();
        assert_eq!(err, AppError::Fetch(BackendError::NotFound(99)));
        assert_eq!(tracker.view(), TrackerView::idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_response_discarded_after_cancel() {
        let (backend, _store, tracker) = setup(TrackerConfig::default());
        backend.put_task(task(1, TaskStatus::Running));
        backend.put_task(task(2, TaskStatus::Running));
        backend.script(1, vec![Ok(TaskStatus::Running), Ok(TaskStatus::Completed)]);
        tracker.select(1).await.unwrap();

        // Tick fires at 2s and its response is due at 5s
        backend.set_latency(Duration::from_secs(3));
        sleep(Duration::from_millis(2500)).await;
        tracker.cancel();

        sleep(Duration::from_secs(30)).await;
        assert_eq!(tracker.view(), TrackerView::idle());
        assert_eq!(backend.get_calls(1), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_never_overlap() {
        let (backend, _store, tracker) = setup(TrackerConfig::default());
        backend.script(1, vec![
            Ok(TaskStatus::Pending),
            Ok(TaskStatus::Running),
            Ok(TaskStatus::Running),
            Ok(TaskStatus::Completed),
        ]);
        tracker.submit(request()).await.unwrap();
        // Slower than the poll interval
        backend.set_latency(Duration::from_secs(5));

        let view = wait_terminal(&tracker).await;
        assert_eq!(view.phase, Phase::Completed);
        assert_eq!(backend.max_in_flight(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_timeout_fails_the_tracker() {
        let backend = Arc::new(ScriptedBackend::new());
        let store = Arc::new(TaskStore::new(backend.clone(), Duration::from_secs(1)));
        let tracker = Tracker::new(backend.clone(), store, &TrackerConfig::default(), Duration::from_secs(1));
        backend.put_task(task(4, TaskStatus::Running));
        tracker.select(4).await.unwrap();

        backend.set_latency(Duration::from_secs(60));
        let view = wait_terminal(&tracker).await;
        let expected = AppError::Poll {
            task_id: 4,
            source: BackendError::Timeout(Duration::from_secs(1)),
        };
        assert_eq!(view.phase, Phase::Failed(Failure::Poll(expected)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_tracker_stops_polling() {
        let (backend, _store, tracker) = setup(TrackerConfig::default());
        tracker.submit(request()).await.unwrap();
        sleep(Duration::from_millis(2500)).await;
        assert_eq!(backend.get_calls(1), 1);

        drop(tracker);
        sleep(Duration::from_secs(60)).await;
        assert_eq!(backend.get_calls(1), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_is_reported_with_submission() {
        let (backend, store, tracker) = setup(TrackerConfig::default());
        backend.fail_list_with(BackendError::Transport("list unavailable".into()));

        let submission = tracker.submit(request()).await.unwrap();
        assert_eq!(
            submission.store_error,
            Some(AppError::Fetch(BackendError::Transport("list unavailable".into())))
        );
        assert!(tracker.view().store_error.is_some());
        assert!(store.all().is_empty());
        assert_eq!(tracker.view().phase, Phase::Polling);
    }

    #[tokio::test(start_paused = true)]
    async fn test_created_is_visible_before_polling() {
        let (backend, _store, tracker) = setup(TrackerConfig::default());
        backend.set_next_id(7);
        backend.set_latency(Duration::from_millis(100));
        let mut rx = tracker.subscribe();

        let (submission, seen) = tokio::join!(tracker.submit(request()), async {
            rx.wait_for(|v| v.phase == Phase::Created).await.map(|v| v.clone())
        });

        let seen = seen.unwrap();
        assert_eq!(seen.task_id, Some(7));
        assert_eq!(seen.message(), "Task 7 created with status: pending");
        assert_eq!(submission.unwrap().task_id, 7);
        assert_eq!(tracker.view().phase, Phase::Polling);
    }
}
