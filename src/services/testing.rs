// In-memory backend with scripted status sequences, used by unit tests.
use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use crate::errors::{BackendError, BackendResult};
use crate::models::{CreateTaskRequest, CreatedTask, Record, Task, TaskStatus};
use super::backend::TaskBackend;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create,
    Get(i64),
    List,
    Records(i64),
}

#[derive(Default)]
struct Inner {
    tasks: Vec<Task>,
    scripts: HashMap<i64, VecDeque<BackendResult<TaskStatus>>>,
    records: HashMap<i64, Vec<Record>>,
    next_id: i64,
    create_failure: Option<BackendError>,
    list_failure: Option<BackendError>,
    latency: Duration,
    calls: Vec<Call>,
}

pub struct ScriptedBackend {
    inner: Mutex<Inner>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

pub fn task(id: i64, status: TaskStatus) -> Task {
    Task {
        id,
        start_year: 2020,
        end_year: 2024,
        companies: None,
        status,
        created_at: Utc.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap(),
    }
}

pub fn record(date: &str, company: &str, car_model: &str, price: f64) -> Record {
    Record {
        sale_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        price,
        company: company.to_string(),
        car_model: car_model.to_string(),
    }
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner { next_id: 1, ..Inner::default() }),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        f(&mut self.inner.lock().unwrap())
    }

    pub fn put_task(&self, task: Task) {
        self.with(|inner| match inner.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task,
            None => inner.tasks.push(task),
        });
    }

    pub fn set_next_id(&self, id: i64) {
        self.with(|inner| inner.next_id = id);
    }

    // Each get_task for `task_id` pops the next scripted answer; once the
    // script runs out the stored task is returned unchanged.
    pub fn script(&self, task_id: i64, answers: Vec<BackendResult<TaskStatus>>) {
        self.with(|inner| inner.scripts.insert(task_id, answers.into()));
    }

    pub fn put_records(&self, task_id: i64, records: Vec<Record>) {
        self.with(|inner| inner.records.insert(task_id, records));
    }

    pub fn fail_create_with(&self, err: BackendError) {
        self.with(|inner| inner.create_failure = Some(err));
    }

    pub fn fail_list_with(&self, err: BackendError) {
        self.with(|inner| inner.list_failure = Some(err));
    }

    pub fn set_latency(&self, latency: Duration) {
        self.with(|inner| inner.latency = latency);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with(|inner| inner.calls.clone())
    }

    pub fn get_calls(&self, task_id: i64) -> usize {
        self.calls().iter().filter(|c| **c == Call::Get(task_id)).count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self, call: Call) -> InFlight<'_> {
        let latency = self.with(|inner| {
            inner.calls.push(call);
            inner.latency
        });
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let guard = InFlight(&self.in_flight);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        guard
    }
}

// Decrements the in-flight count even when the caller drops the call midway
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TaskBackend for ScriptedBackend {
    async fn create_task(&self, request: &CreateTaskRequest) -> BackendResult<CreatedTask> {
        let _in_flight = self.enter(Call::Create).await;
        let result = self.with(|inner| {
            if let Some(err) = inner.create_failure.clone() {
                return Err(err);
            }
            let id = inner.next_id;
            inner.next_id += 1;
            inner.tasks.push(Task {
                id,
                start_year: request.start_year,
                end_year: request.end_year,
                companies: request.companies.clone(),
                ..task(id, TaskStatus::Pending)
            });
            Ok(CreatedTask { id, status: TaskStatus::Pending })
        });
        result
    }

    async fn get_task(&self, task_id: i64) -> BackendResult<Task> {
        let _in_flight = self.enter(Call::Get(task_id)).await;
        let result = self.with(|inner| {
            let next = inner.scripts.get_mut(&task_id).and_then(|s| s.pop_front());
            let stored = inner
                .tasks
                .iter_mut()
                .find(|t| t.id == task_id)
                .ok_or(BackendError::NotFound(task_id))?;
            match next {
                Some(Ok(status)) => stored.status = status,
                Some(Err(err)) => return Err(err),
                None => {}
            }
            Ok(stored.clone())
        });
        result
    }

    async fn get_all_tasks(&self) -> BackendResult<Vec<Task>> {
        let _in_flight = self.enter(Call::List).await;
        let result = self.with(|inner| match inner.list_failure.clone() {
            Some(err) => Err(err),
            None => Ok(inner.tasks.clone()),
        });
        result
    }

    async fn get_task_records(&self, task_id: i64) -> BackendResult<Vec<Record>> {
        let _in_flight = self.enter(Call::Records(task_id)).await;
        let result = self.with(|inner| {
            let stored = inner
                .tasks
                .iter()
                .find(|t| t.id == task_id)
                .ok_or(BackendError::NotFound(task_id))?;
            if stored.status != TaskStatus::Completed {
                return Err(BackendError::NotReady {
                    task_id,
                    status: stored.status.to_string(),
                });
            }
            Ok(inner.records.get(&task_id).cloned().unwrap_or_default())
        });
        result
    }
}
