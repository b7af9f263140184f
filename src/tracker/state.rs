use std::collections::HashSet;
use crate::errors::AppError;
use crate::models::TaskStatus;

// Why a tracked task ended up failed
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    // The backend reported a terminal non-success status
    Analysis(TaskStatus),
    // We lost contact with the backend while polling
    Poll(AppError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Created,
    Polling,
    Completed,
    Failed(Failure),
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Created => "created",
            Phase::Polling => "polling",
            Phase::Completed => "completed",
            Phase::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed | Phase::Failed(_))
    }
}

/// What the tracker currently knows about the task it follows.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerView {
    pub task_id: Option<i64>,
    pub phase: Phase,
    pub status: Option<TaskStatus>,
    // Set when the task list refresh triggered by submit/completion failed
    pub store_error: Option<AppError>,
}

impl TrackerView {
    pub fn idle() -> Self {
        Self {
            task_id: None,
            phase: Phase::Idle,
            status: None,
            store_error: None,
        }
    }

    pub fn tracking(task_id: i64, phase: Phase, status: TaskStatus) -> Self {
        Self {
            task_id: Some(task_id),
            phase,
            status: Some(status),
            store_error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn message(&self) -> String {
        let (id, status) = match (self.task_id, &self.status) {
            (Some(id), Some(status)) => (id, status),
            _ => return "No task is being tracked".to_string(),
        };
        match &self.phase {
            Phase::Idle => "No task is being tracked".to_string(),
            Phase::Created => format!("Task {} created with status: {}", id, status),
            Phase::Polling | Phase::Completed => format!("Task {} status: {}", id, status),
            Phase::Failed(Failure::Analysis(s)) => {
                format!("Task {} analysis failed with status: {}", id, s)
            }
            Phase::Failed(Failure::Poll(err)) => err.user_message(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
    InProgress,
}

/// Decides which backend statuses end polling.
#[derive(Debug, Clone)]
pub struct TerminalPolicy {
    terminal: HashSet<String>,
}

impl TerminalPolicy {
    pub fn new<I, S>(statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            terminal: statuses
                .into_iter()
                .map(|s| status_key(&TaskStatus::from(s.as_ref())))
                .collect(),
        }
    }

    pub fn classify(&self, status: &TaskStatus) -> Outcome {
        if *status == TaskStatus::Completed {
            Outcome::Succeeded
        } else if self.terminal.contains(&status_key(status)) {
            Outcome::Failed
        } else {
            Outcome::InProgress
        }
    }
}

fn status_key(status: &TaskStatus) -> String {
    status.as_str().trim().to_ascii_lowercase()
}
