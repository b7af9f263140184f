use serde::{Deserialize, Deserializer, Serialize, Serializer};
use chrono::{DateTime, Utc};
use std::fmt;
use super::timestamp;

// Status as reported by the backend. Unknown values are kept verbatim so a
// configured terminal set can still match them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Other(String),
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Other(s) => s,
        }
    }
}

impl From<&str> for TaskStatus {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" | "queued" => TaskStatus::Pending,
            "running" | "in_progress" => TaskStatus::Running,
            "completed" => TaskStatus::Completed,
            "failed" => TaskStatus::Failed,
            _ => TaskStatus::Other(value.to_string()),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TaskStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(TaskStatus::from(raw.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(alias = "task_id")]
    pub id: i64,
    pub start_year: i32,
    pub end_year: i32,
    #[serde(default, with = "companies")]
    pub companies: Option<Vec<String>>,
    pub status: TaskStatus,
    #[serde(deserialize_with = "timestamp::datetime")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    // One-line description used by the task picker
    pub fn label(&self) -> String {
        format!(
            "Task {}: {}-{}, Companies: {}, Status: {}, Created: {}",
            self.id,
            self.start_year,
            self.end_year,
            self.companies.as_ref().map_or("All".to_string(), |c| c.join(",")),
            self.status,
            self.created_at.format("%Y-%m-%d %H:%M:%S"),
        )
    }
}

// Body of a create call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateTaskRequest {
    pub start_year: i32,
    pub end_year: i32,
    #[serde(with = "companies")]
    pub companies: Option<Vec<String>>,
}

// What the backend hands back from a create call
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedTask {
    #[serde(alias = "task_id")]
    pub id: i64,
    pub status: TaskStatus,
}

/// The backend stores the company filter as a comma-separated string; arrays
/// are accepted too. Blank entries are dropped and an empty filter is `None`.
pub mod companies {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Joined(String),
        List(Vec<String>),
    }

    pub fn split(raw: &str) -> Option<Vec<String>> {
        normalize(raw.split(',').map(str::to_string).collect())
    }

    fn normalize(items: Vec<String>) -> Option<Vec<String>> {
        let items: Vec<String> = items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if items.is_empty() {
            None
        } else {
            Some(items)
        }
    }

    pub fn serialize<S: Serializer>(value: &Option<Vec<String>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(items) => serializer.serialize_str(&items.join(",")),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<String>>, D::Error> {
        Ok(match Option::<Wire>::deserialize(deserializer)? {
            Some(Wire::Joined(raw)) => split(&raw),
            Some(Wire::List(items)) => normalize(items),
            None => None,
        })
    }
}
