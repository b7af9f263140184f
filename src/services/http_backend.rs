use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use crate::errors::{BackendError, BackendResult};
use crate::models::{CreateTaskRequest, CreatedTask, Record, Task};
use super::backend::TaskBackend;

// JSON-over-HTTP client for the analysis backend
#[derive(Clone)]
pub struct HttpBackend {
    base_url: String,
    client: Client,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> BackendResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(resp: Response, task_id: Option<i64>) -> BackendResult<T> {
        let status = resp.status();
        if status.is_success() {
            return resp.json::<T>().await.map_err(BackendError::from);
        }

        if status == StatusCode::NOT_FOUND {
            if let Some(id) = task_id {
                return Err(BackendError::NotFound(id));
            }
        }

        // Prefer the backend's own {"error": "..."} message when present
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);

        tracing::debug!("Backend answered {}: {}", status, message);
        Err(BackendError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl TaskBackend for HttpBackend {
    async fn create_task(&self, request: &CreateTaskRequest) -> BackendResult<CreatedTask> {
        tracing::debug!("POST /tasks {:?}", request);
        let resp = self.client.post(self.url("/tasks")).json(request).send().await?;
        Self::decode(resp, None).await
    }

    async fn get_task(&self, task_id: i64) -> BackendResult<Task> {
        let resp = self
            .client
            .get(self.url(&format!("/tasks/{}", task_id)))
            .send()
            .await?;
        Self::decode(resp, Some(task_id)).await
    }

    async fn get_all_tasks(&self) -> BackendResult<Vec<Task>> {
        let resp = self.client.get(self.url("/tasks")).send().await?;
        Self::decode(resp, None).await
    }

    async fn get_task_records(&self, task_id: i64) -> BackendResult<Vec<Record>> {
        let resp = self
            .client
            .get(self.url(&format!("/tasks/{}/records", task_id)))
            .send()
            .await?;
        Self::decode(resp, Some(task_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let backend = HttpBackend::new("http://127.0.0.1:5000/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(backend.url("/tasks/7"), "http://127.0.0.1:5000/api/tasks/7");
    }
}
