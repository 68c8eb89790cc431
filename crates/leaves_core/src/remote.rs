use crate::error::AppError;
use crate::model::{Task, TaskStatus};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/todos";
pub const DEFAULT_SUGGESTION_LIMIT: usize = 3;
/// Owner tag sent with every pushed task.
pub const OWNER_ID: u64 = 1;
/// Prefix that marks a task as coming from the suggestion service.
pub const SUGGESTION_MARKER: &str = "💡 ";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One item from the suggestion service. Only `title` is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteItem {
    #[serde(default)]
    pub id: Option<u64>,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushPayload {
    pub title: String,
    pub completed: bool,
    #[serde(rename = "userId")]
    pub owner: u64,
}

impl PushPayload {
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.description().to_string(),
            completed: task.status() == TaskStatus::Completed,
            owner: OWNER_ID,
        }
    }
}

/// External source of suggested notes. Implementations never touch the
/// local store; callers feed results through `TaskStore::create`.
#[allow(async_fn_in_trait)]
pub trait SuggestionPort {
    async fn fetch_suggestions(&self, limit: usize) -> Result<Vec<RemoteItem>, AppError>;

    async fn push_task(&self, task: &Task) -> Result<RemoteItem, AppError>;
}

#[derive(Debug, Clone)]
pub struct HttpSuggestions {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSuggestions {
    pub fn new<E: Into<String>>(endpoint: E) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl SuggestionPort for HttpSuggestions {
    async fn fetch_suggestions(&self, limit: usize) -> Result<Vec<RemoteItem>, AppError> {
        tracing::debug!(endpoint = %self.endpoint, limit, "fetching suggestions");
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("_limit", limit)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::network(format!("GET failed: {status}")));
        }

        Ok(response.json::<Vec<RemoteItem>>().await?)
    }

    async fn push_task(&self, task: &Task) -> Result<RemoteItem, AppError> {
        let payload = PushPayload::from_task(task);
        tracing::debug!(endpoint = %self.endpoint, id = %task.id(), "pushing task");
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json; charset=UTF-8")
            .body(serde_json::to_string(&payload)?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::network(format!("POST failed: {status}")));
        }

        Ok(response.json::<RemoteItem>().await?)
    }
}
