//! HTTP client for the exercise backend.

use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use exercise_core::{parse_exercise, Exercise, ProgressUpdate};

/// Client errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend error: {status} - {message}")]
    Backend { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Not authenticated - please register a learner first")]
    NotAuthenticated,
}

/// Stored progress as returned by the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProgressRecord {
    pub content_type: String,
    pub content_id: i64,
    pub is_completed: bool,
    pub score: i32,
    pub attempts: i32,
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    /// Stored best score as a percentage.
    pub fn best_score(&self) -> u8 {
        self.score.clamp(0, 100) as u8
    }
}

// === API Request/Response Types ===

#[derive(Debug, Serialize)]
struct LearnerRegisterRequest {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LearnerRegisterResponse {
    learner_id: Uuid,
    token: String,
}

#[derive(Debug, Serialize)]
struct ProgressRequest {
    is_completed: bool,
    score: i32,
}

/// Inner state shared across clones.
struct ApiClientInner {
    client: Client,
    backend_url: String,
    token: Mutex<Option<String>>,
}

/// Client for the exercise and progress endpoints.
///
/// Cheap to clone; clones share the token.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

impl ApiClient {
    pub fn new(backend_url: &str, token: Option<String>) -> Self {
        Self {
            inner: Arc::new(ApiClientInner {
                client: Client::new(),
                backend_url: backend_url.trim_end_matches('/').to_string(),
                token: Mutex::new(token),
            }),
        }
    }

    pub fn backend_url(&self) -> &str {
        &self.inner.backend_url
    }

    pub async fn token(&self) -> Option<String> {
        self.inner.token.lock().await.clone()
    }

    /// Check if backend is reachable.
    pub async fn check_connectivity(&self) -> Result<bool, ClientError> {
        let url = format!("{}/health", self.inner.backend_url);
        match self.inner.client.get(&url).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(e) => Err(ClientError::Network(e.to_string())),
        }
    }

    /// Register a new learner and keep its token for later calls.
    pub async fn register_learner(&self, name: Option<String>) -> Result<Uuid, ClientError> {
        let url = format!("{}/api/learner/register", self.inner.backend_url);
        let request = LearnerRegisterRequest { name };

        let resp = self
            .inner
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let response: LearnerRegisterResponse = read_json(resp).await?;
        *self.inner.token.lock().await = Some(response.token);

        tracing::info!(learner_id = %response.learner_id, "registered learner");
        Ok(response.learner_id)
    }

    /// Fetch and validate the exercise published for a topic.
    pub async fn fetch_exercise(&self, topic_id: i64) -> Result<Exercise, ClientError> {
        let token = self.require_token().await?;
        let url = format!("{}/api/exercises/{}", self.inner.backend_url, topic_id);

        let resp = self
            .inner
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let body = check_status(resp)
            .await?
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        parse_exercise(&body).map_err(|e| ClientError::Parse(e.to_string()))
    }

    /// Stored progress, `None` when nothing was recorded yet.
    pub async fn get_progress(
        &self,
        content_type: &str,
        content_id: i64,
    ) -> Result<Option<ProgressRecord>, ClientError> {
        let token = self.require_token().await?;
        let url = format!(
            "{}/api/progress/{}/{}",
            self.inner.backend_url, content_type, content_id
        );

        let resp = self
            .inner
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        read_json(resp).await.map(Some)
    }

    /// Send one attempt; the backend keeps the best score.
    pub async fn put_progress(&self, update: &ProgressUpdate) -> Result<ProgressRecord, ClientError> {
        let token = self.require_token().await?;
        let url = format!(
            "{}/api/progress/{}/{}",
            self.inner.backend_url, update.content_type, update.content_id
        );
        let request = ProgressRequest {
            is_completed: update.is_completed,
            score: i32::from(update.score),
        };

        let resp = self
            .inner
            .client
            .put(&url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        read_json(resp).await
    }

    async fn require_token(&self) -> Result<String, ClientError> {
        self.token().await.ok_or(ClientError::NotAuthenticated)
    }
}

async fn check_status(resp: Response) -> Result<Response, ClientError> {
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let message = resp.text().await.unwrap_or_default();
        return Err(ClientError::Backend { status, message });
    }
    Ok(resp)
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    check_status(resp)
        .await?
        .json()
        .await
        .map_err(|e| ClientError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn calls_without_token_are_rejected_locally() {
        let client = ApiClient::new("http://127.0.0.1:9/", None);
        assert_eq!(client.backend_url(), "http://127.0.0.1:9");

        let err = client.fetch_exercise(1).await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));

        let err = client
            .put_progress(&ProgressUpdate::interactive(1, true, 100))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
    }

    #[test]
    fn progress_record_from_backend_json() {
        let json = r#"{
            "content_type": "interactive",
            "content_id": 4,
            "is_completed": true,
            "score": 85,
            "attempts": 2,
            "updated_at": "2025-01-01T10:00:00Z"
        }"#;
        let record: ProgressRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.best_score(), 85);
        assert!(record.is_completed);
    }
}
