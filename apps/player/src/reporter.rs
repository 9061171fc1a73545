//! Background delivery of progress updates.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use exercise_core::{ProgressReporter, ProgressUpdate};

use crate::client::{ApiClient, ClientError, ProgressRecord};
use crate::retry::{retry_async_with_config, RetryConfig};

/// Remote progress store.
#[async_trait]
pub trait ProgressStore: Send + Sync + 'static {
    async fn put_progress(&self, update: &ProgressUpdate) -> Result<ProgressRecord, ClientError>;
}

#[async_trait]
impl ProgressStore for ApiClient {
    async fn put_progress(&self, update: &ProgressUpdate) -> Result<ProgressRecord, ClientError> {
        ApiClient::put_progress(self, update).await
    }
}

/// [`ProgressReporter`] that pushes each update from a spawned task.
///
/// Failed deliveries are retried with backoff and then logged; the session
/// never sees them.
pub struct BackgroundReporter<S> {
    store: Arc<S>,
    retry: RetryConfig,
    runtime: Handle,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

pub type HttpProgressReporter = BackgroundReporter<ApiClient>;

impl<S: ProgressStore> BackgroundReporter<S> {
    /// Must be called from within a tokio runtime.
    pub fn new(store: S, retry: RetryConfig) -> Self {
        Self {
            store: Arc::new(store),
            retry,
            runtime: Handle::current(),
            in_flight: Mutex::new(Vec::new()),
        }
    }

    /// Wait for every update handed over so far.
    pub async fn flush(&self) {
        let handles: Vec<_> = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .drain(..)
            .collect();

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!("progress task ended abnormally: {}", e);
            }
        }
    }
}

impl<S: ProgressStore> ProgressReporter for BackgroundReporter<S> {
    fn report(&self, update: ProgressUpdate) {
        let store = self.store.clone();
        let retry = self.retry.clone();

        let handle = self.runtime.spawn(async move {
            let result = retry_async_with_config(&retry, || {
                let store = store.clone();
                let update = update.clone();
                async move { store.put_progress(&update).await }
            })
            .await;

            match result {
                Ok(record) => tracing::info!(
                    content_id = record.content_id,
                    best_score = record.score,
                    is_completed = record.is_completed,
                    "progress saved"
                ),
                Err(e) => tracing::warn!(
                    content_id = update.content_id,
                    score = update.score,
                    "failed to save progress: {}",
                    e
                ),
            }
        });

        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
    }
}
