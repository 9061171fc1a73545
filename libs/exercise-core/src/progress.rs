//! Progress reporting boundary.

use crate::types::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Completion event pushed to the progress store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub content_type: String,
    pub content_id: i64,
    pub is_completed: bool,
    /// Percentage score of the attempt.
    pub score: u8,
}

impl ProgressUpdate {
    pub fn interactive(content_id: i64, is_completed: bool, score: u8) -> Self {
        Self {
            content_type: CONTENT_TYPE.to_string(),
            content_id,
            is_completed,
            score,
        }
    }
}

/// Sink for progress updates.
///
/// `report` is fire-and-forget: implementations must return promptly and deal
/// with their own failures. The store is authoritative for the best score.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// Reporter that discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, update: ProgressUpdate) {
        tracing::debug!(content_id = update.content_id, "progress reporting disabled");
    }
}

/// Reporter that keeps updates in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    updates: Mutex<Vec<ProgressUpdate>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates received so far, oldest first.
    pub fn updates(&self) -> Vec<ProgressUpdate> {
        self.updates
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ProgressReporter for MemoryReporter {
    fn report(&self, update: ProgressUpdate) {
        self.updates
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(update);
    }
}

/// Best of a previously known score and a new one.
pub fn best_of(previous: Option<u8>, current: u8) -> u8 {
    previous.map_or(current, |p| p.max(current))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_score_never_decreases() {
        assert_eq!(best_of(None, 40), 40);
        assert_eq!(best_of(Some(70), 40), 70);
        assert_eq!(best_of(Some(70), 90), 90);
    }

    #[test]
    fn memory_reporter_keeps_order() {
        let reporter = MemoryReporter::new();
        reporter.report(ProgressUpdate::interactive(1, false, 10));
        reporter.report(ProgressUpdate::interactive(1, true, 100));

        let updates = reporter.updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].content_type, "interactive");
        assert!(updates[1].is_completed);
    }
}
