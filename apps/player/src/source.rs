//! Where exercise definitions come from.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use exercise_core::{parse_exercise, Exercise, ExerciseError};

use crate::client::{ApiClient, ClientError};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid exercise: {0}")]
    Exercise(#[from] ExerciseError),
}

#[async_trait]
pub trait ExerciseSource: Send + Sync {
    async fn fetch(&self, topic_id: i64) -> Result<Exercise, SourceError>;
}

#[async_trait]
impl ExerciseSource for ApiClient {
    async fn fetch(&self, topic_id: i64) -> Result<Exercise, SourceError> {
        Ok(self.fetch_exercise(topic_id).await?)
    }
}

/// A single definition on disk, served for every topic.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl ExerciseSource for FileSource {
    async fn fetch(&self, _topic_id: i64) -> Result<Exercise, SourceError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;
        Ok(parse_exercise(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("exercise-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn file_source_loads_definition() {
        let path = temp_file(r#"{"id": 3, "title": "From disk", "steps": [{"id": 1}]}"#);
        let exercise = FileSource::new(&path).fetch(99).await.unwrap();
        assert_eq!(exercise.id, 3);
        assert_eq!(exercise.steps.len(), 1);
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn file_source_reports_missing_file() {
        let source = FileSource::new("/nonexistent/exercise.json");
        assert!(matches!(
            source.fetch(1).await.unwrap_err(),
            SourceError::Io { .. }
        ));
    }

    #[tokio::test]
    async fn file_source_rejects_invalid_definition() {
        let path = temp_file(r#"{"id": 3, "title": "Dup", "steps": [{"id": 1}, {"id": 1}]}"#);
        assert!(matches!(
            FileSource::new(&path).fetch(1).await.unwrap_err(),
            SourceError::Exercise(ExerciseError::DuplicateStep { step_id: 1 })
        ));
        std::fs::remove_file(path).ok();
    }
}
