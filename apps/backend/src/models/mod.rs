//! Database models and API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

// Re-export shared types from exercise-core
pub use exercise_core::types::{Action, Exercise, Step, CONTENT_TYPE};

// === Database Entity Types ===

/// Registered learner
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Learner {
    pub id: Uuid,
    pub token: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// Exercise definition stored in PostgreSQL
#[derive(Debug, Clone, FromRow)]
pub struct DbExercise {
    pub topic_id: i64,
    pub exercise_id: i64,
    pub title: String,
    pub definition: Json<Exercise>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbExercise {
    /// Convert to the shared exercise type
    pub fn into_exercise(self) -> Exercise {
        self.definition.0
    }
}

/// Progress row in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbProgress {
    pub id: Uuid,
    pub learner_id: Uuid,
    pub content_type: String,
    pub content_id: i64,
    pub is_completed: bool,
    pub score: i32,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbProgress {
    /// Convert to API response type
    pub fn to_api_progress(&self) -> ProgressResponse {
        ProgressResponse {
            content_type: self.content_type.clone(),
            content_id: self.content_id,
            is_completed: self.is_completed,
            score: self.score,
            attempts: self.attempts,
            updated_at: self.updated_at,
        }
    }
}

// === API Request/Response Types ===

#[derive(Debug, Serialize, Deserialize)]
pub struct LearnerRegisterRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LearnerRegisterResponse {
    pub learner_id: Uuid,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LearnerStatusResponse {
    pub learner_id: Uuid,
    pub name: Option<String>,
    pub last_seen_at: DateTime<Utc>,
}

/// Body of PUT /api/progress/:content_type/:content_id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRequest {
    pub is_completed: bool,
    pub score: i32,
}

impl ProgressRequest {
    /// Check the score is a percentage
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(0..=100).contains(&self.score) {
            return Err(format!("score must be between 0 and 100, got {}", self.score));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub content_type: String,
    pub content_id: i64,
    pub is_completed: bool,
    /// Best score ever recorded
    pub score: i32,
    /// Number of reports received
    pub attempts: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExerciseStoredResponse {
    pub topic_id: i64,
    pub exercise_id: i64,
    pub step_count: usize,
    pub scoring_actions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_score_bounds() {
        let ok = |score| ProgressRequest {
            is_completed: false,
            score,
        };
        assert!(ok(0).validate().is_ok());
        assert!(ok(100).validate().is_ok());
        assert!(ok(-1).validate().is_err());
        assert!(ok(101).validate().is_err());
    }

    #[test]
    fn progress_response_from_row() {
        let now = Utc::now();
        let row = DbProgress {
            id: Uuid::new_v4(),
            learner_id: Uuid::new_v4(),
            content_type: CONTENT_TYPE.to_string(),
            content_id: 7,
            is_completed: true,
            score: 100,
            attempts: 3,
            created_at: now,
            updated_at: now,
        };
        let api = row.to_api_progress();
        assert_eq!(api.content_type, "interactive");
        assert_eq!(api.content_id, 7);
        assert_eq!(api.score, 100);
        assert_eq!(api.attempts, 3);
    }
}
