//! Error types for exercise-core.

use thiserror::Error;

/// Result type alias using ExerciseError.
pub type Result<T> = std::result::Result<T, ExerciseError>;

/// Errors that can occur while loading an exercise definition.
#[derive(Debug, Error)]
pub enum ExerciseError {
    #[error("invalid exercise definition: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate step id {step_id}")]
    DuplicateStep { step_id: i64 },

    #[error("duplicate action id {action_id} in step {step_id}")]
    DuplicateAction { step_id: i64, action_id: i64 },

    #[error("action {action_id} is placed in step {step_id} but refers to step {declared}")]
    StepMismatch {
        step_id: i64,
        action_id: i64,
        declared: i64,
    },
}
