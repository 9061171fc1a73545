//! Exercise definition endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use exercise_core::parser::validate;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;

/// GET /api/exercises/:topic_id
pub async fn get(
    State(state): State<AppState>,
    Path(topic_id): Path<i64>,
) -> Result<Json<Exercise>> {
    let exercise = state
        .db
        .get_exercise(topic_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Exercise for topic {}", topic_id)))?;

    Ok(Json(exercise.into_exercise()))
}

/// PUT /api/exercises/:topic_id
/// Publishes a definition for a topic after structural validation
pub async fn put(
    State(state): State<AppState>,
    Path(topic_id): Path<i64>,
    Json(exercise): Json<Exercise>,
) -> Result<Json<ExerciseStoredResponse>> {
    validate(&exercise)?;
    state.db.upsert_exercise(topic_id, &exercise).await?;

    tracing::info!(
        "Stored exercise {} for topic {} ({} steps)",
        exercise.id,
        topic_id,
        exercise.steps.len()
    );

    Ok(Json(ExerciseStoredResponse {
        topic_id,
        exercise_id: exercise.id,
        step_count: exercise.steps.len(),
        scoring_actions: exercise.scoring_action_count(),
    }))
}
