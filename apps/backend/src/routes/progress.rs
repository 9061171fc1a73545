//! Progress endpoints

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedLearner;
use crate::AppState;

/// GET /api/progress/:content_type/:content_id
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedLearner>,
    Path((content_type, content_id)): Path<(String, i64)>,
) -> Result<Json<ProgressResponse>> {
    check_content_type(&content_type)?;

    let progress = state
        .db
        .get_progress(auth.learner_id, &content_type, content_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("No progress for {}/{}", content_type, content_id))
        })?;

    Ok(Json(progress.to_api_progress()))
}

/// PUT /api/progress/:content_type/:content_id
/// Idempotent upsert; the stored score only ever goes up
pub async fn put(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedLearner>,
    Path((content_type, content_id)): Path<(String, i64)>,
    Json(request): Json<ProgressRequest>,
) -> Result<Json<ProgressResponse>> {
    check_content_type(&content_type)?;
    request.validate().map_err(ApiError::BadRequest)?;

    let progress = state
        .db
        .upsert_progress(auth.learner_id, &content_type, content_id, &request)
        .await?;

    tracing::info!(
        "Progress for learner {} on {}/{}: reported {}, best {}",
        auth.learner_id,
        content_type,
        content_id,
        request.score,
        progress.score
    );

    Ok(Json(progress.to_api_progress()))
}

/// Content types are short lowercase identifiers such as `interactive`
fn check_content_type(content_type: &str) -> Result<()> {
    let valid = !content_type.is_empty()
        && content_type.len() <= 32
        && content_type
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "invalid content type '{}'",
            content_type
        )))
    }
}
