//! Error handling for the backend API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Invalid exercise: {0}")]
    Exercise(#[from] exercise_core::ExerciseError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::Exercise(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Migration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code sent as `error`
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Exercise(_) => "invalid_exercise",
            Self::Database(_) => "database_error",
            Self::Migration(_) => "migration_error",
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Server-side failures are logged in full but not echoed to clients
        let message = if status.is_server_error() {
            tracing::error!("{}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(ErrorResponse {
            error: self.code(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use exercise_core::ExerciseError;

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn status_codes() {
        let cases = [
            (ApiError::Unauthorized("token".into()), StatusCode::UNAUTHORIZED),
            (ApiError::NotFound("topic 1".into()), StatusCode::NOT_FOUND),
            (ApiError::BadRequest("score".into()), StatusCode::BAD_REQUEST),
            (
                ApiError::Exercise(ExerciseError::DuplicateStep { step_id: 3 }),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::Migration("failed".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                ApiError::Database(sqlx::Error::PoolTimedOut),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status(), expected, "{}", error);
        }
    }

    #[tokio::test]
    async fn invalid_exercise_body_names_the_problem() {
        let (status, body) = body_json(ApiError::Exercise(ExerciseError::DuplicateAction {
            step_id: 1,
            action_id: 4,
        }))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_exercise");
        assert_eq!(
            body["message"],
            "Invalid exercise: duplicate action id 4 in step 1"
        );
    }

    #[tokio::test]
    async fn database_errors_are_not_echoed() {
        let (status, body) = body_json(ApiError::Database(sqlx::Error::PoolTimedOut)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "database_error");
        assert_eq!(body["message"], "Internal server error");
    }

    #[test]
    fn display_includes_context() {
        let error = ApiError::NotFound("Exercise for topic 9".to_string());
        assert_eq!(error.to_string(), "Not found: Exercise for topic 9");
    }
}
