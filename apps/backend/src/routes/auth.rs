//! Bearer-token authentication

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::AppState;

/// Paths reachable without a token
const PUBLIC_PATHS: [&str; 2] = ["/health", "/api/learner/register"];

/// Learner resolved from the request token, available as an `Extension`
#[derive(Clone, Debug)]
pub struct AuthenticatedLearner {
    pub learner_id: Uuid,
    pub token: String,
}

/// Resolve the learner behind `Authorization: Bearer <token>`
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    if PUBLIC_PATHS.contains(&request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let token = bearer_token(request.headers())?.to_string();

    let learner = state
        .db
        .get_learner_by_token(&token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown learner token".to_string()))?;

    state.db.update_last_seen(learner.id).await?;
    tracing::debug!(learner_id = %learner.id, path = %request.uri().path(), "authenticated");

    request.extensions_mut().insert(AuthenticatedLearner {
        learner_id: learner.id,
        token,
    });

    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Malformed Authorization header".to_string()))?;

    match value.strip_prefix("Bearer ").map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(ApiError::Unauthorized(
            "Expected a Bearer token".to_string(),
        )),
    }
}
