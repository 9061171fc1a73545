//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext for setting up test environment with database
//! - Helper functions for creating test data
//! - Authentication helpers
//!
//! # Requirements
//! Integration tests require a PostgreSQL database (set DATABASE_URL env var).

pub mod fixtures;

use std::sync::Arc;

use axum::Router;
use uuid::Uuid;

use exercise_backend::db::Database;
use exercise_backend::models::Learner;
use exercise_backend::{router, AppState};

/// Test context containing database connection and test server.
///
/// Requires DATABASE_URL environment variable to be set.
pub struct TestContext {
    pub db: Arc<Database>,
    app: Router,
}

impl TestContext {
    /// Create a new test context.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or database connection fails.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

        let db = Database::connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        db.run_migrations()
            .await
            .expect("Failed to run migrations");

        let db = Arc::new(db);
        let app = router(AppState { db: db.clone() });

        Self { db, app }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Create a test learner and return its ID and token.
    pub async fn create_test_learner(&self, name: Option<&str>) -> (Uuid, String) {
        let learner = self
            .db
            .create_learner(name)
            .await
            .expect("Failed to create test learner");
        (learner.id, learner.token)
    }

    /// Get learner by token.
    pub async fn get_learner_by_token(&self, token: &str) -> Option<Learner> {
        self.db.get_learner_by_token(token).await.ok().flatten()
    }

    /// Format authorization header value.
    pub fn auth_header_value(token: &str) -> String {
        format!("Bearer {}", token)
    }

    /// Remove a learner and its progress rows.
    pub async fn cleanup_learner(&self, learner_id: Uuid) {
        let _ = sqlx::query("DELETE FROM progress WHERE learner_id = $1")
            .bind(learner_id)
            .execute(self.db.pool())
            .await;

        let _ = sqlx::query("DELETE FROM learners WHERE id = $1")
            .bind(learner_id)
            .execute(self.db.pool())
            .await;
    }

    /// Remove a stored exercise.
    pub async fn cleanup_exercise(&self, topic_id: i64) {
        let _ = sqlx::query("DELETE FROM exercises WHERE topic_id = $1")
            .bind(topic_id)
            .execute(self.db.pool())
            .await;
    }
}
