//! PostgreSQL database operations

use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create a pool that connects on first use
    pub fn connect_lazy(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_lazy(database_url)?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ApiError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // === Learner Repository ===

    /// Create a new learner with generated token
    pub async fn create_learner(&self, name: Option<&str>) -> Result<Learner> {
        let token = Uuid::new_v4().to_string();
        let learner = sqlx::query_as::<_, Learner>(
            r#"
            INSERT INTO learners (token, name)
            VALUES ($1, $2)
            RETURNING id, token, name, created_at, last_seen_at
            "#,
        )
        .bind(&token)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(learner)
    }

    /// Get learner by token
    pub async fn get_learner_by_token(&self, token: &str) -> Result<Option<Learner>> {
        let learner = sqlx::query_as::<_, Learner>(
            r#"
            SELECT id, token, name, created_at, last_seen_at
            FROM learners
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(learner)
    }

    /// Update learner last_seen_at timestamp
    pub async fn update_last_seen(&self, learner_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE learners
            SET last_seen_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(learner_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // === Exercise Repository ===

    /// Get the exercise published for a topic
    pub async fn get_exercise(&self, topic_id: i64) -> Result<Option<DbExercise>> {
        let exercise = sqlx::query_as::<_, DbExercise>(
            r#"
            SELECT topic_id, exercise_id, title, definition, created_at, updated_at
            FROM exercises
            WHERE topic_id = $1
            "#,
        )
        .bind(topic_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(exercise)
    }

    /// Insert or replace the exercise of a topic
    pub async fn upsert_exercise(&self, topic_id: i64, exercise: &Exercise) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO exercises (topic_id, exercise_id, title, definition)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (topic_id) DO UPDATE SET
                exercise_id = EXCLUDED.exercise_id,
                title = EXCLUDED.title,
                definition = EXCLUDED.definition,
                updated_at = NOW()
            "#,
        )
        .bind(topic_id)
        .bind(exercise.id)
        .bind(&exercise.title)
        .bind(Json(exercise))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // === Progress Repository ===

    /// Get a learner's progress on one content item
    pub async fn get_progress(
        &self,
        learner_id: Uuid,
        content_type: &str,
        content_id: i64,
    ) -> Result<Option<DbProgress>> {
        let progress = sqlx::query_as::<_, DbProgress>(
            r#"
            SELECT id, learner_id, content_type, content_id, is_completed, score, attempts,
                   created_at, updated_at
            FROM progress
            WHERE learner_id = $1 AND content_type = $2 AND content_id = $3
            "#,
        )
        .bind(learner_id)
        .bind(content_type)
        .bind(content_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(progress)
    }

    /// Record an attempt, keeping the best score and sticky completion
    pub async fn upsert_progress(
        &self,
        learner_id: Uuid,
        content_type: &str,
        content_id: i64,
        request: &ProgressRequest,
    ) -> Result<DbProgress> {
        let progress = sqlx::query_as::<_, DbProgress>(
            r#"
            INSERT INTO progress (learner_id, content_type, content_id, is_completed, score, attempts)
            VALUES ($1, $2, $3, $4, $5, 1)
            ON CONFLICT (learner_id, content_type, content_id) DO UPDATE SET
                is_completed = progress.is_completed OR EXCLUDED.is_completed,
                score = GREATEST(progress.score, EXCLUDED.score),
                attempts = progress.attempts + 1,
                updated_at = CASE
                    WHEN EXCLUDED.score > progress.score THEN NOW()
                    ELSE progress.updated_at
                END
            RETURNING id, learner_id, content_type, content_id, is_completed, score, attempts,
                      created_at, updated_at
            "#,
        )
        .bind(learner_id)
        .bind(content_type)
        .bind(content_id)
        .bind(request.is_completed)
        .bind(request.score)
        .fetch_one(&self.pool)
        .await?;

        Ok(progress)
    }
}
