// src/store/postgres.rs

//! Postgres Store implementation.
//!
//! Entities are persisted as JSONB documents with the columns needed for
//! indexed lookups pulled out beside them. Every transaction runs at
//! SERIALIZABLE isolation, which is what lets two racing submissions for
//! one attempt not both observe `quiz` state and both commit.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use sqlx::{PgPool, Postgres, Transaction};

use crate::{
    error::AppError,
    models::{
        Id,
        attempt::{Attempt, AttemptStatus},
        exercise::Exercise,
        log_entry::LogEntry,
        registration::Registration,
        submission::QuizSubmission,
        user::User,
        week::Week,
    },
};

use super::{Store, StoreTx};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;
        Ok(Box::new(PgTx { tx }))
    }
}

struct PgTx {
    tx: Transaction<'static, Postgres>,
}

fn from_doc<T: DeserializeOwned>(doc: serde_json::Value) -> Result<T, AppError> {
    // A document that no longer deserializes is store corruption, not a
    // caller mistake.
    serde_json::from_value(doc).map_err(|e| AppError::InternalServerError(e.to_string()))
}

fn map_unique_violation(err: sqlx::Error, conflict: AppError) -> AppError {
    // Postgres error code for unique violation is 23505
    let msg = err.to_string();
    if msg.contains("unique constraint") || msg.contains("23505") {
        conflict
    } else {
        AppError::from(err)
    }
}

impl PgTx {
    async fn fetch_doc<T: DeserializeOwned>(
        &mut self,
        query: &str,
        id: &str,
    ) -> Result<Option<T>, AppError> {
        let row: Option<(serde_json::Value,)> = sqlx::query_as(query)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(|(doc,)| from_doc(doc)).transpose()
    }
}

#[async_trait]
impl StoreTx for PgTx {
    async fn get_user(&mut self, id: &str) -> Result<Option<User>, AppError> {
        let row: Option<(String, serde_json::Value)> =
            sqlx::query_as("SELECT password, doc FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await?;
        row.map(|(password, doc)| {
            let mut user: User = from_doc(doc)?;
            user.password = password;
            Ok(user)
        })
        .transpose()
    }

    async fn get_user_by_username(&mut self, username: &str) -> Result<Option<User>, AppError> {
        let row: Option<(String, serde_json::Value)> =
            sqlx::query_as("SELECT password, doc FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&mut *self.tx)
                .await?;
        row.map(|(password, doc)| {
            let mut user: User = from_doc(doc)?;
            user.password = password;
            Ok(user)
        })
        .transpose()
    }

    async fn insert_user(&mut self, user: &User) -> Result<(), AppError> {
        sqlx::query("INSERT INTO users (id, username, password, doc) VALUES ($1, $2, $3, $4)")
            .bind(&user.id)
            .bind(&user.username)
            .bind(&user.password)
            .bind(serde_json::to_value(user)?)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| {
                map_unique_violation(
                    e,
                    AppError::Conflict(format!("Username '{}' already exists", user.username)),
                )
            })?;
        Ok(())
    }

    async fn update_user(&mut self, user: &User) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE users SET username = $2, password = $3, doc = $4 WHERE id = $1")
                .bind(&user.id)
                .bind(&user.username)
                .bind(&user.password)
                .bind(serde_json::to_value(user)?)
                .execute(&mut *self.tx)
                .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    async fn get_week(&mut self, id: &str) -> Result<Option<Week>, AppError> {
        self.fetch_doc("SELECT doc FROM weeks WHERE id = $1", id).await
    }

    async fn insert_week(&mut self, week: &Week) -> Result<(), AppError> {
        sqlx::query("INSERT INTO weeks (id, doc) VALUES ($1, $2)")
            .bind(&week.id)
            .bind(serde_json::to_value(week)?)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn get_exercise(&mut self, id: &str) -> Result<Option<Exercise>, AppError> {
        self.fetch_doc("SELECT doc FROM exercises WHERE id = $1", id)
            .await
    }

    async fn insert_exercise(&mut self, exercise: &Exercise) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO exercises (id, week_id, created_at, doc) VALUES ($1, $2, $3, $4)",
        )
        .bind(&exercise.id)
        .bind(&exercise.week_id)
        .bind(exercise.created_at)
        .bind(serde_json::to_value(exercise)?)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn list_exercises_by_week(&mut self, week_id: &str) -> Result<Vec<Exercise>, AppError> {
        let rows: Vec<(serde_json::Value,)> =
            sqlx::query_as("SELECT doc FROM exercises WHERE week_id = $1 ORDER BY created_at")
                .bind(week_id)
                .fetch_all(&mut *self.tx)
                .await?;
        rows.into_iter().map(|(doc,)| from_doc(doc)).collect()
    }

    async fn get_registration(
        &mut self,
        student_id: &str,
        course_id: &str,
    ) -> Result<Option<Registration>, AppError> {
        let row: Option<(serde_json::Value,)> = sqlx::query_as(
            "SELECT doc FROM registrations WHERE student_id = $1 AND course_id = $2",
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(|(doc,)| from_doc(doc)).transpose()
    }

    async fn upsert_registration(&mut self, registration: &Registration) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO registrations (student_id, course_id, doc)
            VALUES ($1, $2, $3)
            ON CONFLICT (student_id, course_id) DO UPDATE SET doc = EXCLUDED.doc
            "#,
        )
        .bind(&registration.student_id)
        .bind(&registration.course_id)
        .bind(serde_json::to_value(registration)?)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn get_attempt(&mut self, id: &str) -> Result<Option<Attempt>, AppError> {
        self.fetch_doc("SELECT doc FROM attempts WHERE id = $1", id)
            .await
    }

    async fn find_attempt(
        &mut self,
        student_id: &str,
        exercise_id: &str,
    ) -> Result<Option<Attempt>, AppError> {
        let row: Option<(serde_json::Value,)> = sqlx::query_as(
            "SELECT doc FROM attempts WHERE student_id = $1 AND exercise_id = $2",
        )
        .bind(student_id)
        .bind(exercise_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(|(doc,)| from_doc(doc)).transpose()
    }

    async fn insert_attempt(&mut self, attempt: &Attempt) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO attempts (id, student_id, exercise_id, doc) VALUES ($1, $2, $3, $4)",
        )
        .bind(&attempt.id)
        .bind(&attempt.student_id)
        .bind(&attempt.exercise_id)
        .bind(serde_json::to_value(attempt)?)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                AppError::Conflict(
                    "Attempt already exists for this student and exercise".to_string(),
                ),
            )
        })?;
        Ok(())
    }

    async fn set_attempt_status(
        &mut self,
        id: &str,
        status: AttemptStatus,
    ) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE attempts SET doc = jsonb_set(doc, '{status}', $2) WHERE id = $1")
            .bind(id)
            .bind(serde_json::to_value(status)?)
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Attempt not found".to_string()));
        }
        Ok(())
    }

    async fn insert_submission(&mut self, submission: &QuizSubmission) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO quiz_submissions (id, attempt_id, created_at, doc) VALUES ($1, $2, $3, $4)",
        )
        .bind(&submission.id)
        .bind(&submission.attempt_id)
        .bind(submission.created_at)
        .bind(serde_json::to_value(submission)?)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn latest_submission(
        &mut self,
        attempt_id: &str,
    ) -> Result<Option<QuizSubmission>, AppError> {
        let row: Option<(serde_json::Value,)> = sqlx::query_as(
            r#"
            SELECT doc FROM quiz_submissions
            WHERE attempt_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(attempt_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(|(doc,)| from_doc(doc)).transpose()
    }

    async fn add_completion(
        &mut self,
        student_id: &str,
        exercise_id: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO completions (student_id, exercise_id)
            VALUES ($1, $2)
            ON CONFLICT (student_id, exercise_id) DO NOTHING
            "#,
        )
        .bind(student_id)
        .bind(exercise_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn completed_exercises(&mut self, student_id: &str) -> Result<Vec<Id>, AppError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT exercise_id FROM completions WHERE student_id = $1 ORDER BY exercise_id",
        )
        .bind(student_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn append_log(&mut self, entry: &LogEntry) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO exercise_logs (id, attempt_id, created_at, doc) VALUES ($1, $2, $3, $4)",
        )
        .bind(&entry.id)
        .bind(&entry.attempt_id)
        .bind(entry.created_at)
        .bind(serde_json::to_value(entry)?)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn logs_for_attempt(&mut self, attempt_id: &str) -> Result<Vec<LogEntry>, AppError> {
        let rows: Vec<(serde_json::Value,)> = sqlx::query_as(
            "SELECT doc FROM exercise_logs WHERE attempt_id = $1 ORDER BY created_at, id",
        )
        .bind(attempt_id)
        .fetch_all(&mut *self.tx)
        .await?;
        rows.into_iter().map(|(doc,)| from_doc(doc)).collect()
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }
}
