// src/store/mod.rs

//! Persistence collaborator.
//!
//! The core never talks to a database directly: every logical operation
//! begins a transaction, performs all of its reads and writes against the
//! `StoreTx`, and commits as one atomic, serializable unit. Dropping a
//! transaction without committing discards all of its writes, so a failed
//! operation leaves no partial state behind.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

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

pub use memory::MemStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// Open a serializable transaction. Concurrent transactions touching the
    /// same attempt cannot both observe the same pre-state and both commit.
    async fn begin(&self) -> Result<Box<dyn StoreTx>, AppError>;
}

#[async_trait]
pub trait StoreTx: Send {
    // users
    async fn get_user(&mut self, id: &str) -> Result<Option<User>, AppError>;
    async fn get_user_by_username(&mut self, username: &str) -> Result<Option<User>, AppError>;
    /// Fails with `Conflict` on a duplicate username.
    async fn insert_user(&mut self, user: &User) -> Result<(), AppError>;
    async fn update_user(&mut self, user: &User) -> Result<(), AppError>;

    // weeks
    async fn get_week(&mut self, id: &str) -> Result<Option<Week>, AppError>;
    async fn insert_week(&mut self, week: &Week) -> Result<(), AppError>;

    // exercises
    async fn get_exercise(&mut self, id: &str) -> Result<Option<Exercise>, AppError>;
    async fn insert_exercise(&mut self, exercise: &Exercise) -> Result<(), AppError>;
    async fn list_exercises_by_week(&mut self, week_id: &str) -> Result<Vec<Exercise>, AppError>;

    // registrations
    async fn get_registration(
        &mut self,
        student_id: &str,
        course_id: &str,
    ) -> Result<Option<Registration>, AppError>;
    async fn upsert_registration(&mut self, registration: &Registration) -> Result<(), AppError>;

    // attempts
    async fn get_attempt(&mut self, id: &str) -> Result<Option<Attempt>, AppError>;
    async fn find_attempt(
        &mut self,
        student_id: &str,
        exercise_id: &str,
    ) -> Result<Option<Attempt>, AppError>;
    /// Fails with `Conflict` if the (student, exercise) pair already has an
    /// attempt.
    async fn insert_attempt(&mut self, attempt: &Attempt) -> Result<(), AppError>;
    async fn set_attempt_status(&mut self, id: &str, status: AttemptStatus)
    -> Result<(), AppError>;

    // quiz submissions (append-only, totally ordered by creation time)
    async fn insert_submission(&mut self, submission: &QuizSubmission) -> Result<(), AppError>;
    async fn latest_submission(
        &mut self,
        attempt_id: &str,
    ) -> Result<Option<QuizSubmission>, AppError>;

    // completed-exercise set
    /// Idempotent: adding an already-present entry is a no-op.
    async fn add_completion(&mut self, student_id: &str, exercise_id: &str)
    -> Result<(), AppError>;
    async fn completed_exercises(&mut self, student_id: &str) -> Result<Vec<Id>, AppError>;

    // audit log (append-only)
    async fn append_log(&mut self, entry: &LogEntry) -> Result<(), AppError>;
    async fn logs_for_attempt(&mut self, attempt_id: &str) -> Result<Vec<LogEntry>, AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}

/// Fresh document id.
pub fn new_id() -> Id {
    uuid::Uuid::new_v4().to_string()
}
