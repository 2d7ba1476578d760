// src/store/memory.rs

//! In-memory Store implementation.
//!
//! A single tokio mutex guards the whole data set, so transactions are
//! trivially serializable: `begin` takes the lock and clones the data,
//! every operation works on the staged clone, and `commit` swaps it back.
//! Dropping the transaction without committing discards the clone.
//!
//! Used by the integration tests and local runs without a database.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

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

#[derive(Default, Clone)]
struct MemData {
    users: HashMap<Id, User>,
    weeks: HashMap<Id, Week>,
    exercises: HashMap<Id, Exercise>,
    registrations: HashMap<(Id, String), Registration>,
    attempts: HashMap<Id, Attempt>,
    submissions: Vec<QuizSubmission>,
    completions: HashSet<(Id, Id)>,
    logs: Vec<LogEntry>,
}

#[derive(Default, Clone)]
pub struct MemStore {
    data: Arc<Mutex<MemData>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, AppError> {
        let guard = self.data.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemTx { guard, staged }))
    }
}

struct MemTx {
    guard: OwnedMutexGuard<MemData>,
    staged: MemData,
}

#[async_trait]
impl StoreTx for MemTx {
    async fn get_user(&mut self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.staged.users.get(id).cloned())
    }

    async fn get_user_by_username(&mut self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .staged
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn insert_user(&mut self, user: &User) -> Result<(), AppError> {
        if self
            .staged
            .users
            .values()
            .any(|u| u.username == user.username)
        {
            return Err(AppError::Conflict(format!(
                "Username '{}' already exists",
                user.username
            )));
        }
        self.staged.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn update_user(&mut self, user: &User) -> Result<(), AppError> {
        if !self.staged.users.contains_key(&user.id) {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        self.staged.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn get_week(&mut self, id: &str) -> Result<Option<Week>, AppError> {
        Ok(self.staged.weeks.get(id).cloned())
    }

    async fn insert_week(&mut self, week: &Week) -> Result<(), AppError> {
        self.staged.weeks.insert(week.id.clone(), week.clone());
        Ok(())
    }

    async fn get_exercise(&mut self, id: &str) -> Result<Option<Exercise>, AppError> {
        Ok(self.staged.exercises.get(id).cloned())
    }

    async fn insert_exercise(&mut self, exercise: &Exercise) -> Result<(), AppError> {
        self.staged
            .exercises
            .insert(exercise.id.clone(), exercise.clone());
        Ok(())
    }

    async fn list_exercises_by_week(&mut self, week_id: &str) -> Result<Vec<Exercise>, AppError> {
        let mut exercises: Vec<Exercise> = self
            .staged
            .exercises
            .values()
            .filter(|e| e.week_id == week_id)
            .cloned()
            .collect();
        exercises.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(exercises)
    }

    async fn get_registration(
        &mut self,
        student_id: &str,
        course_id: &str,
    ) -> Result<Option<Registration>, AppError> {
        Ok(self
            .staged
            .registrations
            .get(&(student_id.to_string(), course_id.to_string()))
            .cloned())
    }

    async fn upsert_registration(&mut self, registration: &Registration) -> Result<(), AppError> {
        self.staged.registrations.insert(
            (
                registration.student_id.clone(),
                registration.course_id.clone(),
            ),
            registration.clone(),
        );
        Ok(())
    }

    async fn get_attempt(&mut self, id: &str) -> Result<Option<Attempt>, AppError> {
        Ok(self.staged.attempts.get(id).cloned())
    }

    async fn find_attempt(
        &mut self,
        student_id: &str,
        exercise_id: &str,
    ) -> Result<Option<Attempt>, AppError> {
        Ok(self
            .staged
            .attempts
            .values()
            .find(|a| a.student_id == student_id && a.exercise_id == exercise_id)
            .cloned())
    }

    async fn insert_attempt(&mut self, attempt: &Attempt) -> Result<(), AppError> {
        if self
            .staged
            .attempts
            .values()
            .any(|a| a.student_id == attempt.student_id && a.exercise_id == attempt.exercise_id)
        {
            return Err(AppError::Conflict(
                "Attempt already exists for this student and exercise".to_string(),
            ));
        }
        self.staged
            .attempts
            .insert(attempt.id.clone(), attempt.clone());
        Ok(())
    }

    async fn set_attempt_status(
        &mut self,
        id: &str,
        status: AttemptStatus,
    ) -> Result<(), AppError> {
        let attempt = self
            .staged
            .attempts
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))?;
        attempt.status = status;
        Ok(())
    }

    async fn insert_submission(&mut self, submission: &QuizSubmission) -> Result<(), AppError> {
        self.staged.submissions.push(submission.clone());
        Ok(())
    }

    async fn latest_submission(
        &mut self,
        attempt_id: &str,
    ) -> Result<Option<QuizSubmission>, AppError> {
        // Insertion order is the creation order; the last match wins.
        Ok(self
            .staged
            .submissions
            .iter()
            .rev()
            .find(|s| s.attempt_id == attempt_id)
            .cloned())
    }

    async fn add_completion(
        &mut self,
        student_id: &str,
        exercise_id: &str,
    ) -> Result<(), AppError> {
        self.staged
            .completions
            .insert((student_id.to_string(), exercise_id.to_string()));
        Ok(())
    }

    async fn completed_exercises(&mut self, student_id: &str) -> Result<Vec<Id>, AppError> {
        let mut ids: Vec<Id> = self
            .staged
            .completions
            .iter()
            .filter(|(s, _)| s == student_id)
            .map(|(_, e)| e.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn append_log(&mut self, entry: &LogEntry) -> Result<(), AppError> {
        self.staged.logs.push(entry.clone());
        Ok(())
    }

    async fn logs_for_attempt(&mut self, attempt_id: &str) -> Result<Vec<LogEntry>, AppError> {
        Ok(self
            .staged
            .logs
            .iter()
            .filter(|l| l.attempt_id == attempt_id)
            .cloned()
            .collect())
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let MemTx { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: &str, username: &str) -> User {
        User {
            id: id.to_string(),
            username: username.to_string(),
            password: "hash".to_string(),
            role: "student".to_string(),
            has_accommodation: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn uncommitted_writes_are_discarded() {
        let store = MemStore::new();

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_user(&user("u1", "alice")).await.unwrap();
            // dropped without commit
        }

        let mut tx = store.begin().await.unwrap();
        assert!(tx.get_user("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn committed_writes_are_visible() {
        let store = MemStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.insert_user(&user("u1", "alice")).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let found = tx.get_user("u1").await.unwrap().unwrap();
        assert_eq!(found.username, "alice");
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let store = MemStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.insert_user(&user("u1", "alice")).await.unwrap();
        let err = tx.insert_user(&user("u2", "alice")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn completion_set_is_idempotent() {
        let store = MemStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.add_completion("s1", "ex1").await.unwrap();
        tx.add_completion("s1", "ex1").await.unwrap();
        assert_eq!(tx.completed_exercises("s1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn latest_submission_wins_by_insertion_order() {
        let store = MemStore::new();
        let mut tx = store.begin().await.unwrap();
        for i in 0..3 {
            tx.insert_submission(&QuizSubmission {
                id: format!("sub{}", i),
                attempt_id: "a1".to_string(),
                answers: vec![],
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        }
        let latest = tx.latest_submission("a1").await.unwrap().unwrap();
        assert_eq!(latest.id, "sub2");
    }
}
