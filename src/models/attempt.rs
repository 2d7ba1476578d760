// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Id;
use crate::error::AppError;

/// Attempt lifecycle states. An attempt only moves forward through these;
/// the sole exception is the explicit administrative correction endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttemptStatus {
    Exercise,
    ExerciseCompleted,
    Quiz,
    QuizCompleted,
}

impl AttemptStatus {
    /// Ordering of the forward-only progression.
    fn rank(self) -> u8 {
        match self {
            AttemptStatus::Exercise => 0,
            AttemptStatus::ExerciseCompleted => 1,
            AttemptStatus::Quiz => 2,
            AttemptStatus::QuizCompleted => 3,
        }
    }

    /// `goToQuiz` is legal only before the quiz has been entered.
    pub fn can_start_quiz(self) -> bool {
        matches!(
            self,
            AttemptStatus::Exercise | AttemptStatus::ExerciseCompleted
        )
    }
}

/// One per (student, exercise). Created on exercise start, mutated only by
/// the state machine, never deleted in normal operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub id: Id,
    pub student_id: Id,
    pub exercise_id: Id,
    pub status: AttemptStatus,
    /// Conversation thread of the explain variant, owned by the assistant
    /// collaborator. Created before the attempt row, see the two-phase flow.
    pub thread_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Attempt {
    /// Forward-only transition. Anything else is an `InvalidState` error,
    /// never a silent coercion.
    pub fn advance_to(&mut self, next: AttemptStatus) -> Result<(), AppError> {
        if next.rank() <= self.status.rank() {
            return Err(AppError::InvalidState(format!(
                "Attempt cannot move from {:?} to {:?}",
                self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }

    /// The `goToQuiz` transition, with its stricter source-state rule.
    pub fn start_quiz(&mut self) -> Result<(), AppError> {
        if !self.status.can_start_quiz() {
            return Err(AppError::InvalidState(format!(
                "Attempt is in state {:?}, quiz cannot be started",
                self.status
            )));
        }
        self.status = AttemptStatus::Quiz;
        Ok(())
    }
}

/// DTO for the administrative status correction (admin surface).
#[derive(Debug, Deserialize)]
pub struct SetAttemptStatusRequest {
    pub status: AttemptStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(status: AttemptStatus) -> Attempt {
        Attempt {
            id: "a1".to_string(),
            student_id: "s1".to_string(),
            exercise_id: "e1".to_string(),
            status,
            thread_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn start_quiz_from_exercise_states() {
        let mut a = attempt(AttemptStatus::Exercise);
        assert!(a.start_quiz().is_ok());
        assert_eq!(a.status, AttemptStatus::Quiz);

        let mut a = attempt(AttemptStatus::ExerciseCompleted);
        assert!(a.start_quiz().is_ok());
    }

    #[test]
    fn start_quiz_rejected_in_quiz_states() {
        let mut a = attempt(AttemptStatus::Quiz);
        assert!(matches!(a.start_quiz(), Err(AppError::InvalidState(_))));

        let mut a = attempt(AttemptStatus::QuizCompleted);
        assert!(matches!(a.start_quiz(), Err(AppError::InvalidState(_))));
        assert_eq!(a.status, AttemptStatus::QuizCompleted);
    }

    #[test]
    fn advance_never_moves_backward() {
        let mut a = attempt(AttemptStatus::Quiz);
        assert!(a.advance_to(AttemptStatus::QuizCompleted).is_ok());
        assert!(matches!(
            a.advance_to(AttemptStatus::Exercise),
            Err(AppError::InvalidState(_))
        ));
        assert!(matches!(
            a.advance_to(AttemptStatus::QuizCompleted),
            Err(AppError::InvalidState(_))
        ));
    }

    #[test]
    fn status_serializes_camel_case() {
        let json = serde_json::to_string(&AttemptStatus::ExerciseCompleted).unwrap();
        assert_eq!(json, "\"exerciseCompleted\"");
        let json = serde_json::to_string(&AttemptStatus::QuizCompleted).unwrap();
        assert_eq!(json, "\"quizCompleted\"");
    }
}
