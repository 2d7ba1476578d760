// src/models/log_entry.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Id;
use super::quiz::{AnswerValue, PresentedQuestion};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogEvent {
    AttemptStarted,
    QuizStarted,
    QuizSubmission,
}

/// Append-only audit record of lifecycle events.
///
/// Carries a denormalized snapshot of the presented question order and
/// correctness: the presentation order is never persisted anywhere else, so
/// audits and migrations reconstruct history from these entries alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Id,
    pub event: LogEvent,
    pub attempt_id: Id,
    pub student_id: Id,
    pub exercise_id: Id,
    /// Questions and answer options re-ordered to match what the student
    /// actually saw, correctness included.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<PresentedQuestion>>,
    /// Raw submitted answer vector, for `quizSubmission` events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<AnswerValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correctness: Option<f64>,
    pub created_at: DateTime<Utc>,
}
