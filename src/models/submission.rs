// src/models/submission.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Id;
use super::quiz::AnswerValue;

/// Append-only record of one grading attempt. The latest submission per
/// attempt drives the client cooldown and answer pre-fill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSubmission {
    pub id: Id,
    pub attempt_id: Id,
    /// Raw answer vector exactly as submitted, one entry per displayed
    /// question.
    pub answers: Vec<AnswerValue>,
    pub created_at: DateTime<Utc>,
}

/// DTO for submitting a quiz.
#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    pub answers: Vec<AnswerValue>,
}
