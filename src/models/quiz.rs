// src/models/quiz.rs

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A quiz is an ordered list of batches. Each student is deterministically
/// assigned exactly one batch; the others are alternative content variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub batches: Vec<Batch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    /// When false, questions are presented in their declared order.
    pub randomize: bool,
    pub questions: Vec<Question>,
}

/// Quiz question as a tagged union: a free-text item can never be treated as
/// multiple-choice by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Question {
    #[serde(rename_all = "camelCase")]
    MultipleChoice {
        prompt: String,
        answers: Vec<Answer>,
        /// Per-question opt-out: the declared answer order is kept even when
        /// the batch shuffles questions.
        #[serde(default)]
        keep_answer_order: bool,
    },
    #[serde(rename_all = "camelCase")]
    FreeText { prompt: String },
}

impl Question {
    pub fn prompt(&self) -> &str {
        match self {
            Question::MultipleChoice { prompt, .. } => prompt,
            Question::FreeText { prompt } => prompt,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub correct: bool,
}

/// One entry of a submitted answer vector: a presented-order index for
/// multiple-choice questions, free text otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Choice(usize),
    Text(String),
}

impl Quiz {
    /// Structural validation, applied when an exercise is written and again
    /// on every read path that consumes the quiz.
    pub fn validate_config(&self) -> Result<(), AppError> {
        if self.batches.is_empty() {
            return Err(AppError::ValidationError(
                "Quiz must contain at least one batch".to_string(),
            ));
        }
        for (b, batch) in self.batches.iter().enumerate() {
            if batch.questions.is_empty() {
                return Err(AppError::ValidationError(format!(
                    "Quiz batch {} has no questions",
                    b
                )));
            }
            for (q, question) in batch.questions.iter().enumerate() {
                if let Question::MultipleChoice { answers, .. } = question {
                    if !answers.iter().any(|a| a.correct) {
                        return Err(AppError::ValidationError(format!(
                            "Question {} in batch {} has no correct answer",
                            q, b
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// A question exactly as one student sees it: post-shuffle position, answers
/// in presented order with their correctness. This is what grading recomputes
/// and what the audit log snapshots; it is never persisted as live state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PresentedQuestion {
    #[serde(rename_all = "camelCase")]
    MultipleChoice {
        prompt: String,
        answers: Vec<Answer>,
    },
    #[serde(rename_all = "camelCase")]
    FreeText { prompt: String },
}

impl PresentedQuestion {
    /// Indices of the answers considered correct, in presented order.
    /// Empty for free-text questions.
    pub fn correct_indices(&self) -> Vec<usize> {
        match self {
            PresentedQuestion::MultipleChoice { answers, .. } => answers
                .iter()
                .enumerate()
                .filter(|(_, a)| a.correct)
                .map(|(i, _)| i)
                .collect(),
            PresentedQuestion::FreeText { .. } => Vec::new(),
        }
    }

    /// DTO safe to send to the client: answer texts only, correctness
    /// stripped unless the caller deliberately reveals solutions.
    pub fn public_view(&self, reveal_solutions: bool) -> PublicQuestion {
        match self {
            PresentedQuestion::MultipleChoice { prompt, answers } => PublicQuestion {
                kind: "multipleChoice".to_string(),
                prompt: prompt.clone(),
                answers: Some(answers.iter().map(|a| a.text.clone()).collect()),
                correct_indices: reveal_solutions.then(|| self.correct_indices()),
            },
            PresentedQuestion::FreeText { prompt } => PublicQuestion {
                kind: "freeText".to_string(),
                prompt: prompt.clone(),
                answers: None,
                correct_indices: None,
            },
        }
    }
}

/// DTO for sending a presented question to the client (hides correctness).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub kind: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_indices: Option<Vec<usize>>,
}
