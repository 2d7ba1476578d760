// src/engine/grading.rs

//! Pure scoring of an answer vector against a recomputed presentation.
//!
//! The caller is responsible for recomputing the presentation with the
//! attempt's own student id; this module only compares.

use crate::{
    error::AppError,
    models::quiz::{AnswerValue, PresentedQuestion},
};

#[derive(Debug, Clone, PartialEq)]
pub struct GradeOutcome {
    /// Fraction of questions satisfied, in `[0, 1]`.
    pub correctness: f64,
    /// Per-question verdict in presented order. Free-text questions are
    /// always satisfied; they are never auto-graded.
    pub per_question: Vec<bool>,
}

impl GradeOutcome {
    pub fn fully_correct(&self) -> bool {
        self.correctness == 1.0
    }
}

pub fn grade(
    presented: &[PresentedQuestion],
    answers: &[AnswerValue],
) -> Result<GradeOutcome, AppError> {
    if presented.is_empty() {
        return Err(AppError::ValidationError(
            "Cannot grade a quiz with no questions".to_string(),
        ));
    }
    if answers.len() != presented.len() {
        return Err(AppError::ValidationError(format!(
            "Expected {} answers, got {}",
            presented.len(),
            answers.len()
        )));
    }

    let per_question: Vec<bool> = presented
        .iter()
        .zip(answers)
        .map(|(question, answer)| match (question, answer) {
            (PresentedQuestion::FreeText { .. }, _) => true,
            (PresentedQuestion::MultipleChoice { .. }, AnswerValue::Choice(index)) => {
                question.correct_indices().contains(index)
            }
            // Free text submitted against a choice question never matches.
            (PresentedQuestion::MultipleChoice { .. }, AnswerValue::Text(_)) => false,
        })
        .collect();

    let satisfied = per_question.iter().filter(|&&ok| ok).count();
    Ok(GradeOutcome {
        correctness: satisfied as f64 / presented.len() as f64,
        per_question,
    })
}
