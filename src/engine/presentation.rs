// src/engine/presentation.rs

//! Deterministic question presentation.
//!
//! The order computed here is shown to the student and recomputed verbatim
//! at grading time; it is never persisted and never memoized. Seed keys are
//! therefore load-bearing: the part order of each key must stay identical
//! between every compute and recompute site.

use crate::{
    error::AppError,
    models::{
        quiz::{PresentedQuestion, Question, Quiz},
        registration::GroupSlot,
    },
};

use super::{assignment, rng::SeededRng};

/// The ordered list of questions one student sees for one exercise, with
/// each multiple-choice question's answers in their presented order.
pub fn presented_questions(
    quiz: &Quiz,
    student_id: &str,
    exercise_id: &str,
    group: Option<&GroupSlot>,
) -> Result<Vec<PresentedQuestion>, AppError> {
    // Write-time validation should have rejected this already; reads reject
    // it again rather than panicking on an empty batch list.
    quiz.validate_config()?;

    let batch_idx = assignment::batch_index(student_id, exercise_id, group, quiz.batches.len())?;
    let batch = &quiz.batches[batch_idx];

    let mut questions: Vec<&Question> = batch.questions.iter().collect();
    if batch.randomize {
        let mut rng = SeededRng::from_parts(&[student_id, exercise_id, "questions order"]);
        rng.shuffle(&mut questions);
    }

    let presented = questions
        .into_iter()
        .enumerate()
        .map(|(index, question)| match question {
            Question::MultipleChoice {
                prompt,
                answers,
                keep_answer_order,
            } => {
                let mut answers = answers.clone();
                if !keep_answer_order {
                    // Keyed on the post-shuffle question index.
                    let mut rng = SeededRng::from_parts(&[
                        exercise_id,
                        student_id,
                        &index.to_string(),
                        "answers order",
                    ]);
                    rng.shuffle(&mut answers);
                }
                PresentedQuestion::MultipleChoice {
                    prompt: prompt.clone(),
                    answers,
                }
            }
            Question::FreeText { prompt } => PresentedQuestion::FreeText {
                prompt: prompt.clone(),
            },
        })
        .collect();

    Ok(presented)
}
