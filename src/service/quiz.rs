// src/service/quiz.rs

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::{
    config::QUIZ_RETRY_COOLDOWN_SECONDS,
    engine::{grading, presentation, window},
    error::AppError,
    models::{
        attempt::AttemptStatus,
        log_entry::{LogEntry, LogEvent},
        quiz::{AnswerValue, PublicQuestion},
        submission::QuizSubmission,
    },
    state::AppState,
    store::{Store, new_id},
};

use super::{load_context, owner_group};

#[derive(Debug, Serialize)]
pub struct QuizView {
    pub status: AttemptStatus,
    pub questions: Vec<PublicQuestion>,
    pub solution_shown: bool,
    /// End of the client-side retry cooldown after an incorrect submission.
    /// Present only while the attempt is still in `quiz` state and a
    /// submission exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_retry_at: Option<DateTime<Utc>>,
    /// Latest submitted answers, for pre-filling the form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_answers: Option<Vec<AnswerValue>>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionOutcome {
    pub correctness: f64,
    pub correct_count: usize,
    pub total_questions: usize,
    pub status: AttemptStatus,
}

/// Render the quiz as one student sees it.
///
/// Read-only: the transaction is never committed. The presentation is
/// recomputed from seeds on every call; there is no cached copy to drift
/// from.
pub async fn render_quiz(
    state: &AppState,
    user_id: &str,
    attempt_id: &str,
    now: DateTime<Utc>,
) -> Result<QuizView, AppError> {
    let mut tx = state.store.begin().await?;
    let attempt = tx
        .get_attempt(attempt_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))?;

    let ctx = load_context(tx.as_mut(), user_id, &attempt.exercise_id).await?;
    if attempt.student_id != user_id && !ctx.registration.role.is_staff() {
        return Err(AppError::OwnershipViolation(
            "This attempt belongs to another student".to_string(),
        ));
    }
    window::ensure_visible(&ctx.week, ctx.registration.role, now)?;

    if attempt.status.can_start_quiz() {
        return Err(AppError::InvalidState(
            "Quiz has not been started for this attempt".to_string(),
        ));
    }

    let quiz = ctx
        .exercise
        .quiz
        .as_ref()
        .ok_or_else(|| AppError::NotFound("This exercise has no quiz".to_string()))?;

    let group = owner_group(tx.as_mut(), &ctx, &attempt.student_id).await?;
    let presented = presentation::presented_questions(
        quiz,
        &attempt.student_id,
        &attempt.exercise_id,
        group.as_ref(),
    )?;

    let reveal = window::solution_shown(&ctx.week, now);
    let latest = tx.latest_submission(&attempt.id).await?;
    let can_retry_at = latest
        .as_ref()
        .filter(|_| attempt.status == AttemptStatus::Quiz)
        .map(|s| s.created_at + Duration::seconds(QUIZ_RETRY_COOLDOWN_SECONDS));

    Ok(QuizView {
        status: attempt.status,
        questions: presented.iter().map(|q| q.public_view(reveal)).collect(),
        solution_shown: reveal,
        can_retry_at,
        latest_answers: latest.map(|s| s.answers),
    })
}

/// Grade a submission.
///
/// Recomputes the presentation for the attempt's own student, scores the
/// answer vector against it, persists the submission unconditionally, and
/// on a fully correct result idempotently records the completion and moves
/// the attempt to `quizCompleted`. Everything happens in one transaction;
/// the audit entry is the only durable record of the presented order.
pub async fn submit_quiz(
    state: &AppState,
    user_id: &str,
    attempt_id: &str,
    answers: Vec<AnswerValue>,
    now: DateTime<Utc>,
) -> Result<SubmissionOutcome, AppError> {
    let mut tx = state.store.begin().await?;
    let mut attempt = tx
        .get_attempt(attempt_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))?;

    let ctx = load_context(tx.as_mut(), user_id, &attempt.exercise_id).await?;
    if attempt.student_id != user_id && !ctx.registration.role.is_staff() {
        return Err(AppError::OwnershipViolation(
            "This attempt belongs to another student".to_string(),
        ));
    }
    window::ensure_accepts_submissions(&ctx.week, ctx.requester(), now)?;

    if attempt.status != AttemptStatus::Quiz {
        return Err(AppError::InvalidState(format!(
            "Attempt is in state {:?}, submissions are not accepted",
            attempt.status
        )));
    }

    let quiz = ctx
        .exercise
        .quiz
        .as_ref()
        .ok_or_else(|| AppError::NotFound("This exercise has no quiz".to_string()))?;

    // Recompute exactly what was rendered. The caller may be staff, so the
    // seeds use the attempt owner's id, never the caller's.
    let group = owner_group(tx.as_mut(), &ctx, &attempt.student_id).await?;
    let presented = presentation::presented_questions(
        quiz,
        &attempt.student_id,
        &attempt.exercise_id,
        group.as_ref(),
    )?;

    let outcome = grading::grade(&presented, &answers)?;

    tx.insert_submission(&QuizSubmission {
        id: new_id(),
        attempt_id: attempt.id.clone(),
        answers: answers.clone(),
        created_at: now,
    })
    .await?;

    if outcome.fully_correct() {
        tx.add_completion(&attempt.student_id, &attempt.exercise_id)
            .await?;
        attempt.advance_to(AttemptStatus::QuizCompleted)?;
        tx.set_attempt_status(&attempt.id, AttemptStatus::QuizCompleted)
            .await?;
    }

    let correct_count = outcome.per_question.iter().filter(|&&ok| ok).count();
    tx.append_log(&LogEntry {
        id: new_id(),
        event: LogEvent::QuizSubmission,
        attempt_id: attempt.id.clone(),
        student_id: attempt.student_id.clone(),
        exercise_id: attempt.exercise_id.clone(),
        questions: Some(presented),
        answers: Some(answers),
        correctness: Some(outcome.correctness),
        created_at: now,
    })
    .await?;
    tx.commit().await?;

    Ok(SubmissionOutcome {
        correctness: outcome.correctness,
        correct_count,
        total_questions: outcome.per_question.len(),
        status: attempt.status,
    })
}
