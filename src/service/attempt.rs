// src/service/attempt.rs

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    engine::{assignment, presentation, window},
    error::AppError,
    external::Job,
    models::{
        Id,
        attempt::{Attempt, AttemptStatus},
        exercise::ExerciseVariant,
        log_entry::{LogEntry, LogEvent},
    },
    state::AppState,
    store::{Store, new_id},
};

use super::load_context;

#[derive(Debug, Serialize)]
pub struct AttemptView {
    pub id: Id,
    pub exercise_id: Id,
    pub status: AttemptStatus,
    pub variant: ExerciseVariant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

impl AttemptView {
    fn new(attempt: &Attempt, variant: ExerciseVariant) -> Self {
        Self {
            id: attempt.id.clone(),
            exercise_id: attempt.exercise_id.clone(),
            status: attempt.status,
            variant,
            thread_id: attempt.thread_id.clone(),
        }
    }
}

/// Get-or-create the caller's attempt for an exercise.
///
/// For the explain variant the assistant thread is created before the
/// attempt row: a failed external call must never leave an attempt
/// referencing a thread that does not exist, and an attempt must never
/// reference a thread that was not created. The first assistant message is
/// dispatched through the scheduler after the commit, never inline.
pub async fn start_attempt(
    state: &AppState,
    user_id: &str,
    exercise_id: &str,
    now: DateTime<Utc>,
) -> Result<AttemptView, AppError> {
    // Read pass: validate access and bail out early if the attempt exists.
    let mut tx = state.store.begin().await?;
    let ctx = load_context(tx.as_mut(), user_id, exercise_id).await?;
    window::ensure_visible(&ctx.week, ctx.registration.role, now)?;

    let variant = assignment::variant_for(&ctx.exercise.control_group, ctx.registration.group.as_ref());
    if let Some(existing) = tx.find_attempt(user_id, exercise_id).await? {
        return Ok(AttemptView::new(&existing, variant));
    }
    drop(tx);

    // External call first, outside any transaction.
    let thread_id = match variant {
        ExerciseVariant::Explain => Some(
            state
                .assistant
                .create_thread(
                    user_id,
                    exercise_id,
                    ctx.exercise.assistant_instructions.as_deref(),
                )
                .await?,
        ),
        ExerciseVariant::Reading => None,
    };

    // Transactional creation.
    let mut tx = state.store.begin().await?;
    if let Some(existing) = tx.find_attempt(user_id, exercise_id).await? {
        // Lost a race with another request; the freshly created thread is
        // abandoned rather than the attempt duplicated.
        return Ok(AttemptView::new(&existing, variant));
    }

    let attempt = Attempt {
        id: new_id(),
        student_id: user_id.to_string(),
        exercise_id: exercise_id.to_string(),
        status: AttemptStatus::Exercise,
        thread_id: thread_id.clone(),
        created_at: now,
    };
    tx.insert_attempt(&attempt).await?;
    tx.append_log(&LogEntry {
        id: new_id(),
        event: LogEvent::AttemptStarted,
        attempt_id: attempt.id.clone(),
        student_id: attempt.student_id.clone(),
        exercise_id: attempt.exercise_id.clone(),
        questions: None,
        answers: None,
        correctness: None,
        created_at: now,
    })
    .await?;
    tx.commit().await?;

    if let Some(thread_id) = thread_id {
        state.scheduler.run_after(
            Duration::ZERO,
            Job::SendAssistantMessage {
                thread_id,
                text: format!(
                    "Let's get started: explain \"{}\" in your own words.",
                    ctx.exercise.title
                ),
            },
        );
    }

    Ok(AttemptView::new(&attempt, variant))
}

/// The `goToQuiz` transition.
///
/// Requires the caller to own the attempt, the week to still accept
/// submissions, and the exercise to actually have a quiz. Appends the
/// `quizStarted` audit entry carrying the presented order, since that order
/// is never stored anywhere else.
pub async fn go_to_quiz(
    state: &AppState,
    user_id: &str,
    attempt_id: &str,
    now: DateTime<Utc>,
) -> Result<AttemptView, AppError> {
    let mut tx = state.store.begin().await?;
    let mut attempt = tx
        .get_attempt(attempt_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))?;
    if attempt.student_id != user_id {
        return Err(AppError::OwnershipViolation(
            "This attempt belongs to another student".to_string(),
        ));
    }

    let ctx = load_context(tx.as_mut(), user_id, &attempt.exercise_id).await?;
    window::ensure_accepts_submissions(&ctx.week, ctx.requester(), now)?;

    let quiz = ctx
        .exercise
        .quiz
        .as_ref()
        .ok_or_else(|| AppError::NotFound("This exercise has no quiz".to_string()))?;

    attempt.start_quiz()?;
    tx.set_attempt_status(&attempt.id, AttemptStatus::Quiz).await?;

    let presented = presentation::presented_questions(
        quiz,
        &attempt.student_id,
        &attempt.exercise_id,
        ctx.registration.group.as_ref(),
    )?;
    tx.append_log(&LogEntry {
        id: new_id(),
        event: LogEvent::QuizStarted,
        attempt_id: attempt.id.clone(),
        student_id: attempt.student_id.clone(),
        exercise_id: attempt.exercise_id.clone(),
        questions: Some(presented),
        answers: None,
        correctness: None,
        created_at: now,
    })
    .await?;
    tx.commit().await?;

    let variant = assignment::variant_for(&ctx.exercise.control_group, ctx.registration.group.as_ref());
    Ok(AttemptView::new(&attempt, variant))
}

/// Read-only view of the caller's attempt for an exercise.
pub async fn get_attempt(
    state: &AppState,
    user_id: &str,
    exercise_id: &str,
    now: DateTime<Utc>,
) -> Result<Option<AttemptView>, AppError> {
    let mut tx = state.store.begin().await?;
    let ctx = load_context(tx.as_mut(), user_id, exercise_id).await?;
    window::ensure_visible(&ctx.week, ctx.registration.role, now)?;
    let variant = assignment::variant_for(&ctx.exercise.control_group, ctx.registration.group.as_ref());
    Ok(tx
        .find_attempt(user_id, exercise_id)
        .await?
        .map(|a| AttemptView::new(&a, variant)))
}
