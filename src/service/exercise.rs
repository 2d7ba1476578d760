// src/service/exercise.rs

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    engine::{assignment, window},
    error::AppError,
    models::{Id, exercise::ExerciseVariant, week::Week},
    state::AppState,
    store::Store,
};

use super::load_context;

#[derive(Debug, Serialize)]
pub struct ExerciseSummary {
    pub id: Id,
    pub title: String,
    pub has_quiz: bool,
    pub completed: bool,
}

#[derive(Debug, Serialize)]
pub struct WeekExercisesView {
    pub week: Week,
    pub solution_shown: bool,
    pub exercises: Vec<ExerciseSummary>,
}

/// List a week's exercises for the caller, with completion markers.
pub async fn list_week_exercises(
    state: &AppState,
    user_id: &str,
    week_id: &str,
    now: DateTime<Utc>,
) -> Result<WeekExercisesView, AppError> {
    let mut tx = state.store.begin().await?;
    let week = tx
        .get_week(week_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Week not found".to_string()))?;
    let registration = tx
        .get_registration(user_id, &week.course_id)
        .await?
        .ok_or_else(|| {
            AppError::NotEnrolled(format!("Not enrolled in course '{}'", week.course_id))
        })?;
    window::ensure_visible(&week, registration.role, now)?;

    let completed = tx.completed_exercises(user_id).await?;
    let exercises = tx
        .list_exercises_by_week(week_id)
        .await?
        .into_iter()
        .map(|e| ExerciseSummary {
            completed: completed.contains(&e.id),
            has_quiz: e.quiz.is_some(),
            id: e.id,
            title: e.title,
        })
        .collect();

    Ok(WeekExercisesView {
        solution_shown: window::solution_shown(&week, now),
        week,
        exercises,
    })
}

#[derive(Debug, Serialize)]
pub struct ExerciseView {
    pub id: Id,
    pub week_id: Id,
    pub title: String,
    pub variant: ExerciseVariant,
    /// Reading content. Withheld from explain-variant students until
    /// solutions are shown; staff always see it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub has_quiz: bool,
    pub solution_shown: bool,
}

/// A single exercise as the caller may see it right now.
pub async fn get_exercise(
    state: &AppState,
    user_id: &str,
    exercise_id: &str,
    now: DateTime<Utc>,
) -> Result<ExerciseView, AppError> {
    let mut tx = state.store.begin().await?;
    let ctx = load_context(tx.as_mut(), user_id, exercise_id).await?;
    window::ensure_visible(&ctx.week, ctx.registration.role, now)?;

    let variant =
        assignment::variant_for(&ctx.exercise.control_group, ctx.registration.group.as_ref());
    let reveal = window::solution_shown(&ctx.week, now);
    let content_visible =
        variant == ExerciseVariant::Reading || reveal || ctx.registration.role.is_staff();

    Ok(ExerciseView {
        id: ctx.exercise.id,
        week_id: ctx.exercise.week_id,
        title: ctx.exercise.title,
        variant,
        content: content_visible.then_some(ctx.exercise.content),
        has_quiz: ctx.exercise.quiz.is_some(),
        solution_shown: reveal,
    })
}
