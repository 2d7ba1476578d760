// src/service/mod.rs

//! Transactional operations.
//!
//! Each function here is one logical operation: it opens a single store
//! transaction, does all of its reads and writes through it, and commits
//! all-or-nothing. Handlers stay thin; the clock is always passed in.

pub mod attempt;
pub mod exercise;
pub mod quiz;

use crate::{
    engine::window::Requester,
    error::AppError,
    models::{
        exercise::Exercise, registration::GroupSlot, registration::Registration, user::User,
        week::Week,
    },
    store::StoreTx,
};

/// The caller-and-target facts shared by every operation: who is asking,
/// which exercise, which week, and the caller's enrollment in its course.
pub struct CourseContext {
    pub user: User,
    pub exercise: Exercise,
    pub week: Week,
    pub registration: Registration,
}

impl CourseContext {
    pub fn requester(&self) -> Requester {
        Requester {
            role: self.registration.role,
            has_accommodation: self.user.has_accommodation,
        }
    }
}

pub(crate) async fn load_context(
    tx: &mut dyn StoreTx,
    user_id: &str,
    exercise_id: &str,
) -> Result<CourseContext, AppError> {
    let user = tx
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown user".to_string()))?;
    let exercise = tx
        .get_exercise(exercise_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Exercise not found".to_string()))?;
    let week = tx
        .get_week(&exercise.week_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Week not found".to_string()))?;
    let registration = tx
        .get_registration(user_id, &week.course_id)
        .await?
        .ok_or_else(|| {
            AppError::NotEnrolled(format!("Not enrolled in course '{}'", week.course_id))
        })?;
    Ok(CourseContext {
        user,
        exercise,
        week,
        registration,
    })
}

/// Group slot of the student who owns an attempt. When staff act on another
/// student's attempt, the presentation must still be derived from the
/// owner's registration, not the caller's.
pub(crate) async fn owner_group(
    tx: &mut dyn StoreTx,
    ctx: &CourseContext,
    owner_id: &str,
) -> Result<Option<GroupSlot>, AppError> {
    if owner_id == ctx.user.id {
        return Ok(ctx.registration.group.clone());
    }
    Ok(tx
        .get_registration(owner_id, &ctx.week.course_id)
        .await?
        .and_then(|r| r.group))
}
