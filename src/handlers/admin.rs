// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        attempt::SetAttemptStatusRequest,
        exercise::{CreateExerciseRequest, Exercise},
        registration::{Registration, UpsertRegistrationRequest},
        week::{CreateWeekRequest, Week},
    },
    state::AppState,
    store::{Store, new_id},
};

/// Creates a week (admin surface).
pub async fn create_week(
    State(state): State<AppState>,
    Json(payload): Json<CreateWeekRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::ValidationError(validation_errors.to_string()));
    }
    payload.validate_dates()?;

    let week = Week {
        id: new_id(),
        course_id: payload.course_id,
        title: payload.title,
        start_date: payload.start_date,
        end_date: payload.end_date,
        end_date_extra_time: payload.end_date_extra_time,
    };

    let mut tx = state.store.begin().await?;
    tx.insert_week(&week).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(week)))
}

/// Creates an exercise. Quiz configuration is validated here, at write
/// time: a quiz with zero batches or a choice question without a correct
/// answer never reaches the store.
pub async fn create_exercise(
    State(state): State<AppState>,
    Json(payload): Json<CreateExerciseRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::ValidationError(validation_errors.to_string()));
    }
    if let Some(quiz) = &payload.quiz {
        quiz.validate_config()?;
    }

    let mut tx = state.store.begin().await?;
    tx.get_week(&payload.week_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Week not found".to_string()))?;

    let exercise = Exercise {
        id: new_id(),
        week_id: payload.week_id,
        title: payload.title,
        content: payload.content,
        quiz: payload.quiz,
        control_group: payload.control_group.into(),
        assistant_instructions: payload.assistant_instructions,
        created_at: Utc::now(),
    };
    tx.insert_exercise(&exercise).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(exercise)))
}

/// Creates or replaces a (student, course) registration.
pub async fn upsert_registration(
    State(state): State<AppState>,
    Json(payload): Json<UpsertRegistrationRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::ValidationError(validation_errors.to_string()));
    }

    let registration = Registration {
        student_id: payload.student_id,
        course_id: payload.course_id,
        role: payload.role,
        group: payload.group,
    };

    let mut tx = state.store.begin().await?;
    tx.get_user(&registration.student_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    tx.upsert_registration(&registration).await?;
    tx.commit().await?;

    Ok(Json(registration))
}

#[derive(Debug, Deserialize)]
pub struct SetAccommodationRequest {
    pub has_accommodation: bool,
}

/// Grants or revokes a student's accommodation flag.
pub async fn set_accommodation(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<SetAccommodationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = state.store.begin().await?;
    let mut user = tx
        .get_user(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    user.has_accommodation = payload.has_accommodation;
    tx.update_user(&user).await?;
    tx.commit().await?;

    Ok(Json(json!({ "id": user.id, "has_accommodation": user.has_accommodation })))
}

/// Administrative attempt-status correction.
///
/// The one sanctioned exception to the forward-only rule: sets the status
/// directly, in either direction, and leaves no doubt in the audit trail
/// since regular transitions always come with a log entry and this does not.
pub async fn set_attempt_status(
    State(state): State<AppState>,
    Path(attempt_id): Path<String>,
    Json(payload): Json<SetAttemptStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = state.store.begin().await?;
    tx.get_attempt(&attempt_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))?;
    tx.set_attempt_status(&attempt_id, payload.status).await?;
    tx.commit().await?;

    Ok(Json(json!({ "id": attempt_id, "status": payload.status })))
}

/// Reads an attempt's append-only audit log. This is the durable record of
/// what each student actually saw.
pub async fn get_attempt_logs(
    State(state): State<AppState>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = state.store.begin().await?;
    let logs = tx.logs_for_attempt(&attempt_id).await?;
    Ok(Json(logs))
}
