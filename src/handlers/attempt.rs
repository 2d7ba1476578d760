// src/handlers/attempt.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use crate::{error::AppError, service, state::AppState, utils::jwt::Claims};

/// Get-or-create the caller's attempt for an exercise.
pub async fn start_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(exercise_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let view =
        service::attempt::start_attempt(&state, &claims.sub, &exercise_id, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Returns the caller's attempt for an exercise, if any.
pub async fn get_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(exercise_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let view = service::attempt::get_attempt(&state, &claims.sub, &exercise_id, Utc::now()).await?;
    match view {
        Some(view) => Ok(Json(view).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// The `goToQuiz` transition for an attempt the caller owns.
pub async fn go_to_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let view = service::attempt::go_to_quiz(&state, &claims.sub, &attempt_id, Utc::now()).await?;
    Ok(Json(view))
}
