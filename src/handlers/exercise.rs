// src/handlers/exercise.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;

use crate::{error::AppError, service, state::AppState, utils::jwt::Claims};

/// Lists a week's exercises with completion markers for the caller.
pub async fn list_week_exercises(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(week_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let view =
        service::exercise::list_week_exercises(&state, &claims.sub, &week_id, Utc::now()).await?;
    Ok(Json(view))
}

/// Retrieves a single exercise, gated by the week's access window.
pub async fn get_exercise(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(exercise_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let view = service::exercise::get_exercise(&state, &claims.sub, &exercise_id, Utc::now()).await?;
    Ok(Json(view))
}
