// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;

use crate::{
    error::AppError, models::submission::SubmitQuizRequest, service, state::AppState,
    utils::jwt::Claims,
};

/// Renders the quiz for an attempt: presented questions (correctness
/// stripped until solutions are shown), cooldown expiry, and the latest
/// submission for pre-fill.
pub async fn get_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let view = service::quiz::render_quiz(&state, &claims.sub, &attempt_id, Utc::now()).await?;
    Ok(Json(view))
}

/// Grades a submitted answer vector.
pub async fn submit_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<String>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = service::quiz::submit_quiz(
        &state,
        &claims.sub,
        &attempt_id,
        payload.answers,
        Utc::now(),
    )
    .await?;
    Ok(Json(outcome))
}
