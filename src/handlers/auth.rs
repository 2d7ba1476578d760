// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{CreateUserRequest, LoginRequest, User},
    state::AppState,
    store::{Store, new_id},
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::ValidationError(validation_errors.to_string()));
    }

    let user = User {
        id: new_id(),
        username: payload.username,
        password: hash_password(&payload.password)?,
        role: "student".to_string(),
        has_accommodation: false,
        created_at: Utc::now(),
    };

    let mut tx = state.store.begin().await?;
    tx.insert_user(&user).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and returns a JWT token.
///
/// Verifies the username and password against the store.
/// If valid, signs a JWT token with the user's ID and role.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::ValidationError(validation_errors.to_string()));
    }

    let mut tx = state.store.begin().await?;
    let user = tx
        .get_user_by_username(&payload.username)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    let is_valid = verify_password(&payload.password, &user.password)?;

    if !is_valid {
        return Err(AppError::Unauthorized("Invalid password".to_string()));
    }

    let token = sign_jwt(
        &user.id,
        &user.role,
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "user_id": user.id,
    })))
}
