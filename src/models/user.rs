// src/models/user.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Id;

/// Platform account. Course-level roles live on `Registration`; the `role`
/// field here only gates the site-wide admin surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Id,

    /// Unique username.
    pub username: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip_serializing, default)]
    pub password: String,

    /// Account role: 'student' or 'admin'.
    pub role: String,

    /// Grants extended access past the normal due date, up to the week's
    /// `end_date_extra_time`.
    pub has_accommodation: bool,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username length must be between 3 and 50 characters."
    ))]
    pub username: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}
