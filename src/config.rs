// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Seconds a student must wait after an incorrect quiz submission before the
/// client offers the retry button. Surfaced as `can_retry_at` in the quiz
/// view; the grading engine itself accepts resubmissions.
pub const QUIZ_RETRY_COOLDOWN_SECONDS: i64 = 60;

/// Separator used when joining identifiers into a seed key. Changing this
/// invalidates every outstanding quiz presentation, so it is fixed forever.
pub const SEED_KEY_SEPARATOR: &str = "/";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let admin_username = env::var("ADMIN_USERNAME").ok();
        let admin_password = env::var("ADMIN_PASSWORD").ok();

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            admin_username,
            admin_password,
        }
    }
}
