// src/models/week.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Id;

/// A course week: the time window governing visibility and due-date gating
/// for every exercise it contains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Week {
    pub id: Id,
    /// Course offering key, e.g. "cs101-2026s". Registrations are scoped to
    /// the same key.
    pub course_id: String,
    pub title: String,
    /// Exercises become visible to students at this instant.
    pub start_date: DateTime<Utc>,
    /// Hard due date for students without an accommodation.
    pub end_date: DateTime<Utc>,
    /// Extended deadline for accommodated students; also the instant at
    /// which solutions become visible to everyone.
    pub end_date_extra_time: DateTime<Utc>,
}

/// DTO for creating a new week (admin surface).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateWeekRequest {
    #[validate(length(min = 1, max = 100))]
    pub course_id: String,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub end_date_extra_time: DateTime<Utc>,
}

impl CreateWeekRequest {
    /// The three instants must be ordered; equal endpoints would make the
    /// accommodation window empty or negative.
    pub fn validate_dates(&self) -> Result<(), crate::error::AppError> {
        if self.start_date >= self.end_date || self.end_date > self.end_date_extra_time {
            return Err(crate::error::AppError::ValidationError(
                "Week dates must satisfy startDate < endDate <= endDateExtraTime".to_string(),
            ));
        }
        Ok(())
    }
}
