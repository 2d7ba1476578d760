// src/models/registration.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Id;

/// Per-course role. `Ta` and `Admin` bypass the not-yet-open gate and may
/// act on other students' attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Ta,
    Admin,
}

impl Role {
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Ta | Role::Admin)
    }
}

/// Stable cohort slot used for capacity-balanced batch selection: the
/// student's position inside a named group of known size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSlot {
    pub name: String,
    pub position: usize,
    pub size: usize,
}

impl GroupSlot {
    /// A slot missing coherent position/size fields falls back to the
    /// per-student seeded batch choice.
    pub fn is_valid(&self) -> bool {
        self.size > 0 && self.position < self.size
    }
}

/// (student, course) enrollment record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub student_id: Id,
    pub course_id: String,
    pub role: Role,
    pub group: Option<GroupSlot>,
}

/// DTO for creating or replacing a registration (admin surface).
#[derive(Debug, Deserialize, Validate)]
pub struct UpsertRegistrationRequest {
    pub student_id: Id,
    #[validate(length(min = 1, max = 100))]
    pub course_id: String,
    pub role: Role,
    pub group: Option<GroupSlot>,
}
