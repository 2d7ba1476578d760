// src/models/exercise.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Id;
use super::quiz::Quiz;

/// Which experiment cohort sees the reading variant of an exercise.
///
/// Stored as a plain string: the keywords `all` / `none`, or the name of a
/// registration group for a named split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ControlGroupPolicy {
    /// Every student gets the reading variant.
    All,
    /// Every student gets the explain (chat) variant.
    None,
    /// Students whose registration group matches the name get the reading
    /// variant; everyone else gets the explain variant.
    Split(String),
}

impl From<String> for ControlGroupPolicy {
    fn from(value: String) -> Self {
        match value.as_str() {
            "all" => ControlGroupPolicy::All,
            "none" => ControlGroupPolicy::None,
            _ => ControlGroupPolicy::Split(value),
        }
    }
}

impl From<ControlGroupPolicy> for String {
    fn from(value: ControlGroupPolicy) -> Self {
        match value {
            ControlGroupPolicy::All => "all".to_string(),
            ControlGroupPolicy::None => "none".to_string(),
            ControlGroupPolicy::Split(name) => name,
        }
    }
}

/// The exercise variant a student is assigned for the experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExerciseVariant {
    /// Plain reading material plus the quiz.
    Reading,
    /// Chat-driven variant: the student explains the material to an
    /// assistant before the quiz unlocks.
    Explain,
}

/// An exercise inside a week. Immutable once published except through the
/// admin surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub id: Id,
    pub week_id: Id,
    pub title: String,
    /// Free-text reading content shown for the reading variant (and revealed
    /// to everyone once solutions are shown).
    pub content: String,
    pub quiz: Option<Quiz>,
    pub control_group: ControlGroupPolicy,
    /// Instructions handed to the assistant when an explain-variant thread
    /// is created.
    pub assistant_instructions: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a new exercise (admin surface).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateExerciseRequest {
    pub week_id: Id,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 100_000))]
    pub content: String,
    pub quiz: Option<Quiz>,
    #[serde(default = "default_control_group")]
    pub control_group: String,
    pub assistant_instructions: Option<String>,
}

fn default_control_group() -> String {
    "all".to_string()
}
