//! Shared primitive IDs and workout-related enums.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::CoreError;

/// Store-assigned workout identifier.
pub type WorkoutId = i64;
/// Store-assigned exercise identifier.
pub type ExerciseId = i64;
/// Store-assigned set identifier.
pub type SetId = i64;
/// Store-assigned history snapshot identifier.
pub type HistoryId = i64;
/// Opaque owner key.
pub type UserId = String;

/// Persisted workout state. Completion is not a state: it folds straight back to `Draft`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkoutStatus {
    /// Reusable template, no session running.
    #[default]
    Draft,
    /// A session is running; `started_at` is set.
    InProgress,
}

impl WorkoutStatus {
    /// Text form used on the wire and in storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::InProgress => "IN_PROGRESS",
        }
    }
}

impl fmt::Display for WorkoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkoutStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(Self::Draft),
            "IN_PROGRESS" => Ok(Self::InProgress),
            other => Err(format!("unknown workout status: {other}")),
        }
    }
}

/// Parses a path identifier. Only positive integers are accepted.
pub fn parse_id(raw: &str) -> Result<i64, CoreError> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(CoreError::InvalidIdentifier(raw.to_string())),
    }
}
