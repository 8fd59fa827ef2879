//! Workout domain records, drafts, and patch types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ExerciseId, HistoryId, SetId, UserId, WorkoutId, WorkoutStatus};

/// One logged set inside an exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSet {
    /// Stable set identifier.
    pub id: SetId,
    /// Owning exercise.
    pub exercise_id: ExerciseId,
    /// Repetitions performed or planned.
    pub reps: u32,
    /// Load, when tracked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Zero-based position within the exercise.
    pub order: u32,
    /// Whether the set was ticked off in the running session.
    pub completed: bool,
    /// When the set was ticked off. Unset whenever `completed` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// An exercise with its ordered sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    /// Stable exercise identifier.
    pub id: ExerciseId,
    /// Owning workout.
    pub workout_id: WorkoutId,
    /// Display name, also the catalog lookup key.
    pub name: String,
    /// Zero-based position within the workout.
    pub order: u32,
    /// Sets ordered by `order`.
    #[serde(default)]
    pub sets: Vec<WorkoutSet>,
}

/// A reusable workout template plus its current session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    /// Stable workout identifier.
    pub id: WorkoutId,
    /// Owning user.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Creation timestamp.
    pub date: DateTime<Utc>,
    /// Session state.
    pub status: WorkoutStatus,
    /// Session start; set exactly while `status` is `InProgress`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Unused at rest, completion always resets it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Unused at rest, completion always resets it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// Exercises ordered by `order`.
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

impl Workout {
    /// Counts exercises, sets, and completed sets as they stand now.
    pub fn set_tally(&self) -> SetTally {
        let mut tally = SetTally {
            exercise_count: self.exercises.len() as u32,
            ..SetTally::default()
        };
        for set in self.exercises.iter().flat_map(|e| e.sets.iter()) {
            tally.total_sets += 1;
            if set.completed {
                tally.completed_sets += 1;
            }
        }
        tally
    }

    /// Iterates every set under this workout.
    pub fn sets(&self) -> impl Iterator<Item = &WorkoutSet> {
        self.exercises.iter().flat_map(|e| e.sets.iter())
    }
}

/// Aggregate counts captured before a completion resets the sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTally {
    /// Number of exercises.
    pub exercise_count: u32,
    /// Number of sets across all exercises.
    pub total_sets: u32,
    /// Number of sets with `completed = true`.
    pub completed_sets: u32,
}

/// Immutable snapshot of one completed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutHistory {
    /// Stable snapshot identifier.
    pub id: HistoryId,
    /// Source workout. A reference only: the workout keeps living and changing.
    pub workout_id: WorkoutId,
    /// Workout name at snapshot time.
    pub name: String,
    /// Owning user.
    pub user_id: UserId,
    /// Session length in seconds.
    pub duration: u64,
    /// Exercise count at snapshot time.
    pub exercise_count: u32,
    /// Set count at snapshot time.
    pub total_sets: u32,
    /// Completed set count at snapshot time.
    pub completed_sets: u32,
    /// Workout notes at snapshot time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Snapshot creation time.
    pub completed_at: DateTime<Utc>,
}

/// Insert payload for a new [`Workout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkout {
    pub user_id: UserId,
    pub name: String,
    pub notes: Option<String>,
    pub date: DateTime<Utc>,
}

/// Insert payload for a new [`Exercise`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExercise {
    pub workout_id: WorkoutId,
    pub name: String,
    pub order: u32,
}

/// Insert payload for a new [`WorkoutSet`]. Sets are always created incomplete.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSet {
    pub exercise_id: ExerciseId,
    pub reps: u32,
    pub weight: Option<f64>,
    pub notes: Option<String>,
    pub order: u32,
}

/// Insert payload for a new [`WorkoutHistory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkoutHistory {
    pub workout_id: WorkoutId,
    pub name: String,
    pub user_id: UserId,
    pub duration: u64,
    pub exercise_count: u32,
    pub total_sets: u32,
    pub completed_sets: u32,
    pub notes: Option<String>,
    pub completed_at: DateTime<Utc>,
}

/// Sparse workout update. For nullable columns `Some(None)` clears the value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkoutPatch {
    pub status: Option<WorkoutStatus>,
    pub started_at: Option<Option<DateTime<Utc>>>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub duration: Option<Option<u64>>,
}

impl WorkoutPatch {
    /// Moves a workout into a running session stamped at `now`.
    pub fn started(now: DateTime<Utc>) -> Self {
        Self {
            status: Some(WorkoutStatus::InProgress),
            started_at: Some(Some(now)),
            ..Self::default()
        }
    }

    /// Returns a workout to a clean, reusable draft.
    pub fn draft() -> Self {
        Self {
            status: Some(WorkoutStatus::Draft),
            started_at: Some(None),
            completed_at: Some(None),
            duration: Some(None),
        }
    }

    pub fn apply_to(&self, workout: &mut Workout) {
        if let Some(v) = self.status {
            workout.status = v;
        }
        if let Some(v) = self.started_at {
            workout.started_at = v;
        }
        if let Some(v) = self.completed_at {
            workout.completed_at = v;
        }
        if let Some(v) = self.duration {
            workout.duration = v;
        }
    }
}

/// Sparse set update. For nullable columns `Some(None)` clears the value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetPatch {
    pub reps: Option<u32>,
    pub weight: Option<Option<f64>>,
    pub notes: Option<Option<String>>,
    pub completed: Option<bool>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

impl SetPatch {
    /// Un-ticks a set.
    pub fn cleared() -> Self {
        Self {
            completed: Some(false),
            completed_at: Some(None),
            ..Self::default()
        }
    }

    /// Ticks a set off at `now`.
    pub fn completed(now: DateTime<Utc>) -> Self {
        Self {
            completed: Some(true),
            completed_at: Some(Some(now)),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, set: &mut WorkoutSet) {
        if let Some(v) = self.reps {
            set.reps = v;
        }
        if let Some(v) = self.weight {
            set.weight = v;
        }
        if let Some(v) = &self.notes {
            set.notes = v.clone();
        }
        if let Some(v) = self.completed {
            set.completed = v;
        }
        if let Some(v) = self.completed_at {
            set.completed_at = v;
        }
    }
}
