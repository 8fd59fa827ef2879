//! Runtime event stream payloads.

use crate::types::{HistoryId, SetId, WorkoutId};

/// Events emitted from the single-writer runtime loop after a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkoutEvent {
    /// A session started, or `start` confirmed one already running.
    Started {
        /// Workout id.
        id: WorkoutId,
    },
    /// A session completed and was snapshotted.
    Completed {
        /// Workout id.
        id: WorkoutId,
        /// Appended history row.
        history_id: HistoryId,
    },
    /// A session was abandoned.
    Reset {
        /// Workout id.
        id: WorkoutId,
    },
    /// A set was ticked off.
    SetCompleted {
        /// Set id.
        id: SetId,
    },
    /// Workout, exercise, or set structure changed.
    TemplateChanged {
        /// Affected workout id, when known.
        workout_id: Option<WorkoutId>,
    },
}
