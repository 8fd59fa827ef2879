pub mod memory;
pub mod sqlite;

use thiserror::Error;

use crate::{
    types::{ExerciseId, SetId, WorkoutId},
    workout::{
        Exercise, NewExercise, NewSet, NewWorkout, NewWorkoutHistory, SetPatch, Workout,
        WorkoutHistory, WorkoutPatch, WorkoutSet,
    },
};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("row not found")]
    RowNotFound,

    #[error("{0}")]
    Message(String),
}

pub type PersistResult<T> = Result<T, PersistError>;

/// A transactional store for workouts and their descendants.
pub trait Gateway: Send + 'static {
    type Tx<'a>: GatewayTx
    where
        Self: 'a;

    /// Opens a transaction. Writes become visible only on [`GatewayTx::commit`];
    /// dropping the transaction discards them.
    fn begin(&mut self) -> PersistResult<Self::Tx<'_>>;
}

/// Reads and writes available inside one gateway transaction.
///
/// Reads observe the transaction's own uncommitted writes. Updates and deletes
/// targeting a missing row fail with [`PersistError::RowNotFound`].
pub trait GatewayTx {
    /// Loads a workout with exercises and sets, each ordered by `order`.
    fn get_workout(&self, id: WorkoutId) -> PersistResult<Option<Workout>>;
    /// Loads a user's workouts, newest first.
    fn list_workouts(&self, user_id: &str) -> PersistResult<Vec<Workout>>;
    fn create_workout(&mut self, draft: &NewWorkout) -> PersistResult<Workout>;
    fn update_workout(&mut self, id: WorkoutId, patch: &WorkoutPatch) -> PersistResult<()>;
    /// Applies `patch` to every set transitively under the workout and returns how many matched.
    fn update_sets_for_workout(&mut self, id: WorkoutId, patch: &SetPatch) -> PersistResult<usize>;

    fn create_workout_history(&mut self, record: &NewWorkoutHistory) -> PersistResult<WorkoutHistory>;
    /// Loads a user's history, newest first.
    fn list_history(&self, user_id: &str) -> PersistResult<Vec<WorkoutHistory>>;

    fn get_exercise(&self, id: ExerciseId) -> PersistResult<Option<Exercise>>;
    fn create_exercise(&mut self, draft: &NewExercise) -> PersistResult<Exercise>;
    /// Deletes the exercise and all of its sets.
    fn delete_exercise(&mut self, id: ExerciseId) -> PersistResult<()>;
    fn set_exercise_order(&mut self, id: ExerciseId, order: u32) -> PersistResult<()>;

    fn get_set(&self, id: SetId) -> PersistResult<Option<WorkoutSet>>;
    fn create_set(&mut self, draft: &NewSet) -> PersistResult<WorkoutSet>;
    fn update_set(&mut self, id: SetId, patch: &SetPatch) -> PersistResult<WorkoutSet>;
    fn delete_set(&mut self, id: SetId) -> PersistResult<()>;

    fn commit(self) -> PersistResult<()>
    where
        Self: Sized;
}
