//! Template editing that sits beside the lifecycle: workouts, exercises, sets,
//! and history reads. Each call is one gateway transaction.

use serde::Deserialize;
use tracing::info;

use crate::{
    clock::Clock,
    persist::{Gateway, GatewayTx},
    types::{ExerciseId, SetId, WorkoutId},
    workout::{
        Exercise, NewExercise, NewSet, NewWorkout, SetPatch, Workout, WorkoutHistory, WorkoutSet,
    },
};

use super::{
    error::{CoreError, CoreResult, Entity},
    lifecycle::LifecycleManager,
};

/// One entry of a reorder request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct OrderEntry {
    pub id: ExerciseId,
    pub order: u32,
}

/// Editable set fields. Completion is driven by the lifecycle, not edited directly.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SetEdit {
    pub reps: Option<u32>,
    pub weight: Option<f64>,
    pub notes: Option<String>,
}

impl<G: Gateway, C: Clock> LifecycleManager<G, C> {
    pub fn create_workout(&mut self, user_id: &str, name: &str, notes: Option<String>) -> CoreResult<Workout> {
        let user_id = non_empty(user_id, "userId")?;
        let name = non_empty(name, "name")?;
        let date = self.clock.now();

        let mut tx = self.gateway.begin()?;
        let workout = tx.create_workout(&NewWorkout {
            user_id,
            name,
            notes: notes.filter(|n| !n.trim().is_empty()),
            date,
        })?;
        tx.commit()?;

        info!(workout_id = workout.id, "workout created");
        Ok(workout)
    }

    pub fn get_workout(&mut self, id: WorkoutId) -> CoreResult<Workout> {
        let tx = self.gateway.begin()?;
        tx.get_workout(id)?
            .ok_or(CoreError::not_found(Entity::Workout, id))
    }

    pub fn list_workouts(&mut self, user_id: &str) -> CoreResult<Vec<Workout>> {
        let user_id = non_empty(user_id, "userId")?;
        let tx = self.gateway.begin()?;
        Ok(tx.list_workouts(&user_id)?)
    }

    pub fn history(&mut self, user_id: &str) -> CoreResult<Vec<WorkoutHistory>> {
        let user_id = non_empty(user_id, "userId")?;
        let tx = self.gateway.begin()?;
        Ok(tx.list_history(&user_id)?)
    }

    /// The workout's exercises in order, each with its sets.
    pub fn list_exercises(&mut self, workout_id: WorkoutId) -> CoreResult<Vec<Exercise>> {
        Ok(self.get_workout(workout_id)?.exercises)
    }

    pub fn get_exercise(&mut self, id: ExerciseId) -> CoreResult<Exercise> {
        let tx = self.gateway.begin()?;
        tx.get_exercise(id)?
            .ok_or(CoreError::not_found(Entity::Exercise, id))
    }

    /// Appends an exercise at the end of the workout.
    pub fn add_exercise(&mut self, workout_id: WorkoutId, name: &str) -> CoreResult<Exercise> {
        let name = non_empty(name, "name")?;

        let mut tx = self.gateway.begin()?;
        let workout = tx
            .get_workout(workout_id)?
            .ok_or(CoreError::not_found(Entity::Workout, workout_id))?;
        let exercise = tx.create_exercise(&NewExercise {
            workout_id,
            name,
            order: workout.exercises.len() as u32,
        })?;
        tx.commit()?;

        info!(workout_id, exercise_id = exercise.id, "exercise added");
        Ok(exercise)
    }

    /// Deletes an exercise with its sets and closes the gap in the ordering.
    pub fn remove_exercise(&mut self, id: ExerciseId) -> CoreResult<Workout> {
        let mut tx = self.gateway.begin()?;
        let exercise = tx
            .get_exercise(id)?
            .ok_or(CoreError::not_found(Entity::Exercise, id))?;
        tx.delete_exercise(id)?;

        let workout_id = exercise.workout_id;
        let remaining = tx
            .get_workout(workout_id)?
            .ok_or(CoreError::not_found(Entity::Workout, workout_id))?;
        for (pos, ex) in remaining.exercises.iter().enumerate() {
            if ex.order != pos as u32 {
                tx.set_exercise_order(ex.id, pos as u32)?;
            }
        }
        let workout = tx
            .get_workout(workout_id)?
            .ok_or(CoreError::not_found(Entity::Workout, workout_id))?;
        tx.commit()?;

        info!(workout_id, exercise_id = id, "exercise removed");
        Ok(workout)
    }

    /// Applies a client-side ordering. `entries` must name every exercise of the
    /// workout exactly once; the requested positions are normalized to `0..n`.
    pub fn reorder_exercises(&mut self, workout_id: WorkoutId, entries: &[OrderEntry]) -> CoreResult<Workout> {
        let mut tx = self.gateway.begin()?;
        let workout = tx
            .get_workout(workout_id)?
            .ok_or(CoreError::not_found(Entity::Workout, workout_id))?;

        let mut current: Vec<ExerciseId> = workout.exercises.iter().map(|e| e.id).collect();
        let mut requested: Vec<ExerciseId> = entries.iter().map(|e| e.id).collect();
        current.sort_unstable();
        requested.sort_unstable();
        if current != requested {
            return Err(CoreError::InvalidInput(format!(
                "reorder must list each of the workout's {} exercises exactly once",
                current.len()
            )));
        }

        let mut ordered = entries.to_vec();
        ordered.sort_by_key(|e| e.order);
        for (pos, entry) in ordered.iter().enumerate() {
            tx.set_exercise_order(entry.id, pos as u32)?;
        }
        let workout = tx
            .get_workout(workout_id)?
            .ok_or(CoreError::not_found(Entity::Workout, workout_id))?;
        tx.commit()?;

        info!(workout_id, exercises = ordered.len(), "exercises reordered");
        Ok(workout)
    }

    /// Appends an incomplete set at the end of the exercise.
    pub fn add_set(&mut self, exercise_id: ExerciseId, reps: u32, weight: Option<f64>, notes: Option<String>) -> CoreResult<WorkoutSet> {
        check_weight(weight)?;

        let mut tx = self.gateway.begin()?;
        let exercise = tx
            .get_exercise(exercise_id)?
            .ok_or(CoreError::not_found(Entity::Exercise, exercise_id))?;
        let set = tx.create_set(&NewSet {
            exercise_id,
            reps,
            weight,
            notes,
            order: exercise.sets.len() as u32,
        })?;
        tx.commit()?;

        Ok(set)
    }

    pub fn get_set(&mut self, id: SetId) -> CoreResult<WorkoutSet> {
        let tx = self.gateway.begin()?;
        tx.get_set(id)?.ok_or(CoreError::not_found(Entity::Set, id))
    }

    pub fn update_set(&mut self, id: SetId, edit: SetEdit) -> CoreResult<WorkoutSet> {
        check_weight(edit.weight)?;

        let patch = SetPatch {
            reps: edit.reps,
            weight: edit.weight.map(Some),
            notes: edit.notes.map(Some),
            ..SetPatch::default()
        };

        let mut tx = self.gateway.begin()?;
        if tx.get_set(id)?.is_none() {
            return Err(CoreError::not_found(Entity::Set, id));
        }
        let set = tx.update_set(id, &patch)?;
        tx.commit()?;
        Ok(set)
    }

    pub fn remove_set(&mut self, id: SetId) -> CoreResult<()> {
        let mut tx = self.gateway.begin()?;
        if tx.get_set(id)?.is_none() {
            return Err(CoreError::not_found(Entity::Set, id));
        }
        tx.delete_set(id)?;
        tx.commit()?;
        Ok(())
    }

    /// Ticks a set off during a session.
    pub fn complete_set(&mut self, id: SetId) -> CoreResult<WorkoutSet> {
        let now = self.clock.now();
        let mut tx = self.gateway.begin()?;
        if tx.get_set(id)?.is_none() {
            return Err(CoreError::not_found(Entity::Set, id));
        }
        let set = tx.update_set(id, &SetPatch::completed(now))?;
        tx.commit()?;
        Ok(set)
    }
}

fn non_empty(value: &str, field: &str) -> CoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidInput(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn check_weight(weight: Option<f64>) -> CoreResult<()> {
    match weight {
        Some(w) if !w.is_finite() || w < 0.0 => Err(CoreError::InvalidInput(format!(
            "weight must be a non-negative number, got {w}"
        ))),
        _ => Ok(()),
    }
}
