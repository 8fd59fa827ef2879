//! In-memory gateway. Transactions stage onto a private copy and swap it in on commit.

use hashbrown::{HashMap, HashSet};

use crate::{
    types::{ExerciseId, HistoryId, SetId, WorkoutId, WorkoutStatus},
    workout::{
        Exercise, NewExercise, NewSet, NewWorkout, NewWorkoutHistory, SetPatch, Workout,
        WorkoutHistory, WorkoutPatch, WorkoutSet,
    },
};

use super::{Gateway, GatewayTx, PersistError, PersistResult};

// Rows are stored flat; `exercises` and `sets` vectors stay empty until hydrated.
#[derive(Debug, Clone)]
struct MemoryState {
    workouts: HashMap<WorkoutId, Workout>,
    exercises: HashMap<ExerciseId, Exercise>,
    sets: HashMap<SetId, WorkoutSet>,
    history: Vec<WorkoutHistory>,
    next_workout_id: WorkoutId,
    next_exercise_id: ExerciseId,
    next_set_id: SetId,
    next_history_id: HistoryId,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            workouts: HashMap::new(),
            exercises: HashMap::new(),
            sets: HashMap::new(),
            history: Vec::new(),
            next_workout_id: 1,
            next_exercise_id: 1,
            next_set_id: 1,
            next_history_id: 1,
        }
    }
}

impl MemoryState {
    fn hydrate(&self, workout: &Workout) -> Workout {
        let mut exercises: Vec<Exercise> = self
            .exercises
            .values()
            .filter(|e| e.workout_id == workout.id)
            .map(|e| self.hydrate_exercise(e))
            .collect();
        exercises.sort_by_key(|e| (e.order, e.id));

        Workout {
            exercises,
            ..workout.clone()
        }
    }

    fn hydrate_exercise(&self, exercise: &Exercise) -> Exercise {
        let mut sets: Vec<WorkoutSet> = self
            .sets
            .values()
            .filter(|s| s.exercise_id == exercise.id)
            .cloned()
            .collect();
        sets.sort_by_key(|s| (s.order, s.id));

        Exercise {
            sets,
            ..exercise.clone()
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: MemoryState,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Gateway for MemoryGateway {
    type Tx<'a> = MemoryTx<'a>;

    fn begin(&mut self) -> PersistResult<MemoryTx<'_>> {
        let staged = self.state.clone();
        Ok(MemoryTx {
            committed: &mut self.state,
            staged,
        })
    }
}

pub struct MemoryTx<'a> {
    committed: &'a mut MemoryState,
    staged: MemoryState,
}

impl GatewayTx for MemoryTx<'_> {
    fn get_workout(&self, id: WorkoutId) -> PersistResult<Option<Workout>> {
        Ok(self.staged.workouts.get(&id).map(|w| self.staged.hydrate(w)))
    }

    fn list_workouts(&self, user_id: &str) -> PersistResult<Vec<Workout>> {
        let mut out: Vec<Workout> = self
            .staged
            .workouts
            .values()
            .filter(|w| w.user_id == user_id)
            .map(|w| self.staged.hydrate(w))
            .collect();
        out.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(out)
    }

    fn create_workout(&mut self, draft: &NewWorkout) -> PersistResult<Workout> {
        let id = self.staged.next_workout_id;
        self.staged.next_workout_id += 1;

        let workout = Workout {
            id,
            user_id: draft.user_id.clone(),
            name: draft.name.clone(),
            notes: draft.notes.clone(),
            date: draft.date,
            status: WorkoutStatus::Draft,
            started_at: None,
            completed_at: None,
            duration: None,
            exercises: Vec::new(),
        };
        self.staged.workouts.insert(id, workout.clone());
        Ok(workout)
    }

    fn update_workout(&mut self, id: WorkoutId, patch: &WorkoutPatch) -> PersistResult<()> {
        let workout = self
            .staged
            .workouts
            .get_mut(&id)
            .ok_or(PersistError::RowNotFound)?;
        patch.apply_to(workout);
        Ok(())
    }

    fn update_sets_for_workout(&mut self, id: WorkoutId, patch: &SetPatch) -> PersistResult<usize> {
        let owned: HashSet<ExerciseId> = self
            .staged
            .exercises
            .values()
            .filter(|e| e.workout_id == id)
            .map(|e| e.id)
            .collect();

        let mut count = 0;
        for set in self.staged.sets.values_mut() {
            if owned.contains(&set.exercise_id) {
                patch.apply_to(set);
                count += 1;
            }
        }
        Ok(count)
    }

    fn create_workout_history(&mut self, record: &NewWorkoutHistory) -> PersistResult<WorkoutHistory> {
        let id = self.staged.next_history_id;
        self.staged.next_history_id += 1;

        let history = WorkoutHistory {
            id,
            workout_id: record.workout_id,
            name: record.name.clone(),
            user_id: record.user_id.clone(),
            duration: record.duration,
            exercise_count: record.exercise_count,
            total_sets: record.total_sets,
            completed_sets: record.completed_sets,
            notes: record.notes.clone(),
            completed_at: record.completed_at,
        };
        self.staged.history.push(history.clone());
        Ok(history)
    }

    fn list_history(&self, user_id: &str) -> PersistResult<Vec<WorkoutHistory>> {
        let mut out: Vec<WorkoutHistory> = self
            .staged
            .history
            .iter()
            .filter(|h| h.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.completed_at.cmp(&a.completed_at).then(b.id.cmp(&a.id)));
        Ok(out)
    }

    fn get_exercise(&self, id: ExerciseId) -> PersistResult<Option<Exercise>> {
        Ok(self
            .staged
            .exercises
            .get(&id)
            .map(|e| self.staged.hydrate_exercise(e)))
    }

    fn create_exercise(&mut self, draft: &NewExercise) -> PersistResult<Exercise> {
        if !self.staged.workouts.contains_key(&draft.workout_id) {
            return Err(PersistError::RowNotFound);
        }
        let id = self.staged.next_exercise_id;
        self.staged.next_exercise_id += 1;

        let exercise = Exercise {
            id,
            workout_id: draft.workout_id,
            name: draft.name.clone(),
            order: draft.order,
            sets: Vec::new(),
        };
        self.staged.exercises.insert(id, exercise.clone());
        Ok(exercise)
    }

    fn delete_exercise(&mut self, id: ExerciseId) -> PersistResult<()> {
        self.staged
            .exercises
            .remove(&id)
            .ok_or(PersistError::RowNotFound)?;
        self.staged.sets.retain(|_, s| s.exercise_id != id);
        Ok(())
    }

    fn set_exercise_order(&mut self, id: ExerciseId, order: u32) -> PersistResult<()> {
        let exercise = self
            .staged
            .exercises
            .get_mut(&id)
            .ok_or(PersistError::RowNotFound)?;
        exercise.order = order;
        Ok(())
    }

    fn get_set(&self, id: SetId) -> PersistResult<Option<WorkoutSet>> {
        Ok(self.staged.sets.get(&id).cloned())
    }

    fn create_set(&mut self, draft: &NewSet) -> PersistResult<WorkoutSet> {
        if !self.staged.exercises.contains_key(&draft.exercise_id) {
            return Err(PersistError::RowNotFound);
        }
        let id = self.staged.next_set_id;
        self.staged.next_set_id += 1;

        let set = WorkoutSet {
            id,
            exercise_id: draft.exercise_id,
            reps: draft.reps,
            weight: draft.weight,
            notes: draft.notes.clone(),
            order: draft.order,
            completed: false,
            completed_at: None,
        };
        self.staged.sets.insert(id, set.clone());
        Ok(set)
    }

    fn update_set(&mut self, id: SetId, patch: &SetPatch) -> PersistResult<WorkoutSet> {
        let set = self
            .staged
            .sets
            .get_mut(&id)
            .ok_or(PersistError::RowNotFound)?;
        patch.apply_to(set);
        Ok(set.clone())
    }

    fn delete_set(&mut self, id: SetId) -> PersistResult<()> {
        self.staged
            .sets
            .remove(&id)
            .map(|_| ())
            .ok_or(PersistError::RowNotFound)
    }

    fn commit(self) -> PersistResult<()> {
        *self.committed = self.staged;
        Ok(())
    }
}
