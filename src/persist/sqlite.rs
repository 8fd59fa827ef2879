//! SQLite-backed persistence gateway.

use std::path::Path;

use hashbrown::HashMap;
use rusqlite::{
    Connection, OptionalExtension, Row, ToSql, Transaction, TransactionBehavior, params,
};

use crate::{
    types::{ExerciseId, SetId, WorkoutId, WorkoutStatus},
    workout::{
        Exercise, NewExercise, NewSet, NewWorkout, NewWorkoutHistory, SetPatch, Workout,
        WorkoutHistory, WorkoutPatch, WorkoutSet,
    },
};

use super::{Gateway, GatewayTx, PersistError, PersistResult};

const WORKOUT_COLUMNS: &str =
    "id, user_id, name, notes, date, status, started_at, completed_at, duration";
const EXERCISE_COLUMNS: &str = "id, workout_id, name, sort_order";
const SET_COLUMNS: &str =
    "s.id, s.exercise_id, s.reps, s.weight, s.notes, s.sort_order, s.completed, s.completed_at";
const HISTORY_COLUMNS: &str = "id, workout_id, user_id, name, duration, exercise_count, \
     total_sets, completed_sets, notes, completed_at";

/// SQLite implementation of [`crate::persist::Gateway`].
pub struct SqliteGateway {
    conn: Connection,
}

impl SqliteGateway {
    /// Opens or creates a database at `path`.
    ///
    /// Enables WAL mode, sets `synchronous=NORMAL`, and turns on foreign keys.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> PersistResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> PersistResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn })
    }

    /// Raw connection, for maintenance and tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Gateway for SqliteGateway {
    type Tx<'a> = SqliteTx<'a>;

    fn begin(&mut self) -> PersistResult<SqliteTx<'_>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(SqliteTx { tx })
    }
}

/// An open SQLite transaction. Rolls back on drop unless committed.
pub struct SqliteTx<'a> {
    tx: Transaction<'a>,
}

impl SqliteTx<'_> {
    fn exercises_of(&self, workout_id: WorkoutId) -> PersistResult<Vec<Exercise>> {
        let mut stmt = self.tx.prepare(&format!(
            "SELECT {EXERCISE_COLUMNS} FROM exercises WHERE workout_id = ?1 ORDER BY sort_order, id"
        ))?;
        let rows = stmt.query_map(params![workout_id], exercise_from_row)?;
        let mut exercises = Vec::new();
        for row in rows {
            exercises.push(row?);
        }

        let mut stmt = self.tx.prepare(&format!(
            "SELECT {SET_COLUMNS} FROM sets s JOIN exercises e ON e.id = s.exercise_id \
             WHERE e.workout_id = ?1 ORDER BY s.sort_order, s.id"
        ))?;
        let rows = stmt.query_map(params![workout_id], set_from_row)?;
        let mut by_exercise: HashMap<ExerciseId, Vec<WorkoutSet>> = HashMap::new();
        for row in rows {
            let set = row?;
            by_exercise.entry(set.exercise_id).or_default().push(set);
        }

        for exercise in &mut exercises {
            exercise.sets = by_exercise.remove(&exercise.id).unwrap_or_default();
        }
        Ok(exercises)
    }

    fn sets_of(&self, exercise_id: ExerciseId) -> PersistResult<Vec<WorkoutSet>> {
        let mut stmt = self.tx.prepare(&format!(
            "SELECT {SET_COLUMNS} FROM sets s WHERE s.exercise_id = ?1 ORDER BY s.sort_order, s.id"
        ))?;
        let rows = stmt.query_map(params![exercise_id], set_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

impl GatewayTx for SqliteTx<'_> {
    fn get_workout(&self, id: WorkoutId) -> PersistResult<Option<Workout>> {
        let workout = self
            .tx
            .query_row(
                &format!("SELECT {WORKOUT_COLUMNS} FROM workouts WHERE id = ?1"),
                params![id],
                workout_from_row,
            )
            .optional()?;

        let Some(mut workout) = workout else {
            return Ok(None);
        };
        workout.exercises = self.exercises_of(id)?;
        Ok(Some(workout))
    }

    fn list_workouts(&self, user_id: &str) -> PersistResult<Vec<Workout>> {
        let mut stmt = self.tx.prepare(&format!(
            "SELECT {WORKOUT_COLUMNS} FROM workouts WHERE user_id = ?1 ORDER BY date DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![user_id], workout_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            let mut workout = row?;
            workout.exercises = self.exercises_of(workout.id)?;
            out.push(workout);
        }
        Ok(out)
    }

    fn create_workout(&mut self, draft: &NewWorkout) -> PersistResult<Workout> {
        self.tx.execute(
            "INSERT INTO workouts(user_id, name, notes, date, status) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                draft.user_id,
                draft.name,
                draft.notes,
                draft.date,
                WorkoutStatus::Draft.as_str(),
            ],
        )?;
        let id = self.tx.last_insert_rowid();
        self.get_workout(id)?.ok_or(PersistError::RowNotFound)
    }

    fn update_workout(&mut self, id: WorkoutId, patch: &WorkoutPatch) -> PersistResult<()> {
        let mut assignments = Assignments::default();
        if let Some(v) = patch.status {
            assignments.set("status", v.as_str());
        }
        if let Some(v) = patch.started_at {
            assignments.set("started_at", v);
        }
        if let Some(v) = patch.completed_at {
            assignments.set("completed_at", v);
        }
        if let Some(v) = patch.duration {
            assignments.set("duration", v.map(duration_to_sql).transpose()?);
        }

        if assignments.is_empty() {
            return self.get_workout(id)?.map(|_| ()).ok_or(PersistError::RowNotFound);
        }
        match assignments.execute(&self.tx, "workouts", "id = ?", id)? {
            0 => Err(PersistError::RowNotFound),
            _ => Ok(()),
        }
    }

    fn update_sets_for_workout(&mut self, id: WorkoutId, patch: &SetPatch) -> PersistResult<usize> {
        let assignments = Assignments::for_set(patch);
        if assignments.is_empty() {
            return Ok(0);
        }
        let count = assignments.execute(
            &self.tx,
            "sets",
            "exercise_id IN (SELECT id FROM exercises WHERE workout_id = ?)",
            id,
        )?;
        Ok(count)
    }

    fn create_workout_history(&mut self, record: &NewWorkoutHistory) -> PersistResult<WorkoutHistory> {
        let duration = duration_to_sql(record.duration)?;
        self.tx.execute(
            "INSERT INTO workout_history(workout_id, user_id, name, duration, exercise_count, \
             total_sets, completed_sets, notes, completed_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.workout_id,
                record.user_id,
                record.name,
                duration,
                record.exercise_count,
                record.total_sets,
                record.completed_sets,
                record.notes,
                record.completed_at,
            ],
        )?;

        Ok(WorkoutHistory {
            id: self.tx.last_insert_rowid(),
            workout_id: record.workout_id,
            name: record.name.clone(),
            user_id: record.user_id.clone(),
            duration: record.duration,
            exercise_count: record.exercise_count,
            total_sets: record.total_sets,
            completed_sets: record.completed_sets,
            notes: record.notes.clone(),
            completed_at: record.completed_at,
        })
    }

    fn list_history(&self, user_id: &str) -> PersistResult<Vec<WorkoutHistory>> {
        let mut stmt = self.tx.prepare(&format!(
            "SELECT {HISTORY_COLUMNS} FROM workout_history WHERE user_id = ?1 \
             ORDER BY completed_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![user_id], history_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn get_exercise(&self, id: ExerciseId) -> PersistResult<Option<Exercise>> {
        let exercise = self
            .tx
            .query_row(
                &format!("SELECT {EXERCISE_COLUMNS} FROM exercises WHERE id = ?1"),
                params![id],
                exercise_from_row,
            )
            .optional()?;

        let Some(mut exercise) = exercise else {
            return Ok(None);
        };
        exercise.sets = self.sets_of(id)?;
        Ok(Some(exercise))
    }

    fn create_exercise(&mut self, draft: &NewExercise) -> PersistResult<Exercise> {
        self.tx.execute(
            "INSERT INTO exercises(workout_id, name, sort_order) VALUES (?1, ?2, ?3)",
            params![draft.workout_id, draft.name, draft.order],
        )?;
        Ok(Exercise {
            id: self.tx.last_insert_rowid(),
            workout_id: draft.workout_id,
            name: draft.name.clone(),
            order: draft.order,
            sets: Vec::new(),
        })
    }

    fn delete_exercise(&mut self, id: ExerciseId) -> PersistResult<()> {
        self.tx
            .execute("DELETE FROM sets WHERE exercise_id = ?1", params![id])?;
        match self
            .tx
            .execute("DELETE FROM exercises WHERE id = ?1", params![id])?
        {
            0 => Err(PersistError::RowNotFound),
            _ => Ok(()),
        }
    }

    fn set_exercise_order(&mut self, id: ExerciseId, order: u32) -> PersistResult<()> {
        match self.tx.execute(
            "UPDATE exercises SET sort_order = ?1 WHERE id = ?2",
            params![order, id],
        )? {
            0 => Err(PersistError::RowNotFound),
            _ => Ok(()),
        }
    }

    fn get_set(&self, id: SetId) -> PersistResult<Option<WorkoutSet>> {
        let set = self
            .tx
            .query_row(
                &format!("SELECT {SET_COLUMNS} FROM sets s WHERE s.id = ?1"),
                params![id],
                set_from_row,
            )
            .optional()?;
        Ok(set)
    }

    fn create_set(&mut self, draft: &NewSet) -> PersistResult<WorkoutSet> {
        self.tx.execute(
            "INSERT INTO sets(exercise_id, reps, weight, notes, sort_order, completed) \
             VALUES (?1, ?2, ?3, ?4, ?5, 0)",
            params![draft.exercise_id, draft.reps, draft.weight, draft.notes, draft.order],
        )?;
        Ok(WorkoutSet {
            id: self.tx.last_insert_rowid(),
            exercise_id: draft.exercise_id,
            reps: draft.reps,
            weight: draft.weight,
            notes: draft.notes.clone(),
            order: draft.order,
            completed: false,
            completed_at: None,
        })
    }

    fn update_set(&mut self, id: SetId, patch: &SetPatch) -> PersistResult<WorkoutSet> {
        let assignments = Assignments::for_set(patch);
        if !assignments.is_empty() && assignments.execute(&self.tx, "sets", "id = ?", id)? == 0 {
            return Err(PersistError::RowNotFound);
        }
        self.get_set(id)?.ok_or(PersistError::RowNotFound)
    }

    fn delete_set(&mut self, id: SetId) -> PersistResult<()> {
        match self.tx.execute("DELETE FROM sets WHERE id = ?1", params![id])? {
            0 => Err(PersistError::RowNotFound),
            _ => Ok(()),
        }
    }

    fn commit(self) -> PersistResult<()> {
        self.tx.commit()?;
        Ok(())
    }
}

/// Column assignments for a sparse `UPDATE`. Column names only ever come from this module.
#[derive(Default)]
struct Assignments {
    columns: Vec<&'static str>,
    values: Vec<Box<dyn ToSql>>,
}

impl Assignments {
    fn for_set(patch: &SetPatch) -> Self {
        let mut out = Self::default();
        if let Some(v) = patch.reps {
            out.set("reps", v);
        }
        if let Some(v) = patch.weight {
            out.set("weight", v);
        }
        if let Some(v) = &patch.notes {
            out.set("notes", v.clone());
        }
        if let Some(v) = patch.completed {
            out.set("completed", v);
        }
        if let Some(v) = patch.completed_at {
            out.set("completed_at", v);
        }
        out
    }

    fn set(&mut self, column: &'static str, value: impl ToSql + 'static) {
        self.columns.push(column);
        self.values.push(Box::new(value));
    }

    fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn execute(self, conn: &Connection, table: &str, filter: &str, key: i64) -> rusqlite::Result<usize> {
        let assignments = self
            .columns
            .iter()
            .map(|c| format!("{c} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE {table} SET {assignments} WHERE {filter}");

        let mut bound: Vec<&dyn ToSql> = self.values.iter().map(|v| v.as_ref()).collect();
        bound.push(&key);
        conn.execute(&sql, bound.as_slice())
    }
}

fn workout_from_row(row: &Row<'_>) -> rusqlite::Result<Workout> {
    let status: String = row.get("status")?;
    let status = status.parse::<WorkoutStatus>().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::other(err)),
        )
    })?;
    let duration: Option<i64> = row.get("duration")?;
    let duration = duration.map(duration_from_sql).transpose()?;

    Ok(Workout {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        name: row.get("name")?,
        notes: row.get("notes")?,
        date: row.get("date")?,
        status,
        started_at: row.get("started_at")?,
        completed_at: row.get("completed_at")?,
        duration,
        exercises: Vec::new(),
    })
}

fn exercise_from_row(row: &Row<'_>) -> rusqlite::Result<Exercise> {
    Ok(Exercise {
        id: row.get("id")?,
        workout_id: row.get("workout_id")?,
        name: row.get("name")?,
        order: row.get("sort_order")?,
        sets: Vec::new(),
    })
}

fn set_from_row(row: &Row<'_>) -> rusqlite::Result<WorkoutSet> {
    Ok(WorkoutSet {
        id: row.get(0)?,
        exercise_id: row.get(1)?,
        reps: row.get(2)?,
        weight: row.get(3)?,
        notes: row.get(4)?,
        order: row.get(5)?,
        completed: row.get(6)?,
        completed_at: row.get(7)?,
    })
}

fn history_from_row(row: &Row<'_>) -> rusqlite::Result<WorkoutHistory> {
    let duration = duration_from_sql(row.get("duration")?)?;
    Ok(WorkoutHistory {
        id: row.get("id")?,
        workout_id: row.get("workout_id")?,
        name: row.get("name")?,
        user_id: row.get("user_id")?,
        duration,
        exercise_count: row.get("exercise_count")?,
        total_sets: row.get("total_sets")?,
        completed_sets: row.get("completed_sets")?,
        notes: row.get("notes")?,
        completed_at: row.get("completed_at")?,
    })
}

fn duration_to_sql(secs: u64) -> PersistResult<i64> {
    i64::try_from(secs).map_err(|_| PersistError::Message(format!("duration {secs} does not fit an INTEGER column")))
}

fn duration_from_sql(secs: i64) -> rusqlite::Result<u64> {
    u64::try_from(secs).map_err(|err| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Integer, Box::new(err)))
}
