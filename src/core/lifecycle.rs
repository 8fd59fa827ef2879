//! Session lifecycle: `Draft -> InProgress -> (history snapshot) -> Draft`.
//!
//! A workout is a reusable template. Completing a session never leaves it in a
//! terminal state; instead a [`WorkoutHistory`] row is appended and the workout
//! is folded back to a clean draft in the same transaction.

use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    clock::{Clock, SystemClock},
    persist::{Gateway, GatewayTx, PersistResult},
    types::{HistoryId, WorkoutId, WorkoutStatus},
    workout::{NewWorkoutHistory, SetPatch, Workout, WorkoutHistory, WorkoutPatch},
};

use super::error::{CoreError, CoreResult, Entity};

#[derive(Debug, Clone, Default)]
pub struct LifecycleConfig {
    /// Rejects a `complete` arriving within this many seconds of the previous
    /// completion of the same workout. `0` disables the guard.
    pub duplicate_complete_window_secs: u64,
}

/// Summary of a finished session, computed from the counts taken before reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub duration: u64,
    pub completed_at: DateTime<Utc>,
    pub exercise_count: u32,
    pub total_sets: u32,
    pub completed_sets: u32,
}

/// Outcome of [`LifecycleManager::complete`].
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// The workout after reset.
    pub workout: Workout,
    pub session: SessionSummary,
    pub history_id: HistoryId,
}

pub struct LifecycleManager<G, C = SystemClock> {
    pub(super) gateway: G,
    pub(super) clock: C,
    config: LifecycleConfig,
    last_completed: HashMap<WorkoutId, DateTime<Utc>>,
}

impl<G: Gateway> LifecycleManager<G, SystemClock> {
    pub fn new(gateway: G) -> Self {
        Self::with_clock(gateway, SystemClock, LifecycleConfig::default())
    }
}

impl<G: Gateway, C: Clock> LifecycleManager<G, C> {
    pub fn with_clock(gateway: G, clock: C, config: LifecycleConfig) -> Self {
        Self {
            gateway,
            clock,
            config,
            last_completed: HashMap::new(),
        }
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    /// Starts a session. Starting a running session returns it untouched so the
    /// elapsed-time baseline survives repeated calls.
    pub fn start(&mut self, id: WorkoutId) -> CoreResult<Workout> {
        let now = self.clock.now();
        let mut tx = self.gateway.begin()?;
        let workout = tx
            .get_workout(id)?
            .ok_or(CoreError::not_found(Entity::Workout, id))?;

        if workout.status == WorkoutStatus::InProgress && workout.started_at.is_some() {
            debug!(workout_id = id, "workout already in progress");
            return Ok(workout);
        }

        tx.update_workout(id, &WorkoutPatch::started(now))?;
        let started = tx
            .get_workout(id)?
            .ok_or(CoreError::not_found(Entity::Workout, id))?;
        tx.commit()?;

        info!(workout_id = id, started_at = %now, "workout started");
        Ok(started)
    }

    /// Ends a session: appends a history snapshot and resets the workout and
    /// all of its sets in one transaction.
    ///
    /// Any status is accepted. Completing a draft records a zero-length session.
    /// A hint that does not fit the store's signed 64-bit column is rejected.
    pub fn complete(&mut self, id: WorkoutId, client_elapsed_secs: Option<u64>) -> CoreResult<Completion> {
        if let Some(secs) = client_elapsed_secs.filter(|s| i64::try_from(*s).is_err()) {
            return Err(CoreError::InvalidInput(format!(
                "elapsed time {secs} is out of range (max {})",
                i64::MAX
            )));
        }
        let now = self.clock.now();
        self.check_duplicate(id, now)?;

        let mut tx = self.gateway.begin()?;
        let workout = tx
            .get_workout(id)?
            .ok_or(CoreError::not_found(Entity::Workout, id))?;

        let duration = resolve_duration(client_elapsed_secs, workout.started_at, now);
        let tally = workout.set_tally();

        let history = tx.create_workout_history(&NewWorkoutHistory {
            workout_id: workout.id,
            name: workout.name.clone(),
            user_id: workout.user_id.clone(),
            duration,
            exercise_count: tally.exercise_count,
            total_sets: tally.total_sets,
            completed_sets: tally.completed_sets,
            notes: workout.notes.clone(),
            completed_at: now,
        })?;
        let sets_reset = reset_session(&mut tx, id)?;
        let reset = tx
            .get_workout(id)?
            .ok_or(CoreError::not_found(Entity::Workout, id))?;
        tx.commit()?;

        if self.config.duplicate_complete_window_secs > 0 {
            self.last_completed.insert(id, now);
        }
        info!(
            workout_id = id,
            history_id = history.id,
            duration,
            completed_sets = tally.completed_sets,
            total_sets = tally.total_sets,
            sets_reset,
            "workout completed"
        );

        Ok(Completion {
            workout: reset,
            session: summarize(&history),
            history_id: history.id,
        })
    }

    /// Abandons a session without recording history.
    pub fn reset(&mut self, id: WorkoutId) -> CoreResult<Workout> {
        let mut tx = self.gateway.begin()?;
        if tx.get_workout(id)?.is_none() {
            return Err(CoreError::not_found(Entity::Workout, id));
        }

        let sets_reset = reset_session(&mut tx, id)?;
        let reset = tx
            .get_workout(id)?
            .ok_or(CoreError::not_found(Entity::Workout, id))?;
        tx.commit()?;

        info!(workout_id = id, sets_reset, "workout reset");
        Ok(reset)
    }

    fn check_duplicate(&self, id: WorkoutId, now: DateTime<Utc>) -> CoreResult<()> {
        let window = self.config.duplicate_complete_window_secs;
        if window == 0 {
            return Ok(());
        }
        let Some(previous) = self.last_completed.get(&id) else {
            return Ok(());
        };

        let since_secs = (now - *previous).num_seconds().max(0) as u64;
        if since_secs < window {
            debug!(workout_id = id, since_secs, "rejecting duplicate completion");
            return Err(CoreError::DuplicateCompletion { id, since_secs });
        }
        Ok(())
    }

    /// Number of workouts the duplicate guard is currently remembering.
    pub fn tracked_completions(&self) -> usize {
        self.last_completed.len()
    }
}

/// Picks the session length: a non-zero client hint wins, then the server-side
/// delta since `started_at` (floored to whole seconds), then zero.
pub fn resolve_duration(
    client_elapsed_secs: Option<u64>,
    started_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> u64 {
    if let Some(secs) = client_elapsed_secs.filter(|s| *s > 0) {
        return secs;
    }
    match started_at {
        Some(started) => ((now - started).num_milliseconds().max(0) / 1000) as u64,
        None => 0,
    }
}

// Shared by `complete` and `reset`. Sets first, then the workout row.
fn reset_session<T: GatewayTx>(tx: &mut T, id: WorkoutId) -> PersistResult<usize> {
    let count = tx.update_sets_for_workout(id, &SetPatch::cleared())?;
    tx.update_workout(id, &WorkoutPatch::draft())?;
    Ok(count)
}

fn summarize(history: &WorkoutHistory) -> SessionSummary {
    SessionSummary {
        duration: history.duration,
        completed_at: history.completed_at,
        exercise_count: history.exercise_count,
        total_sets: history.total_sets,
        completed_sets: history.completed_sets,
    }
}
