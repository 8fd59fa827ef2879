use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, Mutex};
use tracing::{debug, error};

use crate::{
    clock::Clock,
    core::{
        error::{CoreError, CoreResult},
        lifecycle::{Completion, LifecycleManager},
        planner::{OrderEntry, SetEdit},
    },
    persist::Gateway,
    types::{ExerciseId, SetId, WorkoutId},
    workout::{Exercise, Workout, WorkoutHistory, WorkoutSet},
};

use super::events::WorkoutEvent;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("workout runtime is not running")]
    ChannelClosed,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub command_queue_bound: usize,
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: 256,
            event_capacity: 1024,
        }
    }
}

/// Cloneable front door to the runtime. Every call is queued and executed one
/// at a time, so two `complete` requests for the same workout never interleave.
pub struct WorkoutHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<WorkoutEvent>,
}

impl Clone for WorkoutHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

type Reply<T> = oneshot::Sender<CoreResult<T>>;

enum Command {
    Start {
        id: WorkoutId,
        resp: Reply<Workout>,
    },
    Complete {
        id: WorkoutId,
        elapsed_secs: Option<u64>,
        resp: Reply<Completion>,
    },
    Reset {
        id: WorkoutId,
        resp: Reply<Workout>,
    },
    CompleteSet {
        id: SetId,
        resp: Reply<WorkoutSet>,
    },
    GetWorkout {
        id: WorkoutId,
        resp: Reply<Workout>,
    },
    ListWorkouts {
        user_id: String,
        resp: Reply<Vec<Workout>>,
    },
    ListExercises {
        workout_id: WorkoutId,
        resp: Reply<Vec<Exercise>>,
    },
    GetSet {
        id: SetId,
        resp: Reply<WorkoutSet>,
    },
    History {
        user_id: String,
        resp: Reply<Vec<WorkoutHistory>>,
    },
    CreateWorkout {
        user_id: String,
        name: String,
        notes: Option<String>,
        resp: Reply<Workout>,
    },
    AddExercise {
        workout_id: WorkoutId,
        name: String,
        resp: Reply<Exercise>,
    },
    RemoveExercise {
        id: ExerciseId,
        resp: Reply<Workout>,
    },
    ReorderExercises {
        workout_id: WorkoutId,
        entries: Vec<OrderEntry>,
        resp: Reply<Workout>,
    },
    AddSet {
        exercise_id: ExerciseId,
        reps: u32,
        weight: Option<f64>,
        notes: Option<String>,
        resp: Reply<WorkoutSet>,
    },
    UpdateSet {
        id: SetId,
        edit: SetEdit,
        resp: Reply<WorkoutSet>,
    },
    RemoveSet {
        id: SetId,
        resp: Reply<()>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

pub fn spawn_gymlog<G, C>(manager: LifecycleManager<G, C>, config: RuntimeConfig) -> WorkoutHandle
where
    G: Gateway,
    C: Clock,
{
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound.max(1));
    let (events_tx, _) = broadcast::channel::<WorkoutEvent>(config.event_capacity.max(1));

    let events_tx_loop = events_tx.clone();
    let manager = Arc::new(Mutex::new(manager));

    tokio::spawn(async move {
        while let Some(cmd) = cmd_rx.recv().await {
            let cmd = match cmd {
                Command::Shutdown { resp } => {
                    debug!("workout runtime shutting down");
                    let _ = resp.send(());
                    break;
                }
                other => other,
            };

            // Gateway calls block; run them off the async workers but still one at a time.
            let manager = Arc::clone(&manager);
            let events = events_tx_loop.clone();
            let joined = tokio::task::spawn_blocking(move || {
                let mut manager = manager.blocking_lock();
                handle_command(cmd, &mut manager, &events);
            })
            .await;

            if let Err(err) = joined {
                error!(%err, "workout command panicked");
            }
        }
    });

    WorkoutHandle { cmd_tx, events_tx }
}

impl WorkoutHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<WorkoutEvent> {
        self.events_tx.subscribe()
    }

    pub async fn start(&self, id: WorkoutId) -> Result<Workout, RuntimeError> {
        self.request(|resp| Command::Start { id, resp }).await
    }

    pub async fn complete(&self, id: WorkoutId, elapsed_secs: Option<u64>) -> Result<Completion, RuntimeError> {
        self.request(|resp| Command::Complete {
            id,
            elapsed_secs,
            resp,
        })
        .await
    }

    pub async fn reset(&self, id: WorkoutId) -> Result<Workout, RuntimeError> {
        self.request(|resp| Command::Reset { id, resp }).await
    }

    pub async fn complete_set(&self, id: SetId) -> Result<WorkoutSet, RuntimeError> {
        self.request(|resp| Command::CompleteSet { id, resp }).await
    }

    pub async fn get_workout(&self, id: WorkoutId) -> Result<Workout, RuntimeError> {
        self.request(|resp| Command::GetWorkout { id, resp }).await
    }

    pub async fn list_workouts(&self, user_id: impl Into<String>) -> Result<Vec<Workout>, RuntimeError> {
        let user_id = user_id.into();
        self.request(|resp| Command::ListWorkouts { user_id, resp }).await
    }

    pub async fn list_exercises(&self, workout_id: WorkoutId) -> Result<Vec<Exercise>, RuntimeError> {
        self.request(|resp| Command::ListExercises { workout_id, resp }).await
    }

    pub async fn get_set(&self, id: SetId) -> Result<WorkoutSet, RuntimeError> {
        self.request(|resp| Command::GetSet { id, resp }).await
    }

    pub async fn history(&self, user_id: impl Into<String>) -> Result<Vec<WorkoutHistory>, RuntimeError> {
        let user_id = user_id.into();
        self.request(|resp| Command::History { user_id, resp }).await
    }

    pub async fn create_workout(
        &self,
        user_id: impl Into<String>,
        name: impl Into<String>,
        notes: Option<String>,
    ) -> Result<Workout, RuntimeError> {
        let (user_id, name) = (user_id.into(), name.into());
        self.request(|resp| Command::CreateWorkout {
            user_id,
            name,
            notes,
            resp,
        })
        .await
    }

    pub async fn add_exercise(&self, workout_id: WorkoutId, name: impl Into<String>) -> Result<Exercise, RuntimeError> {
        let name = name.into();
        self.request(|resp| Command::AddExercise {
            workout_id,
            name,
            resp,
        })
        .await
    }

    pub async fn remove_exercise(&self, id: ExerciseId) -> Result<Workout, RuntimeError> {
        self.request(|resp| Command::RemoveExercise { id, resp }).await
    }

    pub async fn reorder_exercises(&self, workout_id: WorkoutId, entries: Vec<OrderEntry>) -> Result<Workout, RuntimeError> {
        self.request(|resp| Command::ReorderExercises {
            workout_id,
            entries,
            resp,
        })
        .await
    }

    pub async fn add_set(
        &self,
        exercise_id: ExerciseId,
        reps: u32,
        weight: Option<f64>,
        notes: Option<String>,
    ) -> Result<WorkoutSet, RuntimeError> {
        self.request(|resp| Command::AddSet {
            exercise_id,
            reps,
            weight,
            notes,
            resp,
        })
        .await
    }

    pub async fn update_set(&self, id: SetId, edit: SetEdit) -> Result<WorkoutSet, RuntimeError> {
        self.request(|resp| Command::UpdateSet { id, edit, resp }).await
    }

    pub async fn remove_set(&self, id: SetId) -> Result<(), RuntimeError> {
        self.request(|resp| Command::RemoveSet { id, resp }).await
    }

    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> Result<T, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(build(tx))
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?.map_err(RuntimeError::from)
    }
}

fn handle_command<G: Gateway, C: Clock>(
    cmd: Command,
    manager: &mut LifecycleManager<G, C>,
    events_tx: &broadcast::Sender<WorkoutEvent>,
) {
    match cmd {
        Command::Start { id, resp } => {
            let res = manager.start(id);
            if res.is_ok() {
                let _ = events_tx.send(WorkoutEvent::Started { id });
            }
            let _ = resp.send(res);
        }
        Command::Complete {
            id,
            elapsed_secs,
            resp,
        } => {
            let res = manager.complete(id, elapsed_secs);
            if let Ok(done) = &res {
                let _ = events_tx.send(WorkoutEvent::Completed {
                    id,
                    history_id: done.history_id,
                });
            }
            let _ = resp.send(res);
        }
        Command::Reset { id, resp } => {
            let res = manager.reset(id);
            if res.is_ok() {
                let _ = events_tx.send(WorkoutEvent::Reset { id });
            }
            let _ = resp.send(res);
        }
        Command::CompleteSet { id, resp } => {
            let res = manager.complete_set(id);
            if res.is_ok() {
                let _ = events_tx.send(WorkoutEvent::SetCompleted { id });
            }
            let _ = resp.send(res);
        }
        Command::GetWorkout { id, resp } => {
            let _ = resp.send(manager.get_workout(id));
        }
        Command::ListWorkouts { user_id, resp } => {
            let _ = resp.send(manager.list_workouts(&user_id));
        }
        Command::ListExercises { workout_id, resp } => {
            let _ = resp.send(manager.list_exercises(workout_id));
        }
        Command::GetSet { id, resp } => {
            let _ = resp.send(manager.get_set(id));
        }
        Command::History { user_id, resp } => {
            let _ = resp.send(manager.history(&user_id));
        }
        Command::CreateWorkout {
            user_id,
            name,
            notes,
            resp,
        } => {
            let res = manager.create_workout(&user_id, &name, notes);
            if let Ok(workout) = &res {
                template_changed(events_tx, Some(workout.id));
            }
            let _ = resp.send(res);
        }
        Command::AddExercise {
            workout_id,
            name,
            resp,
        } => {
            let res = manager.add_exercise(workout_id, &name);
            if res.is_ok() {
                template_changed(events_tx, Some(workout_id));
            }
            let _ = resp.send(res);
        }
        Command::RemoveExercise { id, resp } => {
            let res = manager.remove_exercise(id);
            if let Ok(workout) = &res {
                template_changed(events_tx, Some(workout.id));
            }
            let _ = resp.send(res);
        }
        Command::ReorderExercises {
            workout_id,
            entries,
            resp,
        } => {
            let res = manager.reorder_exercises(workout_id, &entries);
            if res.is_ok() {
                template_changed(events_tx, Some(workout_id));
            }
            let _ = resp.send(res);
        }
        Command::AddSet {
            exercise_id,
            reps,
            weight,
            notes,
            resp,
        } => {
            let res = manager.add_set(exercise_id, reps, weight, notes);
            if res.is_ok() {
                template_changed(events_tx, None);
            }
            let _ = resp.send(res);
        }
        Command::UpdateSet { id, edit, resp } => {
            let res = manager.update_set(id, edit);
            if res.is_ok() {
                template_changed(events_tx, None);
            }
            let _ = resp.send(res);
        }
        Command::RemoveSet { id, resp } => {
            let res = manager.remove_set(id);
            if res.is_ok() {
                template_changed(events_tx, None);
            }
            let _ = resp.send(res);
        }
        Command::Shutdown { resp } => {
            let _ = resp.send(());
        }
    }
}

fn template_changed(events_tx: &broadcast::Sender<WorkoutEvent>, workout_id: Option<WorkoutId>) {
    let _ = events_tx.send(WorkoutEvent::TemplateChanged { workout_id });
}
