//! Workout templates with a timed session lifecycle and append-only history.
//!
//! A workout moves `Draft -> InProgress` on start. Completing it appends a
//! [`workout::WorkoutHistory`] snapshot and folds the workout and every set back
//! to a clean draft in one transaction.
//!
//! # Examples
//!
//! Direct use of [`core::lifecycle::LifecycleManager`]:
//! ```
//! use gymlog::{core::lifecycle::LifecycleManager, persist::memory::MemoryGateway, types::WorkoutStatus};
//!
//! let mut manager = LifecycleManager::new(MemoryGateway::new());
//! let workout = manager.create_workout("user-1", "Leg Day", None).expect("create");
//! let squat = manager.add_exercise(workout.id, "Squat").expect("exercise");
//! let set = manager.add_set(squat.id, 5, Some(100.0), None).expect("set");
//!
//! manager.start(workout.id).expect("start");
//! manager.complete_set(set.id).expect("tick");
//! let done = manager.complete(workout.id, Some(1200)).expect("complete");
//!
//! assert_eq!(done.workout.status, WorkoutStatus::Draft);
//! assert_eq!(done.session.duration, 1200);
//! assert_eq!(done.session.completed_sets, 1);
//! assert_eq!(manager.history("user-1").expect("history").len(), 1);
//! ```
//!
//! Runtime usage with the SQLite gateway:
//! ```no_run
//! use gymlog::{
//!     core::lifecycle::LifecycleManager,
//!     persist::sqlite::SqliteGateway,
//!     runtime::handle::{spawn_gymlog, RuntimeConfig},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let gateway = SqliteGateway::open("gymlog.db").expect("open sqlite");
//! let handle = spawn_gymlog(LifecycleManager::new(gateway), RuntimeConfig::default());
//! let workout = handle.create_workout("user-1", "Push", None).await.expect("create");
//! handle.start(workout.id).await.expect("start");
//! handle.complete(workout.id, None).await.expect("complete");
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```

/// Exercise metadata lookup used to decorate responses.
pub mod catalog;
/// Time sources.
pub mod clock;
/// Process configuration.
pub mod config;
/// Lifecycle state machine and template editing.
pub mod core;
/// axum routes and handlers.
pub mod http;
/// Persistence gateway abstraction with SQLite and in-memory implementations.
pub mod persist;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Shared identifiers and enums.
pub mod types;
/// Workout domain records, drafts, and patches.
pub mod workout;
