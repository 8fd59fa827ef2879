//! Workout lifecycle and template editing on top of a [`crate::persist::Gateway`].

/// Error taxonomy shared by every core operation.
pub mod error;
/// Session state machine and completion transaction.
pub mod lifecycle;
/// Workout, exercise, and set editing.
pub mod planner;
