use std::fmt;

use thiserror::Error;

use crate::{persist::PersistError, types::WorkoutId};

/// Row kinds a lookup can miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Workout,
    Exercise,
    Set,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Workout => "workout",
            Self::Exercise => "exercise",
            Self::Set => "set",
        })
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    /// The identifier could not be parsed. Nothing was read or written.
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: i64 },

    /// A completion landed inside the configured de-duplication window.
    #[error("workout {id} was already completed {since_secs}s ago")]
    DuplicateCompletion { id: WorkoutId, since_secs: u64 },

    /// The transaction was rolled back; no partial effects are visible.
    #[error("transaction failed: {0}")]
    Transaction(#[from] PersistError),
}

impl CoreError {
    pub fn not_found(entity: Entity, id: i64) -> Self {
        Self::NotFound { entity, id }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
