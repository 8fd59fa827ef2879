//! Read-only exercise metadata keyed by exercise name.
//!
//! The catalog is a local copy of a free-exercise-db style JSON array. It only
//! decorates responses: a missing file, a parse failure, or an unknown name all
//! degrade to empty details.

use std::path::Path;

use hashbrown::HashMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::workout::Workout;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseDetails {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub force: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub level: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub mechanic: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub equipment: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub category: String,
    #[serde(default)]
    pub primary_muscles: Vec<String>,
    #[serde(default)]
    pub secondary_muscles: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    /// First primary muscle, or empty.
    #[serde(default)]
    pub muscle_group: String,
}

/// A catalog row as found in the source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    #[serde(flatten)]
    pub details: ExerciseDetails,
}

#[derive(Debug, Clone, Default)]
pub struct ExerciseCatalog {
    entries: Vec<CatalogEntry>,
    by_name: HashMap<String, usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse catalog: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExerciseCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        let mut entries = entries;
        let mut by_name = HashMap::with_capacity(entries.len());
        for (idx, entry) in entries.iter_mut().enumerate() {
            if entry.details.muscle_group.is_empty() {
                entry.details.muscle_group =
                    entry.details.primary_muscles.first().cloned().unwrap_or_default();
            }
            by_name.entry(key(&entry.name)).or_insert(idx);
        }
        Self { entries, by_name }
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, CatalogError> {
        let entries: Vec<CatalogEntry> = serde_json::from_slice(bytes)?;
        Ok(Self::from_entries(entries))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let bytes = std::fs::read(path)?;
        Self::from_json(&bytes)
    }

    /// Loads `path` if given; logs and falls back to an empty catalog on failure.
    pub fn load_or_empty(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::empty();
        };
        match Self::from_path(path) {
            Ok(catalog) => {
                info!(path = %path.display(), exercises = catalog.len(), "exercise catalog loaded");
                catalog
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "exercise catalog unavailable, serving without details");
                Self::empty()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive lookup on the trimmed name. Unknown names yield empty details.
    pub fn lookup(&self, name: &str) -> ExerciseDetails {
        self.by_name
            .get(&key(name))
            .map(|idx| self.entries[*idx].details.clone())
            .unwrap_or_default()
    }

    /// Entries whose name contains `query` (case-insensitive), in file order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&CatalogEntry> {
        let needle = key(query);
        self.entries
            .iter()
            .filter(|e| needle.is_empty() || key(&e.name).contains(&needle))
            .take(limit)
            .collect()
    }

    /// Serializes `workout`, merging catalog details into every exercise object.
    pub fn enrich(&self, workout: &Workout) -> serde_json::Result<Value> {
        let mut value = serde_json::to_value(workout)?;
        let Some(exercises) = value.get_mut("exercises").and_then(Value::as_array_mut) else {
            return Ok(value);
        };

        for (exercise, source) in exercises.iter_mut().zip(&workout.exercises) {
            let Value::Object(fields) = serde_json::to_value(self.lookup(&source.name))? else {
                continue;
            };
            if let Some(target) = exercise.as_object_mut() {
                for (k, v) in fields {
                    target.entry(k).or_insert(v);
                }
            }
        }
        Ok(value)
    }
}

fn key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
