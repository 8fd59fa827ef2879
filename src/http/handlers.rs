use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    catalog::CatalogEntry,
    core::{
        lifecycle::SessionSummary,
        planner::{OrderEntry, SetEdit},
    },
    types::{ExerciseId, HistoryId, WorkoutId, parse_id},
    workout::{Exercise, Workout, WorkoutHistory, WorkoutSet},
};

use super::{AppState, error::ApiError};

const DEFAULT_SEARCH_LIMIT: usize = 20;
const MAX_SEARCH_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ExerciseQuery {
    #[serde(rename = "workoutId")]
    pub workout_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompleteBody {
    elapsed_time: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteResponse {
    pub workout: Workout,
    pub session: SessionSummary,
    pub history_id: HistoryId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateWorkoutBody {
    user_id: String,
    name: String,
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReorderBody {
    exercises: Vec<OrderEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateExerciseBody {
    workout_id: WorkoutId,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSetBody {
    exercise_id: ExerciseId,
    reps: u32,
    weight: Option<f64>,
    notes: Option<String>,
}

pub async fn start_workout(State(state): State<AppState>, Path(raw): Path<String>) -> Result<Json<Workout>, ApiError> {
    let id = parse_id(&raw)?;
    Ok(Json(state.handle.start(id).await?))
}

/// `body` may be empty; `{"elapsedTime": 0}` and a missing field both mean "no hint".
pub async fn complete_workout(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    body: Bytes,
) -> Result<Json<CompleteResponse>, ApiError> {
    let id = parse_id(&raw)?;
    let body: CompleteBody = if body.iter().all(u8::is_ascii_whitespace) {
        CompleteBody::default()
    } else {
        parse_body(&body)?
    };

    let done = state.handle.complete(id, body.elapsed_time).await?;
    Ok(Json(CompleteResponse {
        workout: done.workout,
        session: done.session,
        history_id: done.history_id,
    }))
}

pub async fn reset_workout(State(state): State<AppState>, Path(raw): Path<String>) -> Result<Json<Workout>, ApiError> {
    let id = parse_id(&raw)?;
    Ok(Json(state.handle.reset(id).await?))
}

pub async fn list_workouts(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<Vec<Workout>>, ApiError> {
    let Query(query) = query?;
    Ok(Json(state.handle.list_workouts(query.user_id).await?))
}

pub async fn create_workout(State(state): State<AppState>, body: Bytes) -> Result<(StatusCode, Json<Workout>), ApiError> {
    let body: CreateWorkoutBody = parse_body(&body)?;
    let workout = state
        .handle
        .create_workout(body.user_id, body.name, body.notes)
        .await?;
    Ok((StatusCode::CREATED, Json(workout)))
}

pub async fn get_workout(State(state): State<AppState>, Path(raw): Path<String>) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&raw)?;
    let workout = state.handle.get_workout(id).await?;
    Ok(Json(state.catalog.enrich(&workout)?))
}

pub async fn reorder_exercises(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    body: Bytes,
) -> Result<Json<Workout>, ApiError> {
    let id = parse_id(&raw)?;
    let body: ReorderBody = parse_body(&body)?;
    Ok(Json(state.handle.reorder_exercises(id, body.exercises).await?))
}

pub async fn list_exercises(
    State(state): State<AppState>,
    query: Result<Query<ExerciseQuery>, QueryRejection>,
) -> Result<Json<Vec<Exercise>>, ApiError> {
    let Query(query) = query?;
    let workout_id = parse_id(&query.workout_id)?;
    Ok(Json(state.handle.list_exercises(workout_id).await?))
}

pub async fn create_exercise(State(state): State<AppState>, body: Bytes) -> Result<(StatusCode, Json<Exercise>), ApiError> {
    let body: CreateExerciseBody = parse_body(&body)?;
    let exercise = state.handle.add_exercise(body.workout_id, body.name).await?;
    Ok((StatusCode::CREATED, Json(exercise)))
}

pub async fn delete_exercise(State(state): State<AppState>, Path(raw): Path<String>) -> Result<Json<Workout>, ApiError> {
    let id = parse_id(&raw)?;
    Ok(Json(state.handle.remove_exercise(id).await?))
}

pub async fn create_set(State(state): State<AppState>, body: Bytes) -> Result<(StatusCode, Json<WorkoutSet>), ApiError> {
    let body: CreateSetBody = parse_body(&body)?;
    let set = state
        .handle
        .add_set(body.exercise_id, body.reps, body.weight, body.notes)
        .await?;
    Ok((StatusCode::CREATED, Json(set)))
}

pub async fn get_set(State(state): State<AppState>, Path(raw): Path<String>) -> Result<Json<WorkoutSet>, ApiError> {
    let id = parse_id(&raw)?;
    Ok(Json(state.handle.get_set(id).await?))
}

pub async fn update_set(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    body: Bytes,
) -> Result<Json<WorkoutSet>, ApiError> {
    let id = parse_id(&raw)?;
    let edit: SetEdit = parse_body(&body)?;
    Ok(Json(state.handle.update_set(id, edit).await?))
}

pub async fn delete_set(State(state): State<AppState>, Path(raw): Path<String>) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw)?;
    state.handle.remove_set(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn complete_set(State(state): State<AppState>, Path(raw): Path<String>) -> Result<Json<WorkoutSet>, ApiError> {
    let id = parse_id(&raw)?;
    Ok(Json(state.handle.complete_set(id).await?))
}

pub async fn workout_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<WorkoutHistory>>, ApiError> {
    Ok(Json(state.handle.history(user_id).await?))
}

pub async fn search_catalog(
    State(state): State<AppState>,
    query: Result<Query<CatalogQuery>, QueryRejection>,
) -> Result<Json<Vec<CatalogEntry>>, ApiError> {
    let Query(query) = query?;
    let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).min(MAX_SEARCH_LIMIT);
    let hits = state
        .catalog
        .search(query.q.as_deref().unwrap_or_default(), limit)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(hits))
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|err| ApiError::bad_request(format!("malformed request body: {err}")))
}
