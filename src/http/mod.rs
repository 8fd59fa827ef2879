//! JSON-over-HTTP binding for the runtime handle.

use std::{future::Future, sync::Arc};

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{catalog::ExerciseCatalog, runtime::handle::WorkoutHandle};

/// Error type and status mapping.
pub mod error;
/// Request handlers, one per route.
pub mod handlers;

#[derive(Clone)]
pub struct AppState {
    pub handle: WorkoutHandle,
    pub catalog: Arc<ExerciseCatalog>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/workouts",
            get(handlers::list_workouts).post(handlers::create_workout),
        )
        .route("/workouts/{id}", get(handlers::get_workout))
        .route("/workouts/{id}/start", post(handlers::start_workout))
        .route("/workouts/{id}/complete", post(handlers::complete_workout))
        .route("/workouts/{id}/reset", post(handlers::reset_workout))
        .route(
            "/workouts/{id}/exercises/order",
            put(handlers::reorder_exercises),
        )
        .route(
            "/exercises",
            get(handlers::list_exercises).post(handlers::create_exercise),
        )
        .route("/exercises/{id}", delete(handlers::delete_exercise))
        .route("/sets", post(handlers::create_set))
        .route(
            "/sets/{id}",
            get(handlers::get_set)
                .put(handlers::update_set)
                .delete(handlers::delete_set),
        )
        .route("/sets/{id}/complete", post(handlers::complete_set))
        .route("/users/{id}/workout-history", get(handlers::workout_history))
        .route("/catalog", get(handlers::search_catalog))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves until `shutdown` resolves, then drains in-flight requests.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
