use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use gymlog::{
    catalog::ExerciseCatalog,
    core::lifecycle::LifecycleManager,
    http::{router, AppState},
    persist::memory::MemoryGateway,
    runtime::handle::{spawn_gymlog, RuntimeConfig},
};

const CATALOG: &str = r#"[
  {
    "name": "Bench Press",
    "force": "push",
    "level": "beginner",
    "mechanic": "compound",
    "equipment": "barbell",
    "primaryMuscles": ["chest"],
    "secondaryMuscles": ["triceps", "shoulders"],
    "instructions": ["Lower the bar to the chest.", "Press it back up."],
    "category": "strength",
    "images": ["Bench_Press/0.jpg"]
  },
  {
    "name": "Bench Dips",
    "force": null,
    "level": "beginner",
    "mechanic": null,
    "equipment": "body only",
    "primaryMuscles": ["triceps"],
    "secondaryMuscles": [],
    "instructions": [],
    "category": "strength",
    "images": []
  }
]"#;

fn app() -> Router {
    let manager = LifecycleManager::new(MemoryGateway::new());
    let handle = spawn_gymlog(manager, RuntimeConfig::default());
    let catalog = ExerciseCatalog::from_json(CATALOG.as_bytes()).expect("catalog");
    router(AppState {
        handle,
        catalog: Arc::new(catalog),
    })
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

/// Creates the sample workout and returns `(workout_id, [set ids])`.
async fn seed(app: &Router) -> (i64, Vec<i64>) {
    let (status, workout) = call(
        app,
        Method::POST,
        "/workouts",
        Some(json!({ "userId": "user-1", "name": "Chest & Triceps Day" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let workout_id = workout["id"].as_i64().expect("workout id");

    let (status, exercise) = call(
        app,
        Method::POST,
        "/exercises",
        Some(json!({ "workoutId": workout_id, "name": "Bench Press" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let exercise_id = exercise["id"].as_i64().expect("exercise id");

    let mut sets = Vec::new();
    for (reps, weight) in [(10, 60.0), (8, 70.0)] {
        let (status, set) = call(
            app,
            Method::POST,
            "/sets",
            Some(json!({ "exerciseId": exercise_id, "reps": reps, "weight": weight })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        sets.push(set["id"].as_i64().expect("set id"));
    }
    (workout_id, sets)
}

#[tokio::test]
async fn lifecycle_routes_follow_the_session() {
    let app = app();
    let (id, sets) = seed(&app).await;

    let (status, started) = call(&app, Method::POST, &format!("/workouts/{id}/start"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["status"], "IN_PROGRESS");
    assert!(started["startedAt"].is_string());

    let (status, set) = call(&app, Method::POST, &format!("/sets/{}/complete", sets[0]), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(set["completed"], true);

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/workouts/{id}/complete"),
        Some(json!({ "elapsedTime": 610 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["workout"]["status"], "DRAFT");
    assert!(body["workout"].get("startedAt").is_none());
    assert_eq!(body["session"]["duration"], 610);
    assert_eq!(body["session"]["exerciseCount"], 1);
    assert_eq!(body["session"]["totalSets"], 2);
    assert_eq!(body["session"]["completedSets"], 1);
    assert!(body["session"]["completedAt"].is_string());

    let (status, history) = call(&app, Method::GET, "/users/user-1/workout-history", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().map(Vec::len), Some(1));
    assert_eq!(history[0]["duration"], 610);
    assert_eq!(history[0]["completedSets"], 1);
}

#[tokio::test]
async fn complete_accepts_an_empty_body() {
    let app = app();
    let (id, _) = seed(&app).await;

    let (status, body) = call(&app, Method::POST, &format!("/workouts/{id}/complete"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["duration"], 0);

    let (status, reset) = call(&app, Method::POST, &format!("/workouts/{id}/reset"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reset["status"], "DRAFT");
}

#[tokio::test]
async fn bad_identifiers_and_unknown_workouts() {
    let app = app();

    for action in ["start", "complete", "reset"] {
        let (status, body) = call(&app, Method::POST, &format!("/workouts/abc/{action}"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{action}");
        assert!(body["error"].is_string());

        let (status, body) = call(&app, Method::POST, &format!("/workouts/404/{action}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{action}");
        assert_eq!(body["error"], "workout 404 not found");
    }

    let (status, _) = call(&app, Method::GET, "/workouts/0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let app = app();
    let (id, sets) = seed(&app).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/workouts/{id}/complete"))
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::POST,
        "/sets",
        Some(json!({ "exerciseId": 1, "reps": -3 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::PUT,
        &format!("/sets/{}", sets[0]),
        Some(json!({ "weight": -10.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn workout_detail_is_enriched_from_catalog() {
    let app = app();
    let (id, _) = seed(&app).await;

    let (status, workout) = call(&app, Method::GET, &format!("/workouts/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let bench = &workout["exercises"][0];
    assert_eq!(bench["name"], "Bench Press");
    assert_eq!(bench["equipment"], "barbell");
    assert_eq!(bench["muscleGroup"], "chest");
    assert_eq!(bench["sets"].as_array().map(Vec::len), Some(2));

    let (status, hits) = call(&app, Method::GET, "/catalog?q=bench&limit=5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hits.as_array().map(Vec::len), Some(2));
    assert_eq!(hits[1]["mechanic"], "");
}

#[tokio::test]
async fn reorder_and_delete_keep_order_contiguous() {
    let app = app();
    let (id, sets) = seed(&app).await;

    let (_, dips) = call(
        &app,
        Method::POST,
        "/exercises",
        Some(json!({ "workoutId": id, "name": "Bench Dips" })),
    )
    .await;
    let (_, flyes) = call(
        &app,
        Method::POST,
        "/exercises",
        Some(json!({ "workoutId": id, "name": "Cable Flyes" })),
    )
    .await;
    let (_, workout) = call(&app, Method::GET, &format!("/workouts/{id}"), None).await;
    let bench_id = workout["exercises"][0]["id"].clone();

    let (status, reordered) = call(
        &app,
        Method::PUT,
        &format!("/workouts/{id}/exercises/order"),
        Some(json!({ "exercises": [
            { "id": flyes["id"], "order": 0 },
            { "id": bench_id, "order": 1 },
            { "id": dips["id"], "order": 2 },
        ] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reordered["exercises"][0]["name"], "Cable Flyes");
    assert_eq!(reordered["exercises"][2]["order"], 2);

    let (status, after) = call(&app, Method::DELETE, &format!("/exercises/{}", flyes["id"]), None).await;
    assert_eq!(status, StatusCode::OK);
    let orders: Vec<i64> = after["exercises"]
        .as_array()
        .expect("exercises")
        .iter()
        .filter_map(|e| e["order"].as_i64())
        .collect();
    assert_eq!(orders, vec![0, 1]);

    let (status, _) = call(&app, Method::DELETE, &format!("/sets/{}", sets[1]), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, Method::DELETE, &format!("/sets/{}", sets[1]), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_requires_a_user() {
    let app = app();
    seed(&app).await;

    let (status, list) = call(&app, Method::GET, "/workouts?userId=user-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(1));

    let (status, body) = call(&app, Method::GET, "/workouts", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn bad_query_strings_answer_with_json_errors() {
    let app = app();

    let (status, body) = call(&app, Method::GET, "/catalog?limit=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = call(&app, Method::GET, "/exercises", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn elapsed_time_beyond_storage_range_is_rejected() {
    let app = app();
    let (id, _) = seed(&app).await;
    call(&app, Method::POST, &format!("/workouts/{id}/start"), None).await;

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/workouts/{id}/complete"),
        Some(json!({ "elapsedTime": i64::MAX as u64 + 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (_, history) = call(&app, Method::GET, "/users/user-1/workout-history", None).await;
    assert_eq!(history.as_array().map(Vec::len), Some(0));

    let (_, workout) = call(&app, Method::GET, &format!("/workouts/{id}"), None).await;
    assert_eq!(workout["status"], "IN_PROGRESS");
}

#[tokio::test]
async fn sets_and_exercises_can_be_read_back() {
    let app = app();
    let (id, sets) = seed(&app).await;

    let (status, set) = call(&app, Method::GET, &format!("/sets/{}", sets[1]), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(set["reps"], 8);
    assert_eq!(set["completed"], false);

    let (status, _) = call(&app, Method::GET, "/sets/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = call(&app, Method::GET, "/sets/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "set 999 not found");

    let (status, exercises) = call(&app, Method::GET, &format!("/exercises?workoutId={id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(exercises.as_array().map(Vec::len), Some(1));
    assert_eq!(exercises[0]["name"], "Bench Press");
    assert_eq!(exercises[0]["sets"].as_array().map(Vec::len), Some(2));

    let (status, _) = call(&app, Method::GET, "/exercises?workoutId=zero", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = call(&app, Method::GET, "/exercises?workoutId=999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "workout 999 not found");
}
