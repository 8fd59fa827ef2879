use std::io::Write;

use chrono::Utc;
use tempfile::NamedTempFile;

use gymlog::{
    catalog::ExerciseCatalog,
    types::WorkoutStatus,
    workout::{Exercise, Workout},
};

const SAMPLE: &str = r#"[
  {
    "name": "Barbell Squat",
    "force": "push",
    "level": "intermediate",
    "mechanic": "compound",
    "equipment": "barbell",
    "primaryMuscles": ["quadriceps"],
    "secondaryMuscles": ["glutes", "hamstrings"],
    "instructions": ["Brace.", "Sit down and back.", "Drive up."],
    "category": "strength",
    "images": ["Barbell_Squat/0.jpg", "Barbell_Squat/1.jpg"]
  },
  {
    "name": "Plank",
    "force": "static",
    "level": "beginner",
    "mechanic": null,
    "equipment": null,
    "primaryMuscles": [],
    "secondaryMuscles": [],
    "instructions": [],
    "category": "strength",
    "images": []
  }
]"#;

fn workout_with(names: &[&str]) -> Workout {
    Workout {
        id: 1,
        user_id: "user-1".into(),
        name: "Legs".into(),
        notes: None,
        date: Utc::now(),
        status: WorkoutStatus::Draft,
        started_at: None,
        completed_at: None,
        duration: None,
        exercises: names
            .iter()
            .enumerate()
            .map(|(i, name)| Exercise {
                id: i as i64 + 1,
                workout_id: 1,
                name: (*name).into(),
                order: i as u32,
                sets: Vec::new(),
            })
            .collect(),
    }
}

#[test]
fn lookup_is_case_insensitive_and_fills_muscle_group() {
    let catalog = ExerciseCatalog::from_json(SAMPLE.as_bytes()).expect("parse");
    assert_eq!(catalog.len(), 2);

    let squat = catalog.lookup("  barbell SQUAT ");
    assert_eq!(squat.equipment, "barbell");
    assert_eq!(squat.muscle_group, "quadriceps");
    assert_eq!(squat.images.len(), 2);

    let plank = catalog.lookup("Plank");
    assert_eq!(plank.mechanic, "");
    assert_eq!(plank.equipment, "");
    assert_eq!(plank.muscle_group, "");
}

#[test]
fn unknown_names_and_missing_files_degrade_to_empty() {
    let catalog = ExerciseCatalog::from_json(SAMPLE.as_bytes()).expect("parse");
    assert_eq!(catalog.lookup("Zercher Carry"), Default::default());

    let missing = ExerciseCatalog::load_or_empty(Some(std::path::Path::new("/nonexistent/catalog.json")));
    assert!(missing.is_empty());

    let mut broken = NamedTempFile::new().expect("tempfile");
    broken.write_all(b"{ not an array").expect("write");
    assert!(ExerciseCatalog::load_or_empty(Some(broken.path())).is_empty());

    let mut good = NamedTempFile::new().expect("tempfile");
    good.write_all(SAMPLE.as_bytes()).expect("write");
    assert_eq!(ExerciseCatalog::load_or_empty(Some(good.path())).len(), 2);
}

#[test]
fn enrich_merges_details_without_touching_workout_fields() {
    let catalog = ExerciseCatalog::from_json(SAMPLE.as_bytes()).expect("parse");
    let value = catalog
        .enrich(&workout_with(&["Barbell Squat", "Mystery Move"]))
        .expect("enrich");

    let exercises = value["exercises"].as_array().expect("exercises");
    assert_eq!(exercises[0]["name"], "Barbell Squat");
    assert_eq!(exercises[0]["level"], "intermediate");
    assert_eq!(exercises[0]["primaryMuscles"][0], "quadriceps");
    assert_eq!(exercises[0]["order"], 0);
    assert_eq!(exercises[1]["name"], "Mystery Move");
    assert_eq!(exercises[1]["equipment"], "");
    assert_eq!(value["status"], "DRAFT");
}

#[test]
fn search_respects_query_and_limit() {
    let catalog = ExerciseCatalog::from_json(SAMPLE.as_bytes()).expect("parse");
    assert_eq!(catalog.search("squat", 10).len(), 1);
    assert_eq!(catalog.search("", 10).len(), 2);
    assert_eq!(catalog.search("", 1).len(), 1);
    assert!(catalog.search("deadlift", 10).is_empty());
}
