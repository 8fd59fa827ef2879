use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use gymlog::{
    clock::{Clock, ManualClock},
    core::lifecycle::{LifecycleConfig, LifecycleManager},
    persist::memory::MemoryGateway,
    types::WorkoutStatus,
    workout::Workout,
};

#[derive(Debug, Clone)]
enum Action {
    Start { target: u8 },
    CompleteSet { target: u8, set: u8 },
    Complete { target: u8, hint: Option<u16> },
    Reset { target: u8 },
    Wait { secs: u16 },
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        (0u8..3).prop_map(|target| Action::Start { target }),
        (0u8..3, 0u8..8).prop_map(|(target, set)| Action::CompleteSet { target, set }),
        (0u8..3, proptest::option::of(0u16..4000))
            .prop_map(|(target, hint)| Action::Complete { target, hint }),
        (0u8..3).prop_map(|target| Action::Reset { target }),
        (1u16..900).prop_map(|secs| Action::Wait { secs }),
    ]
}

fn check_invariants(workout: &Workout) -> Result<(), TestCaseError> {
    match workout.status {
        WorkoutStatus::InProgress => prop_assert!(workout.started_at.is_some()),
        WorkoutStatus::Draft => {
            prop_assert!(workout.started_at.is_none());
            prop_assert!(workout.completed_at.is_none());
            prop_assert!(workout.duration.is_none());
        }
    }
    for set in workout.sets() {
        if !set.completed {
            prop_assert!(set.completed_at.is_none());
        }
    }
    let orders: Vec<u32> = workout.exercises.iter().map(|e| e.order).collect();
    let expected: Vec<u32> = (0..workout.exercises.len() as u32).collect();
    prop_assert_eq!(orders, expected);
    Ok(())
}

proptest! {
    #[test]
    fn random_sessions_keep_invariants_and_history_count(actions in prop::collection::vec(action_strategy(), 1..120)) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 6, 0, 0).unwrap());
        let mut manager = LifecycleManager::with_clock(MemoryGateway::new(), clock.clone(), LifecycleConfig::default());

        let mut ids = Vec::new();
        for w in 0..3u32 {
            let workout = manager.create_workout("athlete", &format!("Workout {w}"), None).expect("create");
            for e in 0..=w {
                let exercise = manager.add_exercise(workout.id, &format!("Exercise {e}")).expect("exercise");
                for reps in 0..=(e + 1) {
                    manager.add_set(exercise.id, 5 + reps, None, None).expect("set");
                }
            }
            ids.push(workout.id);
        }

        let mut completes = 0usize;
        for action in actions {
            match action {
                Action::Start { target } => {
                    let id = ids[usize::from(target)];
                    let before = manager.get_workout(id).expect("read");
                    let after = manager.start(id).expect("start");
                    if before.status == WorkoutStatus::InProgress {
                        prop_assert_eq!(after.started_at, before.started_at);
                    } else {
                        prop_assert_eq!(after.started_at, Some(clock.now()));
                    }
                }
                Action::CompleteSet { target, set } => {
                    let workout = manager.get_workout(ids[usize::from(target)]).expect("read");
                    let sets: Vec<i64> = workout.sets().map(|s| s.id).collect();
                    let id = sets[usize::from(set) % sets.len()];
                    let done = manager.complete_set(id).expect("complete set");
                    prop_assert!(done.completed);
                }
                Action::Complete { target, hint } => {
                    let id = ids[usize::from(target)];
                    let before = manager.get_workout(id).expect("read");
                    let tally = before.set_tally();
                    let done = manager.complete(id, hint.map(u64::from)).expect("complete");
                    completes += 1;

                    prop_assert_eq!(done.session.total_sets, tally.total_sets);
                    prop_assert_eq!(done.session.completed_sets, tally.completed_sets);
                    prop_assert_eq!(done.workout.status, WorkoutStatus::Draft);
                    prop_assert!(done.workout.sets().all(|s| !s.completed));
                    if let Some(h) = hint.filter(|h| *h > 0) {
                        prop_assert_eq!(done.session.duration, u64::from(h));
                    } else if before.started_at.is_none() {
                        prop_assert_eq!(done.session.duration, 0);
                    }
                }
                Action::Reset { target } => {
                    let reset = manager.reset(ids[usize::from(target)]).expect("reset");
                    prop_assert_eq!(reset.status, WorkoutStatus::Draft);
                }
                Action::Wait { secs } => clock.advance(Duration::seconds(i64::from(secs))),
            }

            for id in &ids {
                check_invariants(&manager.get_workout(*id).expect("read"))?;
            }
            prop_assert_eq!(manager.history("athlete").expect("history").len(), completes);
        }
    }
}
