use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use gymlog::{
    core::lifecycle::LifecycleManager,
    persist::{memory::MemoryGateway, sqlite::SqliteGateway, Gateway},
    types::{SetId, WorkoutId},
};

fn build<G: Gateway>(manager: &mut LifecycleManager<G>, exercises: u32, sets_each: u32) -> (WorkoutId, Vec<SetId>) {
    let workout = manager
        .create_workout("bench", "Full Body", None)
        .expect("create");
    let mut sets = Vec::new();
    for e in 0..exercises {
        let exercise = manager
            .add_exercise(workout.id, &format!("Exercise {e}"))
            .expect("exercise");
        for s in 0..sets_each {
            let set = manager
                .add_set(exercise.id, 8 + s, Some(40.0 + f64::from(s)), None)
                .expect("set");
            sets.push(set.id);
        }
    }
    (workout.id, sets)
}

fn bench_session_memory(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_memory");
    for exercises in [1u32, 8, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(exercises), &exercises, |b, &exercises| {
            let mut manager = LifecycleManager::new(MemoryGateway::new());
            let (id, sets) = build(&mut manager, exercises, 4);
            b.iter(|| {
                manager.start(id).expect("start");
                for set in sets.iter().step_by(2) {
                    manager.complete_set(*set).expect("complete set");
                }
                manager.complete(id, Some(600)).expect("complete");
            });
        });
    }
    group.finish();
}

fn bench_session_sqlite(c: &mut Criterion) {
    c.bench_function("session_sqlite_8x4", |b| {
        let gateway = SqliteGateway::open_in_memory().expect("open sqlite");
        let mut manager = LifecycleManager::new(gateway);
        let (id, sets) = build(&mut manager, 8, 4);
        b.iter(|| {
            manager.start(id).expect("start");
            for set in sets.iter().step_by(2) {
                manager.complete_set(*set).expect("complete set");
            }
            manager.complete(id, None).expect("complete");
        });
    });
}

fn bench_reset(c: &mut Criterion) {
    c.bench_function("reset_sqlite_8x4", |b| {
        let gateway = SqliteGateway::open_in_memory().expect("open sqlite");
        let mut manager = LifecycleManager::new(gateway);
        let (id, _) = build(&mut manager, 8, 4);
        b.iter(|| {
            manager.start(id).expect("start");
            manager.reset(id).expect("reset");
        });
    });
}

criterion_group!(benches, bench_session_memory, bench_session_sqlite, bench_reset);
criterion_main!(benches);
