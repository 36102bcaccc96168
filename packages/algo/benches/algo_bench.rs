//! Benchmark suite for recall-algo
//!
//! Run with: cargo bench

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use recall_algo::{MemoryModel, Rating, ReviewState, Scheduler, SchedulerParams};

fn review_model(stability: f64, difficulty: f64) -> MemoryModel {
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    MemoryModel {
        state: ReviewState::Review,
        due: now,
        stability,
        difficulty,
        elapsed_days: 0,
        scheduled_days: 10,
        learning_steps: 0,
        reps: 20,
        lapses: 1,
        last_review: Some(now - Duration::days(10)),
    }
}

fn bench_commit(c: &mut Criterion) {
    let scheduler = Scheduler::new(SchedulerParams::default());
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let model = review_model(10.0, 5.0);

    c.bench_function("Scheduler::commit review/good", |b| {
        b.iter(|| scheduler.commit(black_box(&model), Rating::Good, now))
    });
}

fn bench_preview(c: &mut Criterion) {
    let scheduler = Scheduler::new(SchedulerParams::default());
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let model = review_model(10.0, 5.0);

    c.bench_function("Scheduler::preview", |b| {
        b.iter(|| scheduler.preview(black_box(&model), now))
    });
}

fn bench_batch_preview(c: &mut Criterion) {
    let scheduler = Scheduler::new(SchedulerParams::default());
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let models: Vec<MemoryModel> = (0..512)
        .map(|i| review_model(1.0 + f64::from(i) * 0.5, 1.0 + f64::from(i % 9)))
        .collect();

    c.bench_function("Scheduler::batch_preview 512", |b| {
        b.iter(|| scheduler.batch_preview(black_box(&models), now))
    });
}

criterion_group!(benches, bench_commit, bench_preview, bench_batch_preview);
criterion_main!(benches);
