use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chrono::{Local, Utc};
use edumate_core::model::{PointCategory, PointRule, PointTransaction, ScoreRange};
use edumate_core::points::{apply_daily_cap, awarded_on_day, PointsEngine};
use uuid::Uuid;

fn make_rules() -> Vec<PointRule> {
    PointCategory::ALL
        .iter()
        .map(|&category| PointRule {
            id: Uuid::nil(),
            category,
            name: category.to_string(),
            base_points: 5,
            score_ranges: vec![
                ScoreRange { min: 0.0, max: 49.0, points: 5 },
                ScoreRange { min: 50.0, max: 79.0, points: 10 },
                ScoreRange { min: 80.0, max: 100.0, points: 20 },
            ],
            bonus_perfect: 15,
            daily_cap: Some(100),
            enabled: true,
        })
        .collect()
}

fn bench_calculate(c: &mut Criterion) {
    let mut group = c.benchmark_group("calculate");
    let engine = PointsEngine::new(make_rules());

    group.bench_function("tiered", |b| {
        b.iter(|| engine.calculate(black_box(PointCategory::MockTest), black_box(85.0)))
    });

    group.bench_function("perfect", |b| {
        b.iter(|| engine.calculate(black_box(PointCategory::PracticeTest), black_box(100.0)))
    });

    group.bench_function("by_name", |b| {
        b.iter(|| engine.calculate_named(black_box("practice-test"), black_box(65.0)))
    });

    group.finish();
}

fn bench_daily_cap(c: &mut Criterion) {
    let now = Utc::now();
    let today = now.with_timezone(&Local).date_naive();
    let history: Vec<PointTransaction> = (0..500)
        .map(|i| PointTransaction {
            id: Uuid::nil(),
            student_id: Uuid::nil(),
            category: PointCategory::ALL[i % PointCategory::ALL.len()],
            amount: (i % 20) as i64,
            reason: String::new(),
            breakdown: vec![],
            created_at: now - chrono::Duration::hours(i as i64),
        })
        .collect();
    let engine = PointsEngine::new(make_rules());

    c.bench_function("award_with_cap_500_tx", |b| {
        b.iter(|| {
            let calc = engine.calculate(PointCategory::Reading, 90.0);
            let already = awarded_on_day(black_box(&history), PointCategory::Reading, today);
            apply_daily_cap(calc, Some(100), already)
        })
    });
}

criterion_group!(benches, bench_calculate, bench_daily_cap);
criterion_main!(benches);
