//! Default point rules and a starter curriculum for a fresh data file.

use anyhow::Result;
use uuid::Uuid;

use edumate_core::curriculum;
use edumate_core::model::{Difficulty, PointCategory, PointRule, ScoreRange};
use edumate_core::traits::Store;

/// What [`seed_defaults`] added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub rules_added: usize,
    pub subjects_added: usize,
    pub topics_added: usize,
}

fn band(min: f64, max: f64, points: i64) -> ScoreRange {
    ScoreRange { min, max, points }
}

/// The rule set a new installation starts with.
pub fn default_point_rules() -> Vec<PointRule> {
    vec![
        PointRule {
            id: Uuid::new_v4(),
            category: PointCategory::Assignment,
            name: "Assignment completed".into(),
            base_points: 10,
            score_ranges: Vec::new(),
            bonus_perfect: 0,
            daily_cap: Some(50),
            enabled: true,
        },
        PointRule {
            id: Uuid::new_v4(),
            category: PointCategory::PracticeTest,
            name: "Practice test".into(),
            base_points: 0,
            score_ranges: vec![
                band(0.0, 49.99, 5),
                band(50.0, 79.99, 10),
                band(80.0, 100.0, 20),
            ],
            bonus_perfect: 15,
            daily_cap: Some(100),
            enabled: true,
        },
        PointRule {
            id: Uuid::new_v4(),
            category: PointCategory::MockTest,
            name: "Mock test".into(),
            base_points: 20,
            score_ranges: vec![
                band(0.0, 59.99, 10),
                band(60.0, 84.99, 25),
                band(85.0, 100.0, 50),
            ],
            bonus_perfect: 25,
            daily_cap: None,
            enabled: true,
        },
        PointRule {
            id: Uuid::new_v4(),
            category: PointCategory::Reading,
            name: "Study session".into(),
            base_points: 5,
            score_ranges: Vec::new(),
            bonus_perfect: 0,
            daily_cap: Some(30),
            enabled: true,
        },
        PointRule {
            id: Uuid::new_v4(),
            category: PointCategory::Bonus,
            name: "Teacher bonus".into(),
            base_points: 10,
            score_ranges: Vec::new(),
            bonus_perfect: 0,
            daily_cap: None,
            enabled: true,
        },
    ]
}

/// Subjects and their topics, in display order.
pub fn sample_curriculum() -> Vec<(&'static str, Difficulty, Vec<(&'static str, Difficulty)>)> {
    vec![
        (
            "Mathematics",
            Difficulty::Medium,
            vec![
                ("Fractions", Difficulty::Easy),
                ("Decimals", Difficulty::Medium),
                ("Geometry", Difficulty::Hard),
            ],
        ),
        (
            "English",
            Difficulty::Medium,
            vec![
                ("Grammar", Difficulty::Easy),
                ("Comprehension", Difficulty::Medium),
            ],
        ),
        (
            "Science",
            Difficulty::Medium,
            vec![
                ("Living Things", Difficulty::Easy),
                ("Forces", Difficulty::Medium),
            ],
        ),
    ]
}

/// Add a rule for every category that has none, and the sample curriculum
/// when `with_curriculum` is set and no subjects exist yet. Safe to run twice.
pub async fn seed_defaults(store: &dyn Store, with_curriculum: bool) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    let existing = store.list_point_rules().await?;
    for rule in default_point_rules() {
        if existing.iter().any(|r| r.category == rule.category) {
            continue;
        }
        store.save_point_rule(&rule).await?;
        report.rules_added += 1;
    }

    if with_curriculum && store.list_subjects().await?.is_empty() {
        for (name, difficulty, topics) in sample_curriculum() {
            let subject = curriculum::add_subject(store, name, difficulty).await?;
            report.subjects_added += 1;
            for (topic, difficulty) in topics {
                curriculum::add_topic(store, subject.id, topic, difficulty, "").await?;
                report.topics_added += 1;
            }
        }
    }

    tracing::info!(
        "seeded {} rules, {} subjects, {} topics",
        report.rules_added,
        report.subjects_added,
        report.topics_added
    );
    Ok(report)
}
