//! Test assignment, grading and study plans.
//!
//! Submitting a test or completing a study plan feeds the result into the
//! points engine.

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::model::{PointCategory, QuestionBankItem, StudyPlan, Test, TestKind, TestQuestion};
use crate::points::{award_with_record, Activity, AwardOutcome};
use crate::traits::{LedgerRecord, Store};

/// Score of a graded test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub correct: usize,
    pub total: usize,
    pub percentage: f64,
}

impl TestKind {
    /// Ledger category a completed test of this kind earns in.
    pub fn point_category(self) -> PointCategory {
        match self {
            TestKind::Baseline | TestKind::Practice => PointCategory::PracticeTest,
            TestKind::Mock => PointCategory::MockTest,
        }
    }
}

/// Assemble a test from the bank: up to `count` items on the given topics,
/// in bank order.
pub fn build_test_from_bank(
    student_id: Uuid,
    kind: TestKind,
    title: &str,
    topic_ids: &[Uuid],
    bank: &[QuestionBankItem],
    count: usize,
) -> Test {
    let questions: Vec<TestQuestion> = bank
        .iter()
        .filter(|item| topic_ids.contains(&item.topic_id))
        .take(count)
        .map(TestQuestion::from)
        .collect();

    Test {
        id: Uuid::new_v4(),
        student_id,
        title: title.to_string(),
        kind,
        topic_ids: topic_ids.to_vec(),
        answers: vec![None; questions.len()],
        questions,
        completed: false,
        score_percentage: None,
        created_at: Utc::now(),
        completed_at: None,
    }
}

/// Grade answers against a test. Missing or out-of-range answers are wrong.
pub fn grade_test(test: &Test, answers: &[Option<u8>]) -> TestOutcome {
    let total = test.questions.len();
    let correct = test
        .questions
        .iter()
        .zip(answers.iter().chain(std::iter::repeat(&None)))
        .filter(|(q, a)| **a == Some(q.correct_index))
        .count();
    let percentage = if total == 0 {
        0.0
    } else {
        (correct as f64 / total as f64 * 1000.0).round() / 10.0
    };

    TestOutcome {
        correct,
        total,
        percentage,
    }
}

/// Store a new test for its student.
pub async fn assign_test(store: &dyn Store, test: &Test) -> Result<()> {
    anyhow::ensure!(!test.questions.is_empty(), "test '{}' has no questions", test.title);
    let student = store.get_user(test.student_id).await?;
    crate::points::ensure_student(&student)?;
    store.save_test(test).await?;
    tracing::info!(
        "assigned {} test '{}' ({} questions) to {}",
        test.kind,
        test.title,
        test.questions.len(),
        student.name
    );
    Ok(())
}

/// Record answers, grade, complete and award points for a test.
///
/// The completed test and the award are written together, so a failed write
/// leaves the test open for another submission.
pub async fn submit_test(
    store: &dyn Store,
    test_id: Uuid,
    answers: &[Option<u8>],
    now: DateTime<Local>,
) -> Result<(TestOutcome, AwardOutcome)> {
    let mut test = store.get_test(test_id).await?;
    if test.completed {
        return Err(DomainError::TestCompleted(test_id).into());
    }

    let outcome = grade_test(&test, answers);
    let mut recorded = answers.to_vec();
    recorded.resize(test.questions.len(), None);
    test.answers = recorded;
    test.completed = true;
    test.score_percentage = Some(outcome.percentage);
    test.completed_at = Some(now.with_timezone(&Utc));

    let activity = Activity::new(
        test.kind.point_category(),
        outcome.percentage,
        format!("{} test: {}", test.kind, test.title),
    );
    let student_id = test.student_id;
    let awarded =
        award_with_record(store, student_id, &activity, now, Some(LedgerRecord::Test(test)))
            .await?;
    Ok((outcome, awarded))
}

/// Schedule a study session.
pub async fn schedule_study_plan(
    store: &dyn Store,
    student_id: Uuid,
    topic_id: Uuid,
    title: &str,
    scheduled_for: NaiveDate,
    duration_minutes: u32,
) -> Result<StudyPlan> {
    let student = store.get_user(student_id).await?;
    crate::points::ensure_student(&student)?;

    let plan = StudyPlan {
        id: Uuid::new_v4(),
        student_id,
        topic_id,
        title: title.to_string(),
        scheduled_for,
        duration_minutes,
        completed: false,
    };
    store.save_study_plan(&plan).await?;
    Ok(plan)
}

/// Mark a study plan done and award reading points. Completing twice awards nothing more.
pub async fn complete_study_plan(
    store: &dyn Store,
    plan_id: Uuid,
    now: DateTime<Local>,
) -> Result<Option<AwardOutcome>> {
    let mut plan = store.get_study_plan(plan_id).await?;
    if plan.completed {
        return Ok(None);
    }
    plan.completed = true;

    let activity = Activity::new(
        PointCategory::Reading,
        0.0,
        format!("Study plan: {}", plan.title),
    );
    let student_id = plan.student_id;
    let awarded = award_with_record(
        store,
        student_id,
        &activity,
        now,
        Some(LedgerRecord::StudyPlan(plan)),
    )
    .await?;
    Ok(Some(awarded))
}
