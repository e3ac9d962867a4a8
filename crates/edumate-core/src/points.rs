//! Points rules engine.
//!
//! Maps an activity category and score percentage to a coin award using the
//! configured [`PointRule`]s, then enforces the per-category daily cap at
//! award time and records the result in the ledger.
//!
//! A missing or disabled rule, or an unknown category name, is not an error:
//! it simply earns nothing.

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::model::{PointCategory, PointRule, PointTransaction, Role};
use crate::traits::{LedgerEntry, LedgerRecord, LedgerWrite, Store};

/// Coins computed for one activity, with a line per component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointsCalculation {
    pub points: i64,
    pub breakdown: Vec<String>,
}

impl PointsCalculation {
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Rule lookup and calculation over a snapshot of the configured rules.
#[derive(Debug, Clone, Default)]
pub struct PointsEngine {
    rules: Vec<PointRule>,
}

impl PointsEngine {
    pub fn new(rules: Vec<PointRule>) -> Self {
        Self { rules }
    }

    /// Snapshot the current rules from the store.
    pub async fn load(store: &dyn Store) -> Result<Self> {
        Ok(Self::new(store.list_point_rules().await?))
    }

    pub fn rules(&self) -> &[PointRule] {
        &self.rules
    }

    /// The active rule for a category: the first enabled one.
    pub fn rule_for(&self, category: PointCategory) -> Option<&PointRule> {
        self.rules
            .iter()
            .find(|r| r.category == category && r.enabled)
    }

    /// Compute the award for an activity. No enabled rule → zero, empty breakdown.
    pub fn calculate(&self, category: PointCategory, score_percentage: f64) -> PointsCalculation {
        match self.rule_for(category) {
            Some(rule) => calculate_for_rule(rule, score_percentage),
            None => PointsCalculation::zero(),
        }
    }

    /// Like [`calculate`](Self::calculate) for a category given by name.
    /// An unrecognized name earns nothing.
    pub fn calculate_named(&self, category: &str, score_percentage: f64) -> PointsCalculation {
        match category.parse::<PointCategory>() {
            Ok(category) => self.calculate(category, score_percentage),
            Err(_) => {
                tracing::debug!("no point category named '{category}'");
                PointsCalculation::zero()
            }
        }
    }
}

/// Apply one rule: base points, at most one score band, and the perfect-score bonus.
pub fn calculate_for_rule(rule: &PointRule, score_percentage: f64) -> PointsCalculation {
    let score = clamp_score(score_percentage);
    let mut points = 0i64;
    let mut breakdown = Vec::new();

    if rule.base_points > 0 {
        points += rule.base_points;
        breakdown.push(format!("Base points: {}", rule.base_points));
    }

    if let Some(range) = rule.score_ranges.iter().find(|r| r.contains(score)) {
        points += range.points;
        breakdown.push(format!(
            "Score bonus ({}-{}%): +{}",
            range.min, range.max, range.points
        ));
    }

    if score == 100.0 && rule.bonus_perfect > 0 {
        points += rule.bonus_perfect;
        breakdown.push(format!("Perfect score bonus: +{}", rule.bonus_perfect));
    }

    PointsCalculation {
        points: points.max(0),
        breakdown,
    }
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    }
}

/// Truncate a calculation to the headroom left under `daily_cap`.
///
/// `already_awarded` is the sum of positive awards in the same category for
/// the same student today. Without a cap the calculation is returned as is.
pub fn apply_daily_cap(
    mut calculation: PointsCalculation,
    daily_cap: Option<i64>,
    already_awarded: i64,
) -> PointsCalculation {
    let Some(cap) = daily_cap else {
        return calculation;
    };

    let headroom = (cap - already_awarded).max(0);
    if calculation.points <= headroom {
        return calculation;
    }

    let original = calculation.points;
    calculation.points = headroom;
    if headroom == 0 {
        calculation
            .breakdown
            .push(format!("Daily cap of {cap} reached: no points awarded"));
    } else {
        calculation.breakdown.push(format!(
            "Daily cap of {cap} reached: reduced from {original} to {headroom}"
        ));
    }
    calculation
}

/// Sum of positive amounts in `category` whose local calendar day is `today`.
pub fn awarded_on_day(
    transactions: &[PointTransaction],
    category: PointCategory,
    today: NaiveDate,
) -> i64 {
    transactions
        .iter()
        .filter(|t| t.category == category && t.amount > 0)
        .filter(|t| t.created_at.with_timezone(&Local).date_naive() == today)
        .map(|t| t.amount)
        .sum()
}

/// An activity that may earn coins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub category: PointCategory,
    #[serde(default)]
    pub score_percentage: f64,
    /// Human-readable reason stored on the ledger entry.
    pub description: String,
}

impl Activity {
    pub fn new(category: PointCategory, score_percentage: f64, description: impl Into<String>) -> Self {
        Self {
            category,
            score_percentage,
            description: description.into(),
        }
    }
}

/// Result of an award attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardOutcome {
    pub student_id: Uuid,
    pub category: PointCategory,
    /// Coins actually credited (after the daily cap).
    pub points: i64,
    pub breakdown: Vec<String>,
    pub new_balance: i64,
    /// The ledger entry written, if any coins were credited.
    pub transaction: Option<PointTransaction>,
}

/// Calculate, cap, credit and record an activity for a student.
///
/// The cap check reads today's transactions before the new one is written.
/// Two awards racing for the same student can both pass the check; nothing
/// here serializes them.
pub async fn award(
    store: &dyn Store,
    student_id: Uuid,
    activity: &Activity,
    now: DateTime<Local>,
) -> Result<AwardOutcome> {
    award_with_record(store, student_id, activity, now, None).await
}

/// [`award`], committing `record` in the same write as the coins.
pub(crate) async fn award_with_record(
    store: &dyn Store,
    student_id: Uuid,
    activity: &Activity,
    now: DateTime<Local>,
    record: Option<LedgerRecord>,
) -> Result<AwardOutcome> {
    let student = store.get_user(student_id).await?;
    ensure_student(&student)?;

    let engine = PointsEngine::load(store).await?;
    let calculation = match engine.rule_for(activity.category) {
        Some(rule) => {
            let calculation = calculate_for_rule(rule, activity.score_percentage);
            if rule.daily_cap.is_some() {
                let history = store.list_transactions(student_id).await?;
                let already = awarded_on_day(&history, activity.category, now.date_naive());
                apply_daily_cap(calculation, rule.daily_cap, already)
            } else {
                calculation
            }
        }
        None => {
            tracing::debug!(
                "no enabled rule for {}, nothing awarded to {student_id}",
                activity.category
            );
            PointsCalculation::zero()
        }
    };

    credit(
        store,
        student.coins,
        student_id,
        activity.category,
        &activity.description,
        calculation,
        now.with_timezone(&Utc),
        record,
    )
    .await
}

/// Grant (or with a negative amount, deduct) coins outside the rules.
pub async fn award_manual(
    store: &dyn Store,
    student_id: Uuid,
    amount: i64,
    reason: &str,
) -> Result<AwardOutcome> {
    let student = store.get_user(student_id).await?;
    ensure_student(&student)?;

    let calculation = PointsCalculation {
        points: amount,
        breakdown: vec![format!("Manual adjustment: {amount:+}")],
    };
    credit(
        store,
        student.coins,
        student_id,
        PointCategory::Manual,
        reason,
        calculation,
        Utc::now(),
        None,
    )
    .await
}

/// A student's ledger, newest first.
pub async fn ledger(store: &dyn Store, student_id: Uuid) -> Result<Vec<PointTransaction>> {
    let mut transactions = store.list_transactions(student_id).await?;
    transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(transactions)
}

pub(crate) fn ensure_student(user: &crate::model::User) -> Result<()> {
    if user.role != Role::Student {
        return Err(DomainError::WrongRole {
            id: user.id,
            expected: Role::Student,
            actual: user.role,
        }
        .into());
    }
    Ok(())
}

/// Write the new balance, its ledger row and `record` in one store call.
/// Zero amounts touch neither balance nor ledger, but `record` is still saved.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn credit(
    store: &dyn Store,
    current_balance: i64,
    student_id: Uuid,
    category: PointCategory,
    reason: &str,
    calculation: PointsCalculation,
    at: DateTime<Utc>,
    record: Option<LedgerRecord>,
) -> Result<AwardOutcome> {
    let entry = (calculation.points != 0).then(|| LedgerEntry {
        new_balance: current_balance + calculation.points,
        transaction: PointTransaction {
            id: Uuid::new_v4(),
            student_id,
            category,
            amount: calculation.points,
            reason: reason.to_string(),
            breakdown: calculation.breakdown.clone(),
            created_at: at,
        },
    });

    if entry.is_some() || record.is_some() {
        store
            .commit_ledger(&LedgerWrite {
                entry: entry.clone(),
                record,
            })
            .await?;
    }

    let Some(entry) = entry else {
        return Ok(AwardOutcome {
            student_id,
            category,
            points: 0,
            breakdown: calculation.breakdown,
            new_balance: current_balance,
            transaction: None,
        });
    };

    tracing::info!(
        "credited {} coins to {student_id} for {category} (balance {})",
        calculation.points,
        entry.new_balance
    );

    Ok(AwardOutcome {
        student_id,
        category,
        points: calculation.points,
        breakdown: calculation.breakdown,
        new_balance: entry.new_balance,
        transaction: Some(entry.transaction),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScoreRange;

    fn rule(category: PointCategory, base: i64) -> PointRule {
        PointRule {
            id: Uuid::new_v4(),
            category,
            name: category.to_string(),
            base_points: base,
            score_ranges: vec![],
            bonus_perfect: 0,
            daily_cap: None,
            enabled: true,
        }
    }

    fn tiered_rule() -> PointRule {
        PointRule {
            score_ranges: vec![
                ScoreRange { min: 0.0, max: 49.0, points: 5 },
                ScoreRange { min: 50.0, max: 79.0, points: 10 },
                ScoreRange { min: 80.0, max: 100.0, points: 20 },
            ],
            bonus_perfect: 15,
            ..rule(PointCategory::PracticeTest, 0)
        }
    }

    fn tx(category: PointCategory, amount: i64, created_at: DateTime<Utc>) -> PointTransaction {
        PointTransaction {
            id: Uuid::new_v4(),
            student_id: Uuid::nil(),
            category,
            amount,
            reason: String::new(),
            breakdown: vec![],
            created_at,
        }
    }

    #[test]
    fn missing_rule_earns_nothing() {
        let engine = PointsEngine::new(vec![rule(PointCategory::Reading, 5)]);
        assert_eq!(
            engine.calculate(PointCategory::MockTest, 90.0),
            PointsCalculation::zero()
        );
    }

    #[test]
    fn disabled_rule_earns_nothing() {
        let mut disabled = rule(PointCategory::Assignment, 10);
        disabled.enabled = false;
        let engine = PointsEngine::new(vec![disabled]);
        let calc = engine.calculate(PointCategory::Assignment, 100.0);
        assert_eq!(calc.points, 0);
        assert!(calc.breakdown.is_empty());
    }

    #[test]
    fn first_enabled_rule_is_active() {
        let mut disabled = rule(PointCategory::Assignment, 99);
        disabled.enabled = false;
        let engine = PointsEngine::new(vec![disabled, rule(PointCategory::Assignment, 10)]);
        assert_eq!(engine.calculate(PointCategory::Assignment, 0.0).points, 10);
    }

    #[test]
    fn unknown_category_name_earns_nothing() {
        let engine = PointsEngine::new(vec![rule(PointCategory::Bonus, 10)]);
        assert_eq!(
            engine.calculate_named("homework", 50.0),
            PointsCalculation::zero()
        );
        assert_eq!(engine.calculate_named("BONUS", 0.0).points, 10);
    }

    #[test]
    fn base_points_without_ranges_ignore_score() {
        let engine = PointsEngine::new(vec![rule(PointCategory::Assignment, 10)]);
        for score in [0.0, 37.5, 80.0, 100.0] {
            let calc = engine.calculate(PointCategory::Assignment, score);
            assert_eq!(calc.points, 10);
            assert_eq!(calc.breakdown, vec!["Base points: 10"]);
        }
    }

    #[test]
    fn score_bands_pick_single_tier() {
        let engine = PointsEngine::new(vec![tiered_rule()]);
        assert_eq!(engine.calculate(PointCategory::PracticeTest, 45.0).points, 5);
        assert_eq!(engine.calculate(PointCategory::PracticeTest, 65.0).points, 10);
        assert_eq!(engine.calculate(PointCategory::PracticeTest, 85.0).points, 20);
    }

    #[test]
    fn perfect_score_adds_bonus() {
        let engine = PointsEngine::new(vec![tiered_rule()]);
        let calc = engine.calculate(PointCategory::PracticeTest, 100.0);
        assert_eq!(calc.points, 35);
        assert_eq!(
            calc.breakdown,
            vec!["Score bonus (80-100%): +20", "Perfect score bonus: +15"]
        );
    }

    #[test]
    fn score_between_bands_gets_no_bonus() {
        let engine = PointsEngine::new(vec![tiered_rule()]);
        let calc = engine.calculate(PointCategory::PracticeTest, 49.5);
        assert_eq!(calc.points, 0);
        assert!(calc.breakdown.is_empty());
    }

    #[test]
    fn base_and_band_stack() {
        let mut r = tiered_rule();
        r.base_points = 10;
        let calc = calculate_for_rule(&r, 65.0);
        assert_eq!(calc.points, 20);
        assert_eq!(calc.breakdown.len(), 2);
    }

    #[test]
    fn out_of_range_scores_are_clamped() {
        let r = tiered_rule();
        assert_eq!(calculate_for_rule(&r, 140.0).points, 35);
        assert_eq!(calculate_for_rule(&r, -5.0).points, 5);
        assert_eq!(calculate_for_rule(&r, f64::NAN).points, 5);
    }

    #[test]
    fn daily_cap_truncates_to_headroom() {
        let calc = PointsCalculation {
            points: 20,
            breakdown: vec!["Base points: 20".into()],
        };
        let capped = apply_daily_cap(calc, Some(50), 45);
        assert_eq!(capped.points, 5);
        assert_eq!(
            capped.breakdown.last().unwrap(),
            "Daily cap of 50 reached: reduced from 20 to 5"
        );
    }

    #[test]
    fn daily_cap_exhausted_awards_zero() {
        let calc = PointsCalculation {
            points: 20,
            breakdown: vec![],
        };
        let capped = apply_daily_cap(calc, Some(50), 60);
        assert_eq!(capped.points, 0);
        assert_eq!(capped.breakdown, vec!["Daily cap of 50 reached: no points awarded"]);
    }

    #[test]
    fn daily_cap_with_room_is_untouched() {
        let calc = PointsCalculation {
            points: 5,
            breakdown: vec!["Base points: 5".into()],
        };
        assert_eq!(apply_daily_cap(calc.clone(), Some(50), 10), calc);
        assert_eq!(apply_daily_cap(calc.clone(), None, 1000), calc);
    }

    #[test]
    fn awarded_on_day_counts_positive_same_category_only() {
        let now = Utc::now();
        let today = now.with_timezone(&Local).date_naive();
        let history = vec![
            tx(PointCategory::Reading, 20, now),
            tx(PointCategory::Reading, 25, now),
            tx(PointCategory::Reading, -30, now),
            tx(PointCategory::Bonus, 100, now),
            tx(PointCategory::Reading, 40, now - chrono::Duration::days(2)),
        ];
        assert_eq!(awarded_on_day(&history, PointCategory::Reading, today), 45);
    }
}
