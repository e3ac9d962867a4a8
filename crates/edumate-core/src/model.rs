//! Core data model types for edumate.
//!
//! These are the plain records the rest of the system reads and writes
//! through the [`Store`](crate::traits::Store) trait: users and their links,
//! the subject/topic curriculum, the question bank, tests, study plans and
//! the points ledger.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// The four account roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Parent,
    Teacher,
    Student,
}

impl Role {
    /// Whether a user with this role may be linked to a student.
    pub fn supervises_students(self) -> bool {
        matches!(self, Role::Parent | Role::Teacher)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Parent => write!(f, "parent"),
            Role::Teacher => write!(f, "teacher"),
            Role::Student => write!(f, "student"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "parent" => Ok(Role::Parent),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// An account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    /// Parent/teacher ↔ student links. Should be mirrored on the other side.
    #[serde(default)]
    pub linked_ids: Vec<Uuid>,
    /// Current coin balance.
    #[serde(default)]
    pub coins: i64,
    /// School grade, students only.
    #[serde(default)]
    pub grade: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            role,
            linked_ids: Vec::new(),
            coins: 0,
            grade: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_linked_to(&self, other: Uuid) -> bool {
        self.linked_ids.contains(&other)
    }
}

// ---------------------------------------------------------------------------
// Curriculum
// ---------------------------------------------------------------------------

/// Difficulty tag shared by curriculum nodes, bank items and generated quizzes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Mixed,
}

impl Difficulty {
    /// Lenient parse used for imported data: anything unrecognized is `Medium`.
    pub fn normalize(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Medium => write!(f, "Medium"),
            Difficulty::Hard => write!(f, "Hard"),
            Difficulty::Mixed => write!(f, "Mixed"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "mixed" => Ok(Difficulty::Mixed),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
}

/// A topic always belongs to exactly one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTopic {
    pub id: Uuid,
    pub topic_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub order: u32,
}

// ---------------------------------------------------------------------------
// Question bank
// ---------------------------------------------------------------------------

/// Tag attached to every question created by the CSV importer.
pub const BULK_UPLOAD_TAG: &str = "Bulk Upload";

/// A four-option multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionBankItem {
    pub id: Uuid,
    pub topic_id: Uuid,
    pub question: String,
    pub options: [String; 4],
    /// 0-based index into `options`.
    pub correct_index: u8,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl QuestionBankItem {
    /// Key used to detect the same question being added twice under a topic.
    pub fn dedup_key(&self) -> (Uuid, String) {
        (self.topic_id, normalize_question(&self.question))
    }
}

/// Trimmed, lowercased question text.
pub fn normalize_question(text: &str) -> String {
    text.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Tests and study plans
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestKind {
    /// Initial diagnostic establishing a starting proficiency per topic.
    Baseline,
    Practice,
    /// Full-length multi-subject exam under exam conditions.
    Mock,
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestKind::Baseline => write!(f, "baseline"),
            TestKind::Practice => write!(f, "practice"),
            TestKind::Mock => write!(f, "mock"),
        }
    }
}

impl FromStr for TestKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "baseline" => Ok(TestKind::Baseline),
            "practice" => Ok(TestKind::Practice),
            "mock" => Ok(TestKind::Mock),
            other => Err(format!("unknown test kind: {other}")),
        }
    }
}

/// A question as frozen into a test at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestQuestion {
    pub topic_id: Uuid,
    pub question: String,
    pub options: [String; 4],
    pub correct_index: u8,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl From<&QuestionBankItem> for TestQuestion {
    fn from(item: &QuestionBankItem) -> Self {
        Self {
            topic_id: item.topic_id,
            question: item.question.clone(),
            options: item.options.clone(),
            correct_index: item.correct_index,
            explanation: item.explanation.clone(),
        }
    }
}

/// A set of questions assigned to a student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Test {
    pub id: Uuid,
    pub student_id: Uuid,
    pub title: String,
    pub kind: TestKind,
    #[serde(default)]
    pub topic_ids: Vec<Uuid>,
    pub questions: Vec<TestQuestion>,
    /// Recorded answers, one slot per question.
    #[serde(default)]
    pub answers: Vec<Option<u8>>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub score_percentage: Option<f64>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// A scheduled, non-test study assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyPlan {
    pub id: Uuid,
    pub student_id: Uuid,
    pub topic_id: Uuid,
    pub title: String,
    pub scheduled_for: NaiveDate,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default)]
    pub completed: bool,
}

// ---------------------------------------------------------------------------
// Points and rewards
// ---------------------------------------------------------------------------

/// Activity categories that earn coins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointCategory {
    Assignment,
    PracticeTest,
    MockTest,
    Reading,
    Bonus,
    Manual,
}

impl PointCategory {
    pub const ALL: [PointCategory; 6] = [
        PointCategory::Assignment,
        PointCategory::PracticeTest,
        PointCategory::MockTest,
        PointCategory::Reading,
        PointCategory::Bonus,
        PointCategory::Manual,
    ];
}

impl fmt::Display for PointCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointCategory::Assignment => write!(f, "assignment"),
            PointCategory::PracticeTest => write!(f, "practice_test"),
            PointCategory::MockTest => write!(f, "mock_test"),
            PointCategory::Reading => write!(f, "reading"),
            PointCategory::Bonus => write!(f, "bonus"),
            PointCategory::Manual => write!(f, "manual"),
        }
    }
}

impl FromStr for PointCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c })
            .collect();
        match key.as_str() {
            "assignment" => Ok(PointCategory::Assignment),
            "practice_test" => Ok(PointCategory::PracticeTest),
            "mock_test" => Ok(PointCategory::MockTest),
            "reading" => Ok(PointCategory::Reading),
            "bonus" => Ok(PointCategory::Bonus),
            "manual" => Ok(PointCategory::Manual),
            _ => Err(format!("unknown point category: {}", s.trim())),
        }
    }
}

/// An inclusive percentage band with its own bonus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
    pub points: i64,
}

impl ScoreRange {
    pub fn contains(&self, score: f64) -> bool {
        score >= self.min && score <= self.max
    }
}

/// Maps an activity category to a coin-reward formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRule {
    pub id: Uuid,
    pub category: PointCategory,
    pub name: String,
    #[serde(default)]
    pub base_points: i64,
    /// Assumed non-overlapping; the first match wins.
    #[serde(default)]
    pub score_ranges: Vec<ScoreRange>,
    #[serde(default)]
    pub bonus_perfect: i64,
    #[serde(default)]
    pub daily_cap: Option<i64>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// One ledger entry. Negative amounts are redemptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointTransaction {
    pub id: Uuid,
    pub student_id: Uuid,
    pub category: PointCategory,
    pub amount: i64,
    pub reason: String,
    #[serde(default)]
    pub breakdown: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A parent-defined reward that coins can be redeemed for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub name: String,
    pub cost: i64,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestStatus::Pending => write!(f, "pending"),
            RequestStatus::Approved => write!(f, "approved"),
            RequestStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// An approval-gated redemption of coins for a reward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardRequest {
    pub id: Uuid,
    pub student_id: Uuid,
    pub reward_id: Uuid,
    /// Cost at the time of the request.
    pub cost: i64,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved_by: Option<Uuid>,
}
