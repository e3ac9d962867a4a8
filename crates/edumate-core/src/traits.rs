//! Core trait definitions for the record store and the generative-AI service.
//!
//! These async traits are implemented by the `edumate-store` and
//! `edumate-ai` crates respectively.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{
    PointRule, PointTransaction, QuestionBankItem, Reward, RewardRequest, StudyPlan, SubTopic,
    Subject, Test, Topic, User,
};

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// The system of record: row-level reads and writes keyed by id or foreign key.
///
/// Errors should downcast to [`StoreError`](crate::error::StoreError).
#[async_trait]
pub trait Store: Send + Sync {
    // Users
    async fn list_users(&self) -> anyhow::Result<Vec<User>>;
    async fn get_user(&self, id: Uuid) -> anyhow::Result<User>;
    /// Insert or replace every user in `users`. All-or-nothing.
    async fn save_users(&self, users: &[User]) -> anyhow::Result<()>;
    /// Overwrite a user's coin balance.
    async fn update_coins(&self, user_id: Uuid, coins: i64) -> anyhow::Result<()>;

    // Curriculum
    async fn list_subjects(&self) -> anyhow::Result<Vec<Subject>>;
    async fn list_topics(&self) -> anyhow::Result<Vec<Topic>>;
    async fn list_sub_topics(&self, topic_id: Uuid) -> anyhow::Result<Vec<SubTopic>>;
    async fn insert_subject(&self, subject: &Subject) -> anyhow::Result<()>;
    async fn insert_topic(&self, topic: &Topic) -> anyhow::Result<()>;
    async fn insert_sub_topic(&self, sub_topic: &SubTopic) -> anyhow::Result<()>;

    // Question bank
    async fn list_question_bank(&self) -> anyhow::Result<Vec<QuestionBankItem>>;
    async fn insert_question(&self, item: &QuestionBankItem) -> anyhow::Result<()>;
    /// Insert every item in one write. All-or-nothing.
    async fn insert_questions(&self, items: &[QuestionBankItem]) -> anyhow::Result<()>;

    // Tests and study plans
    async fn list_tests(&self, student_id: Option<Uuid>) -> anyhow::Result<Vec<Test>>;
    async fn get_test(&self, id: Uuid) -> anyhow::Result<Test>;
    async fn save_test(&self, test: &Test) -> anyhow::Result<()>;
    async fn list_study_plans(&self, student_id: Uuid) -> anyhow::Result<Vec<StudyPlan>>;
    async fn get_study_plan(&self, id: Uuid) -> anyhow::Result<StudyPlan>;
    async fn save_study_plan(&self, plan: &StudyPlan) -> anyhow::Result<()>;

    // Points ledger
    async fn list_point_rules(&self) -> anyhow::Result<Vec<PointRule>>;
    async fn save_point_rule(&self, rule: &PointRule) -> anyhow::Result<()>;
    async fn list_transactions(&self, student_id: Uuid) -> anyhow::Result<Vec<PointTransaction>>;
    async fn insert_transaction(&self, transaction: &PointTransaction) -> anyhow::Result<()>;
    /// Apply a balance change, its ledger row and the record that caused them
    /// as one write. All-or-nothing.
    async fn commit_ledger(&self, write: &LedgerWrite) -> anyhow::Result<()>;

    // Rewards
    async fn list_rewards(&self) -> anyhow::Result<Vec<Reward>>;
    async fn get_reward(&self, id: Uuid) -> anyhow::Result<Reward>;
    async fn save_reward(&self, reward: &Reward) -> anyhow::Result<()>;
    async fn list_reward_requests(&self) -> anyhow::Result<Vec<RewardRequest>>;
    async fn get_reward_request(&self, id: Uuid) -> anyhow::Result<RewardRequest>;
    async fn save_reward_request(&self, request: &RewardRequest) -> anyhow::Result<()>;
}

/// New balance plus the transaction that explains it.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub new_balance: i64,
    pub transaction: PointTransaction,
}

/// A record whose state change goes with a ledger entry.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerRecord {
    RewardRequest(RewardRequest),
    Test(Test),
    StudyPlan(StudyPlan),
}

/// One [`Store::commit_ledger`] call. Either part may be absent: a zero award
/// still completes its test, and a manual adjustment resolves nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerWrite {
    pub entry: Option<LedgerEntry>,
    pub record: Option<LedgerRecord>,
}

// ---------------------------------------------------------------------------
// AI provider trait
// ---------------------------------------------------------------------------

/// Trait for generative-AI backends that answer a prompt with JSON matching a schema.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Human-readable provider name (e.g. "gemini").
    fn name(&self) -> &str;

    /// Generate a JSON document for the prompt, shaped by `request.schema`.
    async fn generate_json(&self, request: &StructuredRequest) -> anyhow::Result<StructuredResponse>;
}

/// Request for structured (JSON) output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredRequest {
    /// Model identifier (e.g. "gemini-2.5-flash").
    pub model: String,
    /// The main prompt.
    pub prompt: String,
    /// Optional system instruction override.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// JSON schema the response must follow.
    pub schema: serde_json::Value,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

/// Response to a structured generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredResponse {
    /// The raw response text.
    pub content: String,
    /// Model that actually generated the response.
    pub model: String,
    /// Token usage.
    pub token_usage: TokenUsage,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Default system instruction for curriculum generation.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an experienced curriculum designer for school students. Respond ONLY with JSON that matches the provided schema.";

// ---------------------------------------------------------------------------
// JSON extraction
// ---------------------------------------------------------------------------

/// Extract the JSON payload from a model response.
///
/// Handles:
/// - A ```json``` fenced block (preferred)
/// - A generic ``` fenced block
/// - Raw JSON with surrounding prose (first `{`/`[` to the matching last `}`/`]`)
pub fn extract_json(response: &str) -> String {
    let mut json_block = None;
    let mut generic_block = None;
    let mut in_block = false;
    let mut is_json_block = false;
    let mut current = String::new();

    for line in response.lines() {
        let trimmed = line.trim();

        if !in_block && trimmed.starts_with("```") {
            in_block = true;
            let lang = trimmed.trim_start_matches('`').trim().to_lowercase();
            is_json_block = lang == "json";
            current.clear();
            continue;
        }

        if in_block && trimmed == "```" {
            in_block = false;
            if is_json_block && json_block.is_none() {
                json_block = Some(current.clone());
            } else if generic_block.is_none() {
                generic_block = Some(current.clone());
            }
            continue;
        }

        if in_block {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
        }
    }

    if let Some(block) = json_block.or(generic_block) {
        return block.trim().to_string();
    }

    let trimmed = response.trim();
    let start = trimmed.find(['{', '[']);
    let end = trimmed.rfind(['}', ']']);
    match (start, end) {
        (Some(s), Some(e)) if e > s => trimmed[s..=e].to_string(),
        _ => trimmed.to_string(),
    }
}
