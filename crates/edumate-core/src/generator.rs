//! AI-backed curriculum, quiz and performance-analysis generation.
//!
//! Every call sends a prompt plus a JSON schema to the configured
//! [`AiProvider`]. If no provider is configured, the call fails, or the
//! answer cannot be parsed into a valid result, the generator returns
//! deterministic placeholder content labelled `[Sample]` instead of an
//! error. Calls are not retried.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::model::Difficulty;
use crate::traits::{extract_json, AiProvider, StructuredRequest, DEFAULT_SYSTEM_PROMPT};

/// Prefix on every piece of fallback content.
pub const SAMPLE_LABEL: &str = "[Sample]";

/// Where a generated result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationSource {
    Ai,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generated<T> {
    pub source: GenerationSource,
    pub value: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedTopic {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub sub_topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: u8,
    #[serde(default)]
    pub explanation: String,
}

/// Input to a performance analysis: one line per test taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicResult {
    pub topic: String,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapStep {
    pub week: u32,
    pub focus: String,
    #[serde(default)]
    pub activities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceAnalysis {
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub roadmap: Vec<RoadmapStep>,
}

#[derive(Deserialize)]
struct TopicsEnvelope {
    topics: Vec<GeneratedTopic>,
}

#[derive(Deserialize)]
struct QuizEnvelope {
    questions: Vec<GeneratedQuestion>,
}

/// Generation settings.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.7,
            max_tokens: 4096,
        }
    }
}

pub struct CurriculumGenerator {
    provider: Option<Arc<dyn AiProvider>>,
    config: GeneratorConfig,
}

impl CurriculumGenerator {
    pub fn new(provider: Option<Arc<dyn AiProvider>>, config: GeneratorConfig) -> Self {
        Self { provider, config }
    }

    /// A generator that always answers with placeholder content.
    pub fn offline() -> Self {
        Self::new(None, GeneratorConfig::default())
    }

    /// Propose `count` topics for a subject at a grade level.
    pub async fn generate_topics(
        &self,
        subject: &str,
        grade: &str,
        count: usize,
    ) -> Generated<Vec<GeneratedTopic>> {
        let prompt = format!(
            "List {count} curriculum topics for the subject \"{subject}\" at grade {grade}, \
             in teaching order. Give each a short description, a difficulty \
             (Easy, Medium or Hard) and two to four sub-topics."
        );
        let result = self
            .ask::<TopicsEnvelope>(prompt, topics_schema())
            .await
            .and_then(|env| validate_topics(env.topics));
        self.settle(result, "topics", || fallback_topics(subject, count))
    }

    /// Write `count` multiple-choice questions on a topic.
    pub async fn generate_quiz(
        &self,
        topic: &str,
        difficulty: Difficulty,
        count: usize,
    ) -> Generated<Vec<GeneratedQuestion>> {
        let prompt = format!(
            "Write {count} multiple-choice questions on \"{topic}\" at {difficulty} difficulty. \
             Each has exactly four options, the 0-based index of the correct option and a \
             one-sentence explanation."
        );
        let result = self
            .ask::<QuizEnvelope>(prompt, quiz_schema())
            .await
            .and_then(|env| validate_questions(env.questions));
        self.settle(result, "quiz", || fallback_quiz(topic, count))
    }

    /// Summarize strengths and weaknesses and propose a study roadmap.
    pub async fn analyze_performance(
        &self,
        student_name: &str,
        results: &[TopicResult],
    ) -> Generated<PerformanceAnalysis> {
        let lines: Vec<String> = results
            .iter()
            .map(|r| format!("- {}: {:.0}%", r.topic, r.percentage))
            .collect();
        let prompt = format!(
            "Here are {student_name}'s recent test results:\n{}\n\nSummarize their performance, \
             list strengths and weaknesses, and give a four-week study roadmap.",
            lines.join("\n")
        );
        let result = self
            .ask::<PerformanceAnalysis>(prompt, analysis_schema())
            .await
            .and_then(|analysis| {
                anyhow::ensure!(!analysis.summary.trim().is_empty(), "empty summary");
                Ok(analysis)
            });
        self.settle(result, "analysis", || fallback_analysis(student_name, results))
    }

    async fn ask<T: DeserializeOwned>(&self, prompt: String, schema: serde_json::Value) -> Result<T> {
        let provider = self
            .provider
            .as_ref()
            .context("no AI provider configured")?;

        let request = StructuredRequest {
            model: self.config.model.clone(),
            prompt,
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
            schema,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = provider.generate_json(&request).await?;
        tracing::debug!(
            "{} answered in {}ms ({} tokens)",
            provider.name(),
            response.latency_ms,
            response.token_usage.total_tokens
        );
        let payload = extract_json(&response.content);
        serde_json::from_str(&payload).context("AI response did not match the expected shape")
    }

    fn settle<T>(&self, result: Result<T>, what: &str, fallback: impl FnOnce() -> T) -> Generated<T> {
        match result {
            Ok(value) => Generated {
                source: GenerationSource::Ai,
                value,
            },
            Err(e) => {
                tracing::warn!("using sample {what}: {e:#}");
                Generated {
                    source: GenerationSource::Fallback,
                    value: fallback(),
                }
            }
        }
    }
}

fn validate_topics(topics: Vec<GeneratedTopic>) -> Result<Vec<GeneratedTopic>> {
    anyhow::ensure!(!topics.is_empty(), "no topics returned");
    anyhow::ensure!(
        topics.iter().all(|t| !t.name.trim().is_empty()),
        "topic without a name"
    );
    Ok(topics)
}

fn validate_questions(questions: Vec<GeneratedQuestion>) -> Result<Vec<GeneratedQuestion>> {
    anyhow::ensure!(!questions.is_empty(), "no questions returned");
    for (i, q) in questions.iter().enumerate() {
        anyhow::ensure!(
            q.options.len() == 4,
            "question {} has {} options",
            i + 1,
            q.options.len()
        );
        anyhow::ensure!(
            q.correct_index < 4,
            "question {} has correct_index {}",
            i + 1,
            q.correct_index
        );
        anyhow::ensure!(!q.question.trim().is_empty(), "question {} is empty", i + 1);
    }
    Ok(questions)
}

// ---------------------------------------------------------------------------
// Schemas
// ---------------------------------------------------------------------------

fn topics_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "topics": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "description": { "type": "string" },
                        "difficulty": { "type": "string", "enum": ["Easy", "Medium", "Hard"] },
                        "sub_topics": { "type": "array", "items": { "type": "string" } }
                    },
                    "required": ["name", "description", "difficulty", "sub_topics"]
                }
            }
        },
        "required": ["topics"]
    })
}

fn quiz_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "questions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "question": { "type": "string" },
                        "options": { "type": "array", "items": { "type": "string" } },
                        "correct_index": { "type": "integer" },
                        "explanation": { "type": "string" }
                    },
                    "required": ["question", "options", "correct_index", "explanation"]
                }
            }
        },
        "required": ["questions"]
    })
}

fn analysis_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "summary": { "type": "string" },
            "strengths": { "type": "array", "items": { "type": "string" } },
            "weaknesses": { "type": "array", "items": { "type": "string" } },
            "roadmap": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "week": { "type": "integer" },
                        "focus": { "type": "string" },
                        "activities": { "type": "array", "items": { "type": "string" } }
                    },
                    "required": ["week", "focus", "activities"]
                }
            }
        },
        "required": ["summary", "strengths", "weaknesses", "roadmap"]
    })
}

// ---------------------------------------------------------------------------
// Fallback content
// ---------------------------------------------------------------------------

fn fallback_topics(subject: &str, count: usize) -> Vec<GeneratedTopic> {
    const LEVELS: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];
    (1..=count.max(1))
        .map(|n| GeneratedTopic {
            name: format!("{SAMPLE_LABEL} {subject} Topic {n}"),
            description: format!(
                "Placeholder topic {n} for {subject}. Configure an AI provider to generate real content."
            ),
            difficulty: LEVELS[(n - 1) * LEVELS.len() / count.max(1)],
            sub_topics: vec![
                format!("{SAMPLE_LABEL} Introduction to topic {n}"),
                format!("{SAMPLE_LABEL} Practice for topic {n}"),
            ],
        })
        .collect()
}

fn fallback_quiz(topic: &str, count: usize) -> Vec<GeneratedQuestion> {
    (1..=count.max(1))
        .map(|n| GeneratedQuestion {
            question: format!("{SAMPLE_LABEL} Question {n} about {topic}?"),
            options: vec![
                "Option A".to_string(),
                "Option B".to_string(),
                "Option C".to_string(),
                "Option D".to_string(),
            ],
            correct_index: 0,
            explanation: format!("{SAMPLE_LABEL} Placeholder explanation."),
        })
        .collect()
}

fn fallback_analysis(student_name: &str, results: &[TopicResult]) -> PerformanceAnalysis {
    let mut sorted: Vec<&TopicResult> = results.iter().collect();
    sorted.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));

    let strengths: Vec<String> = sorted
        .iter()
        .filter(|r| r.percentage >= 80.0)
        .map(|r| r.topic.clone())
        .collect();
    let weaknesses: Vec<String> = sorted
        .iter()
        .rev()
        .filter(|r| r.percentage < 60.0)
        .map(|r| r.topic.clone())
        .collect();

    let average = if results.is_empty() {
        0.0
    } else {
        results.iter().map(|r| r.percentage).sum::<f64>() / results.len() as f64
    };

    let roadmap = (1..=4)
        .map(|week| {
            let focus = weaknesses
                .get(week as usize - 1)
                .cloned()
                .unwrap_or_else(|| "Mixed revision".to_string());
            RoadmapStep {
                week,
                focus,
                activities: vec![
                    format!("{SAMPLE_LABEL} Review notes"),
                    format!("{SAMPLE_LABEL} Take a practice test"),
                ],
            }
        })
        .collect();

    PerformanceAnalysis {
        summary: format!(
            "{SAMPLE_LABEL} {student_name} averaged {average:.0}% across {} test(s).",
            results.len()
        ),
        strengths,
        weaknesses,
        roadmap,
    }
}
