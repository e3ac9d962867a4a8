//! The `edumate generate` commands.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::Subcommand;
use uuid::Uuid;

use edumate_core::curriculum;
use edumate_core::generator::{GenerationSource, TopicResult};
use edumate_core::model::{Difficulty, QuestionBankItem, Test};
use edumate_core::traits::Store;

use super::{find_subject, find_topic, find_user};

/// Tag on questions saved from AI output.
const AI_TAG: &str = "AI Generated";

#[derive(Subcommand)]
pub enum GenerateCommand {
    /// Propose topics for a subject
    Topics {
        #[arg(long)]
        subject: String,

        #[arg(long, default_value = "5")]
        grade: String,

        #[arg(long, default_value = "5")]
        count: usize,

        /// Add the topics to the subject (AI results only)
        #[arg(long)]
        save: bool,
    },

    /// Write multiple-choice questions for a topic
    Quiz {
        #[arg(long)]
        subject: String,

        #[arg(long)]
        topic: String,

        #[arg(long, default_value = "Medium")]
        difficulty: String,

        #[arg(long, default_value = "5")]
        count: usize,

        /// Add the questions to the question bank (AI results only)
        #[arg(long)]
        save: bool,
    },

    /// Analyze a student's completed tests and suggest a roadmap
    Analysis {
        #[arg(long)]
        student: String,
    },
}

pub async fn execute(config_path: Option<PathBuf>, command: GenerateCommand) -> Result<()> {
    let workspace = super::open(config_path)?;
    let store = &workspace.store;
    let generator = workspace.config.generator()?;

    match command {
        GenerateCommand::Topics {
            subject,
            grade,
            count,
            save,
        } => {
            let result = generator.generate_topics(&subject, &grade, count).await;
            print_source(result.source);
            for (i, topic) in result.value.iter().enumerate() {
                println!("{}. {} [{}]", i + 1, topic.name, topic.difficulty);
                if !topic.description.is_empty() {
                    println!("   {}", topic.description);
                }
                for sub in &topic.sub_topics {
                    println!("   - {sub}");
                }
            }

            if save && can_save(result.source) {
                let subject = find_subject(store, &subject).await?;
                let mut saved = 0;
                for generated in &result.value {
                    match curriculum::add_topic(
                        store,
                        subject.id,
                        &generated.name,
                        generated.difficulty,
                        &generated.description,
                    )
                    .await
                    {
                        Ok(topic) => {
                            for sub in &generated.sub_topics {
                                curriculum::add_sub_topic(store, topic.id, sub).await?;
                            }
                            saved += 1;
                        }
                        Err(e) => tracing::warn!("skipped '{}': {e:#}", generated.name),
                    }
                }
                println!("Saved {saved} topic(s) to {}", subject.name);
            }
        }
        GenerateCommand::Quiz {
            subject,
            topic,
            difficulty,
            count,
            save,
        } => {
            let difficulty = Difficulty::normalize(&difficulty);
            let result = generator.generate_quiz(&topic, difficulty, count).await;
            print_source(result.source);
            for (i, q) in result.value.iter().enumerate() {
                println!("{}. {}", i + 1, q.question);
                for (j, option) in q.options.iter().enumerate() {
                    let marker = if j == usize::from(q.correct_index) { "*" } else { " " };
                    println!("  {marker} {}) {option}", (b'A' + j as u8) as char);
                }
                if !q.explanation.is_empty() {
                    println!("    {}", q.explanation);
                }
            }

            if save && can_save(result.source) {
                let subject = find_subject(store, &subject).await?;
                let topic = find_topic(store, &subject, &topic).await?;
                let mut items = Vec::new();
                for q in result.value {
                    let Ok(options) = <[String; 4]>::try_from(q.options) else {
                        continue;
                    };
                    items.push(QuestionBankItem {
                        id: Uuid::new_v4(),
                        topic_id: topic.id,
                        question: q.question,
                        options,
                        correct_index: q.correct_index,
                        difficulty,
                        explanation: Some(q.explanation).filter(|e| !e.is_empty()),
                        tags: vec![AI_TAG.to_string()],
                        created_at: Utc::now(),
                    });
                }
                store.insert_questions(&items).await?;
                println!(
                    "Saved {} question(s) to {} / {}",
                    items.len(),
                    subject.name,
                    topic.name
                );
            }
        }
        GenerateCommand::Analysis { student } => {
            let student = find_user(store, &student).await?;
            let tests = store.list_tests(Some(student.id)).await?;
            let topic_names: HashMap<Uuid, String> = store
                .list_topics()
                .await?
                .into_iter()
                .map(|t| (t.id, t.name))
                .collect();
            let results = topic_results(&tests, &topic_names);
            if results.is_empty() {
                println!("{} has no completed tests yet.", student.name);
                return Ok(());
            }

            let analysis = generator.analyze_performance(&student.name, &results).await;
            print_source(analysis.source);
            let analysis = analysis.value;
            println!("{}", analysis.summary);
            if !analysis.strengths.is_empty() {
                println!("Strengths: {}", analysis.strengths.join(", "));
            }
            if !analysis.weaknesses.is_empty() {
                println!("Needs work: {}", analysis.weaknesses.join(", "));
            }
            for step in &analysis.roadmap {
                println!("Week {}: {}", step.week, step.focus);
                for activity in &step.activities {
                    println!("  - {activity}");
                }
            }
        }
    }
    Ok(())
}

fn print_source(source: GenerationSource) {
    if source == GenerationSource::Fallback {
        println!("(AI unavailable, showing sample content)");
    }
}

fn can_save(source: GenerationSource) -> bool {
    if source == GenerationSource::Fallback {
        println!("Sample content is not saved.");
        return false;
    }
    true
}

/// Per-topic percentage of correct answers across completed tests.
fn topic_results(tests: &[Test], topic_names: &HashMap<Uuid, String>) -> Vec<TopicResult> {
    let mut tally: HashMap<Uuid, (usize, usize)> = HashMap::new();
    for test in tests.iter().filter(|t| t.completed) {
        for (i, question) in test.questions.iter().enumerate() {
            let entry = tally.entry(question.topic_id).or_default();
            entry.1 += 1;
            if test.answers.get(i).copied().flatten() == Some(question.correct_index) {
                entry.0 += 1;
            }
        }
    }

    let mut results: Vec<TopicResult> = tally
        .into_iter()
        .map(|(topic_id, (correct, total))| TopicResult {
            topic: topic_names
                .get(&topic_id)
                .cloned()
                .unwrap_or_else(|| "Unknown topic".to_string()),
            percentage: correct as f64 / total as f64 * 100.0,
        })
        .collect();
    results.sort_by(|a, b| a.topic.cmp(&b.topic));
    results
}
