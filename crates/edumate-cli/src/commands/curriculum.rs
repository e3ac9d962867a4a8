//! The `edumate curriculum` commands.

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

use edumate_core::curriculum;
use edumate_core::model::Difficulty;
use edumate_core::traits::Store;

use super::find_subject;

#[derive(Subcommand)]
pub enum CurriculumCommand {
    /// Add a subject
    AddSubject {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "Medium")]
        difficulty: String,
    },

    /// Add a topic to a subject
    AddTopic {
        #[arg(long)]
        subject: String,

        #[arg(long)]
        name: String,

        #[arg(long, default_value = "Medium")]
        difficulty: String,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// Show subjects, topics and question counts
    List,
}

pub async fn execute(config_path: Option<PathBuf>, command: CurriculumCommand) -> Result<()> {
    let workspace = super::open(config_path)?;
    let store = &workspace.store;

    match command {
        CurriculumCommand::AddSubject { name, difficulty } => {
            let subject =
                curriculum::add_subject(store, &name, Difficulty::normalize(&difficulty)).await?;
            println!("Added subject {} ({})", subject.name, subject.id);
        }
        CurriculumCommand::AddTopic {
            subject,
            name,
            difficulty,
            description,
        } => {
            let subject = find_subject(store, &subject).await?;
            let topic = curriculum::add_topic(
                store,
                subject.id,
                &name,
                Difficulty::normalize(&difficulty),
                &description,
            )
            .await?;
            println!("Added topic {} to {} ({})", topic.name, subject.name, topic.id);
        }
        CurriculumCommand::List => {
            let subjects = store.list_subjects().await?;
            if subjects.is_empty() {
                println!("No subjects yet. Run `edumate init` or `edumate curriculum add-subject`.");
                return Ok(());
            }
            let topics = store.list_topics().await?;
            let bank = store.list_question_bank().await?;

            for subject in &subjects {
                println!("{} [{}]", subject.name, subject.difficulty);
                for topic in topics.iter().filter(|t| t.subject_id == subject.id) {
                    let questions = bank.iter().filter(|q| q.topic_id == topic.id).count();
                    println!(
                        "  {}. {} [{}] - {questions} question(s)",
                        topic.order, topic.name, topic.difficulty
                    );
                }
            }
        }
    }
    Ok(())
}
