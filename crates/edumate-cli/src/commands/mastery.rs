//! The `edumate mastery` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use edumate_core::mastery::topic_mastery;
use edumate_core::traits::Store;

use super::find_user;

pub async fn execute(config_path: Option<PathBuf>, student: String) -> Result<()> {
    let workspace = super::open(config_path)?;
    let store = &workspace.store;

    let student = find_user(store, &student).await?;
    let topics = store.list_topics().await?;
    let tests = store.list_tests(Some(student.id)).await?;
    let mastery = topic_mastery(&topics, &tests, student.id);
    if mastery.is_empty() {
        println!("No topics in the curriculum yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Topic", "Status", "Average", "Attempts"]);
    for entry in &mastery {
        table.add_row(vec![
            Cell::new(&entry.topic_name),
            Cell::new(entry.status),
            Cell::new(
                entry
                    .average
                    .map(|a| format!("{a:.1}%"))
                    .unwrap_or_else(|| "-".into()),
            ),
            Cell::new(entry.attempts),
        ]);
    }
    println!("Topic mastery for {}", student.name);
    println!("{table}");
    Ok(())
}
