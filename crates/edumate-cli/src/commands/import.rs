//! The `edumate import` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use edumate_core::importer::import_questions;

pub async fn execute(config_path: Option<PathBuf>, csv: PathBuf) -> Result<()> {
    let workspace = super::open(config_path)?;
    let content = std::fs::read_to_string(&csv)
        .with_context(|| format!("failed to read {}", csv.display()))?;

    let summary = import_questions(&workspace.store, &content).await?;

    println!(
        "Imported {} question(s), {} failed",
        summary.success, summary.failed
    );
    for error in &summary.errors {
        println!("  {error}");
    }
    Ok(())
}
