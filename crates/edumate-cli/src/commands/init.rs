//! The `edumate init` command.

use std::path::PathBuf;

use anyhow::Result;

use edumate_ai::config::CONFIG_FILE_NAME;
use edumate_store::seed::seed_defaults;

pub async fn execute(config_path: Option<PathBuf>, with_sample: bool) -> Result<()> {
    let path = config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, SAMPLE_CONFIG)?;
        println!("Created {}", path.display());
    }

    let workspace = super::open(Some(path))?;
    let report = seed_defaults(&workspace.store, with_sample).await?;
    println!(
        "Seeded {} point rules, {} subjects and {} topics into {}",
        report.rules_added,
        report.subjects_added,
        report.topics_added,
        workspace.config.data_file.display()
    );

    println!("\nNext steps:");
    println!("  1. Set GEMINI_API_KEY (or edit {CONFIG_FILE_NAME}) to enable AI generation");
    println!("  2. Run: edumate user add --name Ada --email ada@example.com --role admin");
    println!("  3. Run: edumate import --csv questions.csv");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# edumate configuration

default_provider = "gemini"
default_model = "gemini-2.5-flash"
default_temperature = 0.7
data_file = "edumate-data.json"

[providers.gemini]
type = "gemini"
api_key = "${GEMINI_API_KEY}"

[providers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"
"#;
