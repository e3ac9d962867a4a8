//! The `edumate points` commands.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use clap::Subcommand;
use comfy_table::{Cell, Table};

use edumate_core::model::PointCategory;
use edumate_core::points::{self, Activity, AwardOutcome, PointsEngine};

use super::find_user;

#[derive(Subcommand)]
pub enum PointsCommand {
    /// Preview the points an activity would earn, without awarding them
    Calc {
        /// assignment, practice_test, mock_test, reading, bonus
        #[arg(long)]
        category: String,

        /// Score percentage (0-100)
        #[arg(long, default_value = "0")]
        score: f64,
    },

    /// Award points for an activity, applying the daily cap
    Award {
        /// Student id, email or name
        #[arg(long)]
        student: String,

        #[arg(long)]
        category: PointCategory,

        #[arg(long, default_value = "0")]
        score: f64,

        /// Ledger description
        #[arg(long, default_value = "Activity")]
        reason: String,
    },

    /// Add or deduct coins outside the rules
    Manual {
        #[arg(long)]
        student: String,

        #[arg(long, allow_hyphen_values = true)]
        amount: i64,

        #[arg(long)]
        reason: String,
    },

    /// Show a student's transactions, newest first
    Ledger {
        #[arg(long)]
        student: String,
    },

    /// List the configured point rules
    Rules,
}

pub async fn execute(config_path: Option<PathBuf>, command: PointsCommand) -> Result<()> {
    let workspace = super::open(config_path)?;
    let store = &workspace.store;

    match command {
        PointsCommand::Calc { category, score } => {
            let engine = PointsEngine::load(store).await?;
            let calculation = engine.calculate_named(&category, score);
            println!("{} points", calculation.points);
            for line in &calculation.breakdown {
                println!("  {line}");
            }
        }
        PointsCommand::Award {
            student,
            category,
            score,
            reason,
        } => {
            let student = find_user(store, &student).await?;
            let activity = Activity::new(category, score, reason);
            let outcome = points::award(store, student.id, &activity, Local::now()).await?;
            print_outcome(&student.name, &outcome);
        }
        PointsCommand::Manual {
            student,
            amount,
            reason,
        } => {
            let student = find_user(store, &student).await?;
            let outcome = points::award_manual(store, student.id, amount, &reason).await?;
            print_outcome(&student.name, &outcome);
        }
        PointsCommand::Ledger { student } => {
            let student = find_user(store, &student).await?;
            let transactions = points::ledger(store, student.id).await?;
            if transactions.is_empty() {
                println!("No transactions for {}.", student.name);
                return Ok(());
            }

            let mut table = Table::new();
            table.set_header(vec!["When", "Category", "Amount", "Reason"]);
            for t in &transactions {
                table.add_row(vec![
                    Cell::new(t.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")),
                    Cell::new(t.category),
                    Cell::new(format!("{:+}", t.amount)),
                    Cell::new(&t.reason),
                ]);
            }
            println!("{table}");
            println!("Balance: {} coins", student.coins);
        }
        PointsCommand::Rules => {
            let engine = PointsEngine::load(store).await?;
            let mut table = Table::new();
            table.set_header(vec![
                "Category", "Name", "Base", "Score bands", "Perfect", "Daily cap", "Enabled",
            ]);
            for rule in engine.rules() {
                let bands: Vec<String> = rule
                    .score_ranges
                    .iter()
                    .map(|r| format!("{}-{}%: +{}", r.min, r.max, r.points))
                    .collect();
                table.add_row(vec![
                    Cell::new(rule.category),
                    Cell::new(&rule.name),
                    Cell::new(rule.base_points),
                    Cell::new(bands.join(", ")),
                    Cell::new(rule.bonus_perfect),
                    Cell::new(
                        rule.daily_cap
                            .map(|c| c.to_string())
                            .unwrap_or_else(|| "-".into()),
                    ),
                    Cell::new(if rule.enabled { "yes" } else { "no" }),
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}

fn print_outcome(name: &str, outcome: &AwardOutcome) {
    println!(
        "{name}: {:+} coins ({}), balance {}",
        outcome.points, outcome.category, outcome.new_balance
    );
    for line in &outcome.breakdown {
        println!("  {line}");
    }
}
