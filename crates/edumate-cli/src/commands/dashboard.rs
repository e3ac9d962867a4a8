//! The `edumate dashboard` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use comfy_table::{Cell, Table};

use edumate_core::state::{AppState, Dashboard, StudentSummary};

use super::find_user;

pub async fn execute(config_path: Option<PathBuf>, user: String, json: bool) -> Result<()> {
    let workspace = super::open(config_path)?;
    let user = find_user(&workspace.store, &user).await?;

    let mut state = AppState::new(Arc::new(workspace.store));
    state.refresh().await?;
    let dashboard = state.dashboard(user.id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
        return Ok(());
    }

    match dashboard {
        Dashboard::Admin {
            users,
            students,
            subjects,
            topics,
            questions,
        } => {
            println!("Admin overview");
            println!("  Users:     {users} ({students} students)");
            println!("  Subjects:  {subjects}");
            println!("  Topics:    {topics}");
            println!("  Questions: {questions}");
        }
        Dashboard::Parent { name, children } => {
            println!("{name}'s children");
            print_students(&children);
        }
        Dashboard::Teacher { name, students } => {
            println!("{name}'s students");
            print_students(&students);
        }
        Dashboard::Student { name, summary } => {
            println!("{name}");
            println!("  Coins:         {}", summary.coins);
            println!("  Tests done:    {}", summary.completed_tests);
            println!("  Tests pending: {}", summary.pending_tests);
            if let Some(avg) = summary.average_score {
                println!("  Average score: {avg:.1}%");
            }
        }
    }
    Ok(())
}

fn print_students(students: &[StudentSummary]) {
    if students.is_empty() {
        println!("  No linked students.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec!["Student", "Coins", "Done", "Pending", "Average"]);
    for s in students {
        table.add_row(vec![
            Cell::new(&s.name),
            Cell::new(s.coins),
            Cell::new(s.completed_tests),
            Cell::new(s.pending_tests),
            Cell::new(
                s.average_score
                    .map(|a| format!("{a:.1}%"))
                    .unwrap_or_else(|| "-".into()),
            ),
        ]);
    }
    println!("{table}");
}
