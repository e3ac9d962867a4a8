//! The `edumate user` commands.

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Table};

use edumate_core::model::{Role, User};
use edumate_core::traits::Store;

#[derive(Subcommand)]
pub enum UserCommand {
    /// Create a user
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        /// admin, parent, teacher or student
        #[arg(long)]
        role: Role,

        /// School grade (students)
        #[arg(long)]
        grade: Option<String>,
    },

    /// List users
    List {
        /// Only users with this role
        #[arg(long)]
        role: Option<Role>,
    },
}

pub async fn execute(config_path: Option<PathBuf>, command: UserCommand) -> Result<()> {
    let workspace = super::open(config_path)?;
    let store = &workspace.store;

    match command {
        UserCommand::Add {
            name,
            email,
            role,
            grade,
        } => {
            anyhow::ensure!(!name.trim().is_empty(), "name must not be empty");
            let users = store.list_users().await?;
            if users.iter().any(|u| u.email.eq_ignore_ascii_case(email.trim())) {
                anyhow::bail!("a user with email {} already exists", email.trim());
            }

            let mut user = User::new(name.trim(), email.trim(), role);
            user.grade = match role {
                Role::Student => grade,
                Role::Admin | Role::Parent | Role::Teacher => None,
            };
            store.save_users(std::slice::from_ref(&user)).await?;
            println!("Added {} {} ({})", user.role, user.name, user.id);
        }
        UserCommand::List { role } => {
            let mut users = store.list_users().await?;
            users.retain(|u| role.map_or(true, |r| u.role == r));
            users.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
            if users.is_empty() {
                println!("No users.");
                return Ok(());
            }

            let mut table = Table::new();
            table.set_header(vec!["Name", "Email", "Role", "Coins", "Links", "Id"]);
            for u in &users {
                table.add_row(vec![
                    Cell::new(&u.name),
                    Cell::new(&u.email),
                    Cell::new(u.role),
                    Cell::new(u.coins),
                    Cell::new(u.linked_ids.len()),
                    Cell::new(u.id),
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}
