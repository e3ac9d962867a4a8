//! The `edumate reward` commands.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use clap::Subcommand;
use comfy_table::{Cell, Table};

use edumate_core::model::RequestStatus;
use edumate_core::rewards;
use edumate_core::traits::Store;

use super::{find_user, parse_id};

#[derive(Subcommand)]
pub enum RewardCommand {
    /// Offer a new reward
    Create {
        /// Parent id, email or name
        #[arg(long)]
        parent: String,

        #[arg(long)]
        name: String,

        /// Cost in coins
        #[arg(long)]
        cost: i64,
    },

    /// Ask for a reward on behalf of a student
    Request {
        #[arg(long)]
        student: String,

        /// Reward id
        #[arg(long)]
        reward: String,
    },

    /// Approve a pending request and deduct the coins
    Approve {
        /// Request id
        #[arg(long)]
        request: String,

        /// Approving parent or admin
        #[arg(long)]
        by: String,
    },

    /// Reject a pending request
    Reject {
        #[arg(long)]
        request: String,

        #[arg(long)]
        by: String,
    },

    /// List rewards and requests
    List {
        /// Only show pending requests
        #[arg(long)]
        pending: bool,
    },
}

pub async fn execute(config_path: Option<PathBuf>, command: RewardCommand) -> Result<()> {
    let workspace = super::open(config_path)?;
    let store = &workspace.store;

    match command {
        RewardCommand::Create { parent, name, cost } => {
            let parent = find_user(store, &parent).await?;
            let reward = rewards::create_reward(store, parent.id, &name, cost).await?;
            println!("Created reward '{}' for {} coins ({})", reward.name, reward.cost, reward.id);
        }
        RewardCommand::Request { student, reward } => {
            let student = find_user(store, &student).await?;
            let request = rewards::request_reward(store, student.id, parse_id(&reward)?).await?;
            println!("Request {} is pending ({} coins)", request.id, request.cost);
        }
        RewardCommand::Approve { request, by } => {
            let approver = find_user(store, &by).await?;
            let (request, outcome) =
                rewards::approve_request(store, parse_id(&request)?, approver.id).await?;
            println!(
                "Approved {}: {} coins deducted, balance {}",
                request.id, request.cost, outcome.new_balance
            );
        }
        RewardCommand::Reject { request, by } => {
            let approver = find_user(store, &by).await?;
            let request = rewards::reject_request(store, parse_id(&request)?, approver.id).await?;
            println!("Rejected {}", request.id);
        }
        RewardCommand::List { pending } => list(store, pending).await?,
    }
    Ok(())
}

async fn list(store: &dyn Store, pending_only: bool) -> Result<()> {
    let rewards_by_id: HashMap<_, _> = store
        .list_rewards()
        .await?
        .into_iter()
        .map(|r| (r.id, r))
        .collect();
    let names: HashMap<_, _> = store
        .list_users()
        .await?
        .into_iter()
        .map(|u| (u.id, u.name))
        .collect();

    if !pending_only {
        let mut table = Table::new();
        table.set_header(vec!["Reward", "Cost", "Parent", "Active", "Id"]);
        for reward in rewards_by_id.values() {
            table.add_row(vec![
                Cell::new(&reward.name),
                Cell::new(reward.cost),
                Cell::new(names.get(&reward.parent_id).map_or("?", String::as_str)),
                Cell::new(if reward.active { "yes" } else { "no" }),
                Cell::new(reward.id),
            ]);
        }
        println!("{table}");
    }

    let requests = if pending_only {
        rewards::pending_requests(store).await?
    } else {
        let mut all = store.list_reward_requests().await?;
        all.sort_by_key(|r| r.requested_at);
        all
    };
    if requests.is_empty() {
        println!("No reward requests.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Requested", "Student", "Reward", "Cost", "Status", "Id"]);
    for request in &requests {
        let status = match request.status {
            RequestStatus::Pending => "pending".to_string(),
            resolved => format!(
                "{resolved} by {}",
                request
                    .resolved_by
                    .and_then(|id| names.get(&id))
                    .map_or("?", String::as_str)
            ),
        };
        table.add_row(vec![
            Cell::new(request.requested_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")),
            Cell::new(names.get(&request.student_id).map_or("?", String::as_str)),
            Cell::new(
                rewards_by_id
                    .get(&request.reward_id)
                    .map_or("?", |r| r.name.as_str()),
            ),
            Cell::new(request.cost),
            Cell::new(status),
            Cell::new(request.id),
        ]);
    }
    println!("{table}");
    Ok(())
}
