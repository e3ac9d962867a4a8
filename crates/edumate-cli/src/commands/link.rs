//! The `edumate link` command.

use std::path::PathBuf;

use anyhow::Result;

use edumate_core::links::save_links;
use edumate_core::traits::Store;

use super::find_user;

pub async fn execute(config_path: Option<PathBuf>, user: String, to: Vec<String>) -> Result<()> {
    let workspace = super::open(config_path)?;
    let store = &workspace.store;

    let owner = find_user(store, &user).await?;
    let mut desired = Vec::new();
    for reference in to.iter().filter(|r| !r.trim().is_empty()) {
        desired.push(find_user(store, reference).await?.id);
    }

    let report = save_links(store, owner.id, &desired).await?;
    let linked = store.get_user(owner.id).await?.linked_ids.len();
    println!(
        "{} is now linked to {} user(s): {} added, {} removed, {} repaired",
        owner.name,
        linked,
        report.added.len(),
        report.removed.len(),
        report.repaired.len()
    );
    Ok(())
}
